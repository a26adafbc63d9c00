mod controller;
mod format;
mod highlight;
mod player;
mod tui;

pub use controller::SearchController;
pub use player::ExternalPlayer;
pub use tui::SearchApp;
