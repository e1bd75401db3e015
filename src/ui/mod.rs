pub mod app;
pub mod contacts;
pub mod draw;
pub mod panes;
pub mod prompt;
pub mod save_panel;
