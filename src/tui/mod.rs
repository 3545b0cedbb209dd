pub mod app;
pub mod input;
pub mod popup;
pub mod position;
pub mod render;
pub mod session;
pub mod theme;
pub mod wizard;

pub use app::{App, Mode, run};
