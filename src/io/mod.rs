pub mod config_io;
pub mod file_store;
pub mod http_store;
pub mod logging;
pub mod store;

pub use store::{RemoteStore, StoreError, open_store};
