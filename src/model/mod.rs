pub mod collection;
pub mod config;
pub mod item;
pub mod record;
pub mod value;
pub mod workspace;

pub use collection::*;
pub use config::*;
pub use item::*;
pub use record::*;
pub use value::*;
pub use workspace::*;
