pub mod cache;
pub mod connection;
pub mod error;
pub mod models;

pub use cache::{CachedInbox, DurableCache, FileCache, MemoryCache};
pub use connection::open_cache;
pub use error::{DbError, DbResult};
