pub mod backoff;
pub mod manager;
pub mod state;

pub use backoff::ReconnectPolicy;
pub use manager::{ConnectionEvent, ConnectionManager};
pub use state::{ConnectionPhase, ConnectionState, PageEvent};
