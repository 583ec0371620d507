pub mod api;
pub mod connection;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod presentation;
pub mod push;
pub mod reconciler;
pub mod store;


pub use api::{FetchQuery, HttpNotificationApi, NotificationApi};
pub use connection::{ConnectionManager, ConnectionPhase, ConnectionState, PageEvent};
pub use engine::{AuthUser, EngineDeps, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use lifecycle::{AuthSignal, LifecycleBinder};
pub use presentation::{PresentationEvent, Presenter, SoundSink, TracingSoundSink};
pub use push::{PushConnector, PushStream, WsPushConnector};
pub use store::{ChangeKind, NotificationStore, StoreChange, StoreSnapshot};
