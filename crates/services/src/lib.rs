pub mod auth;
pub mod dao;
pub mod export;
pub mod feed;
pub mod lifecycle;
pub mod session;
pub mod store;
pub mod tracker;

pub use auth::AuthService;
pub use dao::*;
pub use feed::{FeedKind, FeedService};
pub use lifecycle::{LifecycleEngine, LifecycleError};
pub use session::Session;
pub use store::{open_store, MemoryStore, MongoStore, RecordStore};
pub use tracker::TrackerService;
