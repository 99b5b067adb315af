pub use crate::builder::CacheBuilder;
pub use crate::clock::Clock;
pub use crate::ds::{Entry, EntryHandle, NodePool, OrderList};
pub use crate::engine::{Cache, CacheCore, ExpireCallback, RunStatus, DEFAULT_EXPIRE_BATCH};
pub use crate::error::ConfigError;
pub use crate::metrics::MetricsSnapshot;
pub use crate::policy::EvictionPolicy;
