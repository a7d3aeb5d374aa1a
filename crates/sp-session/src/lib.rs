//! # sp-session
//!
//! The two shared mutable resources of the service provider:
//!
//! - [`SessionStore`]: authenticated sessions keyed by opaque session ID,
//!   expiring a fixed time after creation
//! - [`ReplayCache`]: message and assertion IDs already consumed, remembered
//!   for a fixed window
//!
//! Both are plain values meant to be constructed once at startup and shared
//! by `Arc`. Every operation is a single atomic step on a sharded
//! [`dashmap::DashMap`], so concurrent requests never observe a half-applied
//! insert or eviction. [`Sweeper`] bounds memory by purging stale entries on
//! a timer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod replay;
pub mod session;
pub mod sweeper;

pub use error::{SessionError, SessionResult};
pub use replay::{ReplayCache, ASSERTION_PREFIX};
pub use session::{Session, SessionStore};
pub use sweeper::Sweeper;
