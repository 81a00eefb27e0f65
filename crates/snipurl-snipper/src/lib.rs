//! The SnipURL service layer.
//!
//! [`SnipperService`] turns URLs into short codes on top of any
//! [`UrlStore`](snipurl_core::UrlStore), resolving hash collisions by salting
//! and retrying. Deletions are handed to a [`DeleteService`] backed by a
//! bounded [`WorkerPool`] and applied asynchronously.

pub mod delete;
pub mod service;
pub mod workerpool;

pub use delete::{DeleteService, DeleteTask};
pub use service::{SnipperService, SnipperSettings};
pub use workerpool::{PoolError, TaskHandler, WorkerPool};
