//! Core types and traits for the SnipURL shortener.
//!
//! This crate provides the shared vocabulary used by the storage backends,
//! the snipper service and the HTTP gateway.

pub mod dump;
pub mod error;
pub mod owner;
pub mod shortcode;
pub mod snipper;
pub mod store;

pub use dump::{DumpRecord, Dumper, NoopDumper};
pub use error::{DumpError, SnipperError, StorageError};
pub use owner::OwnerId;
pub use shortcode::ShortCode;
pub use snipper::{BatchInput, BatchOutput, ShortenedUrl, Snipped, Snipper};
pub use store::{NewUrl, ReadUrlStore, SetUrlOutcome, StoreState, UrlRecord, UrlStore};
