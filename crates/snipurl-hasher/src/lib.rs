pub mod md5_hex;

pub use md5_hex::Md5Hasher;

use snipurl_core::ShortCode;

/// Trait for deriving short code candidates from content.
///
/// Implementations are pure functions of their input and don't interact
/// with storage. Distinct inputs should rarely map to the same code;
/// resolving the collisions that do happen is up to the caller.
pub trait CodeHasher: Send + Sync + 'static {
    /// Hashes `content` into a fixed-length short code.
    fn hash(&self, content: &str) -> ShortCode;
}

impl<H: CodeHasher + ?Sized> CodeHasher for std::sync::Arc<H> {
    fn hash(&self, content: &str) -> ShortCode {
        (**self).hash(content)
    }
}
