use crate::CodeHasher;
use md5::{Digest, Md5};
use snipurl_core::ShortCode;
use typed_builder::TypedBuilder;

/// Number of hex characters in an MD5 digest.
pub const MAX_LENGTH: usize = 32;

/// Hashes content with MD5 and keeps the first `length` hex characters.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct Md5Hasher {
    /// Output length, clamped to `1..=32`.
    #[builder(default = 8)]
    length: usize,
}

impl Md5Hasher {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length.clamp(1, MAX_LENGTH)
    }
}

impl Default for Md5Hasher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CodeHasher for Md5Hasher {
    fn hash(&self, content: &str) -> ShortCode {
        let digest = Md5::digest(content.as_bytes());
        let mut hex = format!("{:x}", digest);
        hex.truncate(self.length());
        ShortCode::new_unchecked(hex)
    }
}
