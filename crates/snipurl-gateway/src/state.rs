use std::sync::Arc;

use snipurl_core::{ShortCode, Snipper};

#[derive(Clone)]
pub struct AppState {
    snipper: Arc<dyn Snipper>,
    base_url: Arc<str>,
    trusted_subnet: Option<Arc<str>>,
}

impl AppState {
    pub fn new(snipper: Arc<dyn Snipper>, public_base_url: impl Into<String>) -> Self {
        Self {
            snipper,
            base_url: public_base_url.into().into(),
            trusted_subnet: None,
        }
    }

    /// Opens the internal routes to requests whose `X-Real-IP` matches `subnet`.
    pub fn with_trusted_subnet(mut self, subnet: Option<String>) -> Self {
        self.trusted_subnet = subnet
            .map(|subnet| subnet.trim().to_owned())
            .filter(|subnet| !subnet.is_empty())
            .map(Into::into);
        self
    }

    pub fn trusted_subnet(&self) -> Option<&str> {
        self.trusted_subnet.as_deref()
    }

    pub fn snipper(&self) -> &dyn Snipper {
        self.snipper.as_ref()
    }

    /// The public URL a client follows to be redirected.
    pub fn short_url(&self, code: &ShortCode) -> String {
        code.to_url(&self.base_url)
    }
}
