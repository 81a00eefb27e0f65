use crate::error::DumpError;
use crate::owner::OwnerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, DumpError>;

/// One line of the durability dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpRecord {
    pub uuid: i64,
    pub short_url: String,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "OwnerId::is_anonymous")]
    pub owner_id: OwnerId,
}

/// Append-only sink used to persist created records and replay them later.
#[async_trait]
pub trait Dumper: Send + Sync + 'static {
    async fn add(&self, record: &DumpRecord) -> Result<()>;

    /// Reads back every record that was added, in insertion order.
    async fn read_all(&self) -> Result<Vec<DumpRecord>>;
}

/// A dumper that persists nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDumper;

#[async_trait]
impl Dumper for NoopDumper {
    async fn add(&self, _record: &DumpRecord) -> Result<()> {
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<DumpRecord>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_owner_is_omitted_from_json() {
        let record = DumpRecord {
            uuid: 1,
            short_url: "c984d06a".into(),
            original_url: "https://example.com".into(),
            owner_id: OwnerId::anonymous(),
        };

        let line = serde_json::to_string(&record).unwrap();
        assert_eq!(
            line,
            r#"{"uuid":1,"short_url":"c984d06a","original_url":"https://example.com"}"#
        );
    }

    #[test]
    fn legacy_line_without_owner_parses() {
        let line = r#"{"uuid":7,"short_url":"abc","original_url":"https://a.example"}"#;
        let record: DumpRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.uuid, 7);
        assert!(record.owner_id.is_anonymous());
    }
}
