use async_trait::async_trait;
use snipurl_core::dump::Result;
use snipurl_core::{DumpError, DumpRecord, Dumper};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

/// Appends records to a file, one JSON object per line.
#[derive(Debug)]
pub struct FileDumper {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileDumper {
    /// Opens `path` for appending, creating it when missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DumpError::Io(format!("{}: {e}", path.display())))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl Dumper for FileDumper {
    async fn add(&self, record: &DumpRecord) -> Result<()> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| DumpError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|e| DumpError::Io(e.to_string()))?;
        file.flush().await.map_err(|e| DumpError::Io(e.to_string()))
    }

    async fn read_all(&self) -> Result<Vec<DumpRecord>> {
        // Hold the writer lock so a concurrent add cannot leave a torn line.
        let _guard = self.file.lock().await;

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DumpError::Io(format!("{}: {e}", self.path.display()))),
        };

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| {
                warn!(line = index + 1, error = %e, "malformed dump line");
                DumpError::Serialization(format!("line {}: {e}", index + 1))
            })?;
            records.push(record);
        }

        Ok(records)
    }
}
