use clap::{Parser, ValueEnum};
use snipurl_snipper::SnipperSettings;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const LISTEN_ADDR_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SNIPURL_STORAGE_BACKEND";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const HASH_LENGTH_ENV: &str = "SNIPURL_HASH_LENGTH";
pub const DELETE_WORKERS_ENV: &str = "SNIPURL_DELETE_WORKERS";
pub const DELETE_BATCH_SIZE_ENV: &str = "SNIPURL_DELETE_BATCH_SIZE";
pub const MAX_ATTEMPTS_ENV: &str = "SNIPURL_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "SNIPURL_LOG_FORMAT";
pub const TRUSTED_SUBNET_ENV: &str = "TRUSTED_SUBNET";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "snipurl", version, about = "URL shortening service")]
pub struct CLI {
    #[arg(short = 'a', long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of the short URLs handed to clients.
    #[arg(short = 'b', long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(short = 'd', long, env = DATABASE_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub database_dsn: Option<String>,

    /// JSON-lines file the in-memory store is restored from and dumped to.
    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<PathBuf>,

    #[arg(long, env = HASH_LENGTH_ENV, default_value_t = 8)]
    pub hash_length: usize,

    #[arg(long, env = DELETE_WORKERS_ENV, default_value_t = 10)]
    pub delete_workers: usize,

    #[arg(long, env = DELETE_BATCH_SIZE_ENV, default_value_t = 10)]
    pub delete_batch_size: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 10)]
    pub max_attempts: usize,

    /// Value `X-Real-IP` must carry to reach the internal stats route.
    #[arg(short = 't', long, env = TRUSTED_SUBNET_ENV)]
    pub trusted_subnet: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}

impl CLI {
    pub fn snipper_settings(&self) -> SnipperSettings {
        SnipperSettings::builder()
            .max_attempts(self.max_attempts)
            .delete_batch_size(self.delete_batch_size)
            .delete_workers(self.delete_workers)
            .build()
    }
}
