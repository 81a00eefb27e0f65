mod health;
mod stats;
mod url;
mod user;

pub use health::ping_handler;
pub use stats::stats_handler;
pub use url::{batch_shorten_handler, redirect_handler, shorten_json_handler, shorten_text_handler};
pub use user::{delete_user_urls_handler, list_user_urls_handler};
