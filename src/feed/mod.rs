mod fetch;
mod model;
mod parse;

pub use fetch::fetch_entries;
pub use model::{AUDIO_MIME_TYPE, Entry, Feed, Link, STALE_AFTER_DAYS};
pub use parse::parse_entries;
