pub mod error;
pub mod export;
pub mod input;
pub mod lookup;

pub use error::CoreError;
pub use export::{Tabular, read_records, write_records};
pub use input::load_urls;
pub use lookup::{LookupOptions, LookupSummary, execute_lookup, format_unretrieved};
