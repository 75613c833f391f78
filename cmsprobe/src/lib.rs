pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use commands::command_argument_builder;
pub use handlers::{expand_path, format_event, lookup_options_from_matches, run_lookup};
