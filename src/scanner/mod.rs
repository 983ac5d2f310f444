pub mod walk;

pub use walk::{compile_ignore_patterns, find_files_named};
