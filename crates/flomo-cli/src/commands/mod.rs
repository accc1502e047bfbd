pub mod common;
pub mod completions;
pub mod cursor;
pub mod journal;
pub mod settings;
pub mod sync;
