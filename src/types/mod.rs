//! Shared types

mod error;

pub use error::{is_duplicate_key, AskThemError, Result};
