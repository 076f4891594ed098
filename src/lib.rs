//! AskThem - questions to elected officials
//!
//! Citizens post questions to public officials and other citizens sign on.
//! Once a question gathers as many signatures as the official's threshold,
//! it is flagged for delivery.
//!
//! ## Modules
//!
//! - **signatures**: record and withdraw signatures, keep the counter and
//!   `threshold_met` flag consistent
//! - **questions**: creation, answers, and the jurisdiction feeds
//! - **users**: registration validation and per-user views
//! - **identities**: staff verification of officials' identity claims
//! - **store**: the persistence seam (MongoDB or in-memory)

pub mod config;
pub mod db;
pub mod identities;
pub mod questions;
pub mod routes;
pub mod server;
pub mod signatures;
pub mod store;
pub mod types;
pub mod users;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AskThemError, Result};
