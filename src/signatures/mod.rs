//! Signatures on questions
//!
//! - `threshold`: when the cached threshold flag flips
//! - `service`: record/withdraw with counter maintenance

pub mod service;
pub mod threshold;

pub use service::{snapshot_signature, SignatureReceipt, SignatureService, TallyAudit};
pub use threshold::{flag_after_signing, flag_after_withdrawal, WithdrawalRule};
