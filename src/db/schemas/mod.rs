//! Database schemas for AskThem
//!
//! MongoDB document structures for users, people, questions, signatures,
//! answers and identities.

mod answer;
mod identity;
mod metadata;
mod person;
mod question;
mod signature;
mod user;

pub use answer::{AnswerDoc, ANSWER_COLLECTION};
pub use identity::{IdentityDoc, IdentityStatus, IDENTITY_COLLECTION};
pub use metadata::Metadata;
pub use person::{PersonDoc, PERSON_COLLECTION};
pub use question::{QuestionDoc, QUESTION_COLLECTION};
pub use signature::{SignatureDoc, SIGNATURE_COLLECTION};
pub use user::{UserDoc, DEFAULT_COUNTRY, STAFF_ROLE, USER_COLLECTION};
