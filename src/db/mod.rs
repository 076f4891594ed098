//! Database layer for AskThem
//!
//! MongoDB storage for users, people, questions, signatures, answers and identities.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
pub use schemas::{
    AnswerDoc, IdentityDoc, IdentityStatus, Metadata, PersonDoc, QuestionDoc, SignatureDoc,
    UserDoc,
};
