//! Identity document schema
//!
//! Claims by a user to be a given person (an elected official). Staff
//! inspect each claim and mark it verified or rejected.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for identities
pub const IDENTITY_COLLECTION: &str = "identities";

/// Identity review status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    /// Awaiting staff review
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

/// Identity document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct IdentityDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Claimant
    pub user_id: ObjectId,

    /// Person being claimed
    pub person_id: ObjectId,

    #[serde(default)]
    pub status: IdentityStatus,

    /// Staff member who last reviewed the claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_id: Option<ObjectId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected_at: Option<DateTime>,
}

impl IdentityDoc {
    /// Create a new pending identity claim
    pub fn new(user_id: ObjectId, person_id: ObjectId) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            user_id,
            person_id,
            status: IdentityStatus::Pending,
            inspector_id: None,
            inspected_at: None,
        }
    }
}

impl IntoIndexes for IdentityDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "user_id": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_status_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "person_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("person_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for IdentityDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
