//! Person document schema
//!
//! Elected officials that questions are addressed to.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for people
pub const PERSON_COLLECTION: &str = "people";

/// Person document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PersonDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub name: String,

    /// Office type (StateLegislator, Governor, FederalLegislator, Councilmember)
    #[serde(default, rename = "_type")]
    pub person_type: String,

    /// Jurisdiction abbreviation
    #[serde(default)]
    pub state: String,

    /// Signatures a question needs before it is put to this person
    #[serde(default = "default_signature_threshold")]
    pub signature_threshold: i64,
}

fn default_signature_threshold() -> i64 {
    1
}

impl PersonDoc {
    /// Create a new person document
    pub fn new(name: String, person_type: String, state: String, signature_threshold: i64) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            name,
            person_type,
            state,
            signature_threshold,
        }
    }
}

impl IntoIndexes for PersonDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "state": 1, "_type": 1 },
            Some(
                IndexOptions::builder()
                    .name("state_type_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PersonDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
