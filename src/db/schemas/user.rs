//! User document schema
//!
//! Citizens who ask and sign questions. Identity and address fields follow
//! Popolo (names) and vCard (address) naming.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Country assumed when a user has none on record
pub const DEFAULT_COUNTRY: &str = "US";

/// Role granting permission to inspect official identities
pub const STAFF_ROLE: &str = "staff";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub given_name: String,

    #[serde(default)]
    pub family_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    /// State or territory abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default = "default_country")]
    pub country: Option<String>,

    /// Longitude/latitude pair, filled in by geocoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<f64>>,

    /// Role names (e.g. "staff")
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_country() -> Option<String> {
    Some(DEFAULT_COUNTRY.to_string())
}

impl UserDoc {
    /// Create a new user document
    pub fn new(email: String, given_name: String, family_name: String) -> Self {
        Self {
            id: None,
            metadata: Metadata::new(),
            email,
            given_name,
            family_name,
            street_address: None,
            locality: None,
            region: None,
            postal_code: None,
            country: default_country(),
            coordinates: None,
            roles: Vec::new(),
        }
    }

    /// Formatted full name
    pub fn name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    /// Single-line address handed to the geocoder
    pub fn address_for_geocoding(&self) -> String {
        [
            &self.street_address,
            &self.locality,
            &self.region,
            &self.country,
            &self.postal_code,
        ]
        .iter()
        .map(|part| part.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Whether the user may verify or reject official identities
    pub fn is_staff(&self) -> bool {
        self.roles.iter().any(|r| r == STAFF_ROLE)
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_address() {
        let mut user = UserDoc::new(
            "ada@example.com".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
        );
        user.street_address = Some("1 Main St".to_string());
        user.locality = Some("Springfield".to_string());
        user.region = Some("IL".to_string());
        user.postal_code = Some("62701".to_string());

        assert_eq!(user.name(), "Ada Lovelace");
        assert_eq!(
            user.address_for_geocoding(),
            "1 Main St, Springfield, IL, US, 62701"
        );
    }

    #[test]
    fn test_missing_country_defaults_on_deserialize() {
        let user: UserDoc = bson::from_document(doc! {
            "email": "x@example.com",
            "given_name": "X",
            "family_name": "Y",
        })
        .unwrap();
        assert_eq!(user.country.as_deref(), Some(DEFAULT_COUNTRY));
        assert!(!user.is_staff());
    }
}
