//! Identity inspection
//!
//! A user claims to be a public figure by filing an identity; staff verify
//! or reject it. A user with at least one verified identity counts as
//! verified.

use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::{info, warn};

use crate::db::schemas::{IdentityDoc, IdentityStatus};
use crate::store::CivicStore;
use crate::types::{AskThemError, Result};

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn CivicStore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn CivicStore>) -> Self {
        Self { store }
    }

    /// File a pending identity claim for `user_id` as `person_id`
    pub async fn claim(&self, user_id: &ObjectId, person_id: &ObjectId) -> Result<IdentityDoc> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(AskThemError::Validation(format!(
                "user {} does not exist",
                user_id
            )));
        }
        if self.store.find_person(person_id).await?.is_none() {
            return Err(AskThemError::Validation(format!(
                "person {} does not exist",
                person_id
            )));
        }

        let mut identity = IdentityDoc::new(*user_id, *person_id);
        let id = self.store.insert_identity(identity.clone()).await?;
        identity.id = Some(id);
        info!("Identity {} claimed by user {}", id, user_id);
        Ok(identity)
    }

    pub async fn verify(
        &self,
        identity_id: &ObjectId,
        inspector_id: &ObjectId,
    ) -> Result<IdentityDoc> {
        self.inspect(identity_id, inspector_id, IdentityStatus::Verified)
            .await
    }

    pub async fn reject(
        &self,
        identity_id: &ObjectId,
        inspector_id: &ObjectId,
    ) -> Result<IdentityDoc> {
        self.inspect(identity_id, inspector_id, IdentityStatus::Rejected)
            .await
    }

    async fn inspect(
        &self,
        identity_id: &ObjectId,
        inspector_id: &ObjectId,
        status: IdentityStatus,
    ) -> Result<IdentityDoc> {
        let inspector = self.store.find_user(inspector_id).await?.ok_or_else(|| {
            AskThemError::Validation(format!("inspector {} does not exist", inspector_id))
        })?;
        if !inspector.is_staff() {
            warn!(
                "User {} attempted to inspect identity {} without staff role",
                inspector_id, identity_id
            );
            return Err(AskThemError::Validation(format!(
                "user {} is not staff",
                inspector_id
            )));
        }

        let identity = self
            .store
            .set_identity_status(identity_id, status, inspector_id)
            .await?
            .ok_or_else(|| AskThemError::NotFound(format!("Identity {}", identity_id)))?;

        info!(
            "Identity {} marked {} by {}",
            identity_id,
            status.as_str(),
            inspector_id
        );
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{PersonDoc, UserDoc, STAFF_ROLE};
    use crate::store::MemoryStore;

    async fn setup() -> (IdentityService, ObjectId, ObjectId, ObjectId) {
        let store = Arc::new(MemoryStore::new());

        let claimant = store
            .insert_user(UserDoc::new(
                "rep@example.com".to_string(),
                "Pat".to_string(),
                "Lee".to_string(),
            ))
            .await
            .unwrap();

        let mut staff = UserDoc::new(
            "staff@example.com".to_string(),
            "Sam".to_string(),
            "Ortiz".to_string(),
        );
        staff.roles.push(STAFF_ROLE.to_string());
        let staff = store.insert_user(staff).await.unwrap();

        let person = store
            .insert_person(PersonDoc::new(
                "Pat Lee".to_string(),
                "Person".to_string(),
                "vt".to_string(),
                1,
            ))
            .await
            .unwrap();

        (IdentityService::new(store), claimant, staff, person)
    }

    #[tokio::test]
    async fn test_staff_can_verify() {
        let (service, claimant, staff, person) = setup().await;
        let identity = service.claim(&claimant, &person).await.unwrap();
        assert_eq!(identity.status, IdentityStatus::Pending);

        let id = identity.id.unwrap();
        let verified = service.verify(&id, &staff).await.unwrap();
        assert_eq!(verified.status, IdentityStatus::Verified);
        assert_eq!(verified.inspector_id, Some(staff));
        assert!(verified.inspected_at.is_some());

        let rejected = service.reject(&id, &staff).await.unwrap();
        assert_eq!(rejected.status, IdentityStatus::Rejected);
    }

    #[tokio::test]
    async fn test_non_staff_cannot_inspect() {
        let (service, claimant, _staff, person) = setup().await;
        let identity = service.claim(&claimant, &person).await.unwrap();

        let result = service.verify(&identity.id.unwrap(), &claimant).await;
        assert!(matches!(result, Err(AskThemError::Validation(_))));
    }

    #[tokio::test]
    async fn test_missing_identity_is_not_found() {
        let (service, _claimant, staff, _person) = setup().await;
        let result = service.reject(&ObjectId::new(), &staff).await;
        assert!(matches!(result, Err(AskThemError::NotFound(_))));
    }
}
