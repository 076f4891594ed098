//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use futures_util::{Stream, TryStreamExt};
use mongodb::{
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::{is_duplicate_key, AskThemError};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, AskThemError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| AskThemError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AskThemError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, applying its schema indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, AskThemError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, AskThemError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), AskThemError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| AskThemError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps.
    ///
    /// A unique index violation is reported as `Validation`.
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, AskThemError> {
        let metadata = item.mut_metadata();
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self.inner.insert_one(item).await.map_err(|e| {
            if is_duplicate_key(&e) {
                AskThemError::Validation(format!("Duplicate key: {}", e))
            } else {
                AskThemError::Database(format!("Insert failed: {}", e))
            }
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AskThemError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, AskThemError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| AskThemError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter, optionally sorted.
    ///
    /// A document that fails to decode fails the whole read.
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, AskThemError> {
        let mut find = self.inner.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }

        let cursor = find
            .await
            .map_err(|e| AskThemError::Database(format!("Find failed: {}", e)))?;

        collect_documents(cursor).await
    }

    /// Distinct values of a field across documents matching the filter
    pub async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<Bson>, AskThemError> {
        self.inner
            .distinct(field, filter)
            .await
            .map_err(|e| AskThemError::Database(format!("Distinct failed: {}", e)))
    }

    /// Count documents matching the filter
    pub async fn count(&self, filter: Document) -> Result<u64, AskThemError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| AskThemError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, AskThemError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| AskThemError::Database(format!("Update failed: {}", e)))
    }

    /// Apply an update atomically and return the document as it is afterwards
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>, AskThemError> {
        self.inner
            .find_one_and_update(filter, update.into())
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| AskThemError::Database(format!("Update failed: {}", e)))
    }

    /// Hard delete one document, returning whether anything was removed
    pub async fn delete_one(&self, filter: Document) -> Result<bool, AskThemError> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| AskThemError::Database(format!("Delete failed: {}", e)))?;

        Ok(result.deleted_count > 0)
    }
}

/// Drain a cursor, stopping at the first document that cannot be read
async fn collect_documents<T, S>(cursor: S) -> Result<Vec<T>, AskThemError>
where
    S: Stream<Item = mongodb::error::Result<T>>,
{
    cursor.try_collect().await.map_err(|e| {
        error!("Error reading document: {}", e);
        AskThemError::Database(format!("Failed to read document: {}", e))
    })
}
