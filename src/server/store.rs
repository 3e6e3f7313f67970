//! # Document Store
//!
//! In-memory, append-only collections of JSON documents. The score server
//! persists into one of these, and so does the in-process backend provider.
//!
//! Documents are never updated or deleted once added.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::messages::Document;

/// Named collections of append-only documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document and return the id generated for the write.
    pub async fn add(&self, collection: &str, fields: Document) -> String {
        let id = Uuid::new_v4().to_string();

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(fields);

        id
    }

    /// Documents of `collection` ordered by the numeric field `order_by`.
    ///
    /// Documents where `order_by` is missing or not a number are left out. Ties
    /// keep insertion order.
    pub async fn query(
        &self,
        collection: &str,
        order_by: &str,
        descending: bool,
        limit: usize,
    ) -> Vec<Document> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Vec::new();
        };

        let mut ranked: Vec<(f64, &Document)> = documents
            .iter()
            .filter_map(|doc| doc.get(order_by)?.as_f64().map(|key| (key, doc)))
            .collect();

        // Stable sort, so equal keys stay in insertion order.
        ranked.sort_by(|a, b| {
            let ord = a.0.total_cmp(&b.0);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        ranked
            .into_iter()
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
