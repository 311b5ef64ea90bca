use std::sync::Arc;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{json, Value};

use super::SearchStore;

/// The name of the analyzer applied to full-text fields at index time.
pub const INDEX_ANALYZER: &str = "autocomplete";

/// The name of the analyzer applied to queries against full-text fields.
pub const SEARCH_ANALYZER: &str = "autocomplete_search";

/// The longest prefix emitted by the index analyzer.
pub const MAX_GRAM: usize = 30;

/// Full-text fields, along with the `ignore_above` of their keyword sub-field.
pub const TEXT_FIELDS: [(&str, usize); 4] = [
	("title", 256),
	("description", 256),
	("post_by", 30),
	("tag", 20),
];

/// The index settings and mappings.
///
/// Full-text fields are indexed as every prefix (up to [`MAX_GRAM`]
/// characters) of each run of letters, digits and whitespace, so a query for
/// `elas` matches `Elasticsearch`. Queries are only split on word boundaries.
pub fn definition() -> Value {
	let mut properties = TEXT_FIELDS
		.iter()
		.map(|(field, ignore_above)| {
			(
				(*field).to_string(),
				json!({
					"type": "text",
					"analyzer": INDEX_ANALYZER,
					"search_analyzer": SEARCH_ANALYZER,
					"fields": {
						"keyword": {
							"type": "keyword",
							"ignore_above": ignore_above
						}
					}
				}),
			)
		})
		.collect::<serde_json::Map<_, _>>();

	properties.insert("contact".into(), json!({ "type": "keyword" }));

	json!({
		"settings": {
			"analysis": {
				"analyzer": {
					INDEX_ANALYZER: {
						"type": "custom",
						"tokenizer": INDEX_ANALYZER,
						"filter": ["lowercase"]
					},
					SEARCH_ANALYZER: {
						"type": "custom",
						"tokenizer": "standard",
						"filter": ["lowercase"]
					}
				},
				"tokenizer": {
					INDEX_ANALYZER: {
						"type": "edge_ngram",
						"min_gram": 1,
						"max_gram": MAX_GRAM,
						"token_chars": ["letter", "digit", "whitespace"]
					}
				}
			}
		},
		"mappings": {
			"properties": properties
		}
	})
}

/// What an index lifecycle operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
	Created,
	Existing,
	Dropped,
	Absent,
}

/// The index could not be created. The service cannot run without it.
#[derive(Debug, thiserror::Error)]
#[error("failed to initialize index {index}: {source}")]
pub struct SchemaInitFailure {
	pub index: String,
	#[source]
	pub source: super::Error,
}

/// Owns the lifecycle of the index.
#[derive(Clone)]
pub struct IndexManager {
	store: Arc<dyn SearchStore>,
}

impl IndexManager {
	pub fn new(store: Arc<dyn SearchStore>) -> Self {
		Self { store }
	}

	/// Creates the index if it does not exist yet.
	#[tracing::instrument(skip(self), fields(index = self.store.index()))]
	pub async fn ensure_index(&self) -> Result<IndexStatus, SchemaInitFailure> {
		let failure = |source| SchemaInitFailure {
			index: self.store.index().to_string(),
			source,
		};

		if self.store.index_exists().await.map_err(failure)? {
			tracing::debug!("index already exists");
			return Ok(IndexStatus::Existing);
		}

		tracing::info!("creating index");

		match self.store.create_index(&definition()).await {
			Ok(()) => Ok(IndexStatus::Created),
			Err(super::Error::IndexExists(..)) => {
				tracing::info!("index was created concurrently");
				Ok(IndexStatus::Existing)
			}
			Err(error) => Err(failure(error)),
		}
	}

	/// Deletes the index and all of its documents, if it exists.
	#[tracing::instrument(skip(self), fields(index = self.store.index()))]
	pub async fn drop_index(&self) -> super::Result<IndexStatus> {
		if !self.store.index_exists().await? {
			return Ok(IndexStatus::Absent);
		}

		tracing::info!("deleting index");
		self.store.delete_index().await?;

		Ok(IndexStatus::Dropped)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::search::memory::MemorySearchStore;

	#[test]
	fn test_definition_mappings() {
		let definition = definition();
		let properties = &definition["mappings"]["properties"];

		assert_eq!(properties["contact"]["type"], "keyword");

		for (field, ignore_above) in TEXT_FIELDS {
			assert_eq!(properties[field]["type"], "text");
			assert_eq!(properties[field]["analyzer"], INDEX_ANALYZER);
			assert_eq!(properties[field]["search_analyzer"], SEARCH_ANALYZER);
			assert_eq!(properties[field]["fields"]["keyword"]["type"], "keyword");
			assert_eq!(
				properties[field]["fields"]["keyword"]["ignore_above"],
				ignore_above
			);
		}
	}

	#[test]
	fn test_definition_analyzers() {
		let analysis = &definition()["settings"]["analysis"];
		let tokenizer = &analysis["tokenizer"][INDEX_ANALYZER];

		assert_eq!(tokenizer["type"], "edge_ngram");
		assert_eq!(tokenizer["min_gram"], 1);
		assert_eq!(tokenizer["max_gram"], 30);
		assert_eq!(
			tokenizer["token_chars"],
			json!(["letter", "digit", "whitespace"])
		);
		assert_eq!(analysis["analyzer"][INDEX_ANALYZER]["filter"], json!(["lowercase"]));
		assert_eq!(analysis["analyzer"][SEARCH_ANALYZER]["tokenizer"], "standard");
	}

	#[tokio::test]
	async fn test_ensure_index_is_idempotent() {
		let store = Arc::new(MemorySearchStore::default());
		let manager = IndexManager::new(store.clone());

		assert_eq!(manager.ensure_index().await.unwrap(), IndexStatus::Created);
		assert_eq!(manager.ensure_index().await.unwrap(), IndexStatus::Existing);

		assert_eq!(store.creates(), 1);
		assert_eq!(store.definition(), Some(definition()));
	}

	#[tokio::test]
	async fn test_ensure_index_failure() {
		let store = Arc::new(MemorySearchStore::default());
		let manager = IndexManager::new(store.clone());

		store.set_unavailable(true);

		let failure = manager.ensure_index().await.unwrap_err();

		assert_eq!(failure.index, store.index());
		assert_eq!(store.creates(), 0);
	}

	#[tokio::test]
	async fn test_ensure_index_tolerates_concurrent_creation() {
		let store = Arc::new(MemorySearchStore::default());
		let manager = IndexManager::new(store.clone());

		manager.ensure_index().await.unwrap();
		store.set_exists_lags(true);

		assert_eq!(manager.ensure_index().await.unwrap(), IndexStatus::Existing);
		assert_eq!(store.creates(), 1);
	}

	#[tokio::test]
	async fn test_drop_index_is_idempotent() {
		let store = Arc::new(MemorySearchStore::default());
		let manager = IndexManager::new(store.clone());

		assert_eq!(manager.drop_index().await.unwrap(), IndexStatus::Absent);

		manager.ensure_index().await.unwrap();

		assert_eq!(manager.drop_index().await.unwrap(), IndexStatus::Dropped);
		assert_eq!(manager.drop_index().await.unwrap(), IndexStatus::Absent);
		assert_eq!(store.definition(), None);
	}
}
