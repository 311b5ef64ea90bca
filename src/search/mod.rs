//! The derived search index for posts.
//!
//! Documents are keyed by the string form of the relational id, see
//! [`document::document_id`].

pub mod document;
mod elastic;
#[cfg(test)]
pub mod memory;
pub mod schema;

pub use document::{document_id, PostDocument};
pub use elastic::Elasticsearch;
pub use schema::{IndexManager, IndexStatus};

use async_trait::async_trait;
use serde_json::Value;

use crate::model::UpdatePostInput;

/// The number of hits returned by a search when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 12;

/// The largest number of hits a single search may return.
pub const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("search transport error: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("search engine returned {status}: {body}")]
	Status { status: u16, body: String },
	#[error("malformed search response: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("document {0} does not exist")]
	DocumentMissing(String),
	#[error("index {0} already exists")]
	IndexExists(String),
	#[cfg(test)]
	#[error("search store unavailable")]
	Unavailable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A single ranked hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
	pub id: String,
	pub document: PostDocument,
}

/// An ordered window of hits, along with the number of documents that
/// matched in total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hits {
	pub total: u64,
	pub hits: Vec<Hit>,
}

/// Document and index operations against a single named index.
#[async_trait]
pub trait SearchStore: Send + Sync {
	/// The name of the index all operations are scoped to.
	fn index(&self) -> &str;

	/// Checks that the engine is reachable.
	async fn ping(&self) -> Result<()>;

	async fn index_exists(&self) -> Result<bool>;

	/// Creates the index with the given settings and mappings.
	async fn create_index(&self, definition: &Value) -> Result<()>;

	async fn delete_index(&self) -> Result<()>;

	/// Creates or replaces the document at `id`.
	async fn index_document(&self, id: &str, document: &PostDocument) -> Result<()>;

	/// Fetches the document at `id`. A missing document is `Ok(None)`.
	async fn get_document(&self, id: &str) -> Result<Option<PostDocument>>;

	/// Merges the present fields of `patch` into the document at `id`.
	///
	/// Fails with [`Error::DocumentMissing`] if there is no such document.
	async fn update_document(&self, id: &str, patch: &UpdatePostInput) -> Result<()>;

	/// Deletes the document at `id`. Deleting a missing document succeeds.
	async fn delete_document(&self, id: &str) -> Result<()>;

	/// Deletes every document in the index, returning how many were removed.
	async fn delete_all_documents(&self) -> Result<u64>;

	/// Runs a full-text query, returning at most `limit` hits by relevance.
	async fn search(&self, query: &str, limit: usize) -> Result<Hits>;

	/// Returns a window of documents in no particular order.
	async fn list(&self, from: usize, size: usize) -> Result<Hits>;
}
