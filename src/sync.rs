//! Keeps the relational store and the search index in step.
//!
//! Writes always go to the relational store first. Only once it succeeds is
//! the change propagated to the search index, keyed by the relational id. A
//! failed propagation never fails the write; it is logged and returned as a
//! [`PropagationLag`] next to the authoritative result.
//!
//! Reads go to the search index first and fall back to the relational store
//! when the document is missing or the index is unreachable.

use std::{fmt, sync::Arc};

use schemars::JsonSchema;
use serde::Serialize;

use crate::{
	database::{self, PostRepository},
	model::{CreatePostInput, Post, UpdatePostInput},
	search::{self, document_id, Hits, PostDocument, SearchStore},
};

/// The number of rows fetched per batch while reindexing.
const REINDEX_BATCH_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	NotFound(i64),
	#[error("relational store unavailable: {0}")]
	Relational(#[from] database::Error),
	#[error("search store unavailable: {0}")]
	Search(#[from] search::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The index mutation that follows a relational write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
	Index,
	Update,
	Delete,
}

impl Propagation {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Index => "index",
			Self::Update => "update",
			Self::Delete => "delete",
		}
	}
}

impl fmt::Display for Propagation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The relational write succeeded but the search index was not updated.
#[derive(Debug, thiserror::Error)]
#[error("{operation} of post {id} was not propagated to the search index: {source}")]
pub struct PropagationLag {
	pub id: i64,
	pub operation: Propagation,
	#[source]
	pub source: search::Error,
}

/// The outcome of a write: the authoritative value from the relational store,
/// and a warning if the search index could not be brought in line with it.
#[derive(Debug)]
pub struct Synced<T> {
	pub value: T,
	pub lag: Option<PropagationLag>,
}

impl<T> Synced<T> {
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Synced<U> {
		Synced {
			value: f(self.value),
			lag: self.lag,
		}
	}
}

/// A ranked window of search results.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SearchResults {
	/// The number of posts that matched, which may exceed the number returned.
	pub total: u64,
	/// The best matching posts, most relevant first.
	pub posts: Vec<Post>,
}

/// The outcome of rebuilding the search index from the relational store.
#[derive(Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ReindexReport {
	/// The number of documents written.
	pub indexed: u64,
	/// The number of rows whose document could not be written.
	pub failed: u64,
}

fn into_posts(hits: Hits) -> Vec<Post> {
	hits.hits.into_iter().filter_map(search::Hit::into_post).collect()
}

/// Orchestrates post operations across the relational store and the search index.
#[derive(Clone)]
pub struct PostService {
	posts: Arc<dyn PostRepository>,
	search: Arc<dyn SearchStore>,
}

impl PostService {
	pub fn new(posts: Arc<dyn PostRepository>, search: Arc<dyn SearchStore>) -> Self {
		Self { posts, search }
	}

	/// Logs a failed propagation and turns it into a warning.
	fn propagate(
		id: i64,
		operation: Propagation,
		result: search::Result<()>,
	) -> Option<PropagationLag> {
		let source = result.err()?;

		tracing::warn!(id, %operation, error = %source, "search index is lagging behind");

		Some(PropagationLag {
			id,
			operation,
			source,
		})
	}

	/// Inserts a post, then indexes its document.
	#[tracing::instrument(skip_all)]
	pub async fn create(&self, input: &CreatePostInput) -> Result<Synced<Post>> {
		let post = self.posts.insert(input).await?;

		let result = self
			.search
			.index_document(&document_id(post.id), &PostDocument::from(&post))
			.await;

		Ok(Synced {
			lag: Self::propagate(post.id, Propagation::Index, result),
			value: post,
		})
	}

	/// Returns a post from the search index, or from the relational store if
	/// the index does not have it or cannot be reached.
	#[tracing::instrument(skip(self))]
	pub async fn read(&self, id: i64) -> Result<Post> {
		let document = match self.search.get_document(&document_id(id)).await {
			Ok(document) => document,
			Err(error) => {
				tracing::warn!(%error, "search lookup failed, reading from the relational store");
				None
			}
		};

		match document {
			Some(document) => Ok(document.into_post(id)),
			None => self.posts.get(id).await?.ok_or(Error::NotFound(id)),
		}
	}

	/// Updates a post, then merges the changed fields into its document.
	///
	/// The returned post is read back through [`PostService::read`], so it
	/// may not reflect the update yet if the index is lagging.
	#[tracing::instrument(skip(self, input))]
	pub async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Synced<Post>> {
		if self.posts.update(id, input).await?.is_none() {
			return Err(Error::NotFound(id));
		}

		let lag = if input.is_empty() {
			None
		} else {
			let result = self.search.update_document(&document_id(id), input).await;

			Self::propagate(id, Propagation::Update, result)
		};

		Ok(Synced {
			value: self.read(id).await?,
			lag,
		})
	}

	/// Deletes a post, then its document.
	#[tracing::instrument(skip(self))]
	pub async fn delete(&self, id: i64) -> Result<Synced<()>> {
		if !self.posts.delete(id).await? {
			return Err(Error::NotFound(id));
		}

		let result = self.search.delete_document(&document_id(id)).await;

		Ok(Synced {
			value: (),
			lag: Self::propagate(id, Propagation::Delete, result),
		})
	}

	/// Deletes every document from the search index.
	///
	/// Relational rows are left untouched; use [`PostService::reindex`] to
	/// restore the documents.
	#[tracing::instrument(skip(self))]
	pub async fn delete_all(&self) -> Result<u64> {
		let deleted = self.search.delete_all_documents().await?;

		tracing::info!(deleted, "cleared search index");
		Ok(deleted)
	}

	/// Runs a free-text query against the search index.
	#[tracing::instrument(skip(self))]
	pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<SearchResults> {
		let limit = limit
			.unwrap_or(search::DEFAULT_SEARCH_LIMIT)
			.clamp(1, search::MAX_SEARCH_LIMIT);

		let hits = self.search.search(query, limit).await?;

		Ok(SearchResults {
			total: hits.total,
			posts: into_posts(hits),
		})
	}

	/// Lists posts from the search index, or from the relational store if the
	/// index cannot be reached.
	#[tracing::instrument(skip(self))]
	pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<Post>> {
		match self.search.list(offset, limit).await {
			Ok(hits) => Ok(into_posts(hits)),
			Err(error) => {
				tracing::warn!(%error, "search listing failed, reading from the relational store");
				Ok(self.posts.list(limit, offset).await?)
			}
		}
	}

	/// Writes the document of every relational row to the search index.
	#[tracing::instrument(skip(self))]
	pub async fn reindex(&self) -> Result<ReindexReport> {
		let mut report = ReindexReport::default();
		let mut offset = 0;

		loop {
			let posts = self.posts.list(REINDEX_BATCH_SIZE, offset).await?;

			for post in &posts {
				let result = self
					.search
					.index_document(&document_id(post.id), &PostDocument::from(post))
					.await;

				match result {
					Ok(()) => report.indexed += 1,
					Err(error) => {
						tracing::warn!(id = post.id, %error, "failed to reindex post");
						report.failed += 1;
					}
				}
			}

			if posts.len() < REINDEX_BATCH_SIZE {
				break;
			}

			offset += posts.len();
		}

		tracing::info!(indexed = report.indexed, failed = report.failed, "reindex finished");
		Ok(report)
	}
}
