//! The relational store of record for posts.
//!
//! This is the identity authority: every post id is assigned here.

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgPostRepository;

use async_trait::async_trait;

use crate::model::{CreatePostInput, Post, UpdatePostInput};

pub type Database = sqlx::Pool<sqlx::Postgres>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),
	#[cfg(test)]
	#[error("relational store unavailable")]
	Unavailable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Create, read, update and delete operations against the `post` table.
#[async_trait]
pub trait PostRepository: Send + Sync {
	/// Inserts a new row, returning it with its assigned id.
	async fn insert(&self, input: &CreatePostInput) -> Result<Post>;

	/// Fetches a row by id.
	async fn get(&self, id: i64) -> Result<Option<Post>>;

	/// Overwrites the fields present in `input`, returning the updated row
	/// or `None` if it does not exist.
	async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<Post>>;

	/// Deletes a row by id, returning `false` if it did not exist.
	async fn delete(&self, id: i64) -> Result<bool>;

	/// Returns a window of rows in ascending id order.
	async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Post>>;
}
