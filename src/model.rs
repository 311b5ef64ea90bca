use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single post.
///
/// The relational row is the source of truth. Its search document is derived
/// from it and keyed by the same id.
#[model]
#[derive(
	Debug,
	Clone,
	Default,
	PartialEq,
	Eq,
	Deserialize,
	Serialize,
	JsonSchema,
	Validate,
	sqlx::FromRow,
)]
pub struct Post {
	/// The unique identifier of the post, assigned by the database.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The title of the post.
	#[validate(length(min = 1, max = 256))]
	pub title: String,
	/// The body of the post.
	#[validate(length(max = 4096))]
	pub description: String,
	/// The name of the author.
	#[validate(length(min = 1, max = 64))]
	pub post_by: String,
	/// A free-form tag used for grouping posts.
	#[validate(length(max = 64))]
	pub tag: String,
	/// How to reach the author. Matched exactly, never tokenized.
	#[validate(length(min = 1, max = 128))]
	pub contact: String,
}
