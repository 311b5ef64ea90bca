use schemars::JsonSchema;
use serde::Serialize;

use crate::search::IndexStatus;

#[derive(Debug, Serialize, JsonSchema)]
pub struct Index {
	/// What the operation did to the index.
	pub status: IndexStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct DeletedDocuments {
	/// The number of documents removed from the index.
	pub deleted: u64,
}
