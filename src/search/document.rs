use serde::{Deserialize, Serialize};

use super::Hit;
use crate::model::Post;

/// The search index representation of a [`Post`].
///
/// The id is not part of the document body; it is the document identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDocument {
	pub title: String,
	pub description: String,
	pub post_by: String,
	pub tag: String,
	pub contact: String,
}

/// The document identifier for the post with the given relational id.
pub fn document_id(id: i64) -> String {
	id.to_string()
}

impl PostDocument {
	/// Reattaches the relational id to the document.
	pub fn into_post(self, id: i64) -> Post {
		Post {
			id,
			title: self.title,
			description: self.description,
			post_by: self.post_by,
			tag: self.tag,
			contact: self.contact,
		}
	}
}

impl From<&Post> for PostDocument {
	fn from(post: &Post) -> Self {
		Self {
			title: post.title.clone(),
			description: post.description.clone(),
			post_by: post.post_by.clone(),
			tag: post.tag.clone(),
			contact: post.contact.clone(),
		}
	}
}

impl Hit {
	/// Converts the hit into a post, or `None` if its identifier was not
	/// derived from a relational id.
	pub fn into_post(self) -> Option<Post> {
		let Ok(id) = self.id.parse() else {
			tracing::warn!(id = %self.id, "skipping document with a non-numeric id");
			return None;
		};

		Some(self.document.into_post(id))
	}
}
