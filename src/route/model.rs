use schemars::JsonSchema;
use serde::Deserialize;
use validator::Validate;

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn one() -> usize {
	1
}

#[inline]
fn ten() -> usize {
	10
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "one")]
	pub page: usize,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten")]
	pub size: usize,
}

impl Paginate {
	pub fn offset(&self) -> usize {
		self.page.saturating_sub(1) * self.size
	}

	pub fn limit(&self) -> usize {
		self.size
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	/// The unique identifier of the post.
	pub id: i64,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// The free-text query, matched against the beginning of each field.
	#[validate(length(min = 1, max = 256))]
	pub q: String,
	/// The maximum number of posts to return, 12 by default.
	#[validate(range(min = 1, max = 100))]
	pub limit: Option<usize>,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	#[test]
	fn test_paginate_offset() {
		let mut paginate = super::Paginate { page: 1, size: 10 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 10);

		paginate.size = 5;

		assert_eq!(paginate.offset(), 5);

		paginate.page = 3;

		assert_eq!(paginate.offset(), 10);
	}

	#[test]
	fn test_paginate_limit() {
		let paginate = super::Paginate { page: 1, size: 10 };

		assert_eq!(paginate.limit(), 10);
	}

	#[test]
	fn test_search_input_rejects_out_of_range_limit() {
		let input = super::SearchInput {
			q: "elas".into(),
			limit: Some(500),
		};

		assert!(input.validate().is_err());

		let input = super::SearchInput {
			q: "elas".into(),
			limit: None,
		};

		assert!(input.validate().is_ok());
	}
}
