use std::borrow::Cow;

use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const POST: &str = "Post";
	pub const ADMIN: &str = "Admin";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Post Search Open API")
		.summary("Posts stored in Postgres and searchable through Elasticsearch")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post management and search".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::ADMIN.into(),
			description: Some("Search index lifecycle".into()),
			..Default::default()
		})
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				errors: vec![error::Message {
					content: "unknown_post".into(),
					field: None,
					details: Some(Cow::Owned({
						let mut map = error::Map::new();
						map.insert("post".into(), serde_json::json!(42));
						map
					})),
				}],
			})
		})
}
