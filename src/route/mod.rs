use std::borrow::Cow;

use aide::{
	axum::ApiRouter,
	gen::GenContext,
	openapi::{Operation, Response as ApiResponse},
	OperationOutput,
};
use axum::{
	body::Body,
	http::{HeaderName, HeaderValue, Response, StatusCode},
	response::IntoResponse,
};
use serde_json::json;

use crate::{
	error,
	sync::{self, PropagationLag},
	AppState,
};

pub mod admin;
pub mod docs;
pub mod model;
pub mod post;

/// Set on write responses when the search index was not updated. The value
/// names the index operation that failed.
pub static PROPAGATION_LAG: HeaderName = HeaderName::from_static("x-propagation-lag");

pub type RouteError = error::RouteError<sync::Error>;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.nest("/posts", post::routes())
		.nest("/admin", admin::routes())
		.nest("/docs", docs::routes())
}

impl error::ErrorShape for sync::Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NotFound(..) => StatusCode::NOT_FOUND,
			Self::Relational(..) | Self::Search(..) => StatusCode::SERVICE_UNAVAILABLE,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		match self {
			Self::NotFound(post) => vec![error::Message {
				content: "unknown_post".into(),
				field: None,
				details: Some(Cow::Owned({
					let mut map = error::Map::new();
					map.insert("post".into(), json!(post));
					map
				})),
			}],
			Self::Relational(..) => vec![error::Message::new("relational_store_unavailable")],
			Self::Search(..) => vec![error::Message::new("search_store_unavailable")],
		}
	}
}

/// A response from a write, flagged with [`PROPAGATION_LAG`] when the search
/// index could not be brought in line with the relational store.
pub struct Lagging<T> {
	pub body: T,
	pub lag: Option<PropagationLag>,
}

impl<T> From<sync::Synced<T>> for Lagging<T> {
	fn from(synced: sync::Synced<T>) -> Self {
		Self {
			body: synced.value,
			lag: synced.lag,
		}
	}
}

impl<T: IntoResponse> IntoResponse for Lagging<T> {
	fn into_response(self) -> Response<Body> {
		let mut response = self.body.into_response();

		if let Some(lag) = self.lag {
			response.headers_mut().insert(
				PROPAGATION_LAG.clone(),
				HeaderValue::from_static(lag.operation.as_str()),
			);
		}

		response
	}
}

impl<T: OperationOutput> OperationOutput for Lagging<T> {
	type Inner = T::Inner;

	fn operation_response(ctx: &mut GenContext, operation: &mut Operation) -> Option<ApiResponse> {
		T::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, ApiResponse)> {
		T::inferred_responses(ctx, operation)
	}
}
