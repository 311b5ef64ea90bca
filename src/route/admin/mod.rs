use aide::axum::{
	routing::{delete_with, post_with, put_with},
	ApiRouter,
};

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/index",
			put_with(ensure_index, ensure_index_docs).delete_with(drop_index, drop_index_docs),
		)
		.api_route(
			"/index/documents",
			delete_with(delete_documents, delete_documents_docs),
		)
		.api_route("/index/reindex", post_with(reindex, reindex_docs))
}
