use axum::extract::State;
use macros::route;

use crate::{
	extract::Json,
	openapi::tag,
	route::RouteError,
	search::IndexManager,
	sync::{self, PostService, ReindexReport},
};

use super::model;

/// Create index
/// Creates the search index with its mappings and analyzers, unless it
/// already exists.
#[route(tag = tag::ADMIN)]
pub async fn ensure_index(
	State(indices): State<IndexManager>,
) -> Result<Json<model::Index>, RouteError> {
	let status = indices
		.ensure_index()
		.await
		.map_err(|failure| sync::Error::Search(failure.source))?;

	Ok(Json(model::Index { status }))
}

/// Drop index
/// Deletes the search index along with every document in it. Posts are kept
/// in the relational store and can be restored with a reindex.
#[route(tag = tag::ADMIN)]
pub async fn drop_index(
	State(indices): State<IndexManager>,
) -> Result<Json<model::Index>, RouteError> {
	let status = indices.drop_index().await.map_err(sync::Error::from)?;

	Ok(Json(model::Index { status }))
}

/// Delete all documents
/// Removes every document from the search index. Posts are kept in the
/// relational store, so reads keep working through the fallback.
#[route(tag = tag::ADMIN)]
pub async fn delete_documents(
	State(posts): State<PostService>,
) -> Result<Json<model::DeletedDocuments>, RouteError> {
	let deleted = posts.delete_all().await?;

	Ok(Json(model::DeletedDocuments { deleted }))
}

/// Reindex posts
/// Writes the search document of every post in the relational store.
#[route(tag = tag::ADMIN)]
pub async fn reindex(State(posts): State<PostService>) -> Result<Json<ReindexReport>, RouteError> {
	let report = posts.reindex().await?;

	Ok(Json(report))
}
