use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Query},
	model::{CreatePostInput, Post, UpdatePostInput},
	openapi::tag,
	route::{model, Lagging, RouteError},
	sync::{PostService, SearchResults},
};

/// Get all posts
/// Returns a paginated response of all posts in ascending id order.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(posts): State<PostService>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<Post>>, RouteError> {
	let posts = posts.list(paginate.offset(), paginate.limit()).await?;

	Ok(Json(posts))
}

/// Search posts
/// Returns the posts best matching a free-text query. The query matches the
/// beginning of a field, so `elas` finds "Elasticsearch Guide" but `gui` does
/// not. Matches in the title rank highest.
#[route(tag = tag::POST)]
pub async fn search_posts(
	State(posts): State<PostService>,
	Query(input): Query<model::SearchInput>,
) -> Result<Json<SearchResults>, RouteError> {
	let results = posts.search(&input.q, input.limit).await?;

	Ok(Json(results))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(posts): State<PostService>,
	Path(path): Path<model::IdInput>,
) -> Result<Json<Post>, RouteError> {
	let post = posts.read(path.id).await?;

	Ok(Json(post))
}

/// Create post
/// Creates a new post. If the post could not be indexed for search, the
/// response carries an `X-Propagation-Lag` header.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(posts): State<PostService>,
	Json(input): Json<CreatePostInput>,
) -> Result<Lagging<Json<Post>>, RouteError> {
	let post = posts.create(&input).await?;

	Ok(post.map(Json).into())
}

/// Update post
/// Updates the given fields of an existing post by its unique id. The post is
/// read back afterwards, so it may not reflect the update yet if the search
/// index is lagging.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(posts): State<PostService>,
	Path(path): Path<model::IdInput>,
	Json(input): Json<UpdatePostInput>,
) -> Result<Lagging<Json<Post>>, RouteError> {
	let post = posts.update(path.id, &input).await?;

	Ok(post.map(Json).into())
}

/// Delete post
/// Deletes an existing post by its unique id.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(posts): State<PostService>,
	Path(path): Path<model::IdInput>,
) -> Result<Lagging<()>, RouteError> {
	Ok(posts.delete(path.id).await?.into())
}
