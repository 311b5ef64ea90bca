#![warn(clippy::pedantic)]

mod config;
mod database;
mod error;
mod extract;
mod model;
mod openapi;
mod route;
mod search;
mod sync;
mod trace;


use std::sync::Arc;

use aide::{axum::ApiRouter, openapi::OpenApi};
use axum::{Extension, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	database::PgPostRepository,
	search::{Elasticsearch, IndexManager, SearchStore},
	sync::PostService,
};

pub type AppState = State;

/// The shared application state.
///
/// Both stores are held behind trait objects, so handlers never see which
/// adapter they are talking to.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub posts: PostService,
	pub indices: IndexManager,
}

impl State {
	pub fn new(posts: Arc<dyn database::PostRepository>, search: Arc<dyn SearchStore>) -> Self {
		Self {
			posts: PostService::new(posts, search.clone()),
			indices: IndexManager::new(search),
		}
	}
}

/// Builds the router, along with its OpenAPI document and middleware.
pub fn app(state: AppState) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.merge(route::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env().expect("invalid configuration");
	let _guard =
		trace::init_tracing_subscriber(&config.telemetry).expect("failed to initialize tracing");

	let database = PgPoolOptions::new()
		.connect_with(
			config
				.database
				.connect_options()
				.expect("invalid database configuration"),
		)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let search: Arc<dyn SearchStore> = Arc::new(
		Elasticsearch::new(config.search).expect("failed to build the search client"),
	);

	if let Err(error) = search.ping().await {
		tracing::error!(%error, "search engine did not answer the ping");
	}

	let state = State::new(Arc::new(PgPostRepository::new(database)), search);

	let status = state
		.indices
		.ensure_index()
		.await
		.expect("failed to initialize the search index");

	tracing::info!(?status, "search index ready");

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.server.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", config.server.port);

	axum::serve(listener, app(state))
		.await
		.expect("server stopped unexpectedly");
}
