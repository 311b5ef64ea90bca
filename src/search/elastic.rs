use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{schema::TEXT_FIELDS, Error, Hit, Hits, PostDocument, Result, SearchStore};
use crate::{
	config::{Refresh, SearchConfig},
	model::UpdatePostInput,
};

/// A [`SearchStore`] that talks to Elasticsearch over its REST API.
#[derive(Clone)]
pub struct Elasticsearch {
	client: Client,
	config: SearchConfig,
}

#[derive(Deserialize)]
struct GetResponse {
	#[serde(rename = "_source")]
	source: PostDocument,
}

#[derive(Deserialize)]
struct SearchResponse {
	hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
	total: Total,
	hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct Total {
	value: u64,
}

#[derive(Deserialize)]
struct SearchHit {
	#[serde(rename = "_id")]
	id: String,
	#[serde(rename = "_source")]
	source: PostDocument,
}

#[derive(Deserialize)]
struct ErrorResponse {
	error: ErrorCause,
}

#[derive(Deserialize)]
struct ErrorCause {
	#[serde(rename = "type")]
	kind: String,
}

#[derive(Deserialize)]
struct DeleteByQueryResponse {
	deleted: u64,
}

impl From<SearchResponse> for Hits {
	fn from(response: SearchResponse) -> Self {
		Self {
			total: response.hits.total.value,
			hits: response
				.hits
				.hits
				.into_iter()
				.map(|hit| Hit {
					id: hit.id,
					document: hit.source,
				})
				.collect(),
		}
	}
}

/// Fields searched by free-text queries. Title matches weigh the most.
fn query_fields() -> Vec<String> {
	TEXT_FIELDS
		.iter()
		.map(|(field, _)| match *field {
			"title" => "title^3".to_string(),
			field => field.to_string(),
		})
		.collect()
}

impl Elasticsearch {
	pub fn new(config: SearchConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(config.request_timeout)
			.build()?;

		Ok(Self { client, config })
	}

	fn request(&self, method: Method, path: &str) -> RequestBuilder {
		let url = format!("{}/{}", self.config.host.trim_end_matches('/'), path);
		let builder = self.client.request(method, url);

		match &self.config.username {
			Some(username) => builder.basic_auth(username, self.config.password.as_ref()),
			None => builder,
		}
	}

	fn document_path(&self, id: &str) -> String {
		format!("{}/_doc/{}", self.config.index, id)
	}

	fn refresh(&self) -> [(&'static str, &'static str); 1] {
		[("refresh", self.config.refresh.as_str())]
	}

	/// Sends the request, retrying connection failures and timeouts up to
	/// the configured number of times.
	async fn send(&self, builder: RequestBuilder) -> Result<Response> {
		let mut attempt = 0;

		loop {
			let Some(request) = builder.try_clone() else {
				return Ok(builder.send().await?);
			};

			match request.send().await {
				Ok(response) => return Ok(response),
				Err(error)
					if (error.is_connect() || error.is_timeout())
						&& attempt < self.config.max_retries =>
				{
					attempt += 1;
					tracing::debug!(%error, attempt, "retrying search request");
				}
				Err(error) => return Err(error.into()),
			}
		}
	}

	/// Sends the request and fails on any non-success status.
	async fn send_ok(&self, builder: RequestBuilder) -> Result<Response> {
		let response = self.send(builder).await?;

		if response.status().is_success() {
			Ok(response)
		} else {
			Err(status_error(response).await)
		}
	}
}

async fn status_error(response: Response) -> Error {
	let status = response.status().as_u16();
	let body = response.text().await.unwrap_or_default();

	Error::Status { status, body }
}

/// Returns `true` if the error response body has the given `error.type`,
/// such as `document_missing_exception`.
fn is_error_type(error: &Error, kind: &str) -> bool {
	let Error::Status { body, .. } = error else {
		return false;
	};

	serde_json::from_str::<ErrorResponse>(body).is_ok_and(|response| response.error.kind == kind)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
	let bytes = response.bytes().await?;

	Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl SearchStore for Elasticsearch {
	fn index(&self) -> &str {
		&self.config.index
	}

	async fn ping(&self) -> Result<()> {
		let request = self
			.request(Method::HEAD, "")
			.timeout(self.config.ping_timeout);

		self.send_ok(request).await?;
		tracing::info!(host = %self.config.host, "search engine connected successfully");
		Ok(())
	}

	async fn index_exists(&self) -> Result<bool> {
		let response = self
			.send(self.request(Method::HEAD, &self.config.index))
			.await?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(false),
			status if status.is_success() => Ok(true),
			_ => Err(status_error(response).await),
		}
	}

	async fn create_index(&self, definition: &Value) -> Result<()> {
		let request = self.request(Method::PUT, &self.config.index).json(definition);

		match self.send_ok(request).await {
			Ok(_) => Ok(()),
			Err(error) if is_error_type(&error, "resource_already_exists_exception") => {
				Err(Error::IndexExists(self.config.index.clone()))
			}
			Err(error) => Err(error),
		}
	}

	async fn delete_index(&self) -> Result<()> {
		self.send_ok(self.request(Method::DELETE, &self.config.index))
			.await?;

		Ok(())
	}

	async fn index_document(&self, id: &str, document: &PostDocument) -> Result<()> {
		let request = self
			.request(Method::PUT, &self.document_path(id))
			.query(&self.refresh())
			.json(document);

		self.send_ok(request).await?;
		Ok(())
	}

	async fn get_document(&self, id: &str) -> Result<Option<PostDocument>> {
		let response = self
			.send(self.request(Method::GET, &self.document_path(id)))
			.await?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(None),
			status if status.is_success() => {
				Ok(Some(decode::<GetResponse>(response).await?.source))
			}
			_ => Err(status_error(response).await),
		}
	}

	async fn update_document(&self, id: &str, patch: &UpdatePostInput) -> Result<()> {
		let request = self
			.request(
				Method::POST,
				&format!("{}/_update/{}", self.config.index, id),
			)
			.query(&self.refresh())
			.json(&json!({ "doc": patch }));

		match self.send_ok(request).await {
			Ok(_) => Ok(()),
			Err(error) if is_error_type(&error, "document_missing_exception") => {
				Err(Error::DocumentMissing(id.to_string()))
			}
			Err(error) => Err(error),
		}
	}

	async fn delete_document(&self, id: &str) -> Result<()> {
		let request = self
			.request(Method::DELETE, &self.document_path(id))
			.query(&self.refresh());

		let response = self.send(request).await?;

		match response.status() {
			StatusCode::NOT_FOUND => Ok(()),
			status if status.is_success() => Ok(()),
			_ => Err(status_error(response).await),
		}
	}

	async fn delete_all_documents(&self) -> Result<u64> {
		// delete-by-query only accepts a boolean refresh
		let refresh = match self.config.refresh {
			Refresh::False => "false",
			Refresh::True | Refresh::WaitFor => "true",
		};

		let request = self
			.request(
				Method::POST,
				&format!("{}/_delete_by_query", self.config.index),
			)
			.query(&[("refresh", refresh), ("conflicts", "proceed")])
			.json(&json!({ "query": { "match_all": {} } }));

		let response = self.send_ok(request).await?;

		Ok(decode::<DeleteByQueryResponse>(response).await?.deleted)
	}

	async fn search(&self, query: &str, limit: usize) -> Result<Hits> {
		let request = self
			.request(Method::POST, &format!("{}/_search", self.config.index))
			.json(&json!({
				"size": limit,
				"track_total_hits": true,
				"query": {
					"multi_match": {
						"query": query,
						"fields": query_fields()
					}
				}
			}));

		let response = self.send_ok(request).await?;

		Ok(decode::<SearchResponse>(response).await?.into())
	}

	async fn list(&self, from: usize, size: usize) -> Result<Hits> {
		let request = self
			.request(Method::POST, &format!("{}/_search", self.config.index))
			.json(&json!({
				"from": from,
				"size": size,
				"track_total_hits": true,
				"query": { "match_all": {} }
			}));

		let response = self.send_ok(request).await?;

		Ok(decode::<SearchResponse>(response).await?.into())
	}
}
