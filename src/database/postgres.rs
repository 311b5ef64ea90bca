use async_trait::async_trait;

use super::{Database, PostRepository, Result};
use crate::model::{CreatePostInput, Post, UpdatePostInput};

/// A [`PostRepository`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgPostRepository {
	database: Database,
}

impl PgPostRepository {
	pub fn new(database: Database) -> Self {
		Self { database }
	}
}

#[async_trait]
impl PostRepository for PgPostRepository {
	async fn insert(&self, input: &CreatePostInput) -> Result<Post> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, description, post_by, tag, contact)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.description)
		.bind(&input.post_by)
		.bind(&input.tag)
		.bind(&input.contact)
		.fetch_one(&self.database)
		.await?;

		Ok(post)
	}

	async fn get(&self, id: i64) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}

	async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET
					title = COALESCE($1, title),
					description = COALESCE($2, description),
					post_by = COALESCE($3, post_by),
					tag = COALESCE($4, tag),
					contact = COALESCE($5, contact)
				WHERE id = $6
				RETURNING *
			"#,
		)
		.bind(&input.title)
		.bind(&input.description)
		.bind(&input.post_by)
		.bind(&input.tag)
		.bind(&input.contact)
		.bind(id)
		.fetch_optional(&self.database)
		.await?;

		Ok(post)
	}

	async fn delete(&self, id: i64) -> Result<bool> {
		let status = sqlx::query(
			r#"
				DELETE FROM post
				WHERE id = $1
			"#,
		)
		.bind(id)
		.execute(&self.database)
		.await?;

		Ok(status.rows_affected() > 0)
	}

	async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				ORDER BY id
				LIMIT $1 OFFSET $2
			"#,
		)
		.bind(i64::try_from(limit).unwrap_or(i64::MAX))
		.bind(i64::try_from(offset).unwrap_or(i64::MAX))
		.fetch_all(&self.database)
		.await?;

		Ok(posts)
	}
}
