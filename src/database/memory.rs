use std::{
	collections::BTreeMap,
	sync::{
		atomic::{AtomicBool, Ordering},
		Mutex,
	},
};

use async_trait::async_trait;

use super::{Error, PostRepository, Result};
use crate::model::{CreatePostInput, Post, UpdatePostInput};

/// An in-memory [`PostRepository`] with switchable availability.
#[derive(Default)]
pub struct MemoryPostRepository {
	rows: Mutex<(i64, BTreeMap<i64, Post>)>,
	unavailable: AtomicBool,
}

impl MemoryPostRepository {
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	fn check(&self) -> Result<()> {
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(Error::Unavailable);
		}

		Ok(())
	}
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
	async fn insert(&self, input: &CreatePostInput) -> Result<Post> {
		self.check()?;

		let mut guard = self.rows.lock().unwrap();
		let (last_id, rows) = &mut *guard;

		*last_id += 1;

		let post = Post {
			id: *last_id,
			title: input.title.clone(),
			description: input.description.clone(),
			post_by: input.post_by.clone(),
			tag: input.tag.clone(),
			contact: input.contact.clone(),
		};

		rows.insert(post.id, post.clone());
		Ok(post)
	}

	async fn get(&self, id: i64) -> Result<Option<Post>> {
		self.check()?;

		Ok(self.rows.lock().unwrap().1.get(&id).cloned())
	}

	async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<Post>> {
		self.check()?;

		let mut guard = self.rows.lock().unwrap();
		let Some(post) = guard.1.get_mut(&id) else {
			return Ok(None);
		};

		let fields = [
			(&mut post.title, &input.title),
			(&mut post.description, &input.description),
			(&mut post.post_by, &input.post_by),
			(&mut post.tag, &input.tag),
			(&mut post.contact, &input.contact),
		];

		for (field, value) in fields {
			if let Some(value) = value {
				field.clone_from(value);
			}
		}

		Ok(Some(post.clone()))
	}

	async fn delete(&self, id: i64) -> Result<bool> {
		self.check()?;

		Ok(self.rows.lock().unwrap().1.remove(&id).is_some())
	}

	async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Post>> {
		self.check()?;

		Ok(self
			.rows
			.lock()
			.unwrap()
			.1
			.values()
			.skip(offset)
			.take(limit)
			.cloned()
			.collect())
	}
}
