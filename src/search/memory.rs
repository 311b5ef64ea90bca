use std::{
	collections::{BTreeMap, HashSet},
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Mutex,
	},
};

use async_trait::async_trait;
use serde_json::Value;

use super::{
	schema::{MAX_GRAM, TEXT_FIELDS},
	Error, Hit, Hits, PostDocument, Result, SearchStore,
};
use crate::model::UpdatePostInput;

/// An in-memory [`SearchStore`] that analyzes text the same way the index
/// definition asks the engine to.
#[derive(Default)]
pub struct MemorySearchStore {
	definition: Mutex<Option<Value>>,
	documents: Mutex<BTreeMap<String, PostDocument>>,
	creates: AtomicUsize,
	unavailable: AtomicBool,
	exists_lags: AtomicBool,
}

/// Every prefix of each run of letters, digits and whitespace, lowercased.
pub fn index_terms(text: &str) -> HashSet<String> {
	text.split(|c: char| !(c.is_alphanumeric() || c.is_whitespace()))
		.flat_map(|run| {
			let run = run.to_lowercase();
			let chars = run.chars().collect::<Vec<_>>();

			(1..=chars.len().min(MAX_GRAM))
				.map(move |len| chars[..len].iter().collect::<String>())
				.collect::<Vec<_>>()
		})
		.collect()
}

/// Lowercased words of the query.
pub fn query_terms(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
		.collect()
}

fn field<'d>(document: &'d PostDocument, name: &str) -> &'d str {
	match name {
		"title" => &document.title,
		"description" => &document.description,
		"post_by" => &document.post_by,
		"tag" => &document.tag,
		_ => "",
	}
}

fn score(document: &PostDocument, terms: &[String]) -> usize {
	TEXT_FIELDS
		.iter()
		.map(|(name, _)| {
			let boost = if *name == "title" { 3 } else { 1 };
			let indexed = index_terms(field(document, name));

			boost * terms.iter().filter(|term| indexed.contains(*term)).count()
		})
		.sum()
}

impl MemorySearchStore {
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	/// Makes `index_exists` report a missing index, as if another process
	/// created it right after the check.
	pub fn set_exists_lags(&self, lags: bool) {
		self.exists_lags.store(lags, Ordering::SeqCst);
	}

	/// The number of times the index was created.
	pub fn creates(&self) -> usize {
		self.creates.load(Ordering::SeqCst)
	}

	/// The definition the index was created with, if it exists.
	pub fn definition(&self) -> Option<Value> {
		self.definition.lock().unwrap().clone()
	}

	/// Writes a document without going through availability checks.
	pub fn insert(&self, id: &str, document: PostDocument) {
		self.documents.lock().unwrap().insert(id.to_string(), document);
	}

	pub fn document(&self, id: &str) -> Option<PostDocument> {
		self.documents.lock().unwrap().get(id).cloned()
	}

	pub fn document_count(&self) -> usize {
		self.documents.lock().unwrap().len()
	}

	fn check(&self) -> Result<()> {
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(Error::Unavailable);
		}

		Ok(())
	}
}

#[async_trait]
impl SearchStore for MemorySearchStore {
	fn index(&self) -> &str {
		"posts"
	}

	async fn ping(&self) -> Result<()> {
		self.check()
	}

	async fn index_exists(&self) -> Result<bool> {
		self.check()?;

		if self.exists_lags.load(Ordering::SeqCst) {
			return Ok(false);
		}

		Ok(self.definition.lock().unwrap().is_some())
	}

	async fn create_index(&self, definition: &Value) -> Result<()> {
		self.check()?;

		let mut current = self.definition.lock().unwrap();

		if current.is_some() {
			return Err(Error::IndexExists(self.index().to_string()));
		}

		self.creates.fetch_add(1, Ordering::SeqCst);
		*current = Some(definition.clone());
		Ok(())
	}

	async fn delete_index(&self) -> Result<()> {
		self.check()?;

		*self.definition.lock().unwrap() = None;
		self.documents.lock().unwrap().clear();
		Ok(())
	}

	async fn index_document(&self, id: &str, document: &PostDocument) -> Result<()> {
		self.check()?;

		self.insert(id, document.clone());
		Ok(())
	}

	async fn get_document(&self, id: &str) -> Result<Option<PostDocument>> {
		self.check()?;

		Ok(self.document(id))
	}

	async fn update_document(&self, id: &str, patch: &UpdatePostInput) -> Result<()> {
		self.check()?;

		let mut documents = self.documents.lock().unwrap();
		let document = documents
			.get_mut(id)
			.ok_or_else(|| Error::DocumentMissing(id.to_string()))?;

		let fields = [
			(&mut document.title, &patch.title),
			(&mut document.description, &patch.description),
			(&mut document.post_by, &patch.post_by),
			(&mut document.tag, &patch.tag),
			(&mut document.contact, &patch.contact),
		];

		for (field, value) in fields {
			if let Some(value) = value {
				field.clone_from(value);
			}
		}

		Ok(())
	}

	async fn delete_document(&self, id: &str) -> Result<()> {
		self.check()?;

		self.documents.lock().unwrap().remove(id);
		Ok(())
	}

	async fn delete_all_documents(&self) -> Result<u64> {
		self.check()?;

		let mut documents = self.documents.lock().unwrap();
		let deleted = documents.len() as u64;

		documents.clear();
		Ok(deleted)
	}

	async fn search(&self, query: &str, limit: usize) -> Result<Hits> {
		self.check()?;

		let terms = query_terms(query);
		let mut scored = self
			.documents
			.lock()
			.unwrap()
			.iter()
			.map(|(id, document)| (score(document, &terms), id.clone(), document.clone()))
			.filter(|(score, ..)| *score > 0)
			.collect::<Vec<_>>();

		scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

		Ok(Hits {
			total: scored.len() as u64,
			hits: scored
				.into_iter()
				.take(limit)
				.map(|(_, id, document)| Hit { id, document })
				.collect(),
		})
	}

	async fn list(&self, from: usize, size: usize) -> Result<Hits> {
		self.check()?;

		let documents = self.documents.lock().unwrap();

		Ok(Hits {
			total: documents.len() as u64,
			hits: documents
				.iter()
				.skip(from)
				.take(size)
				.map(|(id, document)| Hit {
					id: id.clone(),
					document: document.clone(),
				})
				.collect(),
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_index_terms_are_lowercased_prefixes() {
		let terms = index_terms("Elasticsearch Guide");

		assert!(terms.contains("e"));
		assert!(terms.contains("elas"));
		assert!(terms.contains("elasticsearch g"));
		assert!(terms.contains("elasticsearch guide"));
		assert!(!terms.contains("guide"));
	}

	#[test]
	fn test_index_terms_split_on_punctuation() {
		let terms = index_terms("rust-lang");

		assert!(terms.contains("rust"));
		assert!(terms.contains("lang"));
		assert!(!terms.contains("rust-"));
	}

	#[test]
	fn test_index_terms_are_capped() {
		let text = "a".repeat(40);
		let terms = index_terms(&text);

		assert_eq!(terms.len(), MAX_GRAM);
		assert!(terms.iter().all(|term| term.len() <= MAX_GRAM));
	}

	#[test]
	fn test_query_terms() {
		assert_eq!(query_terms("Elas, GUIDE!"), vec!["elas", "guide"]);
		assert!(query_terms("  ").is_empty());
	}
}
