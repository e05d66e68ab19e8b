// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stores over a browser-style `Storage` medium.
//!
//! The medium is a flat string key space shared with other data, so every
//! flag is written as JSON text under a namespaced key and only namespaced
//! keys are enumerated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use flagg_core::{FlagMap, FlagValue, KeyNamespace, Result};
use parking_lot::RwLock;
use tracing::debug;

use super::{ReadableStore, WritableStore, LOCAL_STORE_NAME, SESSION_STORE_NAME};

/// A string key/value medium with the shape of the Web Storage API.
pub trait WebStorage: Send + Sync {
	fn get_item(&self, key: &str) -> Option<String>;
	fn set_item(&self, key: &str, value: &str) -> Result<()>;
	fn remove_item(&self, key: &str) -> Result<()>;
	/// Every key in the medium, including keys that are not flags.
	fn keys(&self) -> Vec<String>;
}

/// Session-scoped medium that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryWebStorage {
	items: RwLock<BTreeMap<String, String>>,
}

impl MemoryWebStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

impl WebStorage for MemoryWebStorage {
	fn get_item(&self, key: &str) -> Option<String> {
		self.items.read().get(key).cloned()
	}

	fn set_item(&self, key: &str, value: &str) -> Result<()> {
		self.items.write().insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	fn remove_item(&self, key: &str) -> Result<()> {
		self.items.write().remove(key);
		Ok(())
	}

	fn keys(&self) -> Vec<String> {
		self.items.read().keys().cloned().collect()
	}
}

/// Durable medium persisted as a JSON object in a single file.
///
/// The whole file is rewritten after every mutation. A mutation only becomes
/// visible once the file has been written.
#[derive(Debug)]
pub struct FileWebStorage {
	path: PathBuf,
	items: RwLock<BTreeMap<String, String>>,
}

impl FileWebStorage {
	/// Opens the storage file, starting empty if it does not exist yet.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let items = match std::fs::read_to_string(&path) {
			Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
			Ok(contents) => serde_json::from_str(&contents)?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(e) => return Err(e.into()),
		};
		debug!(path = %path.display(), items = items.len(), "opened storage file");
		Ok(Self {
			path,
			items: RwLock::new(items),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn persist(&self, items: &BTreeMap<String, String>) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				std::fs::create_dir_all(parent)?;
			}
		}
		let contents = serde_json::to_string_pretty(items)?;
		std::fs::write(&self.path, contents)?;
		Ok(())
	}
}

impl WebStorage for FileWebStorage {
	fn get_item(&self, key: &str) -> Option<String> {
		self.items.read().get(key).cloned()
	}

	fn set_item(&self, key: &str, value: &str) -> Result<()> {
		let mut items = self.items.write();
		let mut next = items.clone();
		next.insert(key.to_owned(), value.to_owned());
		self.persist(&next)?;
		*items = next;
		Ok(())
	}

	fn remove_item(&self, key: &str) -> Result<()> {
		let mut items = self.items.write();
		if !items.contains_key(key) {
			return Ok(());
		}
		let mut next = items.clone();
		next.remove(key);
		self.persist(&next)?;
		*items = next;
		Ok(())
	}

	fn keys(&self) -> Vec<String> {
		self.items.read().keys().cloned().collect()
	}
}

/// Flag store over a [`WebStorage`] medium.
pub struct WebStorageStore<S> {
	name: Arc<str>,
	namespace: KeyNamespace,
	storage: Arc<S>,
}

impl<S: WebStorage> WebStorageStore<S> {
	pub fn new(name: impl Into<String>, storage: S) -> Self {
		Self {
			name: Arc::from(name.into()),
			namespace: KeyNamespace::default(),
			storage: Arc::new(storage),
		}
	}

	/// Session-scoped store named `sessionStore`.
	pub fn session(storage: S) -> Self {
		Self::new(SESSION_STORE_NAME, storage)
	}

	/// Durable store named `localStore`.
	pub fn local(storage: S) -> Self {
		Self::new(LOCAL_STORE_NAME, storage)
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Arc::from(name.into());
		self
	}

	pub fn with_namespace(mut self, namespace: KeyNamespace) -> Self {
		self.namespace = namespace;
		self
	}

	pub fn namespace(&self) -> &KeyNamespace {
		&self.namespace
	}

	pub fn storage(&self) -> &S {
		&self.storage
	}
}

impl<S> Clone for WebStorageStore<S> {
	fn clone(&self) -> Self {
		Self {
			name: Arc::clone(&self.name),
			namespace: self.namespace.clone(),
			storage: Arc::clone(&self.storage),
		}
	}
}

impl<S> std::fmt::Debug for WebStorageStore<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WebStorageStore")
			.field("name", &self.name)
			.field("namespace", &self.namespace)
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl<S: WebStorage + 'static> ReadableStore for WebStorageStore<S> {
	fn name(&self) -> &str {
		&self.name
	}

	fn get(&self, flag_name: &str) -> Option<FlagValue> {
		self.storage
			.get_item(&self.namespace.key(flag_name))
			.map(|raw| FlagValue::parse_stored(&raw))
	}

	async fn all(&self) -> Result<FlagMap> {
		Ok(self
			.namespace
			.collect(self.storage.keys(), |flag_name| self.get(flag_name)))
	}
}

impl<S: WebStorage + 'static> WritableStore for WebStorageStore<S> {
	fn set(&self, flag_name: &str, value: &FlagValue) -> Result<()> {
		let text = serde_json::to_string(value)?;
		self.storage.set_item(&self.namespace.key(flag_name), &text)
	}

	fn remove(&self, flag_name: &str) -> Result<()> {
		self.storage.remove_item(&self.namespace.key(flag_name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn writes_json_text_under_namespaced_key() {
		let store = WebStorageStore::session(MemoryWebStorage::new());
		store
			.set("app.darkMode", &FlagValue::Bool(true))
			.unwrap();
		store
			.set("app.title", &FlagValue::from("Insta\"Snap"))
			.unwrap();

		assert_eq!(
			store.storage().get_item("ff_app.darkMode").as_deref(),
			Some("true")
		);
		assert_eq!(
			store.storage().get_item("ff_app.title").as_deref(),
			Some(r#""Insta\"Snap""#)
		);
		assert_eq!(store.get("app.title"), Some(FlagValue::from("Insta\"Snap")));
	}

	#[test]
	fn malformed_text_is_returned_raw() {
		let storage = MemoryWebStorage::new();
		storage.set_item("ff_broken", "{").unwrap();
		let store = WebStorageStore::local(storage);
		assert_eq!(store.get("broken"), Some(FlagValue::from("{")));
	}

	#[tokio::test]
	async fn all_only_reports_namespaced_keys() {
		let storage = MemoryWebStorage::new();
		storage.set_item("theme", "dark").unwrap();
		storage.set_item("ff_one", "1").unwrap();
		storage.set_item("ff_obj", r#"{"a":true}"#).unwrap();
		let store = WebStorageStore::session(storage);

		let all = store.all().await.unwrap();
		assert_eq!(all.len(), 2);
		assert_eq!(all["one"], FlagValue::from(1));
		assert_eq!(all["obj"], FlagValue::from(json!({"a": true})));
	}

	#[test]
	fn remove_is_noop_for_absent_keys() {
		let store = WebStorageStore::session(MemoryWebStorage::new());
		store.remove("missing").unwrap();
		store.set("present", &FlagValue::from(1)).unwrap();
		store.remove("present").unwrap();
		assert_eq!(store.get("present"), None);
		assert!(store.storage().keys().is_empty());
	}

	#[test]
	fn custom_namespace_is_respected() {
		let store = WebStorageStore::session(MemoryWebStorage::new())
			.with_namespace(KeyNamespace::new("flags", "."));
		store.set("beta", &FlagValue::Bool(true)).unwrap();
		assert_eq!(store.storage().get_item("flags.beta").as_deref(), Some("true"));
		assert_eq!(store.storage().get_item("ff_beta"), None);
	}

	#[test]
	fn file_storage_survives_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("storage.json");

		{
			let store = WebStorageStore::local(FileWebStorage::open(&path).unwrap());
			store.set("beta", &FlagValue::Bool(true)).unwrap();
			store
				.set("colors", &FlagValue::from(vec!["red", "green"]))
				.unwrap();
			store.remove("colors").unwrap();
		}

		let reopened = WebStorageStore::local(FileWebStorage::open(&path).unwrap());
		assert_eq!(reopened.get("beta"), Some(FlagValue::Bool(true)));
		assert_eq!(reopened.get("colors"), None);
	}

	#[test]
	fn file_storage_starts_empty_when_missing() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileWebStorage::open(dir.path().join("absent.json")).unwrap();
		assert!(storage.keys().is_empty());
	}

	#[test]
	fn file_storage_rejects_corrupt_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corrupt.json");
		std::fs::write(&path, "not json").unwrap();
		assert!(FileWebStorage::open(&path).is_err());
	}

	#[test]
	fn failed_persist_leaves_items_unchanged() {
		let dir = tempfile::tempdir().unwrap();
		let blocker = dir.path().join("blocker");
		let storage = FileWebStorage::open(blocker.join("storage.json")).unwrap();
		std::fs::write(&blocker, "not a directory").unwrap();

		assert!(storage.set_item("ff_beta", "true").is_err());
		assert_eq!(storage.get_item("ff_beta"), None);
		assert!(storage.keys().is_empty());
	}

	#[test]
	fn failed_remove_keeps_the_item() {
		let dir = tempfile::tempdir().unwrap();
		let nested = dir.path().join("nested");
		let path = nested.join("storage.json");
		let storage = FileWebStorage::open(&path).unwrap();
		storage.set_item("ff_beta", "true").unwrap();

		std::fs::remove_dir_all(&nested).unwrap();
		std::fs::write(&nested, "not a directory").unwrap();

		assert!(storage.remove_item("ff_beta").is_err());
		assert_eq!(storage.get_item("ff_beta").as_deref(), Some("true"));
	}
}
