// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The flag resolver.
//!
//! Resolution order for a flag:
//! 1. Frozen snapshot, if the flag is frozen
//! 2. Stored value from the flag's store (its definition's `store`, else the
//!    default store), unless missing or `null`
//! 3. The definition's default, else `null`

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use flagg_core::{
	ControlType, DefinitionRegistry, FlagDefinition, FlagMap, FlagValue, FlaggError, KeyNamespace,
	Result,
};
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::catalog::{self, CatalogCategory, DEFAULT_CATEGORY_SEPARATOR};
use crate::changes::{ChangeFeed, ChangeKind, FlagChange, DEFAULT_CHANGE_CAPACITY};
use crate::store::{encode_query, InMemoryStore, ReadableStore, Store};

/// Name of the reserved entry holding the default store.
pub const DEFAULT_STORE_NAME: &str = "__default";
/// Name of the reserved in-memory store holding frozen snapshots.
pub const FROZEN_STORE_NAME: &str = "__frozen";

/// What happened to a single write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
	/// The value was stored as an override.
	Stored,
	/// The value matched the default, so any stored override was removed.
	Removed,
	/// The flag is frozen; nothing changed.
	Frozen,
	/// The flag routes to a read-only store; nothing changed.
	ReadOnly,
	/// The store rejected the write.
	Failed(String),
}

impl WriteOutcome {
	pub fn is_applied(&self) -> bool {
		matches!(self, WriteOutcome::Stored | WriteOutcome::Removed)
	}
}

struct StoreMap {
	default: Store,
	frozen: InMemoryStore,
	named: HashMap<String, Store>,
}

impl StoreMap {
	/// Picks the store for a flag, falling back to the default store when the
	/// definition names a store that was never registered.
	fn route(&self, flag_name: &str, definition: &FlagDefinition) -> &Store {
		let Some(store_name) = definition.store.as_deref() else {
			return &self.default;
		};
		match self.named.get(store_name) {
			Some(store) => store,
			None => {
				warn!(
					flag = flag_name,
					store = store_name,
					"store not available, using default store instead"
				);
				&self.default
			}
		}
	}
}

struct FlaggInner {
	definitions: RwLock<Arc<DefinitionRegistry>>,
	frozen: RwLock<HashSet<String>>,
	stores: StoreMap,
	hydrate_from: Vec<Arc<dyn ReadableStore>>,
	namespace: KeyNamespace,
	category_separator: String,
	changes: ChangeFeed,
}

/// Feature flag resolver.
///
/// Cheap to clone; clones share state. Hydration runs against a clone so
/// `get`/`set` keep working while a slow source is being read.
#[derive(Clone)]
pub struct Flagg {
	inner: Arc<FlaggInner>,
}

impl Flagg {
	pub fn builder() -> FlaggBuilder {
		FlaggBuilder::default()
	}

	/// Returns the effective value of a flag.
	pub fn get(&self, flag_name: &str) -> FlagValue {
		if self.is_frozen(flag_name) {
			return self.inner.stores.frozen.get(flag_name).unwrap_or_default();
		}

		let definitions = self.get_definitions();
		let definition = definitions.get_or_empty(flag_name);

		match self.inner.stores.route(flag_name, definition).get(flag_name) {
			Some(value) if !value.is_null() => value,
			_ => definition.default_value(),
		}
	}

	/// Boolean coercion of [`Flagg::get`].
	pub fn is_on(&self, flag_name: &str) -> bool {
		self.get(flag_name).is_truthy()
	}

	/// Returns the definition's default, regardless of stored state.
	pub fn get_default(&self, flag_name: &str) -> FlagValue {
		self.get_definitions()
			.get_or_empty(flag_name)
			.default_value()
	}

	/// Writes a single flag.
	///
	/// Writing the default removes the stored override. Frozen flags and
	/// read-only stores refuse the write with a warning.
	pub fn set(&self, flag_name: &str, value: impl Into<FlagValue>) -> WriteOutcome {
		let definitions = self.get_definitions();
		self.write(&definitions, flag_name, value.into())
	}

	/// Writes several flags, each with the same rules as [`Flagg::set`].
	pub fn set_many<I, K, V>(&self, values: I) -> BTreeMap<String, WriteOutcome>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<FlagValue>,
	{
		let definitions = self.get_definitions();
		values
			.into_iter()
			.map(|(flag_name, value)| {
				let flag_name = flag_name.into();
				let outcome = self.write(&definitions, &flag_name, value.into());
				(flag_name, outcome)
			})
			.collect()
	}

	/// Writes the default back, clearing any override.
	pub fn reset(&self, flag_name: &str) -> WriteOutcome {
		let default = self.get_default(flag_name);
		self.set(flag_name, default)
	}

	/// Resets every defined flag.
	pub fn reset_all(&self) -> BTreeMap<String, WriteOutcome> {
		let definitions = self.get_definitions();
		let defaults: Vec<_> = definitions
			.iter()
			.map(|(flag_name, definition)| (flag_name.to_owned(), definition.default_value()))
			.collect();
		self.set_many(defaults)
	}

	fn write(&self, definitions: &DefinitionRegistry, flag_name: &str, value: FlagValue) -> WriteOutcome {
		if self.is_frozen(flag_name) {
			warn!(flag = flag_name, "flag is frozen, ignoring write");
			return WriteOutcome::Frozen;
		}

		let definition = definitions.get_or_empty(flag_name);
		let store = self.inner.stores.route(flag_name, definition);
		let Some(writable) = store.as_writable() else {
			warn!(
				flag = flag_name,
				store = store.name(),
				"attempted write to read-only store"
			);
			return WriteOutcome::ReadOnly;
		};

		let (result, outcome, kind) = if value == definition.default_value() {
			(writable.remove(flag_name), WriteOutcome::Removed, ChangeKind::Removed)
		} else {
			(writable.set(flag_name, &value), WriteOutcome::Stored, ChangeKind::Set)
		};

		match result {
			Ok(()) => {
				self.inner.changes.publish(flag_name, kind, value);
				outcome
			}
			Err(e) => {
				warn!(
					flag = flag_name,
					store = store.name(),
					error = %e,
					"store rejected write"
				);
				WriteOutcome::Failed(e.to_string())
			}
		}
	}

	/// Returns true if the effective value differs from the default.
	///
	/// Toggle-type flags compare truthiness, so an unset flag with a `false`
	/// default is not an override.
	pub fn is_overridden(&self, flag_name: &str) -> bool {
		let definitions = self.get_definitions();
		let definition = definitions.get_or_empty(flag_name);
		let value = self.get(flag_name);
		let default = definition.default_value();

		match definition.control_type() {
			ControlType::Toggle => value.is_truthy() != default.is_truthy(),
			ControlType::Select | ControlType::Input => value != default,
		}
	}

	/// Replaces the definitions and re-runs hydration.
	///
	/// The new definitions are visible as soon as this returns; the returned
	/// future performs the hydration pass.
	pub fn set_definitions(
		&self,
		definitions: DefinitionRegistry,
	) -> impl Future<Output = Result<()>> + Send + 'static {
		*self.inner.definitions.write() = Arc::new(definitions);
		let flagg = self.clone();
		async move { flagg.hydrate().await }
	}

	pub fn get_definitions(&self) -> Arc<DefinitionRegistry> {
		Arc::clone(&self.inner.definitions.read())
	}

	/// Effective value of every defined flag.
	pub fn get_all_resolved(&self) -> FlagMap {
		self.get_definitions()
			.names()
			.map(|flag_name| (flag_name.to_owned(), self.get(flag_name)))
			.collect()
	}

	/// Effective value of every defined flag that differs from its default.
	pub fn get_all_overridden(&self) -> FlagMap {
		self.get_definitions()
			.names()
			.filter(|flag_name| self.is_overridden(flag_name))
			.map(|flag_name| (flag_name.to_owned(), self.get(flag_name)))
			.collect()
	}

	/// Pins a flag to its current effective value. Later writes are refused.
	pub fn freeze(&self, flag_name: &str) {
		let value = self.get(flag_name);
		self.inner.stores.frozen.insert(flag_name, value.clone());
		self.inner.frozen.write().insert(flag_name.to_owned());
		self.inner
			.changes
			.publish(flag_name, ChangeKind::Frozen, value);
	}

	/// Freezes every defined flag.
	pub fn freeze_all(&self) {
		for flag_name in self.get_definitions().names() {
			self.freeze(flag_name);
		}
	}

	pub fn is_frozen(&self, flag_name: &str) -> bool {
		self.inner.frozen.read().contains(flag_name)
	}

	/// Copies values from every configured hydration source into the flags'
	/// stores.
	///
	/// Sources are read concurrently and each one is applied as soon as it
	/// answers, so a slow or hung source only holds back its own flags. For a
	/// flag listed by several sources the later configured source wins,
	/// whichever answers first. A failing source is skipped; its error is
	/// returned once the remaining sources have been applied.
	pub async fn hydrate(&self) -> Result<()> {
		let sources = self.inner.hydrate_from.clone();
		self.hydrate_sources(sources).await
	}

	/// Hydrates from a single additional source, once.
	pub async fn hydrate_from(&self, source: impl ReadableStore) -> Result<()> {
		let source: Arc<dyn ReadableStore> = Arc::new(source);
		self.hydrate_sources(vec![source]).await
	}

	async fn hydrate_sources(&self, sources: Vec<Arc<dyn ReadableStore>>) -> Result<()> {
		let mut pending: FuturesUnordered<_> = sources
			.into_iter()
			.enumerate()
			.map(|(index, source)| async move {
				let result = source.all().await;
				(index, source, result)
			})
			.collect();

		// Flag name to the index of the source that last hydrated it.
		let mut written_by: HashMap<String, usize> = HashMap::new();
		let mut first_error = None;
		while let Some((index, source, result)) = pending.next().await {
			match result {
				Ok(values) => {
					let values: Vec<_> = values
						.into_iter()
						.filter(|(flag_name, _)| {
							written_by.get(flag_name).map_or(true, |&writer| writer < index)
						})
						.collect();
					debug!(
						store = source.name(),
						flags = values.len(),
						"hydrating flags"
					);
					for (flag_name, _) in &values {
						written_by.insert(flag_name.clone(), index);
					}
					self.set_many(values);
				}
				Err(e) => {
					warn!(store = source.name(), error = %e, "hydration source failed");
					first_error.get_or_insert_with(|| FlaggError::hydration(source.name(), e.to_string()));
				}
			}
		}

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	/// Query pair carrying every overridden flag, e.g. for a share link.
	pub fn share_query(&self) -> String {
		encode_query(&self.inner.namespace.prefix, &self.get_all_overridden())
	}

	/// Grouped, searchable listing of the defined flags.
	pub fn catalog(&self, search: &str) -> Vec<CatalogCategory> {
		catalog::build(self, search, &self.inner.category_separator)
	}

	/// Receives every applied change from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<FlagChange> {
		self.inner.changes.subscribe()
	}

	/// Number of changes applied so far.
	pub fn revision(&self) -> u64 {
		self.inner.changes.revision()
	}

	pub fn namespace(&self) -> &KeyNamespace {
		&self.inner.namespace
	}

	/// Name of the store flags without a `store` are routed to.
	pub fn default_store_name(&self) -> &str {
		self.inner.stores.default.name()
	}

	/// Registered store names, sorted.
	pub fn store_names(&self) -> Vec<&str> {
		let mut names: Vec<_> = self.inner.stores.named.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}
}

impl std::fmt::Debug for Flagg {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Flagg")
			.field("definitions", &self.get_definitions().len())
			.field("default_store", &self.default_store_name())
			.field("stores", &self.store_names())
			.field("frozen", &self.inner.frozen.read().len())
			.finish()
	}
}

/// Builder for [`Flagg`].
pub struct FlaggBuilder {
	stores: Vec<Store>,
	default_store: Option<String>,
	definitions: DefinitionRegistry,
	hydrate_from: Vec<Arc<dyn ReadableStore>>,
	namespace: KeyNamespace,
	category_separator: String,
	change_capacity: usize,
}

impl Default for FlaggBuilder {
	fn default() -> Self {
		Self {
			stores: Vec::new(),
			default_store: None,
			definitions: DefinitionRegistry::new(),
			hydrate_from: Vec::new(),
			namespace: KeyNamespace::default(),
			category_separator: DEFAULT_CATEGORY_SEPARATOR.to_string(),
			change_capacity: DEFAULT_CHANGE_CAPACITY,
		}
	}
}

impl FlaggBuilder {
	/// Registers a store. The first registered store is the default store
	/// unless [`FlaggBuilder::default_store`] names another one.
	pub fn store(mut self, store: Store) -> Self {
		self.stores.push(store);
		self
	}

	pub fn stores(mut self, stores: impl IntoIterator<Item = Store>) -> Self {
		self.stores.extend(stores);
		self
	}

	pub fn default_store(mut self, name: impl Into<String>) -> Self {
		self.default_store = Some(name.into());
		self
	}

	pub fn definitions(mut self, definitions: DefinitionRegistry) -> Self {
		self.definitions = definitions;
		self
	}

	/// Adds a read-only source applied by [`Flagg::hydrate`].
	pub fn hydrate_from(self, source: impl ReadableStore) -> Self {
		self.hydrate_from_shared(Arc::new(source))
	}

	pub fn hydrate_from_shared(mut self, source: Arc<dyn ReadableStore>) -> Self {
		self.hydrate_from.push(source);
		self
	}

	/// Namespace used for share links. Stores carry their own namespace.
	pub fn namespace(mut self, namespace: KeyNamespace) -> Self {
		self.namespace = namespace;
		self
	}

	pub fn category_separator(mut self, separator: impl Into<String>) -> Self {
		self.category_separator = separator.into();
		self
	}

	pub fn change_capacity(mut self, capacity: usize) -> Self {
		self.change_capacity = capacity;
		self
	}

	/// Builds the resolver without hydrating it.
	///
	/// Use [`FlaggBuilder::build_hydrated`] to run the first hydration pass
	/// as part of construction.
	pub fn build(self) -> Result<Flagg> {
		let mut named = HashMap::with_capacity(self.stores.len());
		for store in &self.stores {
			if named.insert(store.name().to_owned(), store.clone()).is_some() {
				warn!(
					store = store.name(),
					"duplicate store name, the later store replaces the earlier one"
				);
			}
		}

		let default = match &self.default_store {
			Some(name) => named
				.get(name)
				.cloned()
				.ok_or_else(|| FlaggError::NoSuchDefaultStore(name.clone()))?,
			None => match self.stores.first() {
				Some(store) => store.clone(),
				None => {
					debug!("no stores configured, using an in-memory default store");
					Store::read_write(InMemoryStore::with_name(DEFAULT_STORE_NAME))
				}
			},
		};

		Ok(Flagg {
			inner: Arc::new(FlaggInner {
				definitions: RwLock::new(Arc::new(self.definitions)),
				frozen: RwLock::new(HashSet::new()),
				stores: StoreMap {
					default,
					frozen: InMemoryStore::with_name(FROZEN_STORE_NAME),
					named,
				},
				hydrate_from: self.hydrate_from,
				namespace: self.namespace,
				category_separator: self.category_separator,
				changes: ChangeFeed::new(self.change_capacity),
			}),
		})
	}

	/// Builds the resolver and runs the first hydration pass over the
	/// configured sources.
	///
	/// A failing source does not prevent construction; the outcome of the
	/// pass is returned next to the resolver. A hung source keeps this
	/// future pending, so callers that cannot wait should `build` and spawn
	/// [`Flagg::hydrate`] on a clone instead.
	pub async fn build_hydrated(self) -> Result<(Flagg, Result<()>)> {
		let flagg = self.build()?;
		let hydrated = flagg.hydrate().await;
		Ok((flagg, hydrated))
	}
}
