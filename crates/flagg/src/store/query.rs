// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use flagg_core::{FlagMap, FlagValue, Result, DEFAULT_PREFIX};
use tracing::warn;
use url::form_urlencoded;

use super::{ReadableStore, URL_STORE_NAME};

/// Read-only store over a URL query string.
///
/// Flags travel in a single parameter named after the namespace prefix,
/// holding a URL-encoded JSON object: `?ff={"app.darkMode":true}`. Flag names
/// inside the object are not prefixed.
#[derive(Debug, Clone)]
pub struct UrlStore {
	name: String,
	values: FlagMap,
}

impl UrlStore {
	/// Parses the `ff` parameter of a query string.
	///
	/// Accepts a bare query (`a=1&ff=...`), one with a leading `?`, or a
	/// full URL.
	pub fn parse(query: &str) -> Self {
		Self::parse_param(query, DEFAULT_PREFIX)
	}

	/// Parses the flags held in the `param` parameter of a query string.
	///
	/// A missing parameter, or one that does not hold a JSON object, yields
	/// an empty store.
	pub fn parse_param(query: &str, param: &str) -> Self {
		let query = query.split_once('?').map_or(query, |(_, rest)| rest);
		let query = query.split('#').next().unwrap_or_default();

		let values = form_urlencoded::parse(query.as_bytes())
			.find(|(key, _)| key == param)
			.map(|(_, raw)| match FlagValue::parse_stored(&raw) {
				FlagValue::Map(values) => values,
				_ => {
					warn!(param, "query parameter does not hold a flag object, ignoring it");
					FlagMap::new()
				}
			})
			.unwrap_or_default();

		Self {
			name: URL_STORE_NAME.to_string(),
			values,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}
}

#[async_trait]
impl ReadableStore for UrlStore {
	fn name(&self) -> &str {
		&self.name
	}

	fn get(&self, flag_name: &str) -> Option<FlagValue> {
		self.values.get(flag_name).cloned()
	}

	async fn all(&self) -> Result<FlagMap> {
		Ok(self.values.clone())
	}
}

/// Encodes flags as a `<param>=<json>` query pair readable by
/// [`UrlStore::parse_param`].
pub fn encode_query(param: &str, values: &FlagMap) -> String {
	let json = FlagValue::Map(values.clone()).to_json_string();
	form_urlencoded::Serializer::new(String::new())
		.append_pair(param, &json)
		.finish()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn parses_encoded_object() {
		let store = UrlStore::parse("?ff={%22testFlag%22:%22urlIsWorking%22}&anotherVar=foo");
		assert_eq!(store.get("testFlag"), Some(FlagValue::from("urlIsWorking")));
		assert_eq!(store.get("anotherVar"), None);
	}

	#[test]
	fn accepts_full_urls_and_bare_queries() {
		let full = UrlStore::parse("https://example.com/app?x=1&ff=%7B%22a%22%3A1%7D#section");
		assert_eq!(full.get("a"), Some(FlagValue::from(1)));

		let bare = UrlStore::parse("ff=%7B%22a%22%3Atrue%7D");
		assert_eq!(bare.get("a"), Some(FlagValue::Bool(true)));
	}

	#[test]
	fn missing_or_malformed_param_is_empty() {
		assert!(tokio_test::block_on(UrlStore::parse("").all()).unwrap().is_empty());
		assert!(tokio_test::block_on(UrlStore::parse("?other=1").all())
			.unwrap()
			.is_empty());
		assert!(tokio_test::block_on(UrlStore::parse("?ff={").all())
			.unwrap()
			.is_empty());
		assert!(tokio_test::block_on(UrlStore::parse("?ff=[1,2]").all())
			.unwrap()
			.is_empty());
	}

	#[test]
	fn first_param_wins() {
		let store = UrlStore::parse("?ff={%22a%22:1}&ff={%22a%22:2}");
		assert_eq!(store.get("a"), Some(FlagValue::from(1)));
	}

	#[test]
	fn custom_param_name() {
		let store = UrlStore::parse_param("?flags={%22a%22:1}&ff={%22a%22:2}", "flags");
		assert_eq!(store.get("a"), Some(FlagValue::from(1)));
	}

	#[test]
	fn encode_query_shape() {
		let mut values = FlagMap::new();
		values.insert("one".to_string(), FlagValue::from("foo bar"));
		assert_eq!(
			encode_query("ff", &values),
			"ff=%7B%22one%22%3A%22foo+bar%22%7D"
		);
	}

	proptest! {
		#[test]
		fn encoded_query_parses_back(
			values in prop::collection::btree_map(
				"[a-zA-Z][a-zA-Z0-9._]{0,12}",
				prop_oneof![
					any::<bool>().prop_map(FlagValue::Bool),
					"[ -~]{0,16}".prop_map(FlagValue::String),
					(-1000i64..1000).prop_map(FlagValue::from),
				],
				0..6,
			)
		) {
			let query = encode_query("ff", &values);
			let store = UrlStore::parse(&format!("?{query}"));
			let parsed = tokio_test::block_on(store.all()).unwrap();
			prop_assert_eq!(parsed, values);
		}
	}
}
