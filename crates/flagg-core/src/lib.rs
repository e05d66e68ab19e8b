// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Flagg feature flags library.
//!
//! This crate provides the shared vocabulary used by the resolver (`flagg`)
//! and its stores: flag values, flag definitions, key namespacing and errors.
//!
//! # Overview
//!
//! - [`FlagValue`]: JSON-shaped flag values with structural equality and
//!   JavaScript-style truthiness
//! - [`FlagDefinition`] / [`DefinitionRegistry`]: defaults, options and store
//!   routing per flag
//! - [`KeyNamespace`]: `ff_<flag>` keys for stores sharing a key space
//!
//! # Example
//!
//! ```
//! use flagg_core::{ControlType, DefinitionRegistry, FlagDefinition, FlagValue};
//!
//! let definitions = DefinitionRegistry::new()
//!     .with("app.darkMode", FlagDefinition::empty().with_default(false))
//!     .with("app.title", FlagDefinition::empty().with_default("InstaSnap"));
//!
//! let title = definitions.get_or_empty("app.title");
//! assert_eq!(title.default_value(), FlagValue::from("InstaSnap"));
//! assert_eq!(title.control_type(), ControlType::Input);
//!
//! // Unknown flags behave as if defined with an empty definition.
//! assert_eq!(definitions.get_or_empty("nope").default_value(), FlagValue::Null);
//! ```

pub mod definition;
pub mod error;
pub mod namespace;
pub mod value;

pub use definition::{ControlType, DefinitionRegistry, FlagDefinition};
pub use error::{FlaggError, Result};
pub use namespace::{KeyNamespace, DEFAULT_DELIMITER, DEFAULT_PREFIX};
pub use value::{FlagMap, FlagValue};

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn arb_flag_value() -> impl Strategy<Value = FlagValue> {
		let leaf = prop_oneof![
			Just(FlagValue::Null),
			any::<bool>().prop_map(FlagValue::Bool),
			(-1_000_000i64..1_000_000).prop_map(FlagValue::from),
			"[a-zA-Z0-9 ]{0,12}".prop_map(FlagValue::String),
		];
		leaf.prop_recursive(3, 24, 4, |inner| {
			prop_oneof![
				prop::collection::vec(inner.clone(), 0..4).prop_map(FlagValue::List),
				prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(FlagValue::Map),
			]
		})
	}

	// Property-based tests for structural equality
	proptest! {
		#[test]
		fn structural_eq_is_reflexive(value in arb_flag_value()) {
			prop_assert!(value.structural_eq(&value));
		}

		#[test]
		fn structural_eq_is_symmetric(a in arb_flag_value(), b in arb_flag_value()) {
			prop_assert_eq!(a.structural_eq(&b), b.structural_eq(&a));
		}

		#[test]
		fn clone_is_structurally_equal(value in arb_flag_value()) {
			let cloned = value.clone();
			prop_assert_eq!(cloned, value);
		}
	}

	// Property-based tests for stored value parsing
	proptest! {
		#[test]
		fn parse_stored_never_panics(raw in ".{0,64}") {
			let _ = FlagValue::parse_stored(&raw);
		}

		#[test]
		fn stored_json_text_parses_back(value in arb_flag_value()) {
			let text = value.to_json_string();
			prop_assert_eq!(FlagValue::parse_stored(&text), value);
		}

		#[test]
		fn plain_words_pass_through_as_strings(word in "[a-zA-Z][a-zA-Z_]{0,20}") {
			// Bare words are never valid JSON unless they are literals.
			prop_assume!(!matches!(word.as_str(), "true" | "false" | "null"));
			prop_assert_eq!(FlagValue::parse_stored(&word), FlagValue::String(word.clone()));
		}
	}

	// Property-based tests for truthiness
	proptest! {
		#[test]
		fn bool_truthiness_is_identity(b: bool) {
			prop_assert_eq!(FlagValue::Bool(b).is_truthy(), b);
		}

		#[test]
		fn nonzero_numbers_are_truthy(n in 1i64..1_000_000) {
			prop_assert!(FlagValue::from(n).is_truthy());
			prop_assert!(FlagValue::from(-n).is_truthy());
		}
	}

	// Property-based tests for definitions
	proptest! {
		#[test]
		fn string_defaults_are_inputs(default in "[a-z]{0,10}") {
			let def = FlagDefinition::empty().with_default(default.as_str());
			prop_assert_eq!(def.control_type(), ControlType::Input);
		}

		#[test]
		fn options_always_select(
			default in arb_flag_value(),
			options in prop::collection::vec("[a-z]{1,5}", 0..4),
		) {
			let def = FlagDefinition::empty().with_default(default).with_options(options);
			prop_assert_eq!(def.control_type(), ControlType::Select);
		}
	}
}
