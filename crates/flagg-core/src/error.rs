// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the feature flags core.

use thiserror::Error;

/// Feature flag errors.
///
/// Resolution itself never fails: unknown flags, unknown stores and refused
/// writes degrade to defaults and warnings. These errors cover the edges
/// where I/O happens (durable storage, hydration sources) and builder
/// configuration.
#[derive(Debug, Error)]
pub enum FlaggError {
	/// A hydration source failed to enumerate its values.
	#[error("hydration from store '{store}' failed: {message}")]
	Hydration { store: String, message: String },

	/// A backing medium rejected a read or write.
	#[error("storage error in store '{store}': {message}")]
	Storage { store: String, message: String },

	/// The store requested as default was never registered.
	#[error("default store '{0}' is not registered")]
	NoSuchDefaultStore(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Serialization error.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl FlaggError {
	pub fn hydration(store: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Hydration {
			store: store.into(),
			message: message.into(),
		}
	}

	pub fn storage(store: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Storage {
			store: store.into(),
			message: message.into(),
		}
	}
}

/// Result type alias for feature flag operations.
pub type Result<T> = std::result::Result<T, FlaggError>;
