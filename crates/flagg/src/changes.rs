// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Change notifications for flag writes.
//!
//! Admin surfaces re-render whenever a flag changes. Every applied write and
//! every freeze bumps a revision counter and is broadcast to subscribers.

use std::sync::atomic::{AtomicU64, Ordering};

use flagg_core::FlagValue;
use serde::Serialize;
use tokio::sync::broadcast;

/// Default capacity of the change channel.
pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
	/// An override was stored.
	Set,
	/// The stored value was removed because it matched the default.
	Removed,
	/// The flag was frozen at its current value.
	Frozen,
}

/// A single applied change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagChange {
	pub revision: u64,
	pub flag_name: String,
	pub kind: ChangeKind,
	/// Effective value right after the change.
	pub value: FlagValue,
}

#[derive(Debug)]
pub(crate) struct ChangeFeed {
	sender: broadcast::Sender<FlagChange>,
	revision: AtomicU64,
}

impl ChangeFeed {
	pub(crate) fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self {
			sender,
			revision: AtomicU64::new(0),
		}
	}

	pub(crate) fn publish(&self, flag_name: &str, kind: ChangeKind, value: FlagValue) -> u64 {
		let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
		// No subscribers is fine.
		let _ = self.sender.send(FlagChange {
			revision,
			flag_name: flag_name.to_owned(),
			kind,
			value,
		});
		revision
	}

	pub(crate) fn subscribe(&self) -> broadcast::Receiver<FlagChange> {
		self.sender.subscribe()
	}

	pub(crate) fn revision(&self) -> u64 {
		self.revision.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn publish_without_subscribers_still_counts() {
		let feed = ChangeFeed::new(4);
		assert_eq!(feed.publish("a", ChangeKind::Set, FlagValue::Bool(true)), 1);
		assert_eq!(feed.publish("a", ChangeKind::Removed, FlagValue::Null), 2);
		assert_eq!(feed.revision(), 2);
	}

	#[tokio::test]
	async fn subscribers_receive_changes_in_order() {
		let feed = ChangeFeed::new(4);
		let mut rx = feed.subscribe();

		feed.publish("a", ChangeKind::Set, FlagValue::from("x"));
		feed.publish("b", ChangeKind::Frozen, FlagValue::from(1));

		let first = rx.recv().await.unwrap();
		let second = rx.recv().await.unwrap();
		assert_eq!(first.flag_name, "a");
		assert_eq!(first.kind, ChangeKind::Set);
		assert_eq!(second.revision, 2);
		assert_eq!(second.kind, ChangeKind::Frozen);
	}
}
