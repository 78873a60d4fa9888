// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`MemContext`] structure.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;

/// Accounts for the memory held by one or more tries.
///
/// Every trie is created with a shared `MemContext` and charges the
/// size of each node it creates to it before making any change. A
/// context with a limit refuses charges that would take it over, which
/// the trie reports as [`Error::OutOfMemory`](super::Error::OutOfMemory).
/// The counters are atomic, so one context can be shared by tries on
/// different threads.
#[derive(Debug, Default)]
pub struct MemContext {
    in_use: AtomicUsize,
    limit: Option<usize>,
}

impl MemContext {
    /// Creates a context without a limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that refuses to account for more than `limit`
    /// bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            in_use: AtomicUsize::new(0),
            limit: Some(limit),
        }
    }

    /// Returns the number of bytes currently charged.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Returns the limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Charges `bytes` to the context. Returns `false`, leaving the
    /// context unchanged, if that would exceed the limit.
    pub(super) fn try_charge(&self, bytes: usize) -> bool {
        let result = self
            .in_use
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |in_use| {
                let total = in_use.checked_add(bytes)?;
                match self.limit {
                    Some(limit) if total > limit => None,
                    _ => Some(total),
                }
            });
        if let Err(in_use) = result {
            warn!(
                "memory context refused {} bytes ({} in use, limit {:?})",
                bytes, in_use, self.limit,
            );
        }
        result.is_ok()
    }

    /// Returns `bytes` to the context.
    pub(super) fn release(&self, bytes: usize) {
        self.in_use.fetch_sub(bytes, Ordering::Relaxed);
    }
}
