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

//! Implementation of the trie's error types.

use std::fmt;

/// An error type for trie operations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The key is already present.
    Exists,

    /// The key is not present.
    NotFound,

    /// The trie's memory context refused a charge, or an allocation
    /// failed. The trie is unchanged.
    OutOfMemory,

    /// The cursor belongs to another trie, or the trie was structurally
    /// modified after the cursor was positioned.
    StaleCursor,

    /// The cursor is not positioned on an entry.
    NoPosition,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Exists => f.write_str("key already exists"),
            Self::NotFound => f.write_str("key not found"),
            Self::OutOfMemory => f.write_str("out of memory"),
            Self::StaleCursor => f.write_str("cursor is stale"),
            Self::NoPosition => f.write_str("cursor is not positioned"),
        }
    }
}

impl std::error::Error for Error {}

/// The error returned by operations that take a value: along with the
/// [`Error`] it hands back the value, which the trie did not take
/// ownership of.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InsertError<P> {
    pub(super) error: Error,
    pub(super) pval: P,
    pub(super) ival: u32,
}

impl<P> InsertError<P> {
    /// Returns the reason the operation failed.
    pub fn error(&self) -> Error {
        self.error
    }

    /// Returns the value that was not stored.
    pub fn into_inner(self) -> (P, u32) {
        (self.pval, self.ival)
    }
}

impl<P> fmt::Display for InsertError<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<P: fmt::Debug> std::error::Error for InsertError<P> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
