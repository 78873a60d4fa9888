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

//! Implementation of the [`Error`] type for key construction and
//! decoding.

use std::fmt;

use crate::name;

/// An error type used to report malformed keys.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// A label in the key had no symbols before its terminator.
    EmptyLabel,

    /// A symbol was outside the key alphabet, or could not follow the
    /// escape symbol before it.
    InvalidSymbol,

    /// The key was longer than [`MAX_KEY_LEN`](super::MAX_KEY_LEN).
    KeyTooLong,

    /// A decoded label would be longer than 63 octets.
    LabelTooLong,

    /// The decoded name would be longer than 255 octets on the wire.
    NameTooLong,

    /// The key ended in the middle of an escaped octet.
    TruncatedEscape,

    /// The key did not end with a label terminator.
    UnterminatedLabel,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::EmptyLabel => f.write_str("key contains an empty label"),
            Self::InvalidSymbol => f.write_str("key contains an invalid symbol"),
            Self::KeyTooLong => f.write_str("key is too long"),
            Self::LabelTooLong => f.write_str("key decodes to a label longer than 63 octets"),
            Self::NameTooLong => f.write_str("key decodes to a name longer than 255 octets"),
            Self::TruncatedEscape => f.write_str("key ends inside an escaped octet"),
            Self::UnterminatedLabel => f.write_str("key does not end with a label terminator"),
        }
    }
}

impl std::error::Error for Error {}

impl From<name::Error> for Error {
    fn from(e: name::Error) -> Self {
        match e {
            name::Error::LabelTooLong => Self::LabelTooLong,
            name::Error::NullNonTerminal => Self::EmptyLabel,
            _ => Self::NameTooLong,
        }
    }
}
