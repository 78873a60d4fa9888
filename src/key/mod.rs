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

//! Conversion of domain names into trie keys and back.
//!
//! A [`Key`] is a sequence of small symbols chosen so that comparing
//! two keys symbol by symbol gives the same answer as comparing the
//! names they came from in DNSSEC canonical order ([RFC 4034 § 6.1]).
//! To get there, a name is written root-most label first, each label
//! ends with the [`NOBYTE`] terminator, and octets are spelled so that
//! ASCII case disappears and octet order survives (see the `symbols`
//! submodule). Two practical consequences:
//!
//! * the root name is the empty key, the smallest of all; and
//! * the key of a name is a prefix of the keys of all its descendants,
//!   which is what ancestor lookups in the trie rely on.
//!
//! Decoding is the inverse up to case: labels come back lower-cased.
//!
//! [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use arrayvec::ArrayVec;

use crate::name::{Name, NameBuilder, MAX_N_LABELS};

mod error;
mod symbols;
pub use error::Error;
pub use symbols::{LIMIT, NOBYTE};

use symbols::{Read, Spelling};

/// The maximum number of symbols in a key. Any valid name fits with
/// room to spare, since each label octet takes at most two symbols and
/// each label's length octet becomes a single terminator.
pub const MAX_KEY_LEN: usize = 512;

/// An encoded trie key.
///
/// Keys compare as symbol strings padded with [`NOBYTE`], the way the
/// trie sees them, so trailing [`NOBYTE`]s never matter to equality,
/// ordering or hashing. For keys produced by [`Key::from_name`] this is
/// the canonical name order.
#[derive(Clone)]
pub struct Key(Box<[u8]>);

impl Key {
    /// Returns the key of the root name, which is empty.
    pub fn root() -> Self {
        Self(Box::new([]))
    }

    /// Encodes a name.
    pub fn from_name(name: &Name) -> Self {
        let mut symbols = ArrayVec::<u8, MAX_KEY_LEN>::new();

        // NOTE: the pushes cannot overflow; see MAX_KEY_LEN.
        for label in name.labels().rev().filter(|label| !label.is_null()) {
            for &octet in label.octets() {
                match symbols::spell(octet) {
                    Spelling::Single(symbol) => symbols.push(symbol),
                    Spelling::Escaped(escape, symbol) => {
                        symbols.push(escape);
                        symbols.push(symbol);
                    }
                }
            }
            symbols.push(NOBYTE);
        }
        Self(symbols.as_slice().into())
    }

    /// Builds a key from raw symbols, for uses of the trie that are not
    /// keyed by domain names. Only the alphabet and the length are
    /// checked; such keys need not decode to a name. Note that trailing
    /// [`NOBYTE`]s are insignificant to the trie, since it pads every
    /// key with them.
    pub fn from_symbols(symbols: &[u8]) -> Result<Self, Error> {
        if symbols.len() > MAX_KEY_LEN {
            Err(Error::KeyTooLong)
        } else if symbols.iter().any(|s| !(NOBYTE..LIMIT).contains(s)) {
            Err(Error::InvalidSymbol)
        } else {
            Ok(Self(symbols.into()))
        }
    }

    /// Decodes the key back into a name. Labels come back in lower
    /// case. Keys that no name encodes to are rejected.
    pub fn to_name(&self) -> Result<Name, Error> {
        let symbols = match self.0.split_last() {
            None => return Ok(Name::root().clone()),
            Some((&NOBYTE, rest)) => rest,
            Some(_) => return Err(Error::UnterminatedLabel),
        };

        let mut labels = ArrayVec::<&[u8], MAX_N_LABELS>::new();
        for label in symbols.split(|&s| s == NOBYTE) {
            if label.is_empty() {
                return Err(Error::EmptyLabel);
            }
            labels.try_push(label).or(Err(Error::NameTooLong))?;
        }

        // Keys run root-first, but names are built leftmost label
        // first.
        let mut builder = NameBuilder::new();
        for label in labels.iter().rev() {
            decode_label(label, &mut builder)?;
            builder.next_label()?;
        }
        Ok(builder.finish()?)
    }

    /// Returns the symbols of the key.
    pub fn symbols(&self) -> &[u8] {
        &self.0
    }

    /// Returns the number of symbols in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the key is empty (that is, whether it is the key
    /// of the root name).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the symbol at `offset`. Offsets past the end read as
    /// [`NOBYTE`].
    pub fn symbol(&self, offset: usize) -> u8 {
        self.0.get(offset).copied().unwrap_or(NOBYTE)
    }

    /// Returns the number of labels in the encoded name, not counting
    /// the null label.
    pub fn label_count(&self) -> usize {
        self.0.iter().filter(|&&s| s == NOBYTE).count()
    }

    /// Returns whether `self` encodes a proper ancestor of the name
    /// encoded by `other`: it must be a strict prefix of `other` that
    /// ends on a label boundary.
    pub fn is_ancestor_of(&self, other: &Key) -> bool {
        self.significant().len() < other.significant().len()
            && other.0.starts_with(&self.0)
            && self.0.last().map_or(true, |&s| s == NOBYTE)
    }

    /// Returns the first offset at which the two keys differ, treating
    /// both as padded with [`NOBYTE`], or `None` if they do not.
    pub fn first_difference(&self, other: &Key) -> Option<usize> {
        let shared = self.len().min(other.len());
        if let Some(offset) = (0..shared).find(|&i| self.0[i] != other.0[i]) {
            return Some(offset);
        }
        (shared..self.len().max(other.len())).find(|&i| self.symbol(i) != other.symbol(i))
    }

    /// Returns the symbols without any trailing [`NOBYTE`]s.
    fn significant(&self) -> &[u8] {
        let end = self.0.iter().rposition(|&s| s != NOBYTE).map_or(0, |i| i + 1);
        &self.0[..end]
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOBYTE is the smallest symbol, so comparing the padded keys
        // and comparing the trimmed ones agree.
        self.significant().cmp(other.significant())
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

/// Decodes the symbols of one label into the builder's current label.
fn decode_label(mut symbols: &[u8], builder: &mut NameBuilder) -> Result<(), Error> {
    while let Some((&first, rest)) = symbols.split_first() {
        let octet = match symbols::read_first(first) {
            Read::Octet(octet) => {
                symbols = rest;
                octet
            }
            Read::NeedsSecond => {
                let (&second, rest) = rest.split_first().ok_or(Error::TruncatedEscape)?;
                symbols = rest;
                symbols::read_second(first, second).ok_or(Error::InvalidSymbol)?
            }
            Read::Invalid => return Err(Error::InvalidSymbol),
        };
        builder.try_push(octet)?;
    }
    Ok(())
}

impl From<&Name> for Key {
    fn from(name: &Name) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Key[")?;
        for (i, symbol) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", symbol)?;
        }
        f.write_str("]")
    }
}
