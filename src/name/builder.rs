// Copyright 2021 Matthew Ingwersen.
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

//! Implementation of the [`NameBuilder`] structure.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};

/// Builds [`Name`]s one octet or label at a time.
///
/// A new `NameBuilder` holds just the null label, so finishing it
/// right away produces the root name:
///
/// ```
/// use qpname::name::{Name, NameBuilder};
/// assert_eq!(&NameBuilder::new().finish().unwrap(), Name::root());
/// ```
///
/// Octets go into the current label through [`NameBuilder::try_push`]
/// and [`NameBuilder::try_push_slice`]; [`NameBuilder::next_label`]
/// closes the current label and opens an empty one. Every call that
/// would produce an invalid name fails and leaves the builder as it
/// was. The key decoder relies on that to reject malformed keys
/// without any checks of its own.
///
/// ```
/// use qpname::name::NameBuilder;
/// let mut builder = NameBuilder::new();
/// builder.try_push_slice(b"example").unwrap();
/// builder.next_label().unwrap();
/// builder.try_push_slice(b"test").unwrap();
/// builder.next_label().unwrap();
/// assert_eq!(builder.finish().unwrap(), "example.test.".parse().unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct NameBuilder {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_offsets: ArrayVec<u8, MAX_N_LABELS>,
    label_start: usize,
    label_len: u8,
}

impl NameBuilder {
    /// Constructs a new `NameBuilder` holding only the null label.
    pub fn new() -> Self {
        let mut wire_repr = ArrayVec::new();
        let mut label_offsets = ArrayVec::new();
        wire_repr.push(0);
        label_offsets.push(0);
        Self {
            wire_repr,
            label_offsets,
            label_start: 0,
            label_len: 0,
        }
    }

    /// Returns whether the name built so far ends with the null label.
    pub fn is_fully_qualified(&self) -> bool {
        self.label_len == 0
    }

    /// Appends an octet to the current label.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        if self.label_len as usize >= MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_push(octet).is_ok() {
            self.label_len += 1;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Appends several octets to the current label.
    pub fn try_push_slice(&mut self, octets: &[u8]) -> Result<(), Error> {
        if self.label_len as usize + octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_extend_from_slice(octets).is_ok() {
            self.label_len += octets.len() as u8;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Closes the current label and starts a new, empty one. Fails if
    /// the current label is null (only the last label may be null) or
    /// if there is no room left for another length octet.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.is_fully_qualified() {
            Err(Error::NullNonTerminal)
        } else if self.wire_repr.is_full() {
            Err(Error::NameTooLong)
        } else {
            self.wire_repr[self.label_start] = self.label_len;
            self.label_start = self.wire_repr.len();
            self.label_len = 0;

            // Neither push can fail: wire_repr is not full, and every
            // label so far is at least two octets on the wire, so the
            // label count stays under MAX_N_LABELS.
            self.wire_repr.push(0);
            self.label_offsets.push(self.label_start as u8);
            Ok(())
        }
    }

    /// Finishes the name. The current label must be the null label.
    pub fn finish(self) -> Result<Name, Error> {
        if self.is_fully_qualified() {
            Ok(Name::from_parts(self.wire_repr, self.label_offsets))
        } else {
            Err(Error::NonNullTerminal)
        }
    }

    /// Finishes the name by closing the current (non-null) label and
    /// appending all labels of `suffix`.
    pub fn finish_with_suffix(mut self, suffix: &Name) -> Result<Name, Error> {
        if self.is_fully_qualified() {
            return Err(Error::NullNonTerminal);
        }
        self.wire_repr[self.label_start] = self.label_len;
        let base = self.wire_repr.len();
        self.wire_repr
            .try_extend_from_slice(suffix.wire_repr())
            .or(Err(Error::NameTooLong))?;
        for offset in suffix.label_offsets() {
            // Cannot overflow: the wire representation fit, and each
            // non-null label takes at least two octets of it.
            self.label_offsets.push(*offset + base as u8);
        }
        Ok(Name::from_parts(self.wire_repr, self.label_offsets))
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
