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

//! Implementation of data structures related to domain names.
//!
//! The name index itself works on encoded [`Key`](crate::key::Key)s;
//! the types here are the names the surrounding server hands in and
//! gets back. They are deliberately small: uncompressed wire-form
//! names, a builder, labels and the presentation format.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::ops::Index;
use std::str::FromStr;

use arrayvec::ArrayVec;
use lazy_static::lazy_static;

mod builder;
mod error;
mod label;
mod wire;
pub use builder::NameBuilder;
pub use error::Error;
pub use label::Label;

/// The maximum number of labels in a domain name.
pub const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
pub const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
pub const MAX_LABEL_LEN: usize = 63;

lazy_static! {
    static ref ROOT: Name = NameBuilder::new().finish().unwrap();
}

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified domain name in uncompressed wire form.
///
/// A `Name` keeps the on-the-wire representation defined in
/// [RFC 1035 § 3.1] next to the offset of each label within it, so that
/// labels can be reached from either end without rescanning. Both live
/// in fixed-capacity inline buffers large enough for any valid name.
///
/// The last label is always the null label, and [`Name::len`] counts
/// it: the root name has one label.
///
/// `Name`s are constructed
///
/// * through the [`FromStr`] implementation;
/// * through a [`NameBuilder`];
/// * from on-the-wire names through [`Name::try_from_uncompressed`]
///   and [`Name::try_from_uncompressed_all`]; or
/// * by decoding a [`Key`](crate::key::Key).
///
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
#[derive(Clone)]
pub struct Name {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_offsets: ArrayVec<u8, MAX_N_LABELS>,
}

impl Name {
    /// Assembles a `Name` from already validated parts. Used by the
    /// builder and the wire parser.
    fn from_parts(
        wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
        label_offsets: ArrayVec<u8, MAX_N_LABELS>,
    ) -> Self {
        Self {
            wire_repr,
            label_offsets,
        }
    }

    fn label_offsets(&self) -> &[u8] {
        &self.label_offsets
    }
}

////////////////////////////////////////////////////////////////////////
// NAME PUBLIC API                                                    //
////////////////////////////////////////////////////////////////////////

#[allow(clippy::len_without_is_empty)] // A domain name is never empty!
impl Name {
    /// Returns whether this `Name` is equal to or a subdomain of
    /// `other`.
    pub fn eq_or_subdomain_of(&self, other: &Name) -> bool {
        self.len() >= other.len()
            && self
                .labels()
                .rev()
                .zip(other.labels().rev())
                .all(|(a, b)| a == b)
    }

    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.len() == 1
    }

    /// Returns an iterator over the labels of this `Name`, from the
    /// leftmost label to the null label.
    pub fn labels(&self) -> Labels {
        Labels::new(self)
    }

    /// Returns the number of labels in this `Name`, including the null
    /// label.
    pub fn len(&self) -> usize {
        self.label_offsets.len()
    }

    /// Returns the DNS root `.`.
    pub fn root() -> &'static Name {
        &ROOT
    }

    /// Returns the superdomain obtained by skipping the first `skip`
    /// labels, or `None` if there aren't enough labels.
    pub fn superdomain(&self, skip: usize) -> Option<Name> {
        if skip >= self.len() {
            return None;
        }
        let start = self.label_offsets[skip];
        let mut wire_repr = ArrayVec::new();
        let mut label_offsets = ArrayVec::new();
        // Neither can fail: we copy a suffix of a valid name.
        wire_repr
            .try_extend_from_slice(&self.wire_repr[start as usize..])
            .ok()?;
        label_offsets.extend(self.label_offsets[skip..].iter().map(|o| o - start));
        Some(Self::from_parts(wire_repr, label_offsets))
    }

    /// Parses an uncompressed name at the start of `octets`. Extra data
    /// after the name is ignored; the name's length on the wire is
    /// returned with it.
    pub fn try_from_uncompressed(octets: &[u8]) -> Result<(Self, usize), Error> {
        wire::parse_uncompressed_name(octets, false)
    }

    /// Like [`Name::try_from_uncompressed`], but fails if the name does
    /// not occupy the whole buffer.
    pub fn try_from_uncompressed_all(octets: &[u8]) -> Result<Self, Error> {
        wire::parse_uncompressed_name(octets, true).map(|(name, _)| name)
    }

    /// Returns the uncompressed on-the-wire representation.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire_repr
    }
}

impl Index<usize> for Name {
    type Output = Label;

    fn index(&self, index: usize) -> &Self::Output {
        let offset = self.label_offsets[index] as usize;
        let len = self.wire_repr[offset] as usize;
        Label::from_unchecked(&self.wire_repr[offset + 1..offset + 1 + len])
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in self.labels().filter(|l| !l.is_null()) {
            write!(f, "{}.", label)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.labels().zip(other.labels()).all(|(a, b)| a == b)
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The [`Ord`] implementation for `Name` employs DNSSEC's canonical
/// ordering of domain names. Per [RFC 4034 § 6.1], `Name`s are ordered
/// as strings of labels read from right to left.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels().rev().cmp(other.labels().rev())
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in self.labels() {
            label.hash(state);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ITERATION OVER A NAME'S LABELS                                     //
////////////////////////////////////////////////////////////////////////

/// An iterator over the [`Label`]s in a [`Name`], constructed with
/// [`Name::labels`].
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    name: &'a Name,
    front: usize,
    back: usize,
}

impl Labels<'_> {
    fn new(name: &Name) -> Labels {
        Labels {
            name,
            front: 0,
            back: name.len(),
        }
    }
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a Label;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.front += 1;
            Some(&self.name[self.front - 1])
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Labels<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back > self.front {
            self.back -= 1;
            Some(&self.name[self.back])
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Labels<'_> {}

impl FusedIterator for Labels<'_> {}

////////////////////////////////////////////////////////////////////////
// PARSING OF NAMES FROM RUST STRINGS                                 //
////////////////////////////////////////////////////////////////////////

/// Parses the presentation format of a fully qualified name. The
/// string must be ASCII; the escapes of [RFC 4343 § 2.1] (`\X` and
/// `\DDD`) are supported.
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root().clone());
        }

        let mut remaining: &[u8] = s.as_ref();
        let mut builder = NameBuilder::new();
        while let Some(&octet) = remaining.first() {
            if octet == b'\\' {
                let (value, consumed) = parse_escape(&remaining[1..])?;
                builder.try_push(value)?;
                remaining = &remaining[consumed + 1..];
            } else if octet == b'.' {
                builder.next_label()?;
                remaining = &remaining[1..];
            } else if !octet.is_ascii() {
                // Every multi-byte UTF-8 sequence starts with a
                // non-ASCII octet, so checking octets suffices.
                return Err(Error::StrNotAscii);
            } else {
                builder.try_push(octet)?;
                remaining = &remaining[1..];
            }
        }
        builder.finish()
    }
}

/// Parses an escape sequence. `remaining` starts with the octet right
/// *after* the backslash. Returns the octet value and the number of
/// octets consumed.
fn parse_escape(remaining: &[u8]) -> Result<(u8, usize), Error> {
    match remaining {
        [] => Err(Error::InvalidEscape),
        [d1, d2, d3, ..] if d1.is_ascii_digit() && d2.is_ascii_digit() && d3.is_ascii_digit() => {
            let value = [d1, d2, d3]
                .iter()
                .fold(0u16, |acc, d| acc * 10 + (**d - b'0') as u16);
            u8::try_from(value)
                .map(|v| (v, 3))
                .or(Err(Error::InvalidEscape))
        }
        [d, ..] if d.is_ascii_digit() => Err(Error::InvalidEscape),
        [other, ..] => Ok((*other, 1)),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_expected_characteristics() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.len(), 1);
        assert_eq!(root.wire_repr(), &[0]);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn superdomain_works() {
        let subdomain: Name = "subdomain.example.test.".parse().unwrap();
        let domain: Name = "example.test.".parse().unwrap();
        let tld: Name = "test.".parse().unwrap();
        assert_eq!(subdomain.superdomain(0).as_ref(), Some(&subdomain));
        assert_eq!(subdomain.superdomain(1), Some(domain));
        assert_eq!(subdomain.superdomain(2), Some(tld));
        assert_eq!(subdomain.superdomain(3).as_ref(), Some(Name::root()));
        assert_eq!(subdomain.superdomain(4), None);
    }

    #[test]
    fn labels_iterator_works_from_both_ends() {
        let name: Name = "a.b.example.test.".parse().unwrap();
        let forward: Vec<_> = name.labels().map(|l| l.octets().to_vec()).collect();
        assert_eq!(forward, [&b"a"[..], b"b", b"example", b"test", b""]);
        let mut labels = name.labels();
        assert!(labels.next_back().unwrap().is_null());
        assert_eq!(labels.next_back().unwrap().octets(), b"test");
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn eq_or_subdomain_of_works() {
        let subdomain: Name = "subdomain.example.test.".parse().unwrap();
        let domain: Name = "EXAMPLE.test.".parse().unwrap();
        let other: Name = "other.test.".parse().unwrap();
        assert!(subdomain.eq_or_subdomain_of(&domain));
        assert!(domain.eq_or_subdomain_of(&domain));
        assert!(domain.eq_or_subdomain_of(Name::root()));
        assert!(!domain.eq_or_subdomain_of(&subdomain));
        assert!(!domain.eq_or_subdomain_of(&other));
    }

    #[test]
    fn ord_works() {
        // This ordered list is from RFC 4034 § 6.1, which defines the
        // canonical ordering of domain names.
        let names: Vec<Name> = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "Z.a.example.",
            "zABC.a.EXAMPLE.",
            "z.example.",
            "\\001.z.example.",
            "*.z.example.",
            "\\200.z.example.",
        ]
        .into_iter()
        .map(|n| n.parse().unwrap())
        .collect();

        for (i, ni) in names.iter().enumerate() {
            for (j, nj) in names.iter().enumerate() {
                assert_eq!(i.cmp(&j), ni.cmp(nj));
            }
        }
    }

    #[test]
    fn fromstr_and_display_agree() {
        let name: Name = "\\000.\\\\\\..Example.test.".parse().unwrap();
        assert_eq!(name.wire_repr(), b"\x01\x00\x02\\.\x07Example\x04test\x00");
        assert_eq!(name.to_string(), "\\000.\\\\\\..Example.test.");
    }

    #[test]
    fn fromstr_rejects_bad_input() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("✈.aero.".parse::<Name>(), Err(Error::StrNotAscii));
        assert_eq!("non.fqdn".parse::<Name>(), Err(Error::NonNullTerminal));
        assert_eq!("a.b..c.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!("\\00".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\00x.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\256.".parse::<Name>(), Err(Error::InvalidEscape));
    }

    #[test]
    fn wire_round_trip() {
        let name: Name = "www.Example.test.".parse().unwrap();
        assert_eq!(Name::try_from_uncompressed_all(name.wire_repr()), Ok(name));
    }
}
