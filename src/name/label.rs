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

//! Implementation of the [`Label`] type.

use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{Error, MAX_LABEL_LEN};

/// A single label of a domain name.
///
/// `Label` is an unsized wrapper over `[u8]` that only exists for
/// slices of at most 63 octets. Case is preserved in the octets, but
/// equality, ordering and hashing fold ASCII letters to lower case, as
/// [RFC 4343] requires.
///
/// ```
/// use std::convert::TryFrom;
/// use qpname::name::Label;
///
/// let label = <&Label>::try_from(&b"Example"[..]).unwrap();
/// assert_eq!(label, <&Label>::try_from(&b"EXAMPLE"[..]).unwrap());
/// ```
///
/// [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343
#[repr(transparent)]
pub struct Label {
    octets: [u8],
}

#[allow(clippy::len_without_is_empty)] // Following DNS terminology, we have is_null().
impl Label {
    /// Wraps up a `&[u8]` as a `Label` without checking its length. The
    /// parent module uses this only after checking the length itself.
    pub(super) fn from_unchecked(octets: &[u8]) -> &Self {
        // SAFETY: Label is repr(transparent) over [u8], so the pointer
        // cast preserves layout and metadata.
        unsafe { &*(octets as *const [u8] as *const Label) }
    }

    /// Returns whether this is the null (zero-length) label.
    pub fn is_null(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the number of octets in the label.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the null label.
    pub fn null() -> &'static Self {
        Self::from_unchecked(&[])
    }

    /// Returns the octets of the label, with their original case.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }
}

impl<'a> TryFrom<&'a [u8]> for &'a Label {
    type Error = Error;

    fn try_from(octets: &'a [u8]) -> Result<Self, Self::Error> {
        if octets.len() > MAX_LABEL_LEN {
            Err(Error::LabelTooLong)
        } else {
            Ok(Label::from_unchecked(octets))
        }
    }
}

/// Labels are displayed in the presentation format of RFC 1035 § 5.1
/// and RFC 4343 § 2.1: `.` and `\` are backslash-escaped, other ASCII
/// graphic characters appear as themselves, and all remaining octets
/// are written `\DDD` in zero-padded decimal.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &octet in self.octets() {
            match octet {
                b'.' => f.write_str("\\.")?,
                b'\\' => f.write_str("\\\\")?,
                _ if octet.is_ascii_graphic() => write!(f, "{}", octet as char)?,
                _ => write!(f, "\\{:03}", octet)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.octets.eq_ignore_ascii_case(&other.octets)
    }
}

impl Eq for Label {}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Labels are ordered as in [RFC 4034 § 6.1]: as left-justified
/// unsigned octet strings, with upper-case ASCII letters treated as
/// their lower-case counterparts.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        let folded = |octet: &u8| octet.to_ascii_lowercase();
        self.octets.iter().map(folded).cmp(other.octets.iter().map(folded))
    }
}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hashing must fold case to agree with PartialEq.
        for octet in self.octets.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}
