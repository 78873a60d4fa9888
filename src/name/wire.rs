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

//! Parsing of uncompressed on-the-wire names.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};

/// Parses an uncompressed name at the start of `octets`, returning it
/// along with its length on the wire. When `use_all` is set, octets
/// left over after the name are an error. This is the implementation of
/// [`Name::try_from_uncompressed`] and
/// [`Name::try_from_uncompressed_all`].
pub fn parse_uncompressed_name(octets: &[u8], use_all: bool) -> Result<(Name, usize), Error> {
    let mut offset = 0;
    let mut finished = false;
    let mut label_offsets = ArrayVec::<u8, MAX_N_LABELS>::new();
    while !finished && offset < octets.len() {
        let label_len = octets[offset];
        if label_len as usize > MAX_LABEL_LEN {
            // This also rejects compression pointers.
            return Err(Error::LabelTooLong);
        } else if label_len == 0 {
            finished = true;
        }
        label_offsets.push(offset as u8);
        offset += label_len as usize + 1;

        // Checking every iteration keeps label_offsets from
        // overflowing.
        if offset > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
    }

    if !finished {
        Err(Error::UnexpectedEnd)
    } else if use_all && offset < octets.len() {
        Err(Error::ExtraData)
    } else {
        let mut wire_repr = ArrayVec::new();
        // Cannot fail, since offset <= MAX_WIRE_LEN.
        wire_repr
            .try_extend_from_slice(&octets[..offset])
            .or(Err(Error::NameTooLong))?;
        Ok((Name::from_parts(wire_repr, label_offsets), offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_with_trailing_data() {
        let (name, len) = parse_uncompressed_name(b"\x03www\x04test\x00extra", false).unwrap();
        assert_eq!(len, 10);
        assert_eq!(name, "www.test.".parse().unwrap());
    }

    #[test]
    fn rejects_trailing_data_when_asked() {
        assert_eq!(
            parse_uncompressed_name(b"\x04test\x00\x00", true),
            Err(Error::ExtraData)
        );
    }

    #[test]
    fn rejects_truncated_names() {
        assert_eq!(
            parse_uncompressed_name(b"\x04test", false),
            Err(Error::UnexpectedEnd)
        );
        assert_eq!(parse_uncompressed_name(b"", false), Err(Error::UnexpectedEnd));
    }

    #[test]
    fn rejects_pointers() {
        assert_eq!(
            parse_uncompressed_name(b"\x04test\xc0\x0c", false),
            Err(Error::LabelTooLong)
        );
    }

    #[test]
    fn rejects_long_names() {
        let mut octets = Vec::new();
        for _ in 0..64 {
            octets.extend_from_slice(b"\x03abc");
        }
        octets.push(0);
        assert_eq!(parse_uncompressed_name(&octets, true), Err(Error::NameTooLong));
    }
}
