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

//! The mapping between label octets and key symbols.
//!
//! A branch in the trie keeps a 64-bit bitmap of the symbols its
//! children start with, so the alphabet has to stay below 64 symbols
//! while still covering all 256 octet values. The octets that show up
//! in nearly every host name get a symbol each; everything else is
//! spelled with two symbols, an escape followed by a rank. Symbols are
//! handed out in octet order, which is what makes key order agree with
//! canonical name order.

use lazy_static::lazy_static;

/// Ends a label. Positions past the end of a key also read as this
/// symbol, so it sorts before everything else.
pub const NOBYTE: u8 = 2;

/// The first symbol that stands for (part of) an octet.
pub const FIRST: u8 = 3;

/// One past the last symbol.
pub const LIMIT: u8 = 49;

/// How one octet is spelled in a key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Spelling {
    /// A common octet, spelled with one symbol.
    Single(u8),

    /// Any other octet: an escape symbol, then a second symbol.
    Escaped(u8, u8),
}

/// What a symbol means when it starts an octet.
#[derive(Clone, Copy, Debug)]
enum Meaning {
    Invalid,
    Octet(u8),
    Escape,
}

struct Tables {
    spelling: [Spelling; 256],
    meaning: [Meaning; LIMIT as usize],
    escaped: [[Option<u8>; LIMIT as usize]; LIMIT as usize],
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

/// Returns whether `octet` gets a symbol of its own. These are the
/// characters of host names, plus a few neighbours that keep the runs
/// of escaped octets short.
fn is_common(octet: u8) -> bool {
    (b'-'..=b'9').contains(&octet) || (b'_'..=b'z').contains(&octet)
}

impl Tables {
    fn build() -> Self {
        let mut tables = Tables {
            spelling: [Spelling::Single(NOBYTE); 256],
            meaning: [Meaning::Invalid; LIMIT as usize],
            escaped: [[None; LIMIT as usize]; LIMIT as usize],
        };

        let mut one = FIRST;
        let mut two = FIRST;
        for octet in 0..=255u8 {
            if is_common(octet) {
                tables.spelling[octet as usize] = Spelling::Single(one);
                tables.meaning[one as usize] = Meaning::Octet(octet);
                one += 1;
            } else if octet.is_ascii_uppercase() {
                // Folded onto the lower-case letter below. The rank is
                // still used up so that the escaped punctuation after
                // 'Z' keeps its octet order.
                two += 1;
            } else {
                tables.spelling[octet as usize] = Spelling::Escaped(one, two);
                tables.meaning[one as usize] = Meaning::Escape;
                tables.escaped[one as usize][two as usize] = Some(octet);
                two += 1;
                if octet == 255 {
                    break;
                }
                if is_common(octet + 1) || two >= LIMIT {
                    one += 1;
                    two = FIRST;
                }
            }
        }

        for octet in b'A'..=b'Z' {
            tables.spelling[octet as usize] = tables.spelling[octet.to_ascii_lowercase() as usize];
        }
        tables
    }
}

/// Returns the spelling of `octet`. Upper-case ASCII letters are
/// spelled like their lower-case counterparts.
pub fn spell(octet: u8) -> Spelling {
    TABLES.spelling[octet as usize]
}

/// The result of reading the symbols of one octet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Read {
    /// The symbol was a complete octet.
    Octet(u8),

    /// The symbol is an escape; the octet needs the next symbol too.
    NeedsSecond,

    /// The symbol cannot start an octet.
    Invalid,
}

/// Interprets `symbol` as the start of an octet.
pub fn read_first(symbol: u8) -> Read {
    match TABLES.meaning.get(symbol as usize) {
        Some(Meaning::Octet(octet)) => Read::Octet(*octet),
        Some(Meaning::Escape) => Read::NeedsSecond,
        _ => Read::Invalid,
    }
}

/// Completes an escaped octet.
pub fn read_second(escape: u8, symbol: u8) -> Option<u8> {
    TABLES
        .escaped
        .get(escape as usize)
        .and_then(|row| row.get(symbol as usize))
        .copied()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_characters_have_single_symbols() {
        assert_eq!(spell(b'-'), Spelling::Single(4));
        assert_eq!(spell(b'0'), Spelling::Single(7));
        assert_eq!(spell(b'_'), Spelling::Single(18));
        assert_eq!(spell(b'a'), Spelling::Single(20));
        assert_eq!(spell(b'z'), Spelling::Single(45));
        assert_eq!(spell(b'Q'), spell(b'q'));
    }

    #[test]
    fn other_octets_are_escaped() {
        assert_eq!(spell(0), Spelling::Escaped(3, 3));
        assert_eq!(spell(b','), Spelling::Escaped(3, 47));
        assert_eq!(spell(b':'), Spelling::Escaped(17, 3));
        assert_eq!(spell(b'['), Spelling::Escaped(17, 36));
        assert_eq!(spell(b'{'), Spelling::Escaped(46, 3));
        assert_eq!(spell(255), Spelling::Escaped(48, 43));
    }

    #[test]
    fn every_symbol_stays_in_the_alphabet() {
        for octet in 0..=255u8 {
            match spell(octet) {
                Spelling::Single(s) => assert!((FIRST..LIMIT).contains(&s)),
                Spelling::Escaped(e, s) => {
                    assert!((FIRST..LIMIT).contains(&e));
                    assert!((FIRST..LIMIT).contains(&s));
                }
            }
        }
    }

    #[test]
    fn spelling_is_monotonic_in_folded_octet_order() {
        let key = |octet: u8| match spell(octet) {
            Spelling::Single(s) => (s, 0),
            Spelling::Escaped(e, s) => (e, s),
        };
        let mut folded: Vec<u8> = (0..=255u8).filter(|o| !o.is_ascii_uppercase()).collect();
        folded.sort_unstable();
        for pair in folded.windows(2) {
            assert!(key(pair[0]) < key(pair[1]), "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn reading_inverts_spelling() {
        for octet in (0..=255u8).filter(|o| !o.is_ascii_uppercase()) {
            match spell(octet) {
                Spelling::Single(s) => assert_eq!(read_first(s), Read::Octet(octet)),
                Spelling::Escaped(e, s) => {
                    assert_eq!(read_first(e), Read::NeedsSecond);
                    assert_eq!(read_second(e, s), Some(octet));
                }
            }
        }
        assert_eq!(read_first(NOBYTE), Read::Invalid);
        assert_eq!(read_first(LIMIT), Read::Invalid);
        assert_eq!(read_second(3, 48), None);
    }
}
