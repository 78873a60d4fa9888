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

//! Helpers shared by the unit tests.

use proptest::prelude::*;

use crate::name::{Name, NameBuilder};

/// Parses a name, panicking on failure.
pub fn name(s: &str) -> Name {
    s.parse()
        .unwrap_or_else(|e| panic!("bad test name {:?}: {}", s, e))
}

/// Builds a name from labels given leftmost first.
pub fn name_from_labels(labels: &[Vec<u8>]) -> Name {
    let mut builder = NameBuilder::new();
    for label in labels {
        builder.try_push_slice(label).unwrap();
        builder.next_label().unwrap();
    }
    builder.finish().unwrap()
}

/// Generates short names. Most octets come from a small alphabet (with
/// both cases of the same letters) so that generated names often share
/// labels; the rest can be anything.
pub fn arb_name() -> impl Strategy<Value = Name> {
    let octet = prop_oneof![
        3 => prop::sample::select(&b"abAB-0"[..]),
        1 => any::<u8>(),
    ];
    let label = prop::collection::vec(octet, 1..4);
    prop::collection::vec(label, 0..5).prop_map(|labels| name_from_labels(&labels))
}
