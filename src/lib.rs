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

//! An in-memory index of domain names for authoritative DNS servers.
//!
//! The index is a QP-trie ([`trie::Trie`]) mapping domain names to
//! opaque values. Names are stored as [`key::Key`]s, an encoding in
//! which plain symbol order is DNSSEC canonical name order and every
//! name's key is a prefix of its descendants' keys. That gives the trie
//! three lookups a name server needs:
//!
//! * exact lookup of a name;
//! * lookup of the closest enclosing name when the name itself is
//!   absent (finding the zone or delegation a query falls under); and
//! * the predecessor of a name in canonical order (the covering name
//!   for denial of existence).
//!
//! ```
//! use qpname::name::Name;
//! use qpname::trie::{Lookup, Trie};
//!
//! let mut trie = Trie::default();
//! for (i, name) in ["example.", "www.example.", "mail.example."].iter().enumerate() {
//!     trie.insert_name(&name.parse().unwrap(), *name, i as u32).unwrap();
//! }
//!
//! let query: Name = "a.b.www.example.".parse().unwrap();
//! match trie.lookup_name(&query) {
//!     Lookup::Ancestor { entry, labels, .. } => {
//!         assert_eq!(*entry.value(), "www.example.");
//!         assert_eq!(labels, 2);
//!     }
//!     _ => panic!("expected an ancestor"),
//! }
//!
//! let in_order: Vec<_> = trie.iter().map(|entry| *entry.value()).collect();
//! assert_eq!(in_order, ["example.", "mail.example.", "www.example."]);
//! ```

pub mod key;
pub mod name;
pub mod trie;

#[cfg(test)]
mod testing;
