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

//! The [`Methods`] trait.

/// Hooks through which a trie tells its owner when it starts and stops
/// holding a value.
///
/// Values are stored as a pair of an opaque `P` and a 32-bit tag. The
/// trie calls [`Methods::attach`] exactly once for every value it takes
/// (a successful insertion or replacement, or a copy made by
/// [`Trie::try_clone`](super::Trie::try_clone)) and
/// [`Methods::detach`] exactly once when it lets go of it (deletion,
/// replacement, clearing or destruction of the trie). Owners that keep
/// reference counts or usage statistics outside of `P` hook in here;
/// the unit type `()` does nothing.
pub trait Methods<P> {
    /// Called when the trie starts holding a value.
    fn attach(&self, pval: &P, ival: u32);

    /// Called when the trie stops holding a value.
    fn detach(&self, pval: &P, ival: u32);

    /// A name for the trie, used in log messages.
    fn trie_name(&self) -> &str {
        "qp-trie"
    }
}

impl<P> Methods<P> for () {
    fn attach(&self, _pval: &P, _ival: u32) {}

    fn detach(&self, _pval: &P, _ival: u32) {}
}
