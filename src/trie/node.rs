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

//! The nodes of the trie.

use std::mem;

use crate::key::Key;

/// The index of a node in the trie's arena.
pub type NodeId = usize;

/// A node: either a leaf holding a key and its value, or a branch.
#[derive(Clone, Debug)]
pub enum Node<P> {
    Leaf(Leaf<P>),
    Branch(Branch),
}

#[derive(Clone, Debug)]
pub struct Leaf<P> {
    pub key: Key,
    pub pval: P,
    pub ival: u32,
}

impl<P> Leaf<P> {
    /// Returns whether the leaf holds `key`. Trailing [`NOBYTE`]s do
    /// not count.
    ///
    /// [`NOBYTE`]: crate::key::NOBYTE
    pub fn matches(&self, key: &Key) -> bool {
        self.key.first_difference(key).is_none()
    }
}

/// A branch tests the key symbol at `offset`. Bit `s` of `bitmap` is
/// set when some key below has symbol `s` there, and `twigs` holds the
/// children for the set bits in ascending symbol order. Every key below
/// a branch shares the same symbols before `offset`, and a branch
/// always has at least two twigs.
#[derive(Clone, Debug)]
pub struct Branch {
    pub offset: usize,
    pub bitmap: u64,
    pub twigs: Vec<NodeId>,
}

/// The bytes charged for one twig.
pub const TWIG_COST: usize = mem::size_of::<NodeId>();

/// Returns the bytes charged for a leaf holding `key`.
pub fn leaf_cost<P>(key: &Key) -> usize {
    mem::size_of::<Node<P>>() + key.len()
}

/// Returns the bytes charged for a branch with `n_twigs` twigs.
pub fn branch_cost<P>(n_twigs: usize) -> usize {
    mem::size_of::<Node<P>>() + n_twigs * TWIG_COST
}

impl Branch {
    /// Creates a branch with two twigs. `twigs` must be empty; it is
    /// passed in so that the caller can reserve its space up front.
    pub fn new(offset: usize, a: (u8, NodeId), b: (u8, NodeId), mut twigs: Vec<NodeId>) -> Self {
        let (first, second) = if a.0 < b.0 { (a, b) } else { (b, a) };
        twigs.push(first.1);
        twigs.push(second.1);
        Self {
            offset,
            bitmap: (1 << first.0) | (1 << second.0),
            twigs,
        }
    }

    /// Returns whether there is a twig for `symbol`.
    pub fn has(&self, symbol: u8) -> bool {
        self.bitmap & (1 << symbol) != 0
    }

    /// Returns the index in `twigs` that a twig for `symbol` has (or
    /// would have).
    pub fn position(&self, symbol: u8) -> usize {
        (self.bitmap & ((1 << symbol) - 1)).count_ones() as usize
    }

    /// Returns the twig for `symbol`, if there is one.
    pub fn twig(&self, symbol: u8) -> Option<NodeId> {
        if self.has(symbol) {
            Some(self.twigs[self.position(symbol)])
        } else {
            None
        }
    }

    /// Adds a twig for `symbol`, which must not be present yet.
    pub fn add(&mut self, symbol: u8, id: NodeId) {
        let position = self.position(symbol);
        self.twigs.insert(position, id);
        self.bitmap |= 1 << symbol;
    }

    /// Removes and returns the twig for `symbol`, which must be
    /// present.
    pub fn remove(&mut self, symbol: u8) -> NodeId {
        let position = self.position(symbol);
        self.bitmap &= !(1 << symbol);
        self.twigs.remove(position)
    }

    /// Replaces the twig for `symbol`, which must be present.
    pub fn set(&mut self, symbol: u8, id: NodeId) {
        let position = self.position(symbol);
        self.twigs[position] = id;
    }
}
