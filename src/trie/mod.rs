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

//! Implementation of the [`Trie`] structure, a QP-trie keyed by
//! encoded domain names.
//!
//! A QP-trie is a radix tree whose branches test a single key symbol
//! and keep only the children for the symbols that actually occur
//! there, indexed through a bitmap. Because [`Key`]s sort in canonical
//! name order, a walk over the leaves visits names in that order, and
//! because the key of a name is a prefix of the keys of its
//! descendants, the closest enclosing name of a query can be found in
//! the same descent that looks for the query itself.
//!
//! Nodes live in a [`slab::Slab`] arena and refer to each other by
//! index. The trie never inspects stored values; it reports taking and
//! releasing them through its [`Methods`], and charges the memory it
//! uses to a shared [`MemContext`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use slab::Slab;

use crate::key::Key;
use crate::name::Name;

mod cursor;
mod error;
mod lookup;
mod memory;
mod methods;
mod node;
pub use cursor::{Cursor, Iter};
pub use error::{Error, InsertError};
pub use lookup::{Entry, Lookup};
pub use memory::MemContext;
pub use methods::Methods;

use node::{branch_cost, leaf_cost, Branch, Leaf, Node, NodeId, TWIG_COST};

#[cfg(test)]
mod proptests;

/// Source of the identities that tie cursors to their trie.
static NEXT_TRIE_ID: AtomicU64 = AtomicU64::new(0);

////////////////////////////////////////////////////////////////////////
// TRIE STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A QP-trie mapping [`Key`]s to values.
///
/// Each value is a pair of an opaque `P` and a 32-bit tag. The trie
/// owns the values it holds and gives them back on deletion or
/// replacement; `M` gets to observe both events (see [`Methods`]).
///
/// Positions in the trie are held by [`Cursor`]s, which do not borrow
/// the trie. Instead, the trie counts its structural modifications
/// (insertions, deletions and clearing) in a generation number, and a
/// cursor used after the generation it was positioned in fails with
/// [`Error::StaleCursor`].
pub struct Trie<P, M: Methods<P> = ()> {
    nodes: Slab<Node<P>>,
    root: Option<NodeId>,
    leaves: usize,
    bytes: usize,
    generation: u64,
    id: u64,
    mctx: Arc<MemContext>,
    methods: M,
}

/// Statistics about a [`Trie`], returned by [`Trie::stats`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Stats {
    /// The number of leaves (that is, of stored keys).
    pub leaves: usize,

    /// The number of branches.
    pub branches: usize,

    /// The number of bytes charged to the memory context.
    pub bytes: usize,
}

/// Where a node hangs: at the root, or in the twig of a branch for a
/// symbol.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Root,
    Twig(NodeId, u8),
}

/// The structural change an insertion makes, worked out before any
/// memory is charged.
#[derive(Clone, Copy, Debug)]
enum Plan {
    /// The trie is empty; the new leaf becomes the root.
    Root,

    /// The new leaf becomes another twig of an existing branch.
    Twig { branch: NodeId, symbol: u8 },

    /// A new branch at `offset` replaces `node` in `slot`, with `node`
    /// and the new leaf as its twigs.
    Split {
        slot: Slot,
        node: NodeId,
        offset: usize,
        old: u8,
        new: u8,
    },
}

impl<P, M: Methods<P>> Trie<P, M> {
    /// Creates an empty trie that charges its memory to `mctx` and
    /// reports on its values through `methods`.
    pub fn new(mctx: Arc<MemContext>, methods: M) -> Self {
        let id = NEXT_TRIE_ID.fetch_add(1, Ordering::Relaxed);
        debug!("{}: created trie {}", methods.trie_name(), id);
        Self {
            nodes: Slab::new(),
            root: None,
            leaves: 0,
            bytes: 0,
            generation: 0,
            id,
            mctx,
            methods,
        }
    }

    /// Returns the number of keys in the trie.
    pub fn len(&self) -> usize {
        self.leaves
    }

    /// Returns whether the trie is empty.
    pub fn is_empty(&self) -> bool {
        self.leaves == 0
    }

    /// Returns the number of structural modifications made so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns statistics about the trie.
    pub fn stats(&self) -> Stats {
        Stats {
            leaves: self.leaves,
            branches: self.nodes.len() - self.leaves,
            bytes: self.bytes,
        }
    }

    /// Returns the memory context the trie charges to.
    pub fn mem_context(&self) -> &Arc<MemContext> {
        &self.mctx
    }

    /// Returns the trie's methods.
    pub fn methods(&self) -> &M {
        &self.methods
    }

    ////////////////////////////////////////////////////////////////////
    // INSERTION                                                      //
    ////////////////////////////////////////////////////////////////////

    /// Inserts `key` with the value `(pval, ival)`.
    ///
    /// If the key is already present ([`Error::Exists`]) or the memory
    /// for the new nodes cannot be had ([`Error::OutOfMemory`]), the
    /// trie is left unchanged and the value is handed back in the
    /// [`InsertError`]. Otherwise, the value is attached.
    pub fn insert(&mut self, key: Key, pval: P, ival: u32) -> Result<(), InsertError<P>> {
        let plan = match self.plan_insert(&key) {
            Ok(plan) => plan,
            Err(error) => return Err(InsertError { error, pval, ival }),
        };
        let cost = leaf_cost::<P>(&key)
            + match plan {
                Plan::Root => 0,
                Plan::Twig { .. } => TWIG_COST,
                Plan::Split { .. } => branch_cost::<P>(2),
            };

        // Everything that can fail happens before the trie is touched.
        // Room in the arena is made first, so that inserting the new
        // nodes below never grows it.
        self.nodes.reserve(match plan {
            Plan::Split { .. } => 2,
            _ => 1,
        });
        if !self.mctx.try_charge(cost) {
            return Err(InsertError {
                error: Error::OutOfMemory,
                pval,
                ival,
            });
        }
        let mut twigs = Vec::new();
        let reserved = match plan {
            Plan::Root => Ok(()),
            Plan::Twig { branch, .. } => self.branch_mut(branch).twigs.try_reserve(1),
            Plan::Split { .. } => twigs.try_reserve_exact(2),
        };
        if reserved.is_err() {
            self.mctx.release(cost);
            return Err(InsertError {
                error: Error::OutOfMemory,
                pval,
                ival,
            });
        }

        trace!("{}: inserting {:?}", self.methods.trie_name(), key);
        self.methods.attach(&pval, ival);
        let leaf = self.nodes.insert(Node::Leaf(Leaf { key, pval, ival }));
        match plan {
            Plan::Root => self.root = Some(leaf),
            Plan::Twig { branch, symbol } => self.branch_mut(branch).add(symbol, leaf),
            Plan::Split {
                slot,
                node,
                offset,
                old,
                new,
            } => {
                let branch = Branch::new(offset, (old, node), (new, leaf), twigs);
                let branch = self.nodes.insert(Node::Branch(branch));
                self.set_slot(slot, branch);
            }
        }
        self.bytes += cost;
        self.leaves += 1;
        self.generation += 1;
        Ok(())
    }

    /// Works out where `key` goes.
    fn plan_insert(&self, key: &Key) -> Result<Plan, Error> {
        let root = match self.root {
            Some(root) => root,
            None => return Ok(Plan::Root),
        };

        // Any leaf reached by following the key's symbols shares the
        // longest possible prefix with it, so it tells us at which
        // offset the new key leaves the trie.
        let closest = &self.leaf(self.closest_leaf(root, key)).key;
        let offset = key.first_difference(closest).ok_or(Error::Exists)?;

        let mut slot = Slot::Root;
        let mut id = root;
        loop {
            match &self.nodes[id] {
                Node::Branch(branch) if branch.offset < offset => {
                    let symbol = key.symbol(branch.offset);
                    // NOTE: the unwrap is okay, since the key agrees
                    // with the closest leaf before the offset.
                    let next = branch.twig(symbol).unwrap();
                    slot = Slot::Twig(id, symbol);
                    id = next;
                }
                Node::Branch(branch) if branch.offset == offset => {
                    return Ok(Plan::Twig {
                        branch: id,
                        symbol: key.symbol(offset),
                    });
                }
                _ => {
                    return Ok(Plan::Split {
                        slot,
                        node: id,
                        offset,
                        old: closest.symbol(offset),
                        new: key.symbol(offset),
                    });
                }
            }
        }
    }

    /// Inserts a name. See [`Trie::insert`].
    pub fn insert_name(&mut self, name: &Name, pval: P, ival: u32) -> Result<(), InsertError<P>> {
        self.insert(Key::from_name(name), pval, ival)
    }

    ////////////////////////////////////////////////////////////////////
    // DELETION AND REPLACEMENT                                       //
    ////////////////////////////////////////////////////////////////////

    /// Deletes `key`, detaching its value and returning it. Fails with
    /// [`Error::NotFound`], changing nothing, if the key is absent.
    pub fn delete(&mut self, key: &Key) -> Result<(P, u32), Error> {
        let mut id = self.root.ok_or(Error::NotFound)?;
        let mut slot = Slot::Root;
        let mut parent = None;
        while let Node::Branch(branch) = &self.nodes[id] {
            let symbol = key.symbol(branch.offset);
            let next = branch.twig(symbol).ok_or(Error::NotFound)?;
            parent = Some((id, symbol, slot));
            slot = Slot::Twig(id, symbol);
            id = next;
        }
        if !self.leaf(id).matches(key) {
            return Err(Error::NotFound);
        }

        trace!("{}: deleting {:?}", self.methods.trie_name(), key);
        let mut freed = 0;
        match parent {
            None => self.root = None,
            Some((branch_id, symbol, branch_slot)) => {
                let branch = self.branch_mut(branch_id);
                branch.remove(symbol);
                freed += TWIG_COST;

                // A branch with a single twig is replaced by that twig.
                if branch.twigs.len() == 1 {
                    let only = branch.twigs[0];
                    self.nodes.remove(branch_id);
                    self.set_slot(branch_slot, only);
                    freed += branch_cost::<P>(1);
                }
            }
        }
        let leaf = match self.nodes.remove(id) {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => unreachable!(),
        };
        freed += leaf_cost::<P>(&leaf.key);

        self.methods.detach(&leaf.pval, leaf.ival);
        self.mctx.release(freed);
        self.bytes -= freed;
        self.leaves -= 1;
        self.generation += 1;
        Ok((leaf.pval, leaf.ival))
    }

    /// Deletes a name. See [`Trie::delete`].
    pub fn delete_name(&mut self, name: &Name) -> Result<(P, u32), Error> {
        self.delete(&Key::from_name(name))
    }

    /// Replaces the value of `key`, returning the old one. The new
    /// value is attached before the old one is detached. This changes
    /// no structure, so cursors stay valid. Fails with
    /// [`Error::NotFound`] if the key is absent.
    pub fn replace(&mut self, key: &Key, pval: P, ival: u32) -> Result<(P, u32), InsertError<P>> {
        let id = match self.find(key) {
            Some(id) => id,
            None => {
                return Err(InsertError {
                    error: Error::NotFound,
                    pval,
                    ival,
                })
            }
        };

        self.methods.attach(&pval, ival);
        let old = match &mut self.nodes[id] {
            Node::Leaf(leaf) => (
                std::mem::replace(&mut leaf.pval, pval),
                std::mem::replace(&mut leaf.ival, ival),
            ),
            Node::Branch(_) => unreachable!(),
        };
        self.methods.detach(&old.0, old.1);
        Ok(old)
    }

    ////////////////////////////////////////////////////////////////////
    // EXACT LOOKUP                                                   //
    ////////////////////////////////////////////////////////////////////

    /// Looks up `key` exactly.
    pub fn get(&self, key: &Key) -> Option<Entry<'_, P>> {
        self.find(key).map(|id| self.entry(id))
    }

    /// Looks up a name exactly. See [`Trie::get`].
    pub fn get_name(&self, name: &Name) -> Option<Entry<'_, P>> {
        self.get(&Key::from_name(name))
    }

    /// Returns whether `key` is present.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.find(key).is_some()
    }

    fn find(&self, key: &Key) -> Option<NodeId> {
        let mut id = self.root?;
        while let Node::Branch(branch) = &self.nodes[id] {
            id = branch.twig(key.symbol(branch.offset))?;
        }
        self.leaf(id).matches(key).then_some(id)
    }

    ////////////////////////////////////////////////////////////////////
    // WHOLE-TRIE OPERATIONS                                          //
    ////////////////////////////////////////////////////////////////////

    /// Removes every key, detaching every value.
    pub fn clear(&mut self) {
        self.detach_all();
        self.nodes.clear();
        self.root = None;
        self.leaves = 0;
        self.mctx.release(self.bytes);
        self.bytes = 0;
        self.generation += 1;
        debug!("{}: cleared trie {}", self.methods.trie_name(), self.id);
    }

    /// Gives back spare capacity in the node arena and in branches.
    /// Nodes do not move, so cursors stay valid.
    pub fn compact(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            if let Node::Branch(branch) = node {
                branch.twigs.shrink_to_fit();
            }
        }
        self.nodes.shrink_to_fit();
        debug!(
            "{}: compacted trie {} ({} nodes)",
            self.methods.trie_name(),
            self.id,
            self.nodes.len(),
        );
    }

    /// Makes a copy of the trie, attaching every value again. The copy
    /// shares the memory context and fails with
    /// [`Error::OutOfMemory`] if the context cannot hold it. Cursors of
    /// this trie are stale for the copy.
    pub fn try_clone(&self) -> Result<Self, Error>
    where
        P: Clone,
        M: Clone,
    {
        if !self.mctx.try_charge(self.bytes) {
            return Err(Error::OutOfMemory);
        }
        let id = NEXT_TRIE_ID.fetch_add(1, Ordering::Relaxed);
        let copy = Self {
            nodes: self.nodes.clone(),
            root: self.root,
            leaves: self.leaves,
            bytes: self.bytes,
            generation: 0,
            id,
            mctx: Arc::clone(&self.mctx),
            methods: self.methods.clone(),
        };
        for (_, node) in copy.nodes.iter() {
            if let Node::Leaf(leaf) = node {
                copy.methods.attach(&leaf.pval, leaf.ival);
            }
        }
        debug!(
            "{}: cloned trie {} into trie {}",
            self.methods.trie_name(),
            self.id,
            id,
        );
        Ok(copy)
    }

    fn detach_all(&self) {
        for (_, node) in self.nodes.iter() {
            if let Node::Leaf(leaf) = node {
                self.methods.detach(&leaf.pval, leaf.ival);
            }
        }
    }

    ////////////////////////////////////////////////////////////////////
    // NODE ACCESS                                                    //
    ////////////////////////////////////////////////////////////////////

    /// Follows `key` down from `id` as far as possible, taking the
    /// first twig wherever the key's symbol is missing.
    fn closest_leaf(&self, mut id: NodeId, key: &Key) -> NodeId {
        while let Node::Branch(branch) = &self.nodes[id] {
            id = branch
                .twig(key.symbol(branch.offset))
                .unwrap_or(branch.twigs[0]);
        }
        id
    }

    fn leaf(&self, id: NodeId) -> &Leaf<P> {
        match &self.nodes[id] {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => unreachable!("node {} is a branch", id),
        }
    }

    fn branch(&self, id: NodeId) -> &Branch {
        match &self.nodes[id] {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => unreachable!("node {} is a leaf", id),
        }
    }

    fn branch_mut(&mut self, id: NodeId) -> &mut Branch {
        match &mut self.nodes[id] {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => unreachable!("node {} is a leaf", id),
        }
    }

    fn set_slot(&mut self, slot: Slot, id: NodeId) {
        match slot {
            Slot::Root => self.root = Some(id),
            Slot::Twig(branch, symbol) => self.branch_mut(branch).set(symbol, id),
        }
    }

    fn entry(&self, id: NodeId) -> Entry<'_, P> {
        let leaf = self.leaf(id);
        Entry::new(&leaf.key, &leaf.pval, leaf.ival)
    }
}

impl<P> Default for Trie<P> {
    fn default() -> Self {
        Self::new(Arc::new(MemContext::new()), ())
    }
}

impl<P, M: Methods<P>> Drop for Trie<P, M> {
    fn drop(&mut self) {
        self.detach_all();
        self.mctx.release(self.bytes);
        debug!(
            "{}: destroyed trie {} with {} keys",
            self.methods.trie_name(),
            self.id,
            self.leaves,
        );
    }
}

impl<P, M: Methods<P>> fmt::Debug for Trie<P, M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Trie")
            .field("name", &self.methods.trie_name())
            .field("id", &self.id)
            .field("len", &self.leaves)
            .field("generation", &self.generation)
            .field("stats", &self.stats())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
impl<P, M: Methods<P>> Trie<P, M> {
    /// Checks the structural invariants of the trie, panicking if any
    /// is broken.
    pub(crate) fn check_invariants(&self) {
        let mut leaves = 0;
        let mut bytes = 0;
        let mut stack = Vec::new();
        stack.extend(self.root.map(|root| (root, 0)));
        while let Some((id, min_offset)) = stack.pop() {
            match &self.nodes[id] {
                Node::Leaf(leaf) => {
                    leaves += 1;
                    bytes += leaf_cost::<P>(&leaf.key);
                }
                Node::Branch(branch) => {
                    assert!(branch.twigs.len() >= 2, "branch with one twig");
                    assert_eq!(branch.bitmap.count_ones() as usize, branch.twigs.len());
                    assert_eq!(branch.bitmap & 0b11, 0, "symbol below NOBYTE");
                    assert!(branch.offset >= min_offset, "offsets must increase");
                    bytes += branch_cost::<P>(branch.twigs.len());

                    // Following the empty key leads to the first leaf.
                    let first = &self.leaf(self.closest_leaf(id, &Key::root())).key;
                    for symbol in 0..64 {
                        if let Some(twig) = branch.twig(symbol) {
                            let sample = &self.leaf(self.closest_leaf(twig, &Key::root())).key;
                            assert_eq!(sample.symbol(branch.offset), symbol);
                            let agreed = first.first_difference(sample);
                            assert!(agreed.map_or(true, |o| o >= branch.offset));
                            stack.push((twig, branch.offset + 1));
                        }
                    }
                }
            }
        }
        assert_eq!(leaves, self.leaves);
        assert_eq!(bytes, self.bytes);
        assert_eq!(self.nodes.len() - self.leaves, self.stats().branches);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::key::NOBYTE;
    use crate::testing::name;

    fn key(s: &str) -> Key {
        Key::from_name(&name(s))
    }

    /// Methods that count attachments per tag.
    #[derive(Clone, Default)]
    struct Counting {
        held: Rc<RefCell<HashMap<u32, i64>>>,
    }

    impl Counting {
        fn held(&self, ival: u32) -> i64 {
            self.held.borrow().get(&ival).copied().unwrap_or(0)
        }

        fn total(&self) -> i64 {
            self.held.borrow().values().sum()
        }
    }

    impl<P> Methods<P> for Counting {
        fn attach(&self, _pval: &P, ival: u32) {
            *self.held.borrow_mut().entry(ival).or_default() += 1;
        }

        fn detach(&self, _pval: &P, ival: u32) {
            *self.held.borrow_mut().entry(ival).or_default() -= 1;
        }

        fn trie_name(&self) -> &str {
            "counting"
        }
    }

    fn names_in_order<P, M: Methods<P>>(trie: &Trie<P, M>) -> Vec<String> {
        trie.iter()
            .map(|entry| entry.name().unwrap().to_string())
            .collect()
    }

    #[test]
    fn insert_lookup_and_iterate() {
        let mut trie = Trie::default();
        for (i, n) in ["a.", "b.a.", "c.a.", "b.c.a."].into_iter().enumerate() {
            trie.insert_name(&name(n), n, i as u32).unwrap();
        }
        trie.check_invariants();
        assert_eq!(trie.len(), 4);
        assert_eq!(names_in_order(&trie), ["a.", "b.a.", "b.c.a.", "c.a."]);

        let entry = trie.get_name(&name("B.A.")).unwrap();
        assert_eq!(*entry.value(), "b.a.");
        assert_eq!(entry.tag(), 1);
        assert!(trie.get_name(&name("x.a.")).is_none());
        assert!(trie.get(&Key::root()).is_none());
    }

    #[test]
    fn duplicate_insert_changes_nothing() {
        let mut trie = Trie::default();
        trie.insert(key("example."), 1, 0).unwrap();
        let before = (trie.generation(), trie.stats());
        let error = trie.insert(key("EXAMPLE."), 2, 7).unwrap_err();
        assert_eq!(error.error(), Error::Exists);
        assert_eq!(error.into_inner(), (2, 7));
        assert_eq!((trie.generation(), trie.stats()), before);
        assert_eq!(*trie.get(&key("example.")).unwrap().value(), 1);
    }

    #[test]
    fn delete_of_absent_key_changes_nothing() {
        let mut trie = Trie::default();
        assert_eq!(trie.delete(&key("a.")), Err(Error::NotFound));
        trie.insert(key("a."), (), 0).unwrap();
        trie.insert(key("b.a."), (), 0).unwrap();
        let before = (trie.generation(), trie.stats());
        assert_eq!(trie.delete(&key("c.a.")), Err(Error::NotFound));
        assert_eq!(trie.delete(&key("b.")), Err(Error::NotFound));
        assert_eq!(trie.delete(&Key::root()), Err(Error::NotFound));
        assert_eq!((trie.generation(), trie.stats()), before);
    }

    #[test]
    fn delete_collapses_branches() {
        let mut trie = Trie::default();
        for (i, n) in ["a.", "b.a.", "c.a.", "b.c.a.", "."].into_iter().enumerate() {
            trie.insert_name(&name(n), (), i as u32).unwrap();
        }
        assert_eq!(trie.delete_name(&name("c.a.")), Ok(((), 2)));
        trie.check_invariants();
        assert_eq!(names_in_order(&trie), [".", "a.", "b.a.", "b.c.a."]);
        for n in [".", "b.c.a.", "a.", "b.a."] {
            trie.delete_name(&name(n)).unwrap();
            trie.check_invariants();
        }
        assert!(trie.is_empty());
        assert_eq!(trie.stats(), Stats::default());
    }

    #[test]
    fn root_name_is_a_key_like_any_other() {
        let mut trie = Trie::default();
        trie.insert_name(Name::root(), "root", 0).unwrap();
        trie.insert_name(&name("com."), "com", 0).unwrap();
        assert_eq!(*trie.get(&Key::root()).unwrap().value(), "root");
        assert_eq!(names_in_order(&trie), [".", "com."]);
    }

    #[test]
    fn replace_keeps_structure() {
        let counting = Counting::default();
        let mut trie = Trie::new(Arc::new(MemContext::new()), counting.clone());
        trie.insert(key("a."), "old", 1).unwrap();
        let cursor = match trie.lookup(&key("a.")) {
            Lookup::Exact { cursor, .. } => cursor,
            other => panic!("unexpected {:?}", other),
        };
        let generation = trie.generation();
        assert_eq!(trie.replace(&key("a."), "new", 2), Ok(("old", 1)));
        assert_eq!(trie.generation(), generation);
        assert!(cursor.is_valid(&trie));
        assert_eq!(*cursor.current(&trie).unwrap().value(), "new");
        assert_eq!((counting.held(1), counting.held(2)), (0, 1));

        let error = trie.replace(&key("b."), "none", 3).unwrap_err();
        assert_eq!(error.error(), Error::NotFound);
        assert_eq!(counting.held(3), 0);
    }

    #[test]
    fn values_are_attached_and_detached_once() {
        let counting = Counting::default();
        {
            let mut trie = Trie::new(Arc::new(MemContext::new()), counting.clone());
            for (i, n) in ["a.", "b.a.", "c.a.", "d."].into_iter().enumerate() {
                trie.insert_name(&name(n), (), i as u32).unwrap();
            }
            assert!(trie.insert_name(&name("a."), (), 9).is_err());
            assert_eq!(counting.held(9), 0);
            assert_eq!(counting.total(), 4);
            assert_eq!(trie.methods().total(), 4);

            trie.delete_name(&name("b.a.")).unwrap();
            assert_eq!(counting.held(1), 0);
            assert_eq!(counting.total(), 3);

            let copy = trie.try_clone().unwrap();
            assert_eq!(counting.total(), 6);
            drop(copy);
            assert_eq!(counting.total(), 3);

            trie.clear();
            assert_eq!(counting.total(), 0);
            trie.insert_name(&name("e."), (), 5).unwrap();
        }
        assert_eq!(counting.total(), 0);
        assert!(counting.held.borrow().values().all(|&n| n == 0));
    }

    #[test]
    fn memory_is_charged_and_released() {
        let mctx = Arc::new(MemContext::new());
        let mut trie = Trie::new(Arc::clone(&mctx), ());
        assert!(Arc::ptr_eq(trie.mem_context(), &mctx));
        for n in ["a.", "b.a.", "c.a.", "b.c.a."] {
            trie.insert_name(&name(n), (), 0).unwrap();
        }
        assert_eq!(mctx.in_use(), trie.stats().bytes);
        assert!(mctx.in_use() > 0);

        let copy = trie.try_clone().unwrap();
        assert_eq!(mctx.in_use(), 2 * trie.stats().bytes);
        drop(copy);
        trie.compact();
        trie.check_invariants();

        trie.delete_name(&name("b.a.")).unwrap();
        assert_eq!(mctx.in_use(), trie.stats().bytes);
        drop(trie);
        assert_eq!(mctx.in_use(), 0);
    }

    #[test]
    fn exhausted_quota_leaves_trie_unchanged() {
        let limit = 4 * leaf_cost::<u32>(&key("name.")) + 3 * branch_cost::<u32>(2);
        let mctx = Arc::new(MemContext::with_limit(limit));
        let mut trie = Trie::new(Arc::clone(&mctx), ());

        let mut inserted = Vec::new();
        let mut failure = None;
        for i in 0..100u32 {
            let k = key(&format!("n{}.", i));
            let before = (trie.stats(), mctx.in_use(), trie.generation());
            match trie.insert(k.clone(), i, i) {
                Ok(()) => inserted.push(k),
                Err(error) => {
                    assert_eq!(error.error(), Error::OutOfMemory);
                    assert_eq!(error.into_inner(), (i, i));
                    assert_eq!((trie.stats(), mctx.in_use(), trie.generation()), before);
                    failure = Some(k);
                    break;
                }
            }
        }
        let failed = failure.expect("quota was never reached");
        assert!(trie.get(&failed).is_none());
        assert!(mctx.in_use() <= limit);
        trie.check_invariants();
        for k in &inserted {
            assert!(trie.contains_key(k));
        }
        assert!(trie.try_clone().is_err());

        // Freeing memory makes room again.
        trie.delete(&inserted[0]).unwrap();
        trie.delete(&inserted[1]).unwrap();
        trie.insert(failed, 0, 0).unwrap();
    }

    #[test]
    fn inserts_fit_in_reserved_arena_room() {
        let mut trie = Trie::default();
        for i in 0..64u32 {
            // Compacting leaves no spare room, so every insert must
            // reserve its own.
            trie.compact();
            trie.insert(key(&format!("r{}.", i)), i, i).unwrap();
            assert!(trie.nodes.len() <= trie.nodes.capacity());
        }
        trie.check_invariants();
        let values: Vec<u32> = trie.iter().map(|entry| *entry.value()).collect();
        let mut expected: Vec<u32> = (0..64).collect();
        expected.sort_by_key(|i| format!("r{}", i));
        assert_eq!(values, expected);
    }

    #[test]
    fn raw_symbol_keys_follow_key_order() {
        let short = Key::from_symbols(&[0x14]).unwrap();
        let long = Key::from_symbols(&[0x14, NOBYTE]).unwrap();
        let high = Key::from_symbols(&[0x30]).unwrap();

        let mut trie = Trie::default();
        trie.insert(short.clone(), "short", 0).unwrap();
        trie.insert(high.clone(), "high", 1).unwrap();
        trie.check_invariants();

        let error = trie.insert(long.clone(), "long", 2).unwrap_err();
        assert_eq!(error.error(), Error::Exists);
        assert_eq!(long, short);
        assert_eq!(trie.get(&long).unwrap().key(), &long);
        assert!(trie.contains_key(&long));

        let above = Key::from_symbols(&[0x14, NOBYTE, 0x03]).unwrap();
        let (entry, _) = trie.predecessor(&above).unwrap();
        assert_eq!(entry.key(), &short);
        assert!(entry.key() < &above);
        let (entry, _) = trie.predecessor(&long).unwrap();
        assert_eq!(entry.key(), &high);

        let keys: Vec<Key> = trie.iter().map(|entry| entry.key().clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(trie.delete(&long), Ok(("short", 0)));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn random_operations_keep_iteration_consistent() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut trie = Trie::default();
        let mut present = vec![false; 256];

        for round in 0..1234 {
            let i: usize = rng.gen_range(0..256);
            let k = key(&format!("{}.", i));
            if present[i] {
                assert_eq!(trie.delete(&k), Ok((i, 0)));
            } else {
                trie.insert(k, i, 0).unwrap();
            }
            present[i] = !present[i];

            if round % 100 == 0 {
                trie.check_invariants();
            }

            let mut expected: Vec<usize> = (0..256).filter(|&i| present[i]).collect();
            expected.sort_by_key(|i| i.to_string());
            let forward: Vec<usize> = trie.iter().map(|e| *e.value()).collect();
            assert_eq!(forward, expected);
            let mut backward: Vec<usize> = trie.iter().rev().map(|e| *e.value()).collect();
            backward.reverse();
            assert_eq!(backward, expected);
        }
        trie.check_invariants();
    }

    #[test]
    fn clones_are_independent() {
        let mut trie = Trie::default();
        trie.insert(key("a."), 1, 0).unwrap();
        let mut copy = trie.try_clone().unwrap();
        copy.insert(key("b."), 2, 0).unwrap();
        trie.delete(&key("a.")).unwrap();
        assert_eq!(trie.len(), 0);
        assert_eq!(names_in_order(&copy), ["a.", "b."]);
        let cursor = copy.cursor();
        assert!(!cursor.is_valid(&trie));
    }
}
