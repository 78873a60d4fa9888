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

//! Lookups that return more than an exact match: longest-ancestor
//! lookups, ancestor chains and predecessor search.

use std::fmt;

use super::cursor::{End, Step};
use super::node::{Node, NodeId};
use super::{Cursor, Methods, Trie};
use crate::key::{self, Key, NOBYTE};
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// ENTRIES AND LOOKUP RESULTS                                         //
////////////////////////////////////////////////////////////////////////

/// A key stored in a [`Trie`] together with its value.
pub struct Entry<'a, P> {
    key: &'a Key,
    pval: &'a P,
    ival: u32,
}

impl<'a, P> Entry<'a, P> {
    pub(super) fn new(key: &'a Key, pval: &'a P, ival: u32) -> Self {
        Self { key, pval, ival }
    }

    /// Returns the key.
    pub fn key(&self) -> &'a Key {
        self.key
    }

    /// Returns the stored value.
    pub fn value(&self) -> &'a P {
        self.pval
    }

    /// Returns the stored tag.
    pub fn tag(&self) -> u32 {
        self.ival
    }

    /// Decodes the key into a (lower-case) name.
    pub fn name(&self) -> Result<Name, key::Error> {
        self.key.to_name()
    }
}

impl<P> Clone for Entry<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Entry<'_, P> {}

impl<P: fmt::Debug> fmt::Debug for Entry<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", self.key)
            .field("pval", self.pval)
            .field("ival", &self.ival)
            .finish()
    }
}

/// The result of [`Trie::lookup`].
#[derive(Debug)]
pub enum Lookup<'a, P> {
    /// The key is present.
    Exact { entry: Entry<'a, P>, cursor: Cursor },

    /// The key is absent, but `entry` holds its closest ancestor, which
    /// has `labels` labels (not counting the null label).
    Ancestor {
        entry: Entry<'a, P>,
        labels: usize,
        cursor: Cursor,
    },

    /// Neither the key nor any of its ancestors is present.
    NotFound,
}

impl<'a, P> Lookup<'a, P> {
    /// Returns the entry found, if any.
    pub fn entry(&self) -> Option<Entry<'a, P>> {
        match self {
            Self::Exact { entry, .. } | Self::Ancestor { entry, .. } => Some(*entry),
            Self::NotFound => None,
        }
    }

    /// Returns whether the key itself was found.
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact { .. })
    }

    /// Returns the cursor positioned on the entry found, if any.
    pub fn into_cursor(self) -> Option<Cursor> {
        match self {
            Self::Exact { cursor, .. } | Self::Ancestor { cursor, .. } => Some(cursor),
            Self::NotFound => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// LOOKUP IMPLEMENTATION                                              //
////////////////////////////////////////////////////////////////////////

/// What a descent along a query key finds.
struct Descent {
    /// The path taken, down to the last node reached.
    path: Vec<Step>,

    /// The leaf holding the query key, if any.
    exact: Option<NodeId>,

    /// Leaves holding proper ancestors of the query key, shortest
    /// first. Each comes with the length of `path` at the branch it
    /// was found in and the step into it from there, if it is not the
    /// last node reached.
    ancestors: Vec<(NodeId, usize, Option<Step>)>,
}

impl Descent {
    /// Records an ancestor found at the current depth. A leaf seen in a
    /// `NOBYTE` twig may be reached again at the end of the descent.
    fn note_ancestor(&mut self, leaf: NodeId, step: Option<Step>) {
        if self.ancestors.last().map_or(true, |&(last, _, _)| last != leaf) {
            self.ancestors.push((leaf, self.path.len(), step));
        }
    }

    /// Returns the path to an ancestor recorded in `ancestors`.
    fn path_to(&self, depth: usize, step: Option<Step>) -> Vec<Step> {
        let mut path = self.path[..depth].to_vec();
        path.extend(step);
        path
    }
}

impl<P, M: Methods<P>> Trie<P, M> {
    /// Looks up `key`, settling for its closest ancestor in the trie if
    /// the key itself is absent. The cursor in the result is positioned
    /// on the entry found.
    pub fn lookup(&self, key: &Key) -> Lookup<'_, P> {
        let descent = self.descend_partial(key);
        if let Some(leaf) = descent.exact {
            Lookup::Exact {
                entry: self.entry(leaf),
                cursor: Cursor::positioned(self, descent.path, leaf),
            }
        } else if let Some(&(leaf, depth, step)) = descent.ancestors.last() {
            Lookup::Ancestor {
                entry: self.entry(leaf),
                labels: self.leaf(leaf).key.label_count(),
                cursor: Cursor::positioned(self, descent.path_to(depth, step), leaf),
            }
        } else {
            Lookup::NotFound
        }
    }

    /// Looks up a name. See [`Trie::lookup`].
    pub fn lookup_name(&self, name: &Name) -> Lookup<'_, P> {
        self.lookup(&Key::from_name(name))
    }

    /// Returns every ancestor of `key` in the trie, root-most first,
    /// followed by the key itself if present.
    pub fn ancestors(&self, key: &Key) -> Vec<Entry<'_, P>> {
        let descent = self.descend_partial(key);
        descent
            .ancestors
            .iter()
            .map(|&(leaf, _, _)| leaf)
            .chain(descent.exact)
            .map(|leaf| self.entry(leaf))
            .collect()
    }

    /// Follows `key` down the trie, noting ancestors along the way.
    ///
    /// A proper ancestor of the key ends with a label terminator, after
    /// which it is padded with [`NOBYTE`]. So wherever the descent
    /// passes a branch at or past the end of an ancestor, the ancestor
    /// sits in that branch's `NOBYTE` twig, and otherwise it is where
    /// the descent ends.
    fn descend_partial(&self, key: &Key) -> Descent {
        let mut descent = Descent {
            path: Vec::new(),
            exact: None,
            ancestors: Vec::new(),
        };
        let mut id = match self.root {
            Some(root) => root,
            None => return descent,
        };

        loop {
            match &self.nodes[id] {
                Node::Branch(branch) => {
                    if let Some(twig) = branch.twig(NOBYTE) {
                        if self.holds_ancestor(twig, key) {
                            let step = Step {
                                branch: id,
                                position: branch.position(NOBYTE),
                            };
                            descent.note_ancestor(twig, Some(step));
                        }
                    }
                    let symbol = key.symbol(branch.offset);
                    match branch.twig(symbol) {
                        Some(next) => {
                            descent.path.push(Step {
                                branch: id,
                                position: branch.position(symbol),
                            });
                            id = next;
                        }
                        None => break,
                    }
                }
                Node::Leaf(leaf) => {
                    if leaf.matches(key) {
                        descent.exact = Some(id);
                    } else if leaf.key.is_ancestor_of(key) {
                        descent.note_ancestor(id, None);
                    }
                    break;
                }
            }
        }
        descent
    }

    fn holds_ancestor(&self, id: NodeId, key: &Key) -> bool {
        match &self.nodes[id] {
            Node::Leaf(leaf) => leaf.key.is_ancestor_of(key),
            Node::Branch(_) => false,
        }
    }

    ////////////////////////////////////////////////////////////////////
    // PREDECESSOR SEARCH                                             //
    ////////////////////////////////////////////////////////////////////

    /// Returns the entry with the greatest key less than `key`, along
    /// with a cursor positioned on it. When no key is less, the search
    /// wraps around to the greatest key of all, as the covering name
    /// for the start of a zone does. Returns `None` only if the trie is
    /// empty.
    pub fn predecessor(&self, key: &Key) -> Option<(Entry<'_, P>, Cursor)> {
        let root = self.root?;
        let closest = &self.leaf(self.closest_leaf(root, key)).key;
        let offset = closest.first_difference(key);

        // Follow the key down to where it leaves the trie (or to its
        // leaf if it is present).
        let mut path = Vec::new();
        let mut id = root;
        while let Node::Branch(branch) = &self.nodes[id] {
            if offset.map_or(false, |offset| branch.offset >= offset) {
                break;
            }
            let position = branch.position(key.symbol(branch.offset));
            path.push(Step {
                branch: id,
                position,
            });
            id = branch.twigs[position];
        }

        let found = match (offset, &self.nodes[id]) {
            (None, _) => self.step(&mut path, End::Front),
            (Some(offset), Node::Branch(branch)) if branch.offset == offset => {
                // The key's symbol has no twig here; take the twig just
                // before where it would be.
                match branch.position(key.symbol(offset)).checked_sub(1) {
                    Some(position) => {
                        path.push(Step {
                            branch: id,
                            position,
                        });
                        Some(self.descend(branch.twigs[position], &mut path, End::Back))
                    }
                    None => self.step(&mut path, End::Front),
                }
            }
            (Some(offset), _) => {
                // Everything below `id` agrees with the closest leaf up
                // to and including `offset`.
                if closest.symbol(offset) < key.symbol(offset) {
                    Some(self.descend(id, &mut path, End::Back))
                } else {
                    self.step(&mut path, End::Front)
                }
            }
        };

        let leaf = match found {
            Some(leaf) => leaf,
            None => {
                path.clear();
                self.descend(root, &mut path, End::Back)
            }
        };
        Some((self.entry(leaf), Cursor::positioned(self, path, leaf)))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
