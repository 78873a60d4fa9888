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

//! Implementation of [`Cursor`]s and of iteration over a [`Trie`].

use std::iter::FusedIterator;
use std::mem;

use super::node::{Node, NodeId};
use super::{Entry, Error, Methods, Trie};

////////////////////////////////////////////////////////////////////////
// CURSOR STRUCTURE                                                   //
////////////////////////////////////////////////////////////////////////

/// A position in the key order of a [`Trie`].
///
/// A cursor is either *unpositioned* (fresh from [`Trie::cursor`]),
/// *positioned* on an entry, or *exhausted* after running off one end.
/// [`Cursor::next`] and [`Cursor::prev`] start from the first and last
/// entries respectively when unpositioned. An exhausted cursor
/// remembers which end it ran off: moving further that way keeps
/// returning `None`, while moving back returns the entry at that end.
///
/// Cursors do not borrow their trie; every call takes it as an
/// argument. A cursor is tied to the trie and the generation it was
/// created in, and once the trie is structurally modified every call
/// but [`Cursor::is_valid`] fails with [`Error::StaleCursor`].
#[derive(Clone, Debug)]
pub struct Cursor {
    trie_id: u64,
    generation: u64,
    state: State,
}

#[derive(Clone, Debug)]
enum State {
    Unpositioned,

    /// `path` has a step for every branch from the root down to `leaf`.
    Positioned {
        path: Vec<Step>,
        leaf: NodeId,
    },

    Exhausted(End),
}

/// One end of the key order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum End {
    Front,
    Back,
}

/// A branch on the way to a leaf and the index of the twig taken.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct Step {
    pub branch: NodeId,
    pub position: usize,
}

impl Cursor {
    fn unpositioned<P, M: Methods<P>>(trie: &Trie<P, M>) -> Self {
        Self {
            trie_id: trie.id,
            generation: trie.generation,
            state: State::Unpositioned,
        }
    }

    /// Creates a cursor on `leaf`.
    pub(super) fn positioned<P, M: Methods<P>>(
        trie: &Trie<P, M>,
        path: Vec<Step>,
        leaf: NodeId,
    ) -> Self {
        Self {
            trie_id: trie.id,
            generation: trie.generation,
            state: State::Positioned { path, leaf },
        }
    }

    /// Returns whether the cursor can still be used with `trie`.
    pub fn is_valid<P, M: Methods<P>>(&self, trie: &Trie<P, M>) -> bool {
        self.trie_id == trie.id && self.generation == trie.generation
    }

    /// Returns whether the cursor is positioned on an entry.
    pub fn is_positioned(&self) -> bool {
        matches!(self.state, State::Positioned { .. })
    }

    /// Returns whether the cursor has run off either end.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted(_))
    }

    /// Makes the cursor unpositioned and ties it to the current
    /// generation of `trie`. This is the way to reuse a stale cursor.
    pub fn reset<P, M: Methods<P>>(&mut self, trie: &Trie<P, M>) {
        *self = Self::unpositioned(trie);
    }

    /// Returns the entry the cursor is positioned on. Fails with
    /// [`Error::NoPosition`] if there is none.
    pub fn current<'t, P, M: Methods<P>>(&self, trie: &'t Trie<P, M>) -> Result<Entry<'t, P>, Error> {
        self.check(trie)?;
        match self.state {
            State::Positioned { leaf, .. } => Ok(trie.entry(leaf)),
            _ => Err(Error::NoPosition),
        }
    }

    /// Moves to the next entry in key order and returns it, or returns
    /// `None` after the last entry.
    pub fn next<'t, P, M: Methods<P>>(
        &mut self,
        trie: &'t Trie<P, M>,
    ) -> Result<Option<Entry<'t, P>>, Error> {
        self.advance(trie, End::Back)
    }

    /// Moves to the previous entry in key order and returns it, or
    /// returns `None` before the first entry.
    pub fn prev<'t, P, M: Methods<P>>(
        &mut self,
        trie: &'t Trie<P, M>,
    ) -> Result<Option<Entry<'t, P>>, Error> {
        self.advance(trie, End::Front)
    }

    fn advance<'t, P, M: Methods<P>>(
        &mut self,
        trie: &'t Trie<P, M>,
        towards: End,
    ) -> Result<Option<Entry<'t, P>>, Error> {
        self.check(trie)?;
        let (path, leaf) = match mem::replace(&mut self.state, State::Unpositioned) {
            State::Exhausted(end) if end == towards => (Vec::new(), None),
            State::Unpositioned | State::Exhausted(_) => trie.edge(towards.opposite()),
            State::Positioned { mut path, .. } => {
                let leaf = trie.step(&mut path, towards);
                (path, leaf)
            }
        };
        match leaf {
            Some(leaf) => {
                self.state = State::Positioned { path, leaf };
                Ok(Some(trie.entry(leaf)))
            }
            None => {
                self.state = State::Exhausted(towards);
                Ok(None)
            }
        }
    }

    fn check<P, M: Methods<P>>(&self, trie: &Trie<P, M>) -> Result<(), Error> {
        if self.is_valid(trie) {
            Ok(())
        } else {
            Err(Error::StaleCursor)
        }
    }
}

impl End {
    fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// MOVEMENT WITHIN THE TRIE                                           //
////////////////////////////////////////////////////////////////////////

impl<P, M: Methods<P>> Trie<P, M> {
    /// Returns an unpositioned cursor on the trie.
    pub fn cursor(&self) -> Cursor {
        Cursor::unpositioned(self)
    }

    /// Returns an iterator over the entries in key order.
    pub fn iter(&self) -> Iter<'_, P, M> {
        Iter {
            trie: self,
            front: self.cursor(),
            back: self.cursor(),
            remaining: self.leaves,
        }
    }

    /// Descends from `id` to the leaf at the given end of its subtree,
    /// extending `path` along the way.
    pub(super) fn descend(&self, mut id: NodeId, path: &mut Vec<Step>, end: End) -> NodeId {
        while let Node::Branch(branch) = &self.nodes[id] {
            let position = match end {
                End::Front => 0,
                End::Back => branch.twigs.len() - 1,
            };
            path.push(Step {
                branch: id,
                position,
            });
            id = branch.twigs[position];
        }
        id
    }

    /// Returns the path to the leaf at the given end of the trie.
    pub(super) fn edge(&self, end: End) -> (Vec<Step>, Option<NodeId>) {
        let mut path = Vec::new();
        let leaf = self.root.map(|root| self.descend(root, &mut path, end));
        (path, leaf)
    }

    /// Moves `path` to the neighbouring leaf towards `towards`. The
    /// neighbour of a subtree is found by backing up to the nearest
    /// branch with a twig further along and descending into that twig.
    /// Returns `None` at the end, leaving `path` empty.
    pub(super) fn step(&self, path: &mut Vec<Step>, towards: End) -> Option<NodeId> {
        while let Some(step) = path.pop() {
            let branch = self.branch(step.branch);
            let position = match towards {
                End::Front => step.position.checked_sub(1),
                End::Back => Some(step.position + 1).filter(|&p| p < branch.twigs.len()),
            };
            if let Some(position) = position {
                path.push(Step {
                    branch: step.branch,
                    position,
                });
                return Some(self.descend(branch.twigs[position], path, towards.opposite()));
            }
        }
        None
    }
}

////////////////////////////////////////////////////////////////////////
// ITERATOR                                                           //
////////////////////////////////////////////////////////////////////////

/// An iterator over the entries of a [`Trie`] in key order, constructed
/// with [`Trie::iter`]. It runs a cursor from each end.
pub struct Iter<'a, P, M: Methods<P>> {
    trie: &'a Trie<P, M>,
    front: Cursor,
    back: Cursor,
    remaining: usize,
}

impl<'a, P, M: Methods<P>> Iterator for Iter<'a, P, M> {
    type Item = Entry<'a, P>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // NOTE: the cursors cannot go stale while the trie is borrowed.
        self.front.next(self.trie).ok().flatten()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P, M: Methods<P>> DoubleEndedIterator for Iter<'_, P, M> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.back.prev(self.trie).ok().flatten()
    }
}

impl<P, M: Methods<P>> ExactSizeIterator for Iter<'_, P, M> {}

impl<P, M: Methods<P>> FusedIterator for Iter<'_, P, M> {}

impl<'a, P, M: Methods<P>> IntoIterator for &'a Trie<P, M> {
    type Item = Entry<'a, P>;
    type IntoIter = Iter<'a, P, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
