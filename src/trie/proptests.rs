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

//! Checks the trie against a [`BTreeMap`] model.

use std::collections::BTreeMap;

use proptest::prelude::*;

use super::*;
use crate::testing::arb_name;

#[derive(Clone, Debug)]
enum Op {
    Insert(Name, u32),
    Delete(Name),
    Replace(Name, u32),
    Lookup(Name),
    Predecessor(Name),
    Compact,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        40 => (arb_name(), any::<u32>()).prop_map(|(n, v)| Op::Insert(n, v)),
        25 => arb_name().prop_map(Op::Delete),
        5 => (arb_name(), any::<u32>()).prop_map(|(n, v)| Op::Replace(n, v)),
        15 => arb_name().prop_map(Op::Lookup),
        14 => arb_name().prop_map(Op::Predecessor),
        1 => Just(Op::Compact),
    ];
    prop::collection::vec(op, 0..=300)
}

/// The longest proper ancestor of `key` in the model.
fn model_ancestor<'a>(model: &'a BTreeMap<Key, u32>, key: &Key) -> Option<(&'a Key, &'a u32)> {
    model
        .iter()
        .filter(|(k, _)| k.is_ancestor_of(key))
        .max_by_key(|(k, _)| k.len())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut trie: Trie<u32> = Trie::default();
        let mut model: BTreeMap<Key, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(name, value) => {
                    let key = Key::from_name(&name);
                    let got = trie.insert(key.clone(), value, value).map_err(|e| e.error());
                    if model.contains_key(&key) {
                        prop_assert_eq!(got, Err(Error::Exists));
                    } else {
                        prop_assert_eq!(got, Ok(()));
                        model.insert(key, value);
                    }
                }
                Op::Delete(name) => {
                    let key = Key::from_name(&name);
                    let got = trie.delete(&key).ok().map(|(v, _)| v);
                    prop_assert_eq!(got, model.remove(&key));
                }
                Op::Replace(name, value) => {
                    let key = Key::from_name(&name);
                    let got = trie.replace(&key, value, value).ok().map(|(v, _)| v);
                    let expected = model.get_mut(&key).map(|v| std::mem::replace(v, value));
                    prop_assert_eq!(got, expected);
                }
                Op::Lookup(name) => {
                    let key = Key::from_name(&name);
                    match trie.lookup(&key) {
                        Lookup::Exact { entry, .. } => {
                            prop_assert_eq!(Some(entry.value()), model.get(&key));
                        }
                        Lookup::Ancestor { entry, labels, .. } => {
                            prop_assert!(!model.contains_key(&key));
                            let expected = model_ancestor(&model, &key);
                            prop_assert_eq!(Some((entry.key(), entry.value())), expected);
                            prop_assert_eq!(labels, entry.key().label_count());
                        }
                        Lookup::NotFound => {
                            prop_assert!(!model.contains_key(&key));
                            prop_assert_eq!(model_ancestor(&model, &key), None);
                        }
                    }

                    let chain: Vec<&Key> = trie.ancestors(&key).iter().map(|e| e.key()).collect();
                    let expected: Vec<&Key> = model
                        .keys()
                        .filter(|k| k.is_ancestor_of(&key) || **k == key)
                        .collect();
                    prop_assert_eq!(chain, expected);
                }
                Op::Predecessor(name) => {
                    let key = Key::from_name(&name);
                    let expected = model
                        .range(..key.clone())
                        .next_back()
                        .or_else(|| model.iter().next_back())
                        .map(|(k, _)| k);
                    let got = trie.predecessor(&key).map(|(entry, _)| entry.key());
                    prop_assert_eq!(got, expected);
                }
                Op::Compact => trie.compact(),
            }

            prop_assert_eq!(trie.len(), model.len());
        }

        trie.check_invariants();
        let forward: Vec<(&Key, u32)> = trie.iter().map(|e| (e.key(), *e.value())).collect();
        let expected: Vec<(&Key, u32)> = model.iter().map(|(k, v)| (k, *v)).collect();
        prop_assert_eq!(&forward, &expected);

        let mut backward: Vec<(&Key, u32)> = trie.iter().rev().map(|e| (e.key(), *e.value())).collect();
        backward.reverse();
        prop_assert_eq!(backward, expected);
    }

    #[test]
    fn prop_cursor_retraces_its_steps(names in prop::collection::vec(arb_name(), 1..40), steps in prop::collection::vec(any::<bool>(), 0..80)) {
        let mut trie: Trie<()> = Trie::default();
        for name in &names {
            let _ = trie.insert_name(name, (), 0);
        }
        let keys: Vec<&Key> = trie.iter().map(|e| e.key()).collect();

        // Walk the cursor at random and compare with an index into the
        // sorted keys; None stands for having run off an end.
        let mut cursor = trie.cursor();
        let mut index: Option<isize> = None;
        let mut off_end: Option<bool> = None;
        for forward in steps {
            let got = if forward { cursor.next(&trie) } else { cursor.prev(&trie) };
            let got = got.unwrap().map(|e| e.key());
            let next = match (index, off_end) {
                (Some(i), _) => if forward { i + 1 } else { i - 1 },
                (None, Some(true)) => if forward { keys.len() as isize } else { keys.len() as isize - 1 },
                (None, Some(false)) => if forward { 0 } else { -1 },
                (None, None) => if forward { 0 } else { keys.len() as isize - 1 },
            };
            if next >= 0 && (next as usize) < keys.len() {
                prop_assert_eq!(got, Some(keys[next as usize]));
                index = Some(next);
            } else {
                prop_assert_eq!(got, None);
                index = None;
                off_end = Some(next >= 0);
            }
        }
    }
}
