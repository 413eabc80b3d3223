// Keyscope
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<u8, usize>,
    /// Index into `PrefixTrie::prefixes` when a prefix ends here.
    terminal: Option<usize>,
}

/// Byte trie over known prefixes, answering longest-prefix queries in O(key length).
#[derive(Debug, Clone)]
pub struct PrefixTrie {
    nodes: Vec<TrieNode>,
    prefixes: Vec<String>,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            prefixes: Vec::new(),
        }
    }

    pub fn insert(&mut self, prefix: &str) {
        let mut node = 0;
        for &byte in prefix.as_bytes() {
            node = match self.nodes[node].children.get(&byte) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(byte, next);
                    next
                }
            };
        }

        if self.nodes[node].terminal.is_none() {
            self.nodes[node].terminal = Some(self.prefixes.len());
            self.prefixes.push(prefix.to_string());
        }
    }

    /// Deepest terminal node reached while walking `key`.
    pub fn longest_match(&self, key: &str) -> Option<&str> {
        let mut node = 0;
        let mut best = self.nodes[0].terminal;

        for byte in key.as_bytes() {
            match self.nodes[node].children.get(byte) {
                Some(&next) => {
                    node = next;
                    if let Some(terminal) = self.nodes[node].terminal {
                        best = Some(terminal);
                    }
                }
                None => break,
            }
        }

        best.map(|index| self.prefixes[index].as_str())
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for PrefixTrie {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut trie = Self::new();
        for prefix in iter {
            trie.insert(prefix);
        }
        trie
    }
}
