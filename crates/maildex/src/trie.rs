// Copyright 2025 Maildex Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Character trie over the indexed vocabulary, used for prefix completion.
//!
//! Nodes live in an arena indexed by `u32` handles with the root at 0.
//! Children are keyed by codepoint in a `BTreeMap`, so serialisation emits
//! them in sorted order and the on-disk form is deterministic.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::disk::codec::{check_header, read_u16_be, read_u32_be};
use crate::disk::{FORMAT_VERSION, MAGIC_TRIE};
use crate::error::FormatError;
use crate::tokenize::decode_char;

const ROOT: u32 = 0;

#[derive(Debug, Default)]
struct TrieNode {
    terminal: bool,
    children: BTreeMap<char, u32>,
}

#[derive(Debug)]
pub struct Trie {
    nodes: Vec<TrieNode>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Trie {
            nodes: vec![TrieNode::default()],
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert a word, creating nodes as needed. The empty word marks the
    /// root terminal, which is permitted and harmless.
    pub fn insert(&mut self, word: &str) {
        let mut current = ROOT;
        for ch in word.chars() {
            current = match self.nodes[current as usize].children.get(&ch).copied() {
                Some(child) => child,
                None => {
                    let child = self.nodes.len() as u32;
                    self.nodes.push(TrieNode::default());
                    self.nodes[current as usize].children.insert(ch, child);
                    child
                }
            };
        }
        self.nodes[current as usize].terminal = true;
    }

    /// True iff `word` was inserted (prefixes of inserted words are not
    /// members).
    pub fn has(&self, word: &str) -> bool {
        match self.descend(word) {
            Some(node) => self.nodes[node as usize].terminal,
            None => false,
        }
    }

    /// Every inserted word starting with `prefix`, in codepoint-sorted
    /// order. The empty prefix enumerates the whole vocabulary.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut out = Vec::new();
        let Some(node) = self.descend(prefix) else {
            return out;
        };
        let mut buf = String::from(prefix);
        self.collect(node, &mut buf, &mut out);
        out
    }

    fn descend(&self, path: &str) -> Option<u32> {
        let mut current = ROOT;
        for ch in path.chars() {
            current = *self.nodes[current as usize].children.get(&ch)?;
        }
        Some(current)
    }

    fn collect(&self, node: u32, buf: &mut String, out: &mut Vec<String>) {
        let n = &self.nodes[node as usize];
        if n.terminal {
            out.push(buf.clone());
        }
        for (&ch, &child) in &n.children {
            buf.push(ch);
            self.collect(child, buf, out);
            buf.pop();
        }
    }

    /// Serialise the trie.
    ///
    /// ```text
    /// magic      u32 "TRIE"
    /// version    u32
    /// num_nodes  u32
    /// root node:
    ///   is_terminal  u8
    ///   num_children u16
    ///   children sorted by codepoint: UTF-8 rune, then the child node
    /// ```
    pub fn serialize<W: Write>(&self, w: &mut W) -> io::Result<()> {
        assert!(
            self.nodes.len() <= u32::MAX as usize,
            "trie node count exceeds file format limits"
        );
        w.write_all(&MAGIC_TRIE.to_be_bytes())?;
        w.write_all(&FORMAT_VERSION.to_be_bytes())?;
        w.write_all(&(self.nodes.len() as u32).to_be_bytes())?;
        self.write_node(ROOT, w)
    }

    fn write_node<W: Write>(&self, node: u32, w: &mut W) -> io::Result<()> {
        let n = &self.nodes[node as usize];
        assert!(
            n.children.len() <= u16::MAX as usize,
            "trie fan-out exceeds file format limits"
        );
        w.write_all(&[n.terminal as u8])?;
        w.write_all(&(n.children.len() as u16).to_be_bytes())?;
        let mut rune = [0u8; 4];
        for (&ch, &child) in &n.children {
            w.write_all(ch.encode_utf8(&mut rune).as_bytes())?;
            self.write_node(child, w)?;
        }
        Ok(())
    }

    pub fn deserialize(data: &[u8]) -> Result<Trie, FormatError> {
        const FILE: &str = "query.trie";
        let mut pos = 0usize;
        check_header(data, &mut pos, FILE, MAGIC_TRIE)?;
        let num_nodes = read_u32_be(data, &mut pos, FILE)? as usize;

        let mut trie = Trie { nodes: Vec::new() };
        trie.read_node(data, &mut pos)?;
        if trie.nodes.len() != num_nodes {
            return Err(FormatError::OutOfRange {
                what: "trie node count",
            });
        }
        Ok(trie)
    }

    fn read_node(&mut self, data: &[u8], pos: &mut usize) -> Result<u32, FormatError> {
        const FILE: &str = "query.trie";
        if *pos >= data.len() {
            return Err(FormatError::Truncated { file: FILE });
        }
        let terminal = data[*pos] != 0;
        *pos += 1;
        let num_children = read_u16_be(data, pos, FILE)?;

        let node = self.nodes.len() as u32;
        self.nodes.push(TrieNode {
            terminal,
            children: BTreeMap::new(),
        });
        for _ in 0..num_children {
            let (ch, width) =
                decode_char(&data[*pos..]).ok_or(FormatError::Truncated { file: FILE })?;
            *pos += width;
            let child = self.read_node(data, pos)?;
            self.nodes[node as usize].children.insert(ch, child);
        }
        Ok(node)
    }
}
