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

//! Query evaluation over the memory-mapped artifacts: conjunctive keyword
//! queries, prefix completion, and catalog retrieval.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::GzDecoder;

use super::codec::read_uvarint;
use super::CORPUS_INDEX;
use crate::disk::reader::IndexReader;
use crate::error::FormatError;
use crate::set::Set;
use crate::tokenize::is_stop_word;
use crate::types::{QueryResult, QueryWordMatch};

impl IndexReader {
    /// Evaluate a conjunctive keyword query.
    ///
    /// Stop words are skipped entirely; any remaining term absent from the
    /// vocabulary makes the result empty (strict AND, not an error). Each
    /// file's matches are ordered by offset; files are ordered by
    /// descending match count, then filename.
    pub fn query(&self, query_words: &[&str]) -> Result<Vec<QueryResult>, FormatError> {
        let mut per_term: Vec<HashMap<u32, Vec<QueryWordMatch>>> = Vec::new();
        for raw in query_words {
            let word = raw.to_lowercase();
            if is_stop_word(&word) {
                continue;
            }
            let Some(&offset) = self.word_offsets.get(&word) else {
                return Ok(Vec::new());
            };
            per_term.push(self.read_postings(&word, offset)?);
        }
        if per_term.is_empty() {
            return Ok(Vec::new());
        }

        let mut files: Set<u32> = per_term[0].keys().copied().collect();
        for term in &per_term[1..] {
            let keys: Set<u32> = term.keys().copied().collect();
            files = files.intersect(&keys);
        }

        let mut results = Vec::with_capacity(files.len());
        for &fidx in files.iter() {
            let mut word_matches = Vec::new();
            for term in &per_term {
                for m in term.get(&fidx).into_iter().flatten() {
                    word_matches.push(m.clone());
                }
            }
            word_matches.sort_by_key(|m| m.offset);
            results.push(QueryResult {
                filename: self.filenames[fidx as usize].clone(),
                filename_index: fidx,
                word_matches,
            });
        }
        results.sort_by(|a, b| {
            b.word_matches
                .len()
                .cmp(&a.word_matches.len())
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(results)
    }

    /// Decode one word's posting list at `offset`, using a cursor local to
    /// this call so concurrent queries never contend.
    fn read_postings(
        &self,
        word: &str,
        offset: u64,
    ) -> Result<HashMap<u32, Vec<QueryWordMatch>>, FormatError> {
        let buf: &[u8] = &self.index;
        let mut pos = offset as usize;

        let num_matches = read_uvarint(buf, &mut pos, CORPUS_INDEX)?;
        let mut out = HashMap::new();
        for _ in 0..num_matches {
            let fidx = read_uvarint(buf, &mut pos, CORPUS_INDEX)?;
            if fidx >= self.filenames.len() as u64 {
                return Err(FormatError::OutOfRange {
                    what: "filename index in posting",
                });
            }
            let num_offsets = read_uvarint(buf, &mut pos, CORPUS_INDEX)?;
            let mut matches = Vec::new();
            for _ in 0..num_offsets {
                let off = read_uvarint(buf, &mut pos, CORPUS_INDEX)?;
                matches.push(QueryWordMatch {
                    word: word.to_string(),
                    offset: off as u32,
                });
            }
            out.insert(fidx as u32, matches);
        }
        Ok(out)
    }

    /// Prefix completion over the indexed vocabulary, lexicographically
    /// ordered. Empty when no trie was loaded. `limit` of `None` returns
    /// everything.
    pub fn prefix(&self, prefix: &str, limit: Option<usize>) -> Vec<String> {
        let Some(trie) = &self.trie else {
            return Vec::new();
        };
        if limit == Some(0) {
            return Vec::new();
        }
        let folded = prefix.to_lowercase();
        let mut words: Vec<String> = trie
            .with_prefix(&folded)
            .into_iter()
            .filter(|w| !is_stop_word(w))
            .collect();
        if let Some(n) = limit {
            words.truncate(n);
        }
        words
    }

    /// Decompress the stored body for `filename_index`. `None` when the
    /// index is out of range, no body was stored, or the payload fails to
    /// decode.
    pub fn content(&self, filename_index: u32) -> Option<(Vec<u8>, &str)> {
        let entry = self.catalog_entries.get(filename_index as usize)?;
        if entry.offset == 0 && entry.length == 0 {
            return None;
        }
        let start = entry.offset as usize;
        if start > self.catalog.len() {
            return None;
        }

        let mut body = vec![0u8; entry.length as usize];
        let mut dec = GzDecoder::new(&self.catalog[start..]);
        dec.read_exact(&mut body).ok()?;
        Some((body, self.filenames[filename_index as usize].as_str()))
    }
}
