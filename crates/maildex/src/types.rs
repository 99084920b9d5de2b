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

use serde::Serialize;

/// One matched query word at a byte offset within a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryWordMatch {
    pub word: String,
    /// Byte offset of the word within the body, not the file.
    pub offset: u32,
}

/// All matches for one file, grouped and ordered by offset.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub filename: String,
    pub filename_index: u32,
    pub word_matches: Vec<QueryWordMatch>,
}

impl QueryResult {
    /// Byte spans `(start, end)` of each matched word inside the body,
    /// suitable for highlighting over the catalog content.
    pub fn highlight_spans(&self) -> Vec<(u32, u32)> {
        self.word_matches
            .iter()
            .map(|m| (m.offset, m.offset + m.word.len() as u32))
            .collect()
    }
}

/// A posting: one file containing a word, with the word's byte offsets in
/// source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub filename_index: u32,
    pub offsets: Vec<u32>,
}

/// Which half of ingestion a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    /// Parallel per-file work: parse, compress, tokenise.
    Ingest,
    /// Serial merge of the sorted results into the global index.
    Merge,
}

/// Outbound progress event for one file during ingestion.
#[derive(Debug, Clone)]
pub struct IngestUpdate {
    pub filename: String,
    pub success: bool,
    pub phase: IngestPhase,
}

/// Serialisation phases, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializePhase {
    Filenames,
    Words,
    Index,
    Catalog,
    Trie,
}

/// Outbound progress event for the serialiser.
#[derive(Debug, Clone, Copy)]
pub enum SerializeUpdate {
    Begin { phase: SerializePhase, total: usize },
    Progress { phase: SerializePhase, n: usize },
    End { phase: SerializePhase },
}

/// Summary returned by a completed build.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildStats {
    /// Files discovered by the walk (after any cap).
    pub files: usize,
    /// Files successfully parsed and merged into the index.
    pub indexed: u32,
    /// Files that failed to ingest and hold an empty catalog slot.
    pub errors: usize,
    /// Distinct indexed words.
    pub words: usize,
}
