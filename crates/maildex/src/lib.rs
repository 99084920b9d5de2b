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

//! Full-text search over a directory of email messages.
//!
//! The builder walks an input directory, tokenises message bodies in
//! parallel, and serialises a set of binary artifacts: string tables for
//! filenames and vocabulary, a varint-encoded inverted index with a
//! word-offset directory, a gzip catalog of the original bodies, and a
//! prefix trie for completion. The reader memory-maps the artifacts and
//! answers conjunctive keyword queries, prefix completion, and body
//! retrieval without mutating any shared state.

pub mod disk;
pub mod error;
pub mod index;
pub mod set;
pub mod strings;
pub mod tokenize;
pub mod trie;
pub mod types;

pub use crate::disk::reader::IndexReader;
pub use crate::error::{FormatError, IngestError};
pub use crate::index::IndexBuilder;
pub use crate::set::Set;
pub use crate::strings::StringTable;
pub use crate::trie::Trie;
pub use crate::types::{
    BuildStats, IngestPhase, IngestUpdate, Match, QueryResult, QueryWordMatch, SerializePhase,
    SerializeUpdate,
};

/// One-shot convenience: walk `input_dir`, ingest with `threads` workers,
/// and serialise the artifacts into `output_dir`.
pub fn build_index(
    input_dir: impl AsRef<std::path::Path>,
    output_dir: impl AsRef<std::path::Path>,
    threads: usize,
    max_files: Option<usize>,
) -> anyhow::Result<BuildStats> {
    let mut builder = IndexBuilder::new(input_dir.as_ref()).threads(threads);
    if let Some(cap) = max_files {
        builder = builder.max_files(cap);
    }
    builder.build(output_dir.as_ref())
}
