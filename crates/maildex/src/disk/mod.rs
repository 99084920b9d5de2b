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

//! On-disk artifact formats: constants, codec helpers, writer and reader.
//!
//! All fixed-width integers are big-endian; varints are unsigned LEB128.
//! Every artifact opens with a `u32` magic and a `u32` version.

pub mod codec;
pub mod reader;
pub(crate) mod searcher;
pub(crate) mod writer;

/// Artifact file names within an index directory.
pub const FILENAMES_TABLE: &str = "filenames.sid";
pub const WORDS_TABLE: &str = "words.sid";
pub const CORPUS_INDEX: &str = "corpus.index";
pub const WORD_OFFSETS: &str = "word.offsets";
pub const CORPUS_CATALOG: &str = "corpus.cat";
pub const QUERY_TRIE: &str = "query.trie";

/// "STRS"
pub const MAGIC_STRINGS: u32 = 0x5354_5253;
/// "INDX"
pub const MAGIC_INDEX: u32 = 0x494e_4458;
/// "WRDO"
pub const MAGIC_OFFSETS: u32 = 0x5752_444f;
/// "CTLG"
pub const MAGIC_CATALOG: u32 = 0x4354_4c47;
/// "TRIE"
pub const MAGIC_TRIE: u32 = 0x5452_4945;

pub const FORMAT_VERSION: u32 = 1;

/// Size of the main index header: magic + version + NumEntries u64 +
/// CorpusSize u32. Word offsets always point past it.
pub(crate) const INDEX_HEADER_LEN: u64 = 20;

/// Size of the catalog header before the entry directory.
pub(crate) const CATALOG_HEADER_LEN: usize = 12;
