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

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;

use super::codec::{check_header, read_i64_be, read_u32_be, read_u64_be};
use super::{
    CORPUS_CATALOG, CORPUS_INDEX, FILENAMES_TABLE, INDEX_HEADER_LEN, MAGIC_CATALOG, MAGIC_INDEX,
    MAGIC_OFFSETS, QUERY_TRIE, WORDS_TABLE, WORD_OFFSETS,
};
use crate::error::FormatError;
use crate::strings::StringTable;
use crate::trie::Trie;

/// One catalog directory entry. `(0, 0)` means no body is stored for that
/// file (its ingestion failed).
#[derive(Debug, Clone, Copy)]
pub(crate) struct CatalogEntry {
    pub offset: u32,
    pub length: u32,
}

/// Read side of an artifact directory.
///
/// The string tables and directories are owned in memory; the main index
/// and the catalog are memory-mapped and decoded lazily. Nothing is mutated
/// after open, so a reader is safe to share across threads; every query
/// decodes through its own local cursor into the mapping.
pub struct IndexReader {
    pub(crate) filenames: Vec<String>,
    words: Vec<String>,
    pub(crate) word_offsets: HashMap<String, u64>,
    pub(crate) trie: Option<Trie>,
    pub(crate) index: Mmap,
    pub(crate) catalog: Mmap,
    pub(crate) catalog_entries: Vec<CatalogEntry>,
    corpus_size: u32,
}

impl IndexReader {
    /// Open an index directory, verifying every artifact header.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FormatError> {
        let dir = dir.as_ref();

        let filenames = StringTable::load(&dir.join(FILENAMES_TABLE), FILENAMES_TABLE)?;
        log::debug!("loaded filename table: {} entries", filenames.len());

        let words = StringTable::load(&dir.join(WORDS_TABLE), WORDS_TABLE)?;
        log::debug!("loaded word table: {} entries", words.len());

        let offsets = load_offsets_table(&dir.join(WORD_OFFSETS))?;
        if offsets.len() != words.len() {
            return Err(FormatError::SizeMismatch {
                what: "word offset directory",
                expected: words.len(),
                found: offsets.len(),
            });
        }
        let mut word_offsets = HashMap::with_capacity(words.len());
        for (word_index, byte_offset) in offsets {
            let word = words
                .get(word_index as usize)
                .ok_or(FormatError::OutOfRange {
                    what: "word index in offset directory",
                })?;
            if byte_offset < INDEX_HEADER_LEN as i64 {
                return Err(FormatError::OutOfRange {
                    what: "word byte offset",
                });
            }
            word_offsets.insert(word.clone(), byte_offset as u64);
        }

        // The trie is optional; without it prefix completion is disabled.
        let trie = match fs::read(dir.join(QUERY_TRIE)) {
            Ok(data) => Some(Trie::deserialize(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let index = map_file(&dir.join(CORPUS_INDEX))?;
        let mut pos = 0usize;
        check_header(&index, &mut pos, CORPUS_INDEX, MAGIC_INDEX)?;
        let num_entries = read_u64_be(&index, &mut pos, CORPUS_INDEX)?;
        if num_entries != words.len() as u64 {
            return Err(FormatError::SizeMismatch {
                what: "main index entries",
                expected: words.len(),
                found: num_entries as usize,
            });
        }
        let corpus_size = read_u32_be(&index, &mut pos, CORPUS_INDEX)?;

        let catalog = map_file(&dir.join(CORPUS_CATALOG))?;
        let mut pos = 0usize;
        check_header(&catalog, &mut pos, CORPUS_CATALOG, MAGIC_CATALOG)?;
        let num_catalog = read_u32_be(&catalog, &mut pos, CORPUS_CATALOG)? as usize;
        if num_catalog != filenames.len() {
            return Err(FormatError::SizeMismatch {
                what: "catalog entries",
                expected: filenames.len(),
                found: num_catalog,
            });
        }
        let mut catalog_entries = Vec::with_capacity(num_catalog);
        for _ in 0..num_catalog {
            let offset = read_u32_be(&catalog, &mut pos, CORPUS_CATALOG)?;
            let length = read_u32_be(&catalog, &mut pos, CORPUS_CATALOG)?;
            catalog_entries.push(CatalogEntry { offset, length });
        }

        log::debug!(
            "opened index: {} documents, {} words",
            corpus_size,
            words.len()
        );
        Ok(IndexReader {
            filenames,
            words,
            word_offsets,
            trie,
            index,
            catalog,
            catalog_entries,
            corpus_size,
        })
    }

    /// Number of documents the index was built from.
    pub fn corpus_size(&self) -> u32 {
        self.corpus_size
    }

    /// Filenames in index order.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Indexed vocabulary in insertion order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True when prefix completion is available.
    pub fn has_trie(&self) -> bool {
        self.trie.is_some()
    }

    /// Release the mappings and in-memory directories.
    pub fn close(self) {}
}

fn map_file(path: &Path) -> Result<Mmap, FormatError> {
    let f = File::open(path)?;
    // Safety: the artifact files are written once and never mutated after
    // the build; the process only maps them for reading.
    let mmap = unsafe { Mmap::map(&f)? };
    Ok(mmap)
}

fn load_offsets_table(path: &Path) -> Result<Vec<(u32, i64)>, FormatError> {
    let data = fs::read(path)?;
    let mut pos = 0usize;
    check_header(&data, &mut pos, WORD_OFFSETS, MAGIC_OFFSETS)?;
    let num_entries = read_u32_be(&data, &mut pos, WORD_OFFSETS)? as usize;

    let mut out = Vec::with_capacity(num_entries);
    for _ in 0..num_entries {
        let word_index = read_u32_be(&data, &mut pos, WORD_OFFSETS)?;
        let byte_offset = read_i64_be(&data, &mut pos, WORD_OFFSETS)?;
        out.push((word_index, byte_offset));
    }
    Ok(out)
}
