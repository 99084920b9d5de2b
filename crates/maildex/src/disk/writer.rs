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

//! Phased serialisation of the builder state into an artifact directory.
//!
//! Write order is fixed: filename table, word table, main index together
//! with the word-offset directory, catalog, prefix trie. Width overflows
//! panic rather than truncate; the builder must never produce a corrupt
//! artifact.

use std::fs::{self, File};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::codec::write_uvarint;
use super::{
    CATALOG_HEADER_LEN, CORPUS_CATALOG, CORPUS_INDEX, FILENAMES_TABLE, FORMAT_VERSION,
    INDEX_HEADER_LEN, MAGIC_CATALOG, MAGIC_INDEX, MAGIC_OFFSETS, QUERY_TRIE, WORDS_TABLE,
    WORD_OFFSETS,
};
use crate::index::IndexBuilder;
use crate::trie::Trie;
use crate::types::{SerializePhase, SerializeUpdate};

pub struct IndexWriter {
    dir: PathBuf,
}

impl IndexWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        IndexWriter {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn write(&self, ib: &IndexBuilder) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output directory {}", self.dir.display()))?;

        log::info!("serializing filename string table");
        ib.serialize_update(SerializeUpdate::Begin {
            phase: SerializePhase::Filenames,
            total: ib.filenames.len(),
        });
        ib.filenames
            .serialize(&self.dir.join(FILENAMES_TABLE))
            .context("serialize filename table")?;
        ib.serialize_update(SerializeUpdate::End {
            phase: SerializePhase::Filenames,
        });

        log::info!("serializing word string table");
        ib.serialize_update(SerializeUpdate::Begin {
            phase: SerializePhase::Words,
            total: ib.words.len(),
        });
        ib.words
            .serialize(&self.dir.join(WORDS_TABLE))
            .context("serialize word table")?;
        ib.serialize_update(SerializeUpdate::End {
            phase: SerializePhase::Words,
        });

        self.write_index_and_offsets(ib)?;
        self.write_catalog(ib)?;
        self.write_trie(ib)?;
        Ok(())
    }

    /// The main index and the word-offset directory are written together so
    /// each word's byte position is captured as the index file is appended
    /// to.
    fn write_index_and_offsets(&self, ib: &IndexBuilder) -> Result<()> {
        assert_eq!(
            ib.words.len(),
            ib.word_index.len(),
            "word table and inverted index disagree"
        );

        log::info!("serializing index ({} words)", ib.word_index.len());
        let f = File::create(self.dir.join(CORPUS_INDEX)).context("create corpus index")?;
        let mut w = BufWriter::new(f);
        w.write_all(&MAGIC_INDEX.to_be_bytes())?;
        w.write_all(&FORMAT_VERSION.to_be_bytes())?;
        w.write_all(&(ib.word_index.len() as u64).to_be_bytes())?;
        w.write_all(&ib.n_docs.to_be_bytes())?;

        ib.serialize_update(SerializeUpdate::Begin {
            phase: SerializePhase::Index,
            total: ib.word_index.len(),
        });

        let mut offsets: Vec<(u32, i64)> = vec![(0, 0); ib.words.len()];
        let mut pos = INDEX_HEADER_LEN;
        let mut entry = Vec::new();
        for (word, matches) in &ib.word_index {
            let widx = ib
                .words
                .index(word)
                .expect("indexed word missing from word table");
            offsets[widx as usize] = (widx, pos as i64);

            entry.clear();
            write_uvarint(&mut entry, matches.len() as u64)?;
            for m in matches {
                write_uvarint(&mut entry, m.filename_index as u64)?;
                write_uvarint(&mut entry, m.offsets.len() as u64)?;
                for &off in &m.offsets {
                    write_uvarint(&mut entry, off as u64)?;
                }
            }
            w.write_all(&entry)?;
            pos += entry.len() as u64;

            ib.serialize_update(SerializeUpdate::Progress {
                phase: SerializePhase::Index,
                n: 1,
            });
        }
        w.flush()?;
        ib.serialize_update(SerializeUpdate::End {
            phase: SerializePhase::Index,
        });

        log::info!("serializing word offsets");
        write_offsets_file(&offsets, &self.dir.join(WORD_OFFSETS))
    }

    fn write_catalog(&self, ib: &IndexBuilder) -> Result<()> {
        if ib.ingested.len() > u32::MAX as usize {
            panic!("number of documents exceeds file format limits");
        }
        let n = ib.ingested.len();
        log::info!("serializing catalog ({n} documents)");

        let f = File::create(self.dir.join(CORPUS_CATALOG)).context("create corpus catalog")?;
        let mut w = BufWriter::new(f);
        w.write_all(&MAGIC_CATALOG.to_be_bytes())?;
        w.write_all(&FORMAT_VERSION.to_be_bytes())?;
        w.write_all(&(n as u32).to_be_bytes())?;
        // Placeholder directory, patched once payload offsets are known.
        w.write_all(&vec![0u8; n * 8])?;

        ib.serialize_update(SerializeUpdate::Begin {
            phase: SerializePhase::Catalog,
            total: n,
        });

        let mut entries: Vec<(u32, u32)> = vec![(0, 0); n];
        let mut foffset = u32::try_from(CATALOG_HEADER_LEN + n * 8)
            .unwrap_or_else(|_| panic!("catalog directory exceeds file format limits"));
        for item in &ib.ingested {
            if item.error.is_some() {
                continue;
            }
            let fidx = ib
                .filenames
                .index(&item.filename)
                .expect("ingested file missing from filename table");
            entries[fidx as usize] = (foffset, item.len);

            w.write_all(&item.compressed)?;
            let clen = u32::try_from(item.compressed.len())
                .unwrap_or_else(|_| panic!("compressed content exceeds file format limits"));
            foffset = foffset
                .checked_add(clen)
                .unwrap_or_else(|| panic!("catalog offset overflow"));

            ib.serialize_update(SerializeUpdate::Progress {
                phase: SerializePhase::Catalog,
                n: 1,
            });
        }

        // Patch the directory in place.
        let mut f = w
            .into_inner()
            .map_err(|e| e.into_error())
            .context("flush corpus catalog")?;
        f.seek(SeekFrom::Start(CATALOG_HEADER_LEN as u64))?;
        let mut dir_bytes = Vec::with_capacity(n * 8);
        for (offset, length) in &entries {
            dir_bytes.extend_from_slice(&offset.to_be_bytes());
            dir_bytes.extend_from_slice(&length.to_be_bytes());
        }
        f.write_all(&dir_bytes)?;

        ib.serialize_update(SerializeUpdate::End {
            phase: SerializePhase::Catalog,
        });
        Ok(())
    }

    fn write_trie(&self, ib: &IndexBuilder) -> Result<()> {
        let (words, _) = ib.words.flatten();
        log::info!("serializing prefix trie ({} words)", words.len());
        ib.serialize_update(SerializeUpdate::Begin {
            phase: SerializePhase::Trie,
            total: words.len(),
        });

        let mut trie = Trie::new();
        for word in &words {
            trie.insert(word);
        }

        let f = File::create(self.dir.join(QUERY_TRIE)).context("create query trie")?;
        let mut w = BufWriter::new(f);
        trie.serialize(&mut w)?;
        w.flush()?;

        ib.serialize_update(SerializeUpdate::End {
            phase: SerializePhase::Trie,
        });
        Ok(())
    }
}

fn write_offsets_file(offsets: &[(u32, i64)], path: &Path) -> Result<()> {
    if offsets.len() > u32::MAX as usize {
        panic!("number of words exceeds file format limits");
    }

    let mut out = Vec::with_capacity(12 + offsets.len() * 12);
    out.extend_from_slice(&MAGIC_OFFSETS.to_be_bytes());
    out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    out.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for (word_index, byte_offset) in offsets {
        out.extend_from_slice(&word_index.to_be_bytes());
        out.extend_from_slice(&byte_offset.to_be_bytes());
    }
    fs::write(path, out).context("write word offsets")?;
    Ok(())
}
