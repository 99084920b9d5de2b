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

//! Index construction: walk, parallel ingest, deterministic merge.

pub(crate) mod ingest;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use rayon::slice::ParallelSliceMut;

use crate::disk::writer::IndexWriter;
use crate::index::ingest::IngestedFile;
use crate::strings::StringTable;
use crate::types::{BuildStats, IngestPhase, IngestUpdate, Match, SerializeUpdate};

/// Builds the on-disk artifacts for a corpus of email messages.
///
/// Two runs over the same input directory produce byte-identical artifacts:
/// the collector sorts worker output by filename and the merge iterates
/// per-file words in lexicographic order, so index assignment never depends
/// on scheduling.
pub struct IndexBuilder {
    input: PathBuf,
    threads: usize,
    max_files: Option<usize>,
    ingest_progress: Option<Sender<IngestUpdate>>,
    serialize_progress: Option<Sender<SerializeUpdate>>,

    pub(crate) filenames: StringTable,
    pub(crate) words: StringTable,
    /// word -> postings, ordered by filename index (merge order).
    pub(crate) word_index: BTreeMap<String, Vec<Match>>,
    pub(crate) ingested: Vec<IngestedFile>,
    /// Documents successfully processed and merged.
    pub(crate) n_docs: u32,
}

impl IndexBuilder {
    pub fn new(input: impl AsRef<Path>) -> Self {
        let avail = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        IndexBuilder {
            input: input.as_ref().to_path_buf(),
            threads: avail.min(8).max(1),
            max_files: None,
            ingest_progress: None,
            serialize_progress: None,
            filenames: StringTable::new(),
            words: StringTable::new(),
            word_index: BTreeMap::new(),
            ingested: Vec::new(),
            n_docs: 0,
        }
    }

    /// Worker thread count (minimum 1).
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = n.max(1);
        self
    }

    /// Stop walking after this many files.
    pub fn max_files(mut self, n: usize) -> Self {
        self.max_files = Some(n);
        self
    }

    /// Outbound per-file progress. Send failures are ignored; the channel
    /// is dropped (closed) when ingestion completes.
    pub fn ingest_progress(mut self, tx: Sender<IngestUpdate>) -> Self {
        self.ingest_progress = Some(tx);
        self
    }

    /// Outbound serialisation progress, dropped when serialisation
    /// completes.
    pub fn serialize_progress(mut self, tx: Sender<SerializeUpdate>) -> Self {
        self.serialize_progress = Some(tx);
        self
    }

    /// Enumerate input files (paths relative to the input root, sorted) and
    /// the size of the largest one.
    pub fn walk(&self) -> Result<(Vec<String>, u64)> {
        let mut files = Vec::new();
        let mut max_size = 0u64;

        let mut builder = ignore::WalkBuilder::new(&self.input);
        builder.standard_filters(false);
        builder.sort_by_file_path(std::cmp::Ord::cmp);
        for entry in builder.build() {
            let entry = entry?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            max_size = max_size.max(size);

            let rel = entry
                .path()
                .strip_prefix(&self.input)
                .unwrap_or(entry.path());
            files.push(rel.to_string_lossy().into_owned());

            if let Some(cap) = self.max_files {
                if files.len() >= cap {
                    break;
                }
            }
        }
        Ok((files, max_size))
    }

    /// Ingest `files` with the worker pool, then merge serially in sorted
    /// filename order.
    pub fn ingest(&mut self, files: Vec<String>, max_size: u64) -> Result<()> {
        if files.len() > u32::MAX as usize {
            panic!("number of files exceeds file format limits");
        }

        log::info!(
            "ingesting {} files with {} threads",
            files.len(),
            self.threads
        );
        let mut ingested = ingest::ingest_files(
            &self.input,
            files,
            max_size,
            self.threads,
            self.ingest_progress.as_ref(),
        );
        ingested.par_sort_by(|a, b| a.filename.cmp(&b.filename));
        self.ingested = ingested;

        for i in 0..self.ingested.len() {
            let fidx = self.filenames.insert(&self.ingested[i].filename);
            if let Some(err) = &self.ingested[i].error {
                log::warn!("failed to ingest {}: {}", self.ingested[i].filename, err);
                continue;
            }

            let item = &self.ingested[i];
            for (word, offsets) in &item.postings {
                self.words.insert(word);
                self.word_index.entry(word.clone()).or_default().push(Match {
                    filename_index: fidx,
                    offsets: offsets.clone(),
                });
            }
            self.n_docs += 1;

            if let Some(tx) = &self.ingest_progress {
                tx.send(IngestUpdate {
                    filename: self.ingested[i].filename.clone(),
                    success: true,
                    phase: IngestPhase::Merge,
                })
                .ok();
            }
        }

        // Close the progress channel so observers stop.
        self.ingest_progress.take();
        Ok(())
    }

    /// Serialise all artifacts into `dir`, creating it if needed.
    pub fn serialize(&mut self, dir: &Path) -> Result<()> {
        IndexWriter::new(dir)
            .write(self)
            .context("failed to serialize index")?;
        self.serialize_progress.take();
        Ok(())
    }

    /// Walk, ingest, and serialise in one shot.
    pub fn build(mut self, output_dir: &Path) -> Result<BuildStats> {
        let (files, max_size) = self.walk()?;
        self.ingest(files, max_size)?;
        self.serialize(output_dir)?;
        Ok(self.stats())
    }

    pub fn stats(&self) -> BuildStats {
        BuildStats {
            files: self.ingested.len(),
            indexed: self.n_docs,
            errors: self
                .ingested
                .iter()
                .filter(|f| f.error.is_some())
                .count(),
            words: self.words.len(),
        }
    }

    pub(crate) fn serialize_update(&self, update: SerializeUpdate) {
        if let Some(tx) = &self.serialize_progress {
            tx.send(update).ok();
        }
    }
}
