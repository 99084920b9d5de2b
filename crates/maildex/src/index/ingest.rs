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

//! Parallel per-file ingestion: parse, compress, tokenise.
//!
//! One producer feeds a bounded channel, `N` workers consume, and the
//! caller's thread collects. Workers own a reusable scratch buffer sized to
//! the largest input file so steady-state ingestion does not allocate per
//! file. Worker completion order is arbitrary; the caller re-sorts by
//! filename before merging.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::thread;

use crossbeam_channel::{bounded, unbounded, Sender};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::IngestError;
use crate::tokenize::{should_index, word_spans};
use crate::types::{IngestPhase, IngestUpdate};

/// Output of one ingestion worker. Errored items still occupy a slot so
/// filename indices stay dense.
#[derive(Debug)]
pub(crate) struct IngestedFile {
    pub filename: String,
    /// word -> body byte offsets, in source order.
    pub postings: BTreeMap<String, Vec<u32>>,
    /// Uncompressed body length.
    pub len: u32,
    /// Gzip-compressed copy of the body, held until the catalog is written.
    pub compressed: Vec<u8>,
    pub error: Option<IngestError>,
}

/// Run the worker pool over `files` and collect the results, unsorted.
pub(crate) fn ingest_files(
    root: &Path,
    files: Vec<String>,
    max_size: u64,
    threads: usize,
    progress: Option<&Sender<IngestUpdate>>,
) -> Vec<IngestedFile> {
    let total = files.len();
    let (work_tx, work_rx) = bounded::<String>(threads);
    let (out_tx, out_rx) = unbounded::<IngestedFile>();

    let mut out = Vec::with_capacity(total);
    thread::scope(|s| {
        for _ in 0..threads {
            let work_rx = work_rx.clone();
            let out_tx = out_tx.clone();
            s.spawn(move || {
                let mut scratch = vec![0u8; max_size as usize];
                for filename in work_rx.iter() {
                    if out_tx.send(ingest_one(root, filename, &mut scratch)).is_err() {
                        return;
                    }
                }
            });
        }
        drop(out_tx);
        drop(work_rx);

        s.spawn(move || {
            for filename in files {
                if work_tx.send(filename).is_err() {
                    return;
                }
            }
        });

        for item in out_rx.iter() {
            if let Some(tx) = progress {
                tx.send(IngestUpdate {
                    filename: item.filename.clone(),
                    success: item.error.is_none(),
                    phase: IngestPhase::Ingest,
                })
                .ok();
            }
            out.push(item);
        }
    });
    out
}

fn ingest_one(root: &Path, filename: String, scratch: &mut [u8]) -> IngestedFile {
    let mut item = IngestedFile {
        filename,
        postings: BTreeMap::new(),
        len: 0,
        compressed: Vec::new(),
        error: None,
    };

    let n = match read_into(&root.join(&item.filename), scratch) {
        Ok(n) => n,
        Err(e) => {
            item.error = Some(IngestError::Io(e));
            return item;
        }
    };

    let Some(body_start) = body_offset(&scratch[..n]) else {
        item.error = Some(IngestError::MalformedMessage);
        return item;
    };
    let body = &scratch[body_start..n];
    if body.len() > u32::MAX as usize {
        panic!("message body exceeds file format limits");
    }

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    let compressed = match enc.write_all(body) {
        Ok(()) => enc.finish(),
        Err(e) => Err(e),
    };
    match compressed {
        Ok(buf) => item.compressed = buf,
        Err(e) => {
            item.error = Some(IngestError::Compress(e));
            return item;
        }
    }

    item.len = body.len() as u32;
    item.postings = compute_postings(body);
    item
}

/// Fill `scratch` from the file at `path`, returning the bytes read. The
/// buffer is sized to the largest file seen by the walk, so hitting its end
/// means the file grew since then; the overflow is ignored.
fn read_into(path: &Path, scratch: &mut [u8]) -> std::io::Result<usize> {
    let mut f = File::open(path)?;
    let mut off = 0;
    loop {
        if off == scratch.len() {
            return Ok(off);
        }
        match f.read(&mut scratch[off..]) {
            Ok(0) => return Ok(off),
            Ok(n) => off += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Byte offset of the message body: everything after the first blank line
/// (LF or CRLF). `None` when the separator is missing.
fn body_offset(data: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\n' {
            let rest = &data[i + 1..];
            if rest.first() == Some(&b'\n') {
                return Some(i + 2);
            }
            if rest.starts_with(b"\r\n") {
                return Some(i + 3);
            }
        }
        i += 1;
    }
    None
}

/// Tokenise a body into per-file postings: lower-cased word -> offsets.
fn compute_postings(body: &[u8]) -> BTreeMap<String, Vec<u32>> {
    let mut postings: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (start, end) in word_spans(body) {
        let Ok(word) = std::str::from_utf8(&body[start..end]) else {
            continue;
        };
        let folded = word.to_lowercase();
        if !should_index(&folded) {
            continue;
        }
        postings.entry(folded).or_default().push(start as u32);
    }
    postings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_offset_lf_and_crlf() {
        assert_eq!(body_offset(b"Subject: s\n\nbody"), Some(12));
        assert_eq!(body_offset(b"Subject: s\r\n\r\nbody"), Some(14));
        assert_eq!(body_offset(b"no separator here"), None);
        assert_eq!(body_offset(b""), None);
    }

    #[test]
    fn body_offset_empty_body() {
        let data = b"Subject: s\n\n";
        assert_eq!(body_offset(data), Some(12));
    }

    #[test]
    fn postings_offsets_are_body_relative() {
        let postings = compute_postings(b"fraud presentation here");
        assert_eq!(postings["fraud"], vec![0]);
        assert_eq!(postings["presentation"], vec![6]);
        assert_eq!(postings["here"], vec![19]);
    }

    #[test]
    fn postings_fold_case_and_filter() {
        let postings = compute_postings(b"The Sales SALES sales at it ok");
        // "the", "at", "it" are stop words; "ok" is too short.
        assert_eq!(postings.len(), 1);
        assert_eq!(postings["sales"], vec![4, 10, 16]);
    }

    #[test]
    fn postings_offsets_sorted_per_word() {
        let postings = compute_postings(b"alpha beta alpha gamma alpha");
        assert_eq!(postings["alpha"], vec![0, 11, 23]);
    }
}
