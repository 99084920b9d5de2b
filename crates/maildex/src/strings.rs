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
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::disk::codec::{check_header, read_u16_be, read_u32_be, read_uvarint, write_uvarint};
use crate::disk::{FORMAT_VERSION, MAGIC_STRINGS};
use crate::error::FormatError;

/// Append-only set of strings with dense insertion-ordered indices.
///
/// Two instances exist per corpus: filenames (relative paths) and the
/// vocabulary (lower-cased words). For any string ever inserted,
/// `flatten().0[insert(s)] == s`.
#[derive(Debug, Default)]
pub struct StringTable {
    strings: HashMap<String, u32>,
    next: u32,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `s`, returning its index. Re-inserting returns the original
    /// index.
    pub fn insert(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.strings.get(s) {
            return idx;
        }
        let idx = self.next;
        self.strings.insert(s.to_string(), idx);
        self.next += 1;
        idx
    }

    /// Look up without inserting.
    pub fn index(&self, s: &str) -> Option<u32> {
        self.strings.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Flatten to insertion order: position `i` holds the string assigned
    /// index `i`. Also returns the maximum byte length over all entries.
    pub fn flatten(&self) -> (Vec<String>, usize) {
        let mut out = vec![String::new(); self.strings.len()];
        let mut max_len = 0usize;
        for (s, &idx) in &self.strings {
            max_len = max_len.max(s.len());
            out[idx as usize] = s.clone();
        }
        (out, max_len)
    }

    /// Serialise to `path`.
    ///
    /// ```text
    /// magic    u32 "STRS"
    /// version  u32
    /// nstrings u32
    /// max_len  u16
    /// entries: length varint, then UTF-8 bytes
    /// ```
    pub fn serialize(&self, path: &Path) -> Result<(), FormatError> {
        let (strings, max_len) = self.flatten();
        if strings.len() > u32::MAX as usize || max_len >= u16::MAX as usize {
            return Err(FormatError::TableTooLarge);
        }

        let mut out = Vec::with_capacity(10 + strings.iter().map(|s| s.len() + 2).sum::<usize>());
        out.extend_from_slice(&MAGIC_STRINGS.to_be_bytes());
        out.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_be_bytes());
        out.extend_from_slice(&(max_len as u16).to_be_bytes());
        for s in &strings {
            write_uvarint(&mut out, s.len() as u64)?;
            out.write_all(s.as_bytes())?;
        }

        fs::write(path, out)?;
        Ok(())
    }

    /// Load a serialised table as its flattened form.
    pub fn load(path: &Path, file: &'static str) -> Result<Vec<String>, FormatError> {
        let data = fs::read(path)?;
        let mut pos = 0usize;
        check_header(&data, &mut pos, file, MAGIC_STRINGS)?;
        let nstrings = read_u32_be(&data, &mut pos, file)? as usize;
        let max_len = read_u16_be(&data, &mut pos, file)? as usize;

        let mut strings = Vec::with_capacity(nstrings);
        for _ in 0..nstrings {
            let len = read_uvarint(&data, &mut pos, file)? as usize;
            if len > max_len || data.len() - pos < len {
                return Err(FormatError::Truncated { file });
            }
            let s = std::str::from_utf8(&data[pos..pos + len])
                .map_err(|_| FormatError::Truncated { file })?;
            strings.push(s.to_string());
            pos += len;
        }
        Ok(strings)
    }
}
