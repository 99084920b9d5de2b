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

use std::error::Error;
use std::fmt::{self, Display};

/// Typed errors for the on-disk artifact formats. Returned when opening or
/// decoding any of the index files fails structurally, as opposed to plain
/// storage failures which are carried in the `Io` variant.
#[derive(Debug)]
pub enum FormatError {
    /// The leading magic number did not match the expected artifact type.
    BadMagic {
        file: &'static str,
        expected: u32,
        found: u32,
    },
    /// The artifact version is not supported by this build.
    BadVersion { file: &'static str, found: u32 },
    /// The file ended before a declared structure was fully read.
    Truncated { file: &'static str },
    /// Two directories that must agree in size do not.
    SizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// A decoded index or offset points outside its table.
    OutOfRange { what: &'static str },
    /// A varint ran past its maximum encoded width.
    BadVarint { file: &'static str },
    /// A string table too large for the declared field widths.
    TableTooLarge,
    /// Underlying storage failure.
    Io(std::io::Error),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadMagic {
                file,
                expected,
                found,
            } => write!(
                f,
                "{file}: bad magic number {found:#010x}, expected {expected:#010x}"
            ),
            FormatError::BadVersion { file, found } => {
                write!(f, "{file}: unsupported version {found}")
            }
            FormatError::Truncated { file } => write!(f, "{file}: truncated"),
            FormatError::SizeMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what}: expected {expected} entries, found {found}"),
            FormatError::OutOfRange { what } => write!(f, "{what} out of range"),
            FormatError::BadVarint { file } => write!(f, "{file}: varint overruns 64 bits"),
            FormatError::TableTooLarge => {
                write!(f, "string table exceeds the on-disk format limits")
            }
            FormatError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FormatError {
    fn from(e: std::io::Error) -> Self {
        FormatError::Io(e)
    }
}

/// Per-file ingestion failure. Recorded on the ingested item; never aborts
/// the build. The file keeps its filename-table slot and serialises an
/// absent `(0, 0)` catalog entry.
#[derive(Debug)]
pub enum IngestError {
    /// The file could not be opened or read.
    Io(std::io::Error),
    /// No header/body separator was found, so the input is not a message.
    MalformedMessage,
    /// Compressing the body failed.
    Compress(std::io::Error),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Io(e) => write!(f, "read failed: {e}"),
            IngestError::MalformedMessage => write!(f, "no header/body separator"),
            IngestError::Compress(e) => write!(f, "gzip failed: {e}"),
        }
    }
}

impl Error for IngestError {}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        IngestError::Io(e)
    }
}
