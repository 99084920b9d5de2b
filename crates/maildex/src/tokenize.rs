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

//! Body tokenisation: maximal alphanumeric runs as byte spans.
//!
//! The scanner works on raw bytes so offsets are exact for the stored body
//! even when it contains invalid UTF-8; undecodable bytes act as word
//! separators.

/// High-frequency words excluded from the index and from query conjunction.
pub const STOP_WORDS: [&str; 20] = [
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at",
];

/// Case-insensitive stop word test. Whitespace and punctuation never match.
pub fn is_stop_word(word: &str) -> bool {
    let folded = word.to_lowercase();
    STOP_WORDS.contains(&folded.as_str())
}

/// Filter applied to an already lower-cased word before indexing.
pub fn should_index(folded: &str) -> bool {
    folded.len() >= 3 && !STOP_WORDS.contains(&folded)
}

/// Lazy iterator over `(start, end)` byte spans of words in `body`.
pub fn word_spans(body: &[u8]) -> WordSpans<'_> {
    WordSpans { body, pos: 0 }
}

pub struct WordSpans<'a> {
    body: &'a [u8],
    pos: usize,
}

impl Iterator for WordSpans<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        let body = self.body;
        let mut i = self.pos;

        // Skip separators to the start of the next run.
        let start = loop {
            if i >= body.len() {
                self.pos = i;
                return None;
            }
            match decode_char(&body[i..]) {
                Some((c, width)) => {
                    if c.is_alphanumeric() {
                        break i;
                    }
                    i += width;
                }
                None => i += 1,
            }
        };

        // Extend to the end of the run.
        let mut end = start;
        while end < body.len() {
            match decode_char(&body[end..]) {
                Some((c, width)) if c.is_alphanumeric() => end += width,
                _ => break,
            }
        }

        self.pos = end;
        Some((start, end))
    }
}

/// Decode the next UTF-8 scalar, returning it with its encoded width.
/// Returns `None` on an invalid or truncated sequence.
pub(crate) fn decode_char(bytes: &[u8]) -> Option<(char, usize)> {
    let b0 = *bytes.first()?;
    if b0 < 0x80 {
        return Some((b0 as char, 1));
    }
    let width = match b0 {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return None,
    };
    if bytes.len() < width {
        return None;
    }
    let s = std::str::from_utf8(&bytes[..width]).ok()?;
    s.chars().next().map(|c| (c, width))
}
