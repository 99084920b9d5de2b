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

use std::fs;
use std::path::Path;

use anyhow::Result;
use maildex::{build_index, FormatError, IndexBuilder, IndexReader};

const ARTIFACTS: &[&str] = &[
    "filenames.sid",
    "words.sid",
    "corpus.index",
    "word.offsets",
    "corpus.cat",
    "query.trie",
];

fn write_email(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), format!("Subject: s\n\n{body}")).unwrap();
}

/// The two-document corpus from the ranking scenarios.
fn two_doc_corpus(dir: &Path) {
    write_email(dir, "example.email", "presentation sent");
    write_email(dir, "scandal.email", "fraud presentation here");
}

#[test]
fn two_document_ranking_and_offsets() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 4, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert_eq!(reader.corpus_size(), 2);

    let results = reader.query(&["presentation"])?;
    assert_eq!(results.len(), 2);
    // Equal match counts: lexicographic filename tie-break.
    assert_eq!(results[0].filename, "example.email");
    assert_eq!(results[1].filename, "scandal.email");

    assert_eq!(results[0].word_matches.len(), 1);
    assert_eq!(results[0].word_matches[0].word, "presentation");
    assert_eq!(results[0].word_matches[0].offset, 0);
    assert_eq!(results[1].word_matches[0].offset, 6);
    Ok(())
}

#[test]
fn conjunction_is_strict_and() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 4, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    let results = reader.query(&["presentation", "fraud"])?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].filename, "scandal.email");

    // Matches from all terms, ordered by offset within the body.
    let got: Vec<(&str, u32)> = results[0]
        .word_matches
        .iter()
        .map(|m| (m.word.as_str(), m.offset))
        .collect();
    assert_eq!(got, vec![("fraud", 0), ("presentation", 6)]);
    Ok(())
}

#[test]
fn stop_word_only_query_is_empty_not_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert!(reader.query(&["the"])?.is_empty());
    assert!(reader.query(&[])?.is_empty());
    Ok(())
}

#[test]
fn missing_term_empties_the_conjunction() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert!(reader.query(&["presentation", "qwerty"])?.is_empty());
    // Order must not matter: the earlier term must not leak into results.
    assert!(reader.query(&["qwerty", "presentation"])?.is_empty());
    Ok(())
}

#[test]
fn stop_words_are_skipped_within_conjunctions() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    // "the" is skipped, so this behaves exactly like ["fraud"].
    let results = reader.query(&["the", "fraud"])?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].filename, "scandal.email");
    Ok(())
}

#[test]
fn query_is_case_folded() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    write_email(&input, "a.email", "Presentation TOMORROW");
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    let results = reader.query(&["PRESENTATION", "tomorrow"])?;
    assert_eq!(results.len(), 1);
    Ok(())
}

#[test]
fn prefix_completion_over_built_vocabulary() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert!(reader.has_trie());
    assert_eq!(reader.prefix("pre", Some(15)), vec!["presentation"]);
    assert!(reader.prefix("x", Some(15)).is_empty());
    assert!(reader.prefix("pre", Some(0)).is_empty());

    // Empty prefix enumerates the whole vocabulary, sorted.
    assert_eq!(
        reader.prefix("", None),
        vec!["fraud", "here", "presentation", "sent"]
    );
    // Truncation applies after sorting.
    assert_eq!(reader.prefix("", Some(2)), vec!["fraud", "here"]);
    Ok(())
}

#[test]
fn prefix_completion_drops_stop_words_and_folds_case() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    write_email(&input, "a.email", "theory thanks");
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert_eq!(reader.prefix("TH", None), vec!["thanks", "theory"]);
    Ok(())
}

#[test]
fn catalog_roundtrip_returns_exact_body() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    let body = "fraud presentation here";
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    let results = reader.query(&["fraud"])?;
    let fidx = results[0].filename_index;

    let (content, filename) = reader.content(fidx).expect("stored body");
    assert_eq!(filename, "scandal.email");
    assert_eq!(content, body.as_bytes());
    Ok(())
}

#[test]
fn empty_body_is_stored_and_distinct_from_absent() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    fs::write(input.join("empty.email"), "Subject: s\n\n")?;
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert_eq!(reader.corpus_size(), 1);
    let (content, _) = reader.content(0).expect("empty body is still stored");
    assert!(content.is_empty());
    Ok(())
}

#[test]
fn malformed_file_keeps_slot_without_postings() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    // No header/body separator: ingestion error, but the slot stays.
    fs::write(input.join("broken.email"), "not a message")?;
    write_email(&input, "ok.email", "presentation sent");
    let stats = build_index(&input, tmp.path().join("out"), 2, None)?;
    assert_eq!(stats.files, 2);
    assert_eq!(stats.indexed, 1);
    assert_eq!(stats.errors, 1);

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert_eq!(reader.corpus_size(), 1);
    assert_eq!(reader.filenames().len(), 2);

    let broken_idx = reader
        .filenames()
        .iter()
        .position(|f| f == "broken.email")
        .unwrap() as u32;
    assert!(reader.content(broken_idx).is_none());

    let results = reader.query(&["presentation"])?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].filename, "ok.email");
    Ok(())
}

#[test]
fn content_out_of_range_is_none() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert!(reader.content(99).is_none());
    Ok(())
}

#[test]
fn nested_directories_index_relative_paths() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir_all(input.join("alice/inbox"))?;
    write_email(&input.join("alice/inbox"), "msg1", "quarterly forecast");
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    let results = reader.query(&["forecast"])?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].filename, "alice/inbox/msg1");
    Ok(())
}

#[test]
fn rebuild_is_byte_identical() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    write_email(&input, "a.email", "alpha beta gamma alpha");
    write_email(&input, "b.email", "beta delta epsilon");
    write_email(&input, "c.email", "gamma gamma alpha zeta");
    fs::write(input.join("broken.email"), "no separator")?;

    // Different worker counts must not change a single byte.
    build_index(&input, tmp.path().join("out1"), 1, None)?;
    build_index(&input, tmp.path().join("out2"), 7, None)?;

    for name in ARTIFACTS {
        let a = fs::read(tmp.path().join("out1").join(name))?;
        let b = fs::read(tmp.path().join("out2").join(name))?;
        assert_eq!(a, b, "{name} differs between rebuilds");
    }
    Ok(())
}

#[test]
fn posting_lists_hold_sorted_in_range_offsets() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    write_email(&input, "a.email", "market update market summary market");
    write_email(&input, "b.email", "summary of the market");
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    for word in reader.words().to_vec() {
        let results = reader.query(&[word.as_str()])?;
        assert!(!results.is_empty(), "indexed word {word:?} must match");
        for r in &results {
            assert!((r.filename_index as usize) < reader.filenames().len());
            let (body, _) = reader.content(r.filename_index).expect("stored body");
            let offsets: Vec<u32> = r.word_matches.iter().map(|m| m.offset).collect();
            for pair in offsets.windows(2) {
                assert!(pair[0] < pair[1], "offsets must be strictly ascending");
            }
            for off in offsets {
                assert!((off as usize) < body.len(), "offset past body end");
            }
        }
    }
    Ok(())
}

#[test]
fn match_counts_rank_results() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    write_email(&input, "many.email", "budget budget budget");
    write_email(&input, "one.email", "budget line");
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    let results = reader.query(&["budget"])?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].filename, "many.email");
    assert_eq!(results[0].word_matches.len(), 3);
    assert_eq!(results[1].filename, "one.email");
    Ok(())
}

#[test]
fn max_files_caps_the_walk() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    write_email(&input, "a.email", "first message");
    write_email(&input, "b.email", "second message");
    write_email(&input, "c.email", "third message");

    let builder = IndexBuilder::new(&input).max_files(2);
    let (files, _) = builder.walk()?;
    assert_eq!(files, vec!["a.email", "b.email"]);
    Ok(())
}

#[test]
fn missing_trie_disables_completion() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    let out = tmp.path().join("out");
    build_index(&input, &out, 2, None)?;
    fs::remove_file(out.join("query.trie"))?;

    let reader = IndexReader::open(&out)?;
    assert!(!reader.has_trie());
    assert!(reader.prefix("pre", Some(15)).is_empty());
    // Queries still work without the trie.
    assert_eq!(reader.query(&["presentation"])?.len(), 2);
    Ok(())
}

#[test]
fn empty_corpus_builds_and_opens() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    let stats = build_index(&input, tmp.path().join("out"), 2, None)?;
    assert_eq!(stats.files, 0);
    assert_eq!(stats.indexed, 0);

    let reader = IndexReader::open(tmp.path().join("out"))?;
    assert_eq!(reader.corpus_size(), 0);
    assert!(reader.query(&["anything"])?.is_empty());
    assert!(reader.prefix("a", Some(5)).is_empty());
    Ok(())
}

#[test]
fn corrupt_magic_is_a_typed_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    let out = tmp.path().join("out");
    build_index(&input, &out, 2, None)?;

    let mut bytes = fs::read(out.join("corpus.index"))?;
    bytes[0] ^= 0xFF;
    fs::write(out.join("corpus.index"), &bytes)?;

    match IndexReader::open(&out) {
        Err(FormatError::BadMagic { file, .. }) => assert_eq!(file, "corpus.index"),
        Err(e) => panic!("expected BadMagic, got {e}"),
        Ok(_) => panic!("expected BadMagic, got a reader"),
    }
    Ok(())
}

#[test]
fn unsupported_version_is_rejected() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    let out = tmp.path().join("out");
    build_index(&input, &out, 2, None)?;

    let mut bytes = fs::read(out.join("words.sid"))?;
    // Version field follows the 4-byte magic.
    bytes[7] = 9;
    fs::write(out.join("words.sid"), &bytes)?;

    assert!(matches!(
        IndexReader::open(&out),
        Err(FormatError::BadVersion { .. })
    ));
    Ok(())
}

#[test]
fn truncated_offsets_directory_is_rejected() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    let out = tmp.path().join("out");
    build_index(&input, &out, 2, None)?;

    let bytes = fs::read(out.join("word.offsets"))?;
    fs::write(out.join("word.offsets"), &bytes[..bytes.len() - 4])?;

    assert!(matches!(
        IndexReader::open(&out),
        Err(FormatError::Truncated { .. })
    ));
    Ok(())
}

#[test]
fn offsets_table_must_match_word_count() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    let out = tmp.path().join("out");
    build_index(&input, &out, 2, None)?;

    // Drop the final directory entry while keeping the header count and
    // body consistent with one fewer word.
    let bytes = fs::read(out.join("word.offsets"))?;
    let mut truncated = bytes[..bytes.len() - 12].to_vec();
    let n = u32::from_be_bytes(truncated[8..12].try_into().unwrap()) - 1;
    truncated[8..12].copy_from_slice(&n.to_be_bytes());
    fs::write(out.join("word.offsets"), &truncated)?;

    assert!(matches!(
        IndexReader::open(&out),
        Err(FormatError::SizeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn highlight_spans_cover_matched_words() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("in");
    fs::create_dir(&input)?;
    two_doc_corpus(&input);
    build_index(&input, tmp.path().join("out"), 2, None)?;

    let reader = IndexReader::open(tmp.path().join("out"))?;
    let results = reader.query(&["presentation", "fraud"])?;
    let spans = results[0].highlight_spans();
    assert_eq!(spans, vec![(0, 5), (6, 18)]);

    let (body, _) = reader.content(results[0].filename_index).unwrap();
    for (start, end) in spans {
        let text = std::str::from_utf8(&body[start as usize..end as usize])?;
        assert!(["presentation", "fraud"].contains(&text));
    }
    Ok(())
}
