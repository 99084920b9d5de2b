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

use std::io::Write;

use anyhow::{bail, Result};
use clap::Parser;
use maildex::IndexReader;

#[derive(Parser, Debug)]
#[command(name = "mdx-search", about = "Query a maildex index")]
struct Args {
    /// Index directory produced by mdx-index
    index_dir: std::path::PathBuf,
    /// One-shot query: whitespace-separated words, AND semantics
    #[arg(long)]
    query: Option<String>,
    /// Prefix completion over the indexed vocabulary
    #[arg(long)]
    prefix: Option<String>,
    /// Maximum completions to return
    #[arg(long, default_value_t = 15)]
    limit: usize,
    /// Dump the stored body for a filename index
    #[arg(long)]
    content: Option<u32>,
    /// Emit JSON (NDJSON) instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "warn");
    env_logger::Builder::from_env(env).init();

    let args = Args::parse();
    let reader = IndexReader::open(&args.index_dir)?;

    if let Some(q) = &args.query {
        let words: Vec<&str> = q.split_whitespace().collect();
        let results = reader.query(&words)?;
        if args.json {
            for r in &results {
                println!("{}", serde_json::to_string(r)?);
            }
        } else {
            println!(
                "{} results over {} documents",
                results.len(),
                reader.corpus_size()
            );
            for r in &results {
                println!("{} ({} matches)", r.filename, r.word_matches.len());
                for m in &r.word_matches {
                    println!("  {} @ {}", m.word, m.offset);
                }
            }
        }
    } else if let Some(p) = &args.prefix {
        let matches = reader.prefix(p, Some(args.limit));
        if args.json {
            println!("{}", serde_json::to_string(&matches)?);
        } else {
            for w in matches {
                println!("{w}");
            }
        }
    } else if let Some(fidx) = args.content {
        match reader.content(fidx) {
            Some((body, filename)) => {
                log::info!("{} ({} bytes)", filename, body.len());
                std::io::stdout().write_all(&body)?;
            }
            None => bail!("no stored content for file index {fidx}"),
        }
    } else {
        bail!("one of --query, --prefix, --content is required");
    }

    reader.close();
    Ok(())
}
