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

use anyhow::{bail, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use indicatif::{ProgressBar, ProgressStyle};
use maildex::{IndexBuilder, IngestPhase, SerializePhase, SerializeUpdate};

#[derive(Parser, Debug)]
#[command(
    name = "mdx-index",
    about = "Build a maildex index from a directory of email messages"
)]
struct Args {
    /// Directory of email messages
    input: std::path::PathBuf,
    /// Output directory for the generated artifacts
    #[arg(long, default_value = "out")]
    out: std::path::PathBuf,
    /// Worker threads
    #[arg(long, default_value_t = 10)]
    threads: usize,
    /// Maximum number of files to ingest
    #[arg(long)]
    max_files: Option<usize>,
    /// Disable progress bars
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "warn");
    env_logger::Builder::from_env(env).init();

    let args = Args::parse();
    if args.threads == 0 || args.threads > 100 {
        bail!("threads must be between 1 and 100");
    }

    let mut builder = IndexBuilder::new(&args.input).threads(args.threads);
    if let Some(cap) = args.max_files {
        builder = builder.max_files(cap);
    }

    let (files, max_size) = builder.walk()?;
    println!("found {} files (largest {} bytes)", files.len(), max_size);

    let mut observers = Vec::new();
    if !args.quiet {
        let (ingest_tx, ingest_rx) = unbounded();
        builder = builder.ingest_progress(ingest_tx);
        let total = files.len() as u64;
        observers.push(std::thread::spawn(move || {
            let bar = ProgressBar::new(total);
            bar.set_style(bar_style());
            bar.set_message("ingesting 1/2");
            let mut merging = false;
            for update in ingest_rx.iter() {
                if update.phase == IngestPhase::Merge && !merging {
                    merging = true;
                    bar.reset();
                    bar.set_message("merging 2/2");
                }
                bar.inc(1);
            }
            bar.finish();
        }));

        let (ser_tx, ser_rx) = unbounded();
        builder = builder.serialize_progress(ser_tx);
        observers.push(std::thread::spawn(move || {
            let mut bar: Option<ProgressBar> = None;
            for update in ser_rx.iter() {
                match update {
                    SerializeUpdate::Begin { phase, total } => {
                        let b = ProgressBar::new(total as u64);
                        b.set_style(bar_style());
                        b.set_message(phase_name(phase));
                        bar = Some(b);
                    }
                    SerializeUpdate::Progress { n, .. } => {
                        if let Some(b) = &bar {
                            b.inc(n as u64);
                        }
                    }
                    SerializeUpdate::End { .. } => {
                        if let Some(b) = bar.take() {
                            b.finish();
                        }
                    }
                }
            }
        }));
    }

    builder.ingest(files, max_size)?;
    builder.serialize(&args.out)?;
    for t in observers {
        t.join().ok();
    }

    let stats = builder.stats();
    println!(
        "indexed {} of {} files ({} words, {} errors) into {}",
        stats.indexed,
        stats.files,
        stats.words,
        stats.errors,
        args.out.display()
    );
    Ok(())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:25} {bar:40} {pos}/{len}")
        .expect("static progress template")
}

fn phase_name(phase: SerializePhase) -> &'static str {
    match phase {
        SerializePhase::Filenames => "serializing filenames",
        SerializePhase::Words => "serializing words",
        SerializePhase::Index => "serializing index",
        SerializePhase::Catalog => "serializing catalog",
        SerializePhase::Trie => "serializing prefix trie",
    }
}
