// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the `load` command.

use std::fmt::Write;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use env_logger::Env;
use log::{error, info};

use qpname::key::Key;
use qpname::trie::{Lookup, MemContext, Trie};

use crate::args::LoadArgs;
use crate::config::{self, Config};
use crate::names;

/// Runs the `load` command.
pub fn run(args: LoadArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(args: LoadArgs) -> Result<()> {
    info!(
        "qpnames v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    let config = if let Some(ref config_path) = args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else {
        info!("Loading the configuration from the command line.");
        config::load_from_args(args).context("failed to load the configuration")?
    };

    let mctx = Arc::new(match config.memory_limit {
        Some(limit) => MemContext::with_limit(limit),
        None => MemContext::new(),
    });
    let mut trie = Trie::new(Arc::clone(&mctx), ());

    info!("Loading names from {}.", config.names.display());
    let start = Instant::now();
    let report = names::load(&config.names, &mut trie)
        .with_context(|| format!("failed to load {}", config.names.display()))?;
    let load_time = start.elapsed();
    println!(
        "loaded {} names ({} duplicates, {} invalid) in {} ({})",
        report.loaded,
        report.duplicates,
        report.invalid,
        seconds(load_time),
        rate(report.loaded, load_time),
    );

    if config.compact {
        trie.compact();
    }
    let stats = trie.stats();
    println!(
        "{} leaves, {} branches, {} bytes in use ({:.1} bytes per name)",
        stats.leaves,
        stats.branches,
        mctx.in_use(),
        mctx.in_use() as f64 / stats.leaves.max(1) as f64,
    );

    time_lookups(&trie);
    run_queries(&trie, &config)
}

/// Looks every stored name up again and reports the time taken.
fn time_lookups(trie: &Trie<()>) {
    let keys: Vec<Key> = trie.iter().map(|entry| entry.key().clone()).collect();
    let start = Instant::now();
    let found = keys.iter().filter(|key| trie.get(key).is_some()).count();
    let lookup_time = start.elapsed();
    println!(
        "looked up {} names in {} ({})",
        found,
        seconds(lookup_time),
        rate(found, lookup_time),
    );
}

/// Prints the results of the configured queries.
fn run_queries(trie: &Trie<()>, config: &Config) -> Result<()> {
    for query in &config.queries {
        let name = &query.0;
        match trie.lookup_name(name) {
            Lookup::Exact { entry, .. } => {
                println!("{}: found (line {})", name, entry.tag());
            }
            Lookup::Ancestor { entry, labels, .. } => {
                println!(
                    "{}: closest enclosing name is {} ({} labels, line {})",
                    name,
                    entry.name().context("failed to decode a stored name")?,
                    labels,
                    entry.tag(),
                );
            }
            Lookup::NotFound => println!("{}: not found", name),
        }
        if let Some((entry, _)) = trie.predecessor(&Key::from_name(name)) {
            println!(
                "{}: predecessor is {}",
                name,
                entry.name().context("failed to decode a stored name")?,
            );
        }
    }
    Ok(())
}

fn seconds(duration: Duration) -> String {
    format!("{:.3} s", duration.as_secs_f64())
}

fn rate(count: usize, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        format!("{:.0} per second", count as f64 / secs)
    } else {
        String::from("too fast to measure")
    }
}
