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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use qpname::name::Name;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// Loads domain names into a QP-trie name index and reports on it
#[derive(Debug, Parser)]
#[command(author, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a names file and report timings, memory use and lookups
    Load(LoadArgs),
}

#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("input").required(true).args(["config", "names"])))]
pub struct LoadArgs {
    /// Set the configuration file to use
    #[arg(
        long,
        conflicts_with_all = ["names", "memory_limit", "queries", "compact"],
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Set the names file to load (one name per line, optionally
    /// prefixed by "<rank>,")
    #[arg(long, value_name = "FILE")]
    pub names: Option<PathBuf>,

    /// Limit the memory the index may use
    #[arg(long, value_name = "BYTES")]
    pub memory_limit: Option<usize>,

    /// Look up names after loading
    #[arg(
        long = "query",
        num_args = 1..,
        value_delimiter = ',',
        value_name = "NAME"
    )]
    pub queries: Vec<Name>,

    /// Give back spare capacity after loading
    #[arg(long)]
    pub compact: bool,
}
