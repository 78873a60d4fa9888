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

//! Implements loading of names files into a trie.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};

use qpname::name::{self, Name};
use qpname::trie::{Error, Methods, Trie};

/// The outcome of [`load`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadReport {
    pub loaded: usize,
    pub duplicates: usize,
    pub invalid: usize,
}

/// Loads the names file at `path` into `trie`. Each name is stored
/// with its line number as the tag. Invalid lines are skipped with a
/// warning; running out of memory is an error.
pub fn load<M: Methods<()>>(path: &Path, trie: &mut Trie<(), M>) -> Result<LoadReport> {
    let file = File::open(path).context("failed to open the names file")?;
    let mut report = LoadReport::default();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line_number = i + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_number))?;
        let name = match parse_line(&line) {
            None => continue,
            Some(Ok(name)) => name,
            Some(Err(e)) => {
                warn!("Line {}: skipping invalid name: {}", line_number, e);
                report.invalid += 1;
                continue;
            }
        };

        match trie.insert_name(&name, (), line_number as u32) {
            Ok(()) => report.loaded += 1,
            Err(e) if e.error() == Error::Exists => {
                debug!("Line {}: {} is a duplicate.", line_number, name);
                report.duplicates += 1;
            }
            Err(e) => {
                return Err(anyhow!(e)).context(format!(
                    "failed to insert {} (line {}) after loading {} names",
                    name, line_number, report.loaded,
                ));
            }
        }
    }
    Ok(report)
}

/// Parses one line of a names file. Lines are either a name or
/// `<rank>,<name>`, as in popular-domain lists; names without a
/// trailing dot are taken to be fully qualified. Returns `None` for
/// blank lines and `#` comments.
pub fn parse_line(line: &str) -> Option<Result<Name, name::Error>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let text = match line.split_once(',') {
        Some((_rank, text)) => text.trim(),
        None => line,
    };
    if text.is_empty() {
        None
    } else if text.ends_with('.') {
        Some(text.parse())
    } else {
        Some(format!("{}.", text).parse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Option<Name> {
        parse_line(line).map(|result| result.unwrap())
    }

    #[test]
    fn parse_line_accepts_both_forms() {
        let expected: Name = "example.com.".parse().unwrap();
        assert_eq!(parsed("example.com."), Some(expected.clone()));
        assert_eq!(parsed("example.com"), Some(expected.clone()));
        assert_eq!(parsed("17,example.com"), Some(expected.clone()));
        assert_eq!(parsed("  17, example.com.  "), Some(expected));
        assert_eq!(parsed("."), Some(Name::root().clone()));
    }

    #[test]
    fn parse_line_skips_blank_lines_and_comments() {
        assert_eq!(parsed(""), None);
        assert_eq!(parsed("   "), None);
        assert_eq!(parsed("# top sites"), None);
        assert_eq!(parsed("3,"), None);
    }

    #[test]
    fn parse_line_reports_bad_names() {
        assert_eq!(parse_line("a..b"), Some(Err(name::Error::NullNonTerminal)));
        assert!(matches!(parse_line(&"x".repeat(64)), Some(Err(name::Error::LabelTooLong))));
    }
}
