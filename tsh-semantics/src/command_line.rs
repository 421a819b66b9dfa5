// This file is part of tsh, a tiny shell with job control.
// Copyright (C) 2026 WATANABE Yuki
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Splitting of command lines into words
//!
//! A command line is a sequence of words separated by blanks. A word that
//! starts with a single quote extends to the next single quote, so it may
//! contain blanks; the quotes are not part of the word. If the last word
//! starts with `&`, it is removed and the command runs in the background.
//!
//! ```
//! # use tsh_semantics::command_line::parse;
//! let line = parse("/bin/echo 'hello world' &\n");
//! assert_eq!(line.args, ["/bin/echo", "hello world"]);
//! assert!(line.background);
//! ```
//!
//! There is no other syntax. In particular, there are no pipelines,
//! redirections, or expansions.

/// Result of splitting a command line
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CommandLine {
    /// Words of the command line
    ///
    /// This is empty for a blank line.
    pub args: Vec<String>,

    /// Whether the command should run in the background
    pub background: bool,
}

fn is_blank(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// Splits a command line into words.
///
/// A quoted word missing its closing quote extends to the end of the line.
#[must_use]
pub fn parse(line: &str) -> CommandLine {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let mut args = Vec::new();
    let mut rest = line.trim_start_matches(is_blank);
    while !rest.is_empty() {
        let (word, tail) = match rest.strip_prefix('\'') {
            Some(quoted) => quoted.split_once('\'').unwrap_or((quoted, "")),
            None => rest.split_once(is_blank).unwrap_or((rest, "")),
        };
        args.push(word.to_owned());
        rest = tail.trim_start_matches(is_blank);
    }

    let background = args.last().is_some_and(|last| last.starts_with('&'));
    if background {
        args.pop();
    }
    CommandLine { args, background }
}
