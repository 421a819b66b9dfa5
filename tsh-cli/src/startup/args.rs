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

//! Command-line argument parser for the shell
//!
//! The shell accepts the options `-h`, `-v`, and `-p`, which may be combined
//! in one argument as in `-vp`. Parsing stops at `--` or at the first
//! argument that is not an option. Remaining arguments are ignored.

use thiserror::Error;

/// Configuration of the read-eval loop
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Run {
    /// Whether a prompt is printed before reading each line (cleared by `-p`)
    pub prompt: bool,
    /// Whether diagnostic messages are logged (set by `-v`)
    pub verbose: bool,
}

impl Default for Run {
    fn default() -> Self {
        Run {
            prompt: true,
            verbose: false,
        }
    }
}

/// Result of [`parse`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Parse {
    /// Run the shell.
    Run(Run),
    /// Print the usage and exit.
    Help,
}

/// Error in command-line parsing
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The option character is not supported.
    #[error("invalid option -- '{0}'")]
    UnknownOption(char),
}

/// Parses command-line arguments.
///
/// The first item of `args` is the name of the shell and is ignored.
pub fn parse<I, S>(args: I) -> Result<Parse, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut run = Run::default();
    for arg in args.into_iter().skip(1) {
        let arg = arg.as_ref();
        if arg == "--" {
            break;
        }
        let Some(options) = arg.strip_prefix('-').filter(|options| !options.is_empty()) else {
            break;
        };
        for option in options.chars() {
            match option {
                'h' => return Ok(Parse::Help),
                'v' => run.verbose = true,
                'p' => run.prompt = false,
                _ => return Err(Error::UnknownOption(option)),
            }
        }
    }
    Ok(Parse::Run(run))
}
