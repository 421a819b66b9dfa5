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

//! Job target parsing
//!
//! The `bg` and `fg` built-ins take an operand that selects a job in one of
//! two forms:
//!
//! - A string starting with a digit is a process ID.
//! - A string of the form `%n` selects the job with job number `n`.
//!
//! Like `atoi`, only the leading digits are significant: `12abc` is process
//! 12, and `%x` is job number 0, which never exists.
//!
//! ```
//! # use tsh_env::job::{Jid, Pid};
//! # use tsh_env::job::id::{parse, JobTarget, ParseError};
//! assert_eq!(parse("42"), Ok(JobTarget::Pid(Pid::from_raw(42))));
//! assert_eq!(parse("%3"), Ok(JobTarget::Jid(Jid(3))));
//! assert_eq!(parse("abc"), Err(ParseError));
//! ```

use super::Jid;
use super::Job;
use super::JobList;
use super::Pid;
use std::fmt::Display;
use std::fmt::Formatter;
use thiserror::Error;

/// Result of parsing a job target
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JobTarget {
    /// Job whose process group leader has the process ID
    Pid(Pid),
    /// Job with the job number
    Jid(Jid),
}

impl Display for JobTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JobTarget::Pid(pid) => pid.fmt(f),
            JobTarget::Jid(jid) => write!(f, "%{jid}"),
        }
    }
}

/// Error indicating that an operand is neither a process ID nor a job number
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
#[error("argument must be a PID or %jobid")]
pub struct ParseError;

/// Parses the leading decimal digits of the string.
///
/// Returns `None` if the value does not fit.
fn leading_number(s: &str) -> Option<usize> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    match &s[..end] {
        "" => Some(0),
        digits => digits.parse().ok(),
    }
}

/// Parses a job target.
pub fn parse(operand: &str) -> Result<JobTarget, ParseError> {
    if operand.starts_with(|c: char| c.is_ascii_digit()) {
        let number = leading_number(operand).ok_or(ParseError)?;
        let raw = i32::try_from(number).map_err(|_| ParseError)?;
        Ok(JobTarget::Pid(Pid::from_raw(raw)))
    } else if let Some(tail) = operand.strip_prefix('%') {
        // An out-of-range job number cannot match any job.
        let number = leading_number(tail).unwrap_or(0);
        Ok(JobTarget::Jid(Jid(number)))
    } else {
        Err(ParseError)
    }
}

impl JobTarget {
    /// Finds the job this target selects.
    #[must_use]
    pub fn find<'a>(&self, jobs: &'a JobList) -> Option<&'a Job> {
        match *self {
            JobTarget::Pid(pid) => jobs.find_by_pid(pid),
            JobTarget::Jid(jid) => jobs.find_by_jid(jid),
        }
    }
}
