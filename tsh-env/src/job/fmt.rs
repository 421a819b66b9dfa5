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

//! Job report formatting
//!
//! This module defines the lines the interpreter prints about jobs. The
//! formats are fixed because drivers compare the output literally.
//!
//! A [`Report`] is a line of the `jobs` listing:
//!
//! ```text
//! [1] (24437) Running ./myspin 10 &
//! ```
//!
//! A [`Notice`] is printed when a job starts or resumes in the background:
//!
//! ```text
//! [1] (24437) ./myspin 10 &
//! ```
//!
//! A [`StatusChange`] is printed when a job is killed or stopped by a signal:
//!
//! ```text
//! Job [1] (24437) terminated by signal 2
//! Job [1] (24437) stopped by signal 20
//! ```
//!
//! None of the formats includes a trailing newline.

use super::Job;
use nix::sys::signal::Signal;
use std::ffi::c_int;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Line of the job listing
#[derive(Clone, Copy, Debug)]
pub struct Report<'a>(pub &'a Job);

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let Job {
            pid,
            jid,
            state,
            command_line,
        } = self.0;
        write!(f, "[{jid}] ({pid}) {state} {command_line}")
    }
}

/// Line announcing a job running in the background
#[derive(Clone, Copy, Debug)]
pub struct Notice<'a>(pub &'a Job);

impl Display for Notice<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let job = self.0;
        write!(f, "[{}] ({}) {}", job.jid, job.pid, job.command_line)
    }
}

/// Kind of a [`StatusChange`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Change {
    /// The job has been killed.
    Terminated,
    /// The job has been suspended.
    Stopped,
}

/// Line reporting that a signal has killed or stopped a job
#[derive(Clone, Copy, Debug)]
pub struct StatusChange<'a> {
    pub job: &'a Job,
    pub change: Change,
    pub signal: Signal,
}

impl Display for StatusChange<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let verb = match self.change {
            Change::Terminated => "terminated",
            Change::Stopped => "stopped",
        };
        let number = self.signal as c_int;
        write!(
            f,
            "Job [{}] ({}) {verb} by signal {number}",
            self.job.jid, self.job.pid
        )
    }
}
