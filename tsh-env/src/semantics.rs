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

//! Type definitions for command execution.

use std::ffi::c_int;
use std::ops::ControlFlow;

/// Number that summarizes the result of command execution.
///
/// The interpreter itself terminates with an exit status, and so does a child
/// process that failed to start the requested program.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExitStatus(pub c_int);

impl ExitStatus {
    /// Exit status of 0: success
    pub const SUCCESS: ExitStatus = ExitStatus(0);

    /// Exit status of 1: failure
    pub const FAILURE: ExitStatus = ExitStatus(1);

    /// Exit status of 126: the program was found but could not be executed
    pub const NOEXEC: ExitStatus = ExitStatus(126);

    /// Exit status of 127: the program was not found
    pub const NOT_FOUND: ExitStatus = ExitStatus(127);
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<c_int> for ExitStatus {
    fn from(value: c_int) -> ExitStatus {
        ExitStatus(value)
    }
}

impl From<ExitStatus> for c_int {
    fn from(exit_status: ExitStatus) -> c_int {
        exit_status.0
    }
}

/// Result of interrupted command execution.
///
/// `Divert` implements `Ord`. Values are ordered by severity.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Divert {
    /// Exit the interpreter normally.
    ///
    /// This is what the `quit` built-in and `SIGQUIT` do.
    Exit(ExitStatus),

    /// Exit the interpreter because of an unrecoverable error.
    Abort(ExitStatus),
}

impl Divert {
    /// Returns the exit status the interpreter should terminate with.
    #[must_use]
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Divert::Exit(exit_status) | Divert::Abort(exit_status) => *exit_status,
        }
    }
}

/// Result of command execution.
///
/// If the execution has been interrupted by a fatal condition or a request to
/// quit, the result is a `Divert` wrapped in `ControlFlow::Break`. Otherwise,
/// execution continues with the value in `ControlFlow::Continue`.
pub type Result<T = ()> = ControlFlow<Divert, T>;
