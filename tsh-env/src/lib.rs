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

//! This crate defines the state of the tsh interpreter.
//!
//! The [`Env`] struct is the single owner of everything the interpreter
//! mutates while it runs: the [job list](job::JobList), the table of
//! [built-ins](builtin::Builtin), the [options](Options), and the
//! [`System`] through which every interaction with the operating system
//! passes. There is no process-wide global state; an `&mut Env` is threaded
//! through the process launcher, the signal handlers, and the built-ins.
//!
//! The job list is mutated both by ordinary control flow and by the reactions
//! to `SIGCHLD`. Read-modify-write sequences on the list that must appear
//! atomic to those reactions are run inside
//! [`Env::with_sigchld_blocked`].

use self::builtin::Builtin;
use self::io::Fd;
use self::job::JobList;
use nix::errno::Errno;
use nix::sys::signal::SigSet;
use nix::sys::signal::SigmaskHow;
use nix::sys::signal::Signal;
use std::collections::HashMap;
use std::time::Duration;

pub mod builtin;
pub mod io;
pub mod job;
pub mod semantics;
pub mod system;

pub use self::system::r#virtual::VirtualSystem;
pub use self::system::real::RealSystem;
pub use self::system::System;

/// Default interval between two checks of the foreground job
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settings that affect the behavior of the interpreter
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Options {
    /// Whether additional diagnostic information is logged
    pub verbose: bool,
    /// Interval between two checks in the foreground wait loop
    pub poll_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            verbose: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Whole interpreter state
#[derive(Debug)]
pub struct Env {
    /// Built-in utilities available in the environment
    pub builtins: HashMap<&'static str, Builtin>,

    /// Jobs managed in the environment
    pub jobs: JobList,

    /// Interpreter settings
    pub options: Options,

    /// Interface to the system-managed parts of the environment
    pub system: Box<dyn System>,
}

impl Env {
    /// Creates a new environment with the given system.
    ///
    /// Members of the new environment other than `system` are default-constructed.
    #[must_use]
    pub fn with_system(system: Box<dyn System>) -> Env {
        Env {
            builtins: HashMap::new(),
            jobs: JobList::new(),
            options: Options::default(),
            system,
        }
    }

    /// Creates a new environment with a default-constructed [`VirtualSystem`].
    #[must_use]
    pub fn new_virtual() -> Env {
        Env::with_system(Box::new(VirtualSystem::new()))
    }

    /// Prints the text to the standard output.
    ///
    /// Errors are logged and otherwise ignored.
    pub fn print(&mut self, text: &str) {
        if let Err(errno) = self.write_all(Fd::STDOUT, text.as_bytes()) {
            log::warn!("cannot write to the standard output: {errno}");
        }
    }

    /// Prints the text to the standard error.
    ///
    /// Errors are ignored.
    pub fn print_error(&mut self, text: &str) {
        self.write_all(Fd::STDERR, text.as_bytes()).ok();
    }

    /// Writes the whole buffer to the file descriptor.
    ///
    /// Writes interrupted by a signal are retried.
    pub fn write_all(&mut self, fd: Fd, mut buffer: &[u8]) -> Result<(), Errno> {
        while !buffer.is_empty() {
            match self.system.write(fd, buffer) {
                Ok(0) => return Err(Errno::EIO),
                Ok(count) => buffer = &buffer[count..],
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(errno),
            }
        }
        Ok(())
    }

    /// Runs the function with `SIGCHLD` blocked.
    ///
    /// This function blocks `SIGCHLD`, calls `f`, and then restores the signal
    /// mask that was in effect before the call. The second argument to `f` is
    /// that previous mask, which a child process created inside `f` needs to
    /// restore for itself.
    ///
    /// While `f` runs, no reaction to a child status change can observe the
    /// job list, so `f` may look up a job and then modify it without the job
    /// disappearing in between.
    ///
    /// An error is returned if the signal mask cannot be changed. In that case
    /// `f` is not called.
    pub fn with_sigchld_blocked<F, R>(&mut self, f: F) -> Result<R, Errno>
    where
        F: FnOnce(&mut Env, &SigSet) -> R,
    {
        let mut sigchld = SigSet::empty();
        sigchld.add(Signal::SIGCHLD);
        self.with_signals_blocked(&sigchld, f)
    }

    /// Runs the function with the given signals blocked.
    ///
    /// This is the general form of [`with_sigchld_blocked`](Self::with_sigchld_blocked).
    /// The signals in `signals` are added to the signal mask, `f` is called
    /// with the previous mask, and then the previous mask is restored.
    pub fn with_signals_blocked<F, R>(&mut self, signals: &SigSet, f: F) -> Result<R, Errno>
    where
        F: FnOnce(&mut Env, &SigSet) -> R,
    {
        let mut old_mask = SigSet::empty();
        self.system
            .sigmask(SigmaskHow::SIG_BLOCK, Some(signals), Some(&mut old_mask))?;

        let result = f(self, &old_mask);

        if let Err(errno) = self
            .system
            .sigmask(SigmaskHow::SIG_SETMASK, Some(&old_mask), None)
        {
            log::error!("cannot restore the signal mask: {errno}");
        }
        Ok(result)
    }
}
