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

//! [System] and its implementors.

pub mod real;
pub mod r#virtual;

use crate::io::Fd;
use crate::job::Pid;
use crate::semantics::ExitStatus;
use crate::Env;
#[doc(no_inline)]
pub use nix::errno::Errno;
#[doc(no_inline)]
pub use nix::sys::signal::SigSet;
#[doc(no_inline)]
pub use nix::sys::signal::SigmaskHow;
#[doc(no_inline)]
pub use nix::sys::signal::Signal;
#[doc(no_inline)]
pub use nix::sys::wait::WaitStatus;
use std::convert::Infallible;
use std::ffi::CStr;
use std::ffi::CString;
use std::fmt::Debug;
use std::time::Duration;

/// API to the system-managed parts of the environment.
///
/// The `System` trait defines a collection of methods to access the underlying
/// operating system from the interpreter. There are two implementors:
/// [`RealSystem`](self::real::RealSystem) and
/// [`VirtualSystem`](self::virtual::VirtualSystem).
pub trait System: Debug {
    /// Gets and/or sets the signal blocking mask.
    ///
    /// This is a thin wrapper around the `sigprocmask` system call. If `set`
    /// is `Some`, this function updates the mask according to `how`. If
    /// `oldset` is `Some`, the previous mask is stored in it.
    fn sigmask(
        &mut self,
        how: SigmaskHow,
        set: Option<&SigSet>,
        oldset: Option<&mut SigSet>,
    ) -> Result<(), Errno>;

    /// Sets how a signal is handled.
    ///
    /// Returns the previous handling.
    fn sigaction(&mut self, signal: Signal, handling: SignalHandling)
        -> Result<SignalHandling, Errno>;

    /// Returns signals this process has caught, if any.
    ///
    /// Signals are recorded when they are caught under
    /// [`SignalHandling::Catch`]. This function drains the record: a signal
    /// is returned only once for each time it has been caught, except that
    /// the same signal caught twice before a call may be returned once.
    fn caught_signals(&mut self) -> Vec<Signal>;

    /// Sends a signal.
    ///
    /// A negative `target` addresses the process group `-target`. If
    /// `signal` is `None`, only the existence of the target is checked.
    fn kill(&mut self, target: Pid, signal: Option<Signal>) -> Result<(), Errno>;

    /// Returns the process ID of the current process.
    fn getpid(&self) -> Pid;

    /// Modifies the process group ID of a process.
    ///
    /// A zero `pid` means the current process. A zero `pgid` means the process
    /// ID of the target process.
    fn setpgid(&mut self, pid: Pid, pgid: Pid) -> Result<(), Errno>;

    /// Creates a new child process.
    ///
    /// This is a wrapper around the `fork` system call. If successful, the
    /// returned starter must be called exactly once with a task to be run in
    /// the child. In the parent, the starter returns the process ID of the
    /// child. In the child, the starter runs the task and terminates the
    /// process with the exit status the task returns, so it never returns.
    fn new_child_process(&mut self) -> Result<ChildProcessStarter, Errno>;

    /// Replaces the current process image with a new program.
    ///
    /// This function returns only on failure.
    fn execve(
        &mut self,
        path: &CStr,
        args: &[CString],
        envs: &[CString],
    ) -> Result<Infallible, Errno>;

    /// Reports a status change of a child process.
    ///
    /// This is a wrapper around `waitpid` with `WNOHANG` and `WUNTRACED`: it
    /// never blocks, and stopped children are reported as well as terminated
    /// ones. [`WaitStatus::StillAlive`] means that children exist but none has
    /// changed its status. `ECHILD` means there is no child to wait for.
    fn wait(&mut self, target: Pid) -> Result<WaitStatus, Errno>;

    /// Reads from the file descriptor.
    ///
    /// This is a thin wrapper around the `read` system call. `EINTR` is
    /// returned when a signal is caught before any byte is read.
    fn read(&mut self, fd: Fd, buffer: &mut [u8]) -> Result<usize, Errno>;

    /// Waits until the file descriptor is ready for reading.
    ///
    /// This is a wrapper around the `pselect` system call. The signal mask is
    /// replaced with `signal_mask` for the duration of the wait, atomically
    /// with starting the wait. A signal that was pending under the previous
    /// mask and is unblocked in `signal_mask` is therefore caught at the start
    /// of the wait, which then ends with `EINTR`.
    ///
    /// End of file counts as ready for reading.
    fn wait_readable(&mut self, fd: Fd, signal_mask: &SigSet) -> Result<(), Errno>;

    /// Writes to the file descriptor.
    ///
    /// This is a thin wrapper around the `write` system call.
    fn write(&mut self, fd: Fd, buffer: &[u8]) -> Result<usize, Errno>;

    /// Suspends the current process for the duration.
    ///
    /// The sleep ends early with `EINTR` when a signal is caught.
    fn sleep(&mut self, duration: Duration) -> Result<(), Errno>;
}

/// How to handle a signal.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SignalHandling {
    /// Perform the default action for the signal.
    #[default]
    Default,
    /// Ignore the signal.
    Ignore,
    /// Catch the signal.
    ///
    /// A caught signal is only recorded. The interpreter reacts to it when it
    /// next calls [`System::caught_signals`].
    Catch,
}

/// Task executed in a child process
///
/// The task receives the environment of the child process. The returned exit
/// status terminates the child.
pub type ChildProcessTask = Box<dyn FnOnce(&mut Env) -> ExitStatus>;

/// Function that starts a child process
///
/// See [`System::new_child_process`].
pub type ChildProcessStarter = Box<dyn FnOnce(&mut Env, ChildProcessTask) -> Pid>;
