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

//! Implementation of `System` that actually interacts with the system.

use super::ChildProcessStarter;
use super::Errno;
use super::SigSet;
use super::SigmaskHow;
use super::Signal;
use super::SignalHandling;
use super::System;
use super::WaitStatus;
use crate::io::Fd;
use crate::job::Pid;
use nix::sys::select::FdSet;
use nix::sys::signal::SaFlags;
use nix::sys::signal::SigAction;
use nix::sys::signal::SigHandler;
use nix::sys::wait::WaitPidFlag;
use std::convert::Infallible;
use std::ffi::c_int;
use std::ffi::CStr;
use std::ffi::CString;
use std::os::fd::BorrowedFd;
use std::sync::atomic::AtomicIsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

static CAUGHT_SIGNALS: [AtomicIsize; 8] = {
    // In the array creation, the repeat operand must be const.
    #[allow(clippy::declare_interior_mutable_const)]
    const SIGNAL_SLOT: AtomicIsize = AtomicIsize::new(0);
    [SIGNAL_SLOT; 8]
};

/// Signal catching function.
///
/// This function only records the signal number in `CAUGHT_SIGNALS`. The
/// interpreter reacts to the signal when it next calls
/// [`RealSystem::caught_signals`].
extern "C" fn catch_signal(signal: c_int) {
    // This function can only perform async-signal-safe operations.
    // Performing unsafe operations is undefined behavior!

    // Find an unused slot (having a value of 0) in CAUGHT_SIGNALS and write the
    // signal number into it.
    // If there is a slot having a value of the signal already, do nothing.
    // If there is no available slot, the signal will be lost!
    let signal = signal as isize;
    for slot in &CAUGHT_SIGNALS {
        match slot.compare_exchange(0, signal, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(slot_value) if slot_value == signal => break,
            _ => continue,
        }
    }
}

/// Implementation of `System` that actually interacts with the system.
///
/// `RealSystem` is an empty `struct` because the underlying operating system
/// manages the system's internal state.
#[derive(Debug)]
pub struct RealSystem(());

impl RealSystem {
    /// Returns an instance of `RealSystem`.
    ///
    /// # Safety
    ///
    /// This function is marked `unsafe` because improper use of `RealSystem`
    /// may lead to undefined behavior. Most operations performed on the system
    /// are not thread-safe. You should never use `RealSystem` in a
    /// multi-threaded program, and it is your responsibility to make sure you
    /// are using only one instance of `RealSystem` in the process.
    pub unsafe fn new() -> Self {
        RealSystem(())
    }
}

impl System for RealSystem {
    fn sigmask(
        &mut self,
        how: SigmaskHow,
        set: Option<&SigSet>,
        oldset: Option<&mut SigSet>,
    ) -> Result<(), Errno> {
        nix::sys::signal::sigprocmask(how, set, oldset)
    }

    fn sigaction(
        &mut self,
        signal: Signal,
        handling: SignalHandling,
    ) -> Result<SignalHandling, Errno> {
        let handler = match handling {
            SignalHandling::Default => SigHandler::SigDfl,
            SignalHandling::Ignore => SigHandler::SigIgn,
            SignalHandling::Catch => SigHandler::Handler(catch_signal),
        };
        // Without SA_RESTART, a blocking read or sleep returns EINTR so that
        // the interpreter can react to the signal without delay.
        let new_action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
        // SAFETY: The `catch_signal` function only accesses atomic variables.
        let old_action = unsafe { nix::sys::signal::sigaction(signal, &new_action) }?;
        let old_handling = match old_action.handler() {
            SigHandler::SigDfl => SignalHandling::Default,
            SigHandler::SigIgn => SignalHandling::Ignore,
            SigHandler::Handler(_) | SigHandler::SigAction(_) => SignalHandling::Catch,
        };
        Ok(old_handling)
    }

    fn caught_signals(&mut self) -> Vec<Signal> {
        let mut signals = Vec::new();
        for slot in &CAUGHT_SIGNALS {
            // Need a fence to ensure we examine the slots in order.
            std::sync::atomic::compiler_fence(Ordering::Acquire);

            let signal = slot.swap(0, Ordering::Relaxed);
            if signal == 0 {
                // The `catch_signal` function always fills the first unused
                // slot, so there is no more slot filled with a signal.
                break;
            }

            match Signal::try_from(signal as c_int) {
                Ok(signal) => signals.push(signal),
                Err(_) => log::warn!("ignoring unknown signal number {signal}"),
            }
        }
        signals
    }

    fn kill(&mut self, target: Pid, signal: Option<Signal>) -> Result<(), Errno> {
        nix::sys::signal::kill(target, signal)
    }

    fn getpid(&self) -> Pid {
        nix::unistd::getpid()
    }

    fn setpgid(&mut self, pid: Pid, pgid: Pid) -> Result<(), Errno> {
        nix::unistd::setpgid(pid, pgid)
    }

    /// Creates a new child process.
    ///
    /// This implementation calls the `fork` system call and returns both in the
    /// parent and child process. In the parent, the returned starter ignores
    /// its arguments and returns the child process ID. In the child, the
    /// starter runs the task and exits the process.
    fn new_child_process(&mut self) -> Result<ChildProcessStarter, Errno> {
        use nix::unistd::ForkResult::*;
        // SAFETY: As stated on RealSystem::new, the caller is responsible for
        // making only one instance of RealSystem in the process, which is
        // single-threaded.
        match unsafe { nix::unistd::fork()? } {
            Parent { child } => Ok(Box::new(move |_env, _task| child)),
            Child => Ok(Box::new(|env, task| {
                let exit_status = task(env);
                std::process::exit(exit_status.0)
            })),
        }
    }

    fn execve(
        &mut self,
        path: &CStr,
        args: &[CString],
        envs: &[CString],
    ) -> Result<Infallible, Errno> {
        loop {
            let result = nix::unistd::execve(path, args, envs);
            if result != Err(Errno::EINTR) {
                return result;
            }
        }
    }

    fn wait(&mut self, target: Pid) -> Result<WaitStatus, Errno> {
        let options = WaitPidFlag::WUNTRACED | WaitPidFlag::WNOHANG;
        nix::sys::wait::waitpid(target, Some(options))
    }

    fn read(&mut self, fd: Fd, buffer: &mut [u8]) -> Result<usize, Errno> {
        // SAFETY: The pointer and length come from a valid mutable slice.
        let result = unsafe { libc::read(fd.0, buffer.as_mut_ptr().cast(), buffer.len()) };
        Errno::result(result).map(|count| count as usize)
    }

    fn wait_readable(&mut self, fd: Fd, signal_mask: &SigSet) -> Result<(), Errno> {
        // SAFETY: The descriptor stays open while the borrow lives in this call.
        let fd = unsafe { BorrowedFd::borrow_raw(fd.0) };
        let mut readers = FdSet::new();
        readers.insert(fd);
        nix::sys::select::pselect(None, &mut readers, None, None, None, signal_mask).map(drop)
    }

    fn write(&mut self, fd: Fd, buffer: &[u8]) -> Result<usize, Errno> {
        // SAFETY: The pointer and length come from a valid slice.
        let result = unsafe { libc::write(fd.0, buffer.as_ptr().cast(), buffer.len()) };
        Errno::result(result).map(|count| count as usize)
    }

    fn sleep(&mut self, duration: Duration) -> Result<(), Errno> {
        let request = libc::timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as _,
        };
        // SAFETY: `request` is a valid timespec and the remainder is not needed.
        let result = unsafe { libc::nanosleep(&request, std::ptr::null_mut()) };
        Errno::result(result).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_system_caught_signals() {
        unsafe {
            let mut system = RealSystem::new();
            let result = system.caught_signals();
            assert_eq!(result, []);

            catch_signal(Signal::SIGINT as c_int);
            catch_signal(Signal::SIGTSTP as c_int);
            catch_signal(Signal::SIGTSTP as c_int);
            catch_signal(Signal::SIGCHLD as c_int);

            let result = system.caught_signals();
            assert_eq!(result, [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGCHLD]);
            let result = system.caught_signals();
            assert_eq!(result, []);
        }
    }
}
