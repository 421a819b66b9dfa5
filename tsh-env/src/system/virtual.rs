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

//! System simulated in Rust.
//!
//! [`VirtualSystem`] is a pure Rust implementation of [`System`] that simulates
//! the behavior of the underlying system without any interaction with the
//! actual operating system. `VirtualSystem` is used for testing the behavior
//! of the interpreter.
//!
//! The following features are currently simulated:
//!
//! - Processes
//!     - Process IDs, parent process IDs, and process groups
//!     - Signal dispositions, the signal mask, and default signal actions
//!     - Status changes reported to the parent by `SIGCHLD` and `wait`
//! - Standard input, output, and error as in-memory buffers
//!
//! A virtual child process runs its task to completion as soon as it is
//! started. If the task calls [`execve`](System::execve) with a path listed in
//! [`SystemState::executables`], the process is regarded as running the new
//! program: anything the task does after that has no visible effect, and the
//! process keeps running until a [scheduled event](Event) ends it.
//!
//! Time does not pass in the virtual system. Instead, each call to
//! [`sleep`](System::sleep) fires the next scheduled event, and so do a
//! [`read`](System::read) from an empty standard input and a
//! [`wait_readable`](System::wait_readable) on it.

mod process;

pub use self::process::Process;
pub use self::process::ProcessState;
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
use crate::Env;
use std::borrow::Cow;
use std::cell::Ref;
use std::cell::RefCell;
use std::cell::RefMut;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::ffi::c_int;
use std::ffi::CStr;
use std::ffi::CString;
use std::rc::Rc;
use std::time::Duration;

/// Something that happens in the virtual system while the interpreter waits
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// The process exits with the exit status.
    Exit(Pid, c_int),
    /// The signal is sent to the process from outside the interpreter.
    Signal(Pid, Signal),
}

/// Collection of the state of the virtual system
#[derive(Clone, Debug, Default)]
pub struct SystemState {
    /// Processes running in the system
    pub processes: BTreeMap<Pid, Process>,

    /// Largest process ID ever assigned
    ///
    /// Process IDs are not reused after processes are reaped.
    pub last_pid: c_int,

    /// Paths that [`execve`](System::execve) accepts as programs
    pub executables: BTreeSet<String>,

    /// Contents of the standard input not yet read
    pub stdin: VecDeque<u8>,

    /// Contents written to the standard output
    pub stdout: Vec<u8>,

    /// Contents written to the standard error
    pub stderr: Vec<u8>,

    /// Arguments of all calls to [`kill`](System::kill), in order
    pub signals_sent: Vec<(Pid, Option<Signal>)>,

    /// Signal masks of the calling process at the calls to
    /// [`kill`](System::kill), in the same order as `signals_sent`
    pub masks_at_kill: Vec<SigSet>,

    /// Signal masks of the calling process at the calls to
    /// [`new_child_process`](System::new_child_process), in order
    pub masks_at_fork: Vec<SigSet>,

    /// Events fired one by one as the interpreter sleeps or waits for input
    pub scheduled: VecDeque<Event>,

    /// Error the next call to [`wait`](System::wait) fails with
    pub wait_error: Option<Errno>,

    /// Error the next call to [`new_child_process`](System::new_child_process)
    /// fails with
    pub fork_error: Option<Errno>,

    /// Error the next call to [`read`](System::read) fails with
    pub read_error: Option<Errno>,
}

impl SystemState {
    /// Returns the standard output as a string.
    #[must_use]
    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Returns the standard error as a string.
    #[must_use]
    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Sends a signal to the process.
    ///
    /// If the signal changes the state of the process, `SIGCHLD` is sent to the
    /// parent. Returns false if there is no such process.
    pub fn send_signal(&mut self, pid: Pid, signal: Signal) -> bool {
        let Some(process) = self.processes.get_mut(&pid) else {
            return false;
        };
        if process.raise_signal(signal) {
            let ppid = process.ppid;
            self.send_signal(ppid, Signal::SIGCHLD);
        }
        true
    }

    /// Terminates the process with the exit status.
    ///
    /// `SIGCHLD` is sent to the parent. Nothing happens if the process is not
    /// alive.
    pub fn exit(&mut self, pid: Pid, status: c_int) {
        let Some(process) = self.processes.get_mut(&pid) else {
            return;
        };
        if process.state().is_alive() && process.set_state(ProcessState::Exited(status)) {
            let ppid = process.ppid;
            self.send_signal(ppid, Signal::SIGCHLD);
        }
    }

    /// Makes the event happen.
    pub fn fire(&mut self, event: Event) {
        match event {
            Event::Exit(pid, status) => self.exit(pid, status),
            Event::Signal(pid, signal) => {
                self.send_signal(pid, signal);
            }
        }
    }

    /// Fires the next scheduled event.
    ///
    /// Returns false if no event is scheduled.
    pub fn fire_next(&mut self) -> bool {
        match self.scheduled.pop_front() {
            Some(event) => {
                self.fire(event);
                true
            }
            None => false,
        }
    }

    /// Replaces the signal mask of the process and returns the previous one.
    fn set_signal_mask(&mut self, pid: Pid, mask: &SigSet) -> SigSet {
        let Some(process) = self.processes.get_mut(&pid) else {
            return SigSet::empty();
        };
        let old_mask = process.blocked_signals();
        if process.block_signals(SigmaskHow::SIG_SETMASK, mask) {
            let ppid = process.ppid;
            self.send_signal(ppid, Signal::SIGCHLD);
        }
        old_mask
    }

    fn blocked_signals(&self, pid: Pid) -> SigSet {
        self.processes
            .get(&pid)
            .map_or_else(SigSet::empty, Process::blocked_signals)
    }

    fn has_caught_signals(&self, pid: Pid) -> bool {
        self.processes
            .get(&pid)
            .is_some_and(|process| !process.caught_signals.is_empty())
    }

    fn has_executed(&self, pid: Pid) -> bool {
        self.processes
            .get(&pid)
            .is_some_and(|process| process.last_exec.is_some())
    }
}

/// Simulated system
///
/// See the [module-level documentation](self) to grasp a basic understanding
/// of `VirtualSystem`.
///
/// A `VirtualSystem` instance has two members: `state` and `process_id`. The
/// former is a [`SystemState`] that effectively contains the state of the
/// system. The state is contained in `Rc` so that virtual processes can share
/// the same state. The latter is a process ID that identifies a process
/// calling the [`System`] interface.
#[derive(Clone, Debug)]
pub struct VirtualSystem {
    /// State of the system
    pub state: Rc<RefCell<SystemState>>,

    /// Process ID of the process that is interacting with the system
    pub process_id: Pid,
}

impl VirtualSystem {
    /// Creates a new virtual system with a single process.
    ///
    /// The process has process ID 2 and belongs to its own process group. Its
    /// parent, process 1, does not exist in the system.
    #[must_use]
    pub fn new() -> VirtualSystem {
        let process_id = Pid::from_raw(2);
        let mut state = SystemState {
            last_pid: process_id.as_raw(),
            ..SystemState::default()
        };
        let process = Process::with_parent_and_group(Pid::from_raw(1), process_id);
        state.processes.insert(process_id, process);
        VirtualSystem {
            state: Rc::new(RefCell::new(state)),
            process_id,
        }
    }

    /// Finds the current process from the system state.
    ///
    /// # Panics
    ///
    /// This function will panic if it cannot find a process having
    /// `self.process_id`.
    pub fn current_process(&self) -> Ref<'_, Process> {
        Ref::map(self.state.borrow(), |state| {
            &state.processes[&self.process_id]
        })
    }

    /// Finds the current process from the system state.
    ///
    /// # Panics
    ///
    /// This function will panic if it cannot find a process having
    /// `self.process_id`.
    pub fn current_process_mut(&mut self) -> RefMut<'_, Process> {
        RefMut::map(self.state.borrow_mut(), |state| {
            state
                .processes
                .get_mut(&self.process_id)
                .expect("current process not found")
        })
    }
}

impl Default for VirtualSystem {
    fn default() -> Self {
        VirtualSystem::new()
    }
}

impl System for VirtualSystem {
    fn sigmask(
        &mut self,
        how: SigmaskHow,
        set: Option<&SigSet>,
        oldset: Option<&mut SigSet>,
    ) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        let process = state
            .processes
            .get_mut(&self.process_id)
            .expect("current process not found");

        if let Some(oldset) = oldset {
            *oldset = process.blocked_signals();
        }

        if let Some(set) = set {
            if process.block_signals(how, set) {
                let ppid = process.ppid;
                state.send_signal(ppid, Signal::SIGCHLD);
            }
        }

        Ok(())
    }

    fn sigaction(
        &mut self,
        signal: Signal,
        handling: SignalHandling,
    ) -> Result<SignalHandling, Errno> {
        if signal == Signal::SIGKILL || signal == Signal::SIGSTOP {
            return Err(Errno::EINVAL);
        }
        Ok(self
            .current_process_mut()
            .set_signal_handling(signal, handling))
    }

    fn caught_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.current_process_mut().caught_signals)
    }

    /// Sends a signal to the target process.
    ///
    /// A positive `target` names a single process. Zero names the process
    /// group of the current process, and a negative value the process group
    /// `-target`. Every call is recorded in [`SystemState::signals_sent`].
    fn kill(&mut self, target: Pid, signal: Option<Signal>) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        state.signals_sent.push((target, signal));
        let mask = state.blocked_signals(self.process_id);
        state.masks_at_kill.push(mask);

        let targets: Vec<Pid> = match target.as_raw() {
            raw if raw > 0 => state
                .processes
                .contains_key(&target)
                .then_some(target)
                .into_iter()
                .collect(),
            raw => {
                let pgid = if raw == 0 {
                    state.processes[&self.process_id].pgid
                } else {
                    Pid::from_raw(-raw)
                };
                state
                    .processes
                    .iter()
                    .filter(|(_, process)| process.pgid == pgid)
                    .map(|(pid, _)| *pid)
                    .collect()
            }
        };

        if targets.is_empty() {
            return Err(Errno::ESRCH);
        }
        if let Some(signal) = signal {
            for pid in targets {
                state.send_signal(pid, signal);
            }
        }
        Ok(())
    }

    fn getpid(&self) -> Pid {
        self.process_id
    }

    /// Modifies the process group ID of a process.
    ///
    /// The target must be the current process or one of its children. As with
    /// the real system call, a child that has already called `execve` cannot
    /// be moved by the parent.
    fn setpgid(&mut self, pid: Pid, pgid: Pid) -> Result<(), Errno> {
        let pid = if pid.as_raw() == 0 {
            self.process_id
        } else {
            pid
        };
        let pgid = if pgid.as_raw() == 0 { pid } else { pgid };
        if pgid.as_raw() < 0 {
            return Err(Errno::EINVAL);
        }

        let mut state = self.state.borrow_mut();
        let process = state.processes.get_mut(&pid).ok_or(Errno::ESRCH)?;
        if pid != self.process_id {
            if process.ppid != self.process_id {
                return Err(Errno::ESRCH);
            }
            if process.last_exec.is_some() {
                return Err(Errno::EACCES);
            }
        }
        process.pgid = pgid;
        Ok(())
    }

    /// Creates a new child process.
    ///
    /// The child process ID is one greater than the largest process ID ever
    /// assigned. The returned starter runs the task immediately. Unless the
    /// task has executed a program, the child exits with the exit status of
    /// the task, and `SIGCHLD` is sent to the parent.
    fn new_child_process(&mut self) -> Result<ChildProcessStarter, Errno> {
        let mut state = self.state.borrow_mut();
        let mask = state.blocked_signals(self.process_id);
        state.masks_at_fork.push(mask);
        if let Some(errno) = state.fork_error.take() {
            return Err(errno);
        }
        let max_pid = state.processes.keys().max().map_or(0, |pid| pid.as_raw());
        let process_id = Pid::from_raw(max_pid.max(state.last_pid) + 1);
        state.last_pid = process_id.as_raw();
        let parent_process = &state.processes[&self.process_id];
        let child_process = Process::fork_from(self.process_id, parent_process);
        state.processes.insert(process_id, child_process);
        drop(state);

        let state = Rc::clone(&self.state);
        Ok(Box::new(move |parent_env, task| {
            let system = VirtualSystem {
                state: Rc::clone(&state),
                process_id,
            };
            let mut child_env = Env::with_system(Box::new(system));
            child_env.options = parent_env.options;

            let exit_status = task(&mut child_env);

            let mut state = state.borrow_mut();
            if !state.has_executed(process_id) {
                state.exit(process_id, exit_status.0);
            }
            process_id
        }))
    }

    /// Simulates `waitpid` with `WNOHANG` and `WUNTRACED`.
    ///
    /// `target` may be `-1` for any child or the process ID of a child. A
    /// terminated child is removed from the system when its status is
    /// reported.
    fn wait(&mut self, target: Pid) -> Result<WaitStatus, Errno> {
        let parent_pid = self.process_id;
        let mut state = self.state.borrow_mut();
        if let Some(errno) = state.wait_error.take() {
            return Err(errno);
        }

        let is_target = |pid: Pid, process: &Process| {
            process.ppid == parent_pid && (target.as_raw() == -1 || pid == target)
        };

        let changed = state
            .processes
            .iter()
            .find(|&(&pid, process)| is_target(pid, process) && process.state_has_changed())
            .map(|(&pid, _)| pid);
        if let Some(pid) = changed {
            if let Some(process) = state.processes.get_mut(&pid) {
                let process_state = process.take_state();
                if !process_state.is_alive() {
                    state.processes.remove(&pid);
                }
                return Ok(process_state.to_wait_status(pid));
            }
        }

        if state
            .processes
            .iter()
            .any(|(&pid, process)| is_target(pid, process))
        {
            Ok(WaitStatus::StillAlive)
        } else {
            Err(Errno::ECHILD)
        }
    }

    /// Stub for the `execve` system call.
    ///
    /// The `execve` system call cannot be simulated in the userland. This
    /// function returns `ENOSYS` if the path is one of
    /// [`SystemState::executables`] and `ENOENT` otherwise. In the former case,
    /// the arguments are recorded in the current process, which is then
    /// regarded as running the program.
    fn execve(
        &mut self,
        path: &CStr,
        args: &[CString],
        envs: &[CString],
    ) -> Result<Infallible, Errno> {
        let mut state = self.state.borrow_mut();
        if !state.executables.contains(path.to_string_lossy().as_ref()) {
            return Err(Errno::ENOENT);
        }
        let process = state
            .processes
            .get_mut(&self.process_id)
            .expect("current process not found");
        process.exec(path.to_owned(), args.to_owned(), envs.to_owned());
        Err(Errno::ENOSYS)
    }

    /// Reads from the standard input.
    ///
    /// If the standard input is empty, scheduled events are fired until the
    /// current process catches a signal, in which case `EINTR` is returned.
    /// If no event remains, the end of input is reported.
    fn read(&mut self, fd: Fd, buffer: &mut [u8]) -> Result<usize, Errno> {
        if fd != Fd::STDIN {
            return Err(Errno::EBADF);
        }
        let mut state = self.state.borrow_mut();
        if let Some(errno) = state.read_error.take() {
            return Err(errno);
        }
        loop {
            if !state.stdin.is_empty() {
                let count = buffer.len().min(state.stdin.len());
                for (dst, src) in buffer.iter_mut().zip(state.stdin.drain(..count)) {
                    *dst = src;
                }
                return Ok(count);
            }
            if !state.fire_next() {
                return Ok(0);
            }
            if state.has_caught_signals(self.process_id) {
                return Err(Errno::EINTR);
            }
        }
    }

    /// Waits for the standard input to become readable.
    ///
    /// The signal mask of the current process is set to `signal_mask` while
    /// waiting, so a pending signal it unblocks is caught before anything
    /// else happens. If the standard input is empty, scheduled events are
    /// fired until a signal is caught. The standard input is regarded as
    /// being at the end of file when no events remain.
    fn wait_readable(&mut self, fd: Fd, signal_mask: &SigSet) -> Result<(), Errno> {
        if fd != Fd::STDIN {
            return Err(Errno::EBADF);
        }
        let pid = self.process_id;
        let mut state = self.state.borrow_mut();
        let old_mask = state.set_signal_mask(pid, signal_mask);

        let result = loop {
            if state.has_caught_signals(pid) {
                break Err(Errno::EINTR);
            }
            if !state.stdin.is_empty() || !state.fire_next() {
                break Ok(());
            }
        };

        state.set_signal_mask(pid, &old_mask);
        result
    }

    fn write(&mut self, fd: Fd, buffer: &[u8]) -> Result<usize, Errno> {
        let mut state = self.state.borrow_mut();
        if state.has_executed(self.process_id) {
            // The program that replaced the task writes elsewhere.
            return Ok(buffer.len());
        }
        match fd {
            Fd::STDOUT => state.stdout.extend_from_slice(buffer),
            Fd::STDERR => state.stderr.extend_from_slice(buffer),
            _ => return Err(Errno::EBADF),
        }
        Ok(buffer.len())
    }

    /// Fires the next scheduled event.
    ///
    /// `EINTR` is returned if the current process has caught a signal.
    ///
    /// # Panics
    ///
    /// This function panics if no event is scheduled, since nothing could
    /// wake the process up.
    fn sleep(&mut self, _duration: Duration) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        assert!(
            state.fire_next(),
            "process {} sleeps with no scheduled event",
            self.process_id
        );
        if state.has_caught_signals(self.process_id) {
            Err(Errno::EINTR)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::ExitStatus;
    use assert_matches::assert_matches;

    fn spawn(system: &mut VirtualSystem, env: &mut Env, status: ExitStatus) -> Pid {
        let starter = system.new_child_process().unwrap();
        starter(env, Box::new(move |_env| status))
    }

    #[test]
    fn child_exits_with_task_status_and_is_reaped_once() {
        let mut system = VirtualSystem::new();
        let mut env = Env::with_system(Box::new(system.clone()));
        let pid = spawn(&mut system, &mut env, ExitStatus(5));
        assert_eq!(pid, Pid::from_raw(3));

        assert_eq!(system.wait(Pid::from_raw(-1)), Ok(WaitStatus::Exited(pid, 5)));
        assert_eq!(system.wait(Pid::from_raw(-1)), Err(Errno::ECHILD));
        assert!(!system.state.borrow().processes.contains_key(&pid));
    }

    #[test]
    fn process_ids_are_not_reused() {
        let mut system = VirtualSystem::new();
        let mut env = Env::with_system(Box::new(system.clone()));
        let first = spawn(&mut system, &mut env, ExitStatus::SUCCESS);
        system.wait(first).unwrap();
        let second = spawn(&mut system, &mut env, ExitStatus::SUCCESS);
        assert_eq!(second, Pid::from_raw(4));
    }

    #[test]
    fn exit_of_child_sends_sigchld_to_parent() {
        let mut system = VirtualSystem::new();
        system
            .sigaction(Signal::SIGCHLD, SignalHandling::Catch)
            .unwrap();
        let mut env = Env::with_system(Box::new(system.clone()));
        spawn(&mut system, &mut env, ExitStatus::SUCCESS);
        assert_eq!(system.caught_signals(), [Signal::SIGCHLD]);
        assert_eq!(system.caught_signals(), []);
    }

    #[test]
    fn executed_child_keeps_running_until_event() {
        let mut system = VirtualSystem::new();
        system
            .state
            .borrow_mut()
            .executables
            .insert("/bin/sleep".to_string());
        let mut env = Env::with_system(Box::new(system.clone()));
        let starter = system.new_child_process().unwrap();
        let pid = starter(
            &mut env,
            Box::new(|env| {
                let path = CString::new("/bin/sleep").unwrap();
                let args = [path.clone(), CString::new("10").unwrap()];
                let errno = env.system.execve(&path, &args, &[]).unwrap_err();
                env.print_error(&format!("{errno}\n"));
                ExitStatus::NOEXEC
            }),
        );

        assert_eq!(system.wait(pid), Ok(WaitStatus::StillAlive));
        {
            let state = system.state.borrow();
            let process = &state.processes[&pid];
            assert_eq!(process.state(), ProcessState::Running);
            let (path, args, _) = process.last_exec().as_ref().unwrap();
            assert_eq!(path.to_str(), Ok("/bin/sleep"));
            assert_eq!(args.len(), 2);
            assert_eq!(state.stderr_str(), "");
        }

        system
            .state
            .borrow_mut()
            .scheduled
            .push_back(Event::Exit(pid, 0));
        system.sleep(Duration::from_millis(100)).unwrap();
        assert_eq!(system.wait(pid), Ok(WaitStatus::Exited(pid, 0)));
    }

    #[test]
    fn execve_of_unknown_path_fails() {
        let mut system = VirtualSystem::new();
        let path = CString::new("/no/such/file").unwrap();
        let result = system.execve(&path, &[path.clone()], &[]);
        assert_eq!(result, Err(Errno::ENOENT));
        assert_eq!(*system.current_process().last_exec(), None);
    }

    #[test]
    fn stopped_child_is_reported() {
        let mut system = VirtualSystem::new();
        let pid = Pid::from_raw(10);
        let child = Process::with_parent_and_group(system.process_id, pid);
        system.state.borrow_mut().processes.insert(pid, child);

        system.kill(pid, Some(Signal::SIGTSTP)).unwrap();
        assert_eq!(
            system.wait(Pid::from_raw(-1)),
            Ok(WaitStatus::Stopped(pid, Signal::SIGTSTP))
        );
        assert_eq!(system.wait(Pid::from_raw(-1)), Ok(WaitStatus::StillAlive));

        system.kill(pid, Some(Signal::SIGCONT)).unwrap();
        assert_eq!(system.wait(Pid::from_raw(-1)), Ok(WaitStatus::StillAlive));
    }

    #[test]
    fn kill_process_group() {
        let mut system = VirtualSystem::new();
        let pgid = Pid::from_raw(10);
        {
            let mut state = system.state.borrow_mut();
            for raw in [10, 11] {
                let process = Process::with_parent_and_group(system.process_id, pgid);
                state.processes.insert(Pid::from_raw(raw), process);
            }
        }

        system.kill(Pid::from_raw(-10), Some(Signal::SIGINT)).unwrap();
        let state = system.state.borrow();
        for raw in [10, 11] {
            assert_eq!(
                state.processes[&Pid::from_raw(raw)].state(),
                ProcessState::Signaled(Signal::SIGINT)
            );
        }
        assert_eq!(
            state.processes[&system.process_id].state(),
            ProcessState::Running
        );
        assert_eq!(
            state.signals_sent,
            [(Pid::from_raw(-10), Some(Signal::SIGINT))]
        );
    }

    #[test]
    fn kill_missing_target() {
        let mut system = VirtualSystem::new();
        assert_eq!(
            system.kill(Pid::from_raw(-42), Some(Signal::SIGINT)),
            Err(Errno::ESRCH)
        );
        assert_eq!(system.kill(Pid::from_raw(42), None), Err(Errno::ESRCH));
        assert_eq!(system.kill(system.process_id, None), Ok(()));
    }

    #[test]
    fn setpgid_of_child() {
        let mut system = VirtualSystem::new();
        let mut env = Env::with_system(Box::new(system.clone()));
        let starter = system.new_child_process().unwrap();
        let pid = starter(
            &mut env,
            Box::new(|env| {
                env.system
                    .setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .unwrap();
                ExitStatus::SUCCESS
            }),
        );
        assert_eq!(system.state.borrow().processes[&pid].pgid(), pid);

        let stranger = Pid::from_raw(1);
        assert_eq!(system.setpgid(stranger, stranger), Err(Errno::ESRCH));
    }

    #[test]
    fn blocked_sigchld_is_delivered_on_unblock() {
        let mut system = VirtualSystem::new();
        system
            .sigaction(Signal::SIGCHLD, SignalHandling::Catch)
            .unwrap();
        let mut set = SigSet::empty();
        set.add(Signal::SIGCHLD);
        system
            .sigmask(SigmaskHow::SIG_BLOCK, Some(&set), None)
            .unwrap();

        let mut env = Env::with_system(Box::new(system.clone()));
        spawn(&mut system, &mut env, ExitStatus::SUCCESS);
        assert_eq!(system.caught_signals(), []);

        system
            .sigmask(SigmaskHow::SIG_UNBLOCK, Some(&set), None)
            .unwrap();
        assert_eq!(system.caught_signals(), [Signal::SIGCHLD]);
    }

    #[test]
    fn read_from_stdin_and_eof() {
        let mut system = VirtualSystem::new();
        system.state.borrow_mut().stdin.extend(b"ab");
        let mut buffer = [0; 1];
        assert_eq!(system.read(Fd::STDIN, &mut buffer), Ok(1));
        assert_eq!(buffer, *b"a");
        assert_eq!(system.read(Fd::STDIN, &mut buffer), Ok(1));
        assert_eq!(buffer, *b"b");
        assert_eq!(system.read(Fd::STDIN, &mut buffer), Ok(0));
    }

    #[test]
    fn read_interrupted_by_caught_signal() {
        let mut system = VirtualSystem::new();
        system
            .sigaction(Signal::SIGINT, SignalHandling::Catch)
            .unwrap();
        let pid = system.process_id;
        system
            .state
            .borrow_mut()
            .scheduled
            .push_back(Event::Signal(pid, Signal::SIGINT));

        let mut buffer = [0; 1];
        assert_eq!(system.read(Fd::STDIN, &mut buffer), Err(Errno::EINTR));
        assert_eq!(system.caught_signals(), [Signal::SIGINT]);
        assert_eq!(system.read(Fd::STDIN, &mut buffer), Ok(0));
    }

    #[test]
    fn sleep_fires_one_event() {
        let mut system = VirtualSystem::new();
        let pid = Pid::from_raw(10);
        let child = Process::with_parent_and_group(system.process_id, pid);
        {
            let mut state = system.state.borrow_mut();
            state.processes.insert(pid, child);
            state.scheduled.push_back(Event::Signal(pid, Signal::SIGSTOP));
            state.scheduled.push_back(Event::Exit(pid, 3));
        }

        assert_eq!(system.sleep(Duration::from_secs(1)), Ok(()));
        assert_eq!(system.current_process().caught_signals(), []);
        assert_matches!(
            system.state.borrow().processes[&pid].state(),
            ProcessState::Stopped(Signal::SIGSTOP)
        );
        assert_eq!(system.state.borrow().scheduled.len(), 1);
    }

    #[test]
    fn write_to_bad_fd() {
        let mut system = VirtualSystem::new();
        assert_eq!(system.write(Fd(5), b"x"), Err(Errno::EBADF));
        assert_eq!(system.write(Fd::STDOUT, b"x"), Ok(1));
        assert_eq!(system.state.borrow().stdout, b"x");
    }

    #[test]
    fn wait_readable_catches_signal_pending_before_wait() {
        let mut system = VirtualSystem::new();
        system
            .sigaction(Signal::SIGINT, SignalHandling::Catch)
            .unwrap();
        let mut sigint = SigSet::empty();
        sigint.add(Signal::SIGINT);
        system
            .sigmask(SigmaskHow::SIG_BLOCK, Some(&sigint), None)
            .unwrap();
        system.state.borrow_mut().stdin.extend(b"jobs\n");
        let pid = system.process_id;
        system.state.borrow_mut().send_signal(pid, Signal::SIGINT);
        assert_eq!(system.caught_signals(), []);

        let result = system.wait_readable(Fd::STDIN, &SigSet::empty());
        assert_eq!(result, Err(Errno::EINTR));
        assert_eq!(system.caught_signals(), [Signal::SIGINT]);
        assert!(system
            .current_process()
            .blocked_signals()
            .contains(Signal::SIGINT));
        assert_eq!(system.wait_readable(Fd::STDIN, &SigSet::empty()), Ok(()));
    }

    #[test]
    fn wait_readable_fires_events_until_signal_is_caught() {
        let mut system = VirtualSystem::new();
        system
            .sigaction(Signal::SIGCHLD, SignalHandling::Catch)
            .unwrap();
        let shell = system.process_id;
        let child = Pid::from_raw(10);
        {
            let mut state = system.state.borrow_mut();
            state
                .processes
                .insert(child, Process::with_parent_and_group(shell, child));
            state.scheduled.push_back(Event::Exit(child, 0));
            state.scheduled.push_back(Event::Exit(Pid::from_raw(11), 0));
        }

        let result = system.wait_readable(Fd::STDIN, &SigSet::empty());
        assert_eq!(result, Err(Errno::EINTR));
        assert_eq!(system.caught_signals(), [Signal::SIGCHLD]);
        assert_eq!(system.state.borrow().scheduled.len(), 1);

        assert_eq!(system.wait_readable(Fd::STDIN, &SigSet::empty()), Ok(()));
        assert!(system.state.borrow().scheduled.is_empty());
    }

    #[test]
    fn signal_mask_is_recorded_at_kill_and_fork() {
        let mut system = VirtualSystem::new();
        let mut sigchld = SigSet::empty();
        sigchld.add(Signal::SIGCHLD);
        system
            .sigmask(SigmaskHow::SIG_BLOCK, Some(&sigchld), None)
            .unwrap();
        let pid = system.process_id;
        system.kill(pid, None).unwrap();
        let _ = system.new_child_process().unwrap();

        let state = system.state.borrow();
        assert_eq!(state.masks_at_kill, [sigchld]);
        assert_eq!(state.masks_at_fork, [sigchld]);
    }
}
