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

//! Processes in a virtual system.

use super::super::SigSet;
use super::super::SigmaskHow;
use super::super::Signal;
use super::super::SignalHandling;
use super::super::WaitStatus;
use crate::job::Pid;
use std::collections::HashMap;
use std::ffi::c_int;
use std::ffi::CString;

/// Process in a virtual system
#[derive(Clone, Debug)]
pub struct Process {
    /// Process ID of the parent process
    pub(crate) ppid: Pid,

    /// Process group ID of this process
    pub(crate) pgid: Pid,

    /// Execution state of the process
    state: ProcessState,

    /// True when `state` has changed but not yet been reported by `wait`
    state_has_changed: bool,

    /// Current signal dispositions
    signal_handlings: HashMap<Signal, SignalHandling>,

    /// Set of blocked signals
    blocked_signals: SigSet,

    /// Set of raised but not yet delivered signals
    pending_signals: SigSet,

    /// Signals caught by the process but not yet taken by
    /// [`caught_signals`](crate::System::caught_signals)
    pub(crate) caught_signals: Vec<Signal>,

    /// Copy of arguments passed to [`execve`](crate::System::execve)
    pub(crate) last_exec: Option<(CString, Vec<CString>, Vec<CString>)>,
}

impl Process {
    /// Creates a new running process that belongs to its own process group.
    #[must_use]
    pub fn with_parent_and_group(ppid: Pid, pgid: Pid) -> Process {
        Process {
            ppid,
            pgid,
            state: ProcessState::Running,
            state_has_changed: false,
            signal_handlings: HashMap::new(),
            blocked_signals: SigSet::empty(),
            pending_signals: SigSet::empty(),
            caught_signals: Vec::new(),
            last_exec: None,
        }
    }

    /// Creates a new process as a child of the given parent process.
    ///
    /// The child inherits the process group, the signal dispositions, and the
    /// signal mask of the parent. Caught and pending signals are not
    /// inherited.
    #[must_use]
    pub fn fork_from(ppid: Pid, parent: &Process) -> Process {
        let mut child = Process::with_parent_and_group(ppid, parent.pgid);
        child.signal_handlings = parent.signal_handlings.clone();
        child.blocked_signals = parent.blocked_signals;
        child
    }

    /// Returns the process ID of the parent process.
    #[inline(always)]
    #[must_use]
    pub fn ppid(&self) -> Pid {
        self.ppid
    }

    /// Returns the process group ID of this process.
    #[inline(always)]
    #[must_use]
    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    /// Returns the process state.
    #[inline(always)]
    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Sets the state of this process.
    ///
    /// This function returns whether the state did change. If true, the
    /// caller must notify the status update by sending `SIGCHLD` to the parent
    /// process.
    ///
    /// Resuming a stopped process is not reported by
    /// [`wait`](crate::System::wait) because the real `waitpid` is not called
    /// with `WCONTINUED`.
    #[must_use = "You must send SIGCHLD to the parent"]
    pub fn set_state(&mut self, state: ProcessState) -> bool {
        let old_state = std::mem::replace(&mut self.state, state);
        if old_state == state {
            return false;
        }
        self.state_has_changed = state != ProcessState::Running;
        if !state.is_alive() {
            self.pending_signals = SigSet::empty();
        }
        true
    }

    /// Returns true if a new state has been [set](Self::set_state) but not yet
    /// [taken](Self::take_state).
    #[must_use]
    pub fn state_has_changed(&self) -> bool {
        self.state_has_changed
    }

    /// Returns the process state and clears the
    /// [`state_has_changed`](Self::state_has_changed) flag.
    pub fn take_state(&mut self) -> ProcessState {
        self.state_has_changed = false;
        self.state
    }

    /// Returns the currently blocked signals.
    #[must_use]
    pub fn blocked_signals(&self) -> SigSet {
        self.blocked_signals
    }

    /// Returns the currently pending signals.
    #[must_use]
    pub fn pending_signals(&self) -> SigSet {
        self.pending_signals
    }

    /// Returns the signals caught but not yet taken.
    #[must_use]
    pub fn caught_signals(&self) -> &[Signal] {
        &self.caught_signals
    }

    /// Returns the arguments to the last call to
    /// [`execve`](crate::System::execve) on this process.
    #[inline(always)]
    #[must_use]
    pub fn last_exec(&self) -> &Option<(CString, Vec<CString>, Vec<CString>)> {
        &self.last_exec
    }

    /// Records a successful `execve`.
    ///
    /// As with the real system call, caught signals are reset to the default
    /// handling because the catching function no longer exists in the new
    /// program.
    pub(crate) fn exec(&mut self, path: CString, args: Vec<CString>, envs: Vec<CString>) {
        for handling in self.signal_handlings.values_mut() {
            if *handling == SignalHandling::Catch {
                *handling = SignalHandling::Default;
            }
        }
        self.caught_signals.clear();
        self.last_exec = Some((path, args, envs));
    }

    /// Updates the signal blocking mask for this process.
    ///
    /// If this function unblocks a signal, any pending signal is delivered.
    ///
    /// Returns true if the delivery changed the process state.
    #[must_use = "You must send SIGCHLD to the parent"]
    pub fn block_signals(&mut self, how: SigmaskHow, signals: &SigSet) -> bool {
        match how {
            SigmaskHow::SIG_SETMASK => self.blocked_signals = *signals,
            SigmaskHow::SIG_BLOCK => {
                for signal in signals.iter() {
                    self.blocked_signals.add(signal);
                }
            }
            SigmaskHow::SIG_UNBLOCK => {
                for signal in signals.iter() {
                    self.blocked_signals.remove(signal);
                }
            }
            _ => unreachable!(),
        }
        self.deliver_pending_signals()
    }

    /// Returns the current handling for a signal.
    #[must_use]
    pub fn signal_handling(&self, signal: Signal) -> SignalHandling {
        self.signal_handlings
            .get(&signal)
            .copied()
            .unwrap_or_default()
    }

    /// Sets the handling for a signal and returns the previous one.
    pub fn set_signal_handling(
        &mut self,
        signal: Signal,
        handling: SignalHandling,
    ) -> SignalHandling {
        let old_handling = self.signal_handlings.insert(signal, handling);
        old_handling.unwrap_or_default()
    }

    /// Sends a signal to this process.
    ///
    /// If the signal is being blocked, or the process is stopped and the
    /// signal can neither kill nor continue it, the signal remains pending.
    /// Otherwise, it is immediately delivered.
    ///
    /// Returns true if the process state has changed.
    #[must_use = "You must send SIGCHLD to the parent"]
    pub fn raise_signal(&mut self, signal: Signal) -> bool {
        if !self.state.is_alive() {
            return false;
        }
        let unblockable = signal == Signal::SIGKILL || signal == Signal::SIGSTOP;
        let blocked = !unblockable && self.blocked_signals.contains(signal);
        let stopped = matches!(self.state, ProcessState::Stopped(_));

        let mut changed = false;
        if signal == Signal::SIGCONT && stopped {
            changed = self.set_state(ProcessState::Running);
        }

        if blocked || (stopped && signal != Signal::SIGKILL && signal != Signal::SIGCONT) {
            self.pending_signals.add(signal);
            return changed;
        }

        let delivered = self.deliver_signal(signal);
        let continued = changed && self.deliver_pending_signals();
        changed || delivered || continued
    }

    /// Delivers all pending signals that are no longer blocked.
    fn deliver_pending_signals(&mut self) -> bool {
        let mut changed = false;
        for signal in Signal::iterator() {
            if !self.state.is_alive() || matches!(self.state, ProcessState::Stopped(_)) {
                break;
            }
            if self.pending_signals.contains(signal) && !self.blocked_signals.contains(signal) {
                self.pending_signals.remove(signal);
                changed |= self.deliver_signal(signal);
            }
        }
        changed
    }

    /// Performs the action for a signal according to the current handling.
    fn deliver_signal(&mut self, signal: Signal) -> bool {
        let handling = if signal == Signal::SIGKILL || signal == Signal::SIGSTOP {
            SignalHandling::Default
        } else {
            self.signal_handling(signal)
        };
        match handling {
            SignalHandling::Ignore => false,
            SignalHandling::Catch => {
                // Like a real pending signal, a signal caught twice before
                // being taken is recorded once.
                if !self.caught_signals.contains(&signal) {
                    self.caught_signals.push(signal);
                }
                false
            }
            SignalHandling::Default => match DefaultAction::of(signal) {
                DefaultAction::Ignore | DefaultAction::Continue => false,
                DefaultAction::Stop => self.set_state(ProcessState::Stopped(signal)),
                DefaultAction::Terminate => self.set_state(ProcessState::Signaled(signal)),
            },
        }
    }
}

/// Action taken when a signal is delivered with the default handling
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DefaultAction {
    Ignore,
    Continue,
    Stop,
    Terminate,
}

impl DefaultAction {
    fn of(signal: Signal) -> Self {
        use Signal::*;
        match signal {
            SIGCHLD | SIGURG | SIGWINCH => DefaultAction::Ignore,
            SIGCONT => DefaultAction::Continue,
            SIGSTOP | SIGTSTP | SIGTTIN | SIGTTOU => DefaultAction::Stop,
            _ => DefaultAction::Terminate,
        }
    }
}

/// State of a process
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessState {
    Running,
    Stopped(Signal),
    Exited(c_int),
    Signaled(Signal),
}

impl ProcessState {
    /// Whether the process is not yet terminated.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match self {
            ProcessState::Running | ProcessState::Stopped(_) => true,
            ProcessState::Exited(_) | ProcessState::Signaled(_) => false,
        }
    }

    /// Converts `ProcessState` to `WaitStatus`.
    #[must_use]
    pub fn to_wait_status(self, pid: Pid) -> WaitStatus {
        match self {
            ProcessState::Running => WaitStatus::Continued(pid),
            ProcessState::Stopped(signal) => WaitStatus::Stopped(pid, signal),
            ProcessState::Exited(status) => WaitStatus::Exited(pid, status),
            ProcessState::Signaled(signal) => WaitStatus::Signaled(pid, signal, false),
        }
    }
}
