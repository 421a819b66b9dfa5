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

//! Reactions to signals
//!
//! The interpreter catches four signals. The catching function installed by
//! [`install_handlers`] only records the signal; [`run_handlers`] performs the
//! actual reaction later, from ordinary control flow:
//!
//! - `SIGCHLD`: [`reap_children`] collects the status changes of child
//!   processes and updates the job list.
//! - `SIGINT` and `SIGTSTP`: [`forward_to_foreground`] sends the signal to the
//!   process group of the foreground job. The interpreter itself is never
//!   interrupted or stopped.
//! - `SIGQUIT`: the interpreter exits.
//!
//! `run_handlers` is called whenever the interpreter is about to block, so a
//! caught signal is reacted to without delay.

use std::ops::ControlFlow::{Break, Continue};
use tsh_env::job::fmt::Change;
use tsh_env::job::fmt::StatusChange;
use tsh_env::job::JobState;
use tsh_env::job::Pid;
use tsh_env::semantics::Divert;
use tsh_env::semantics::ExitStatus;
use tsh_env::semantics::Result;
use tsh_env::system::Errno;
use tsh_env::system::Signal;
use tsh_env::system::SignalHandling;
use tsh_env::system::WaitStatus;
use tsh_env::Env;

/// Signals the interpreter catches
pub const HANDLED_SIGNALS: [Signal; 4] = [
    Signal::SIGINT,
    Signal::SIGTSTP,
    Signal::SIGCHLD,
    Signal::SIGQUIT,
];

/// Makes the interpreter catch [`HANDLED_SIGNALS`].
pub fn install_handlers(env: &mut Env) -> std::result::Result<(), Errno> {
    for signal in HANDLED_SIGNALS {
        env.system.sigaction(signal, SignalHandling::Catch)?;
    }
    Ok(())
}

/// Reacts to the signals caught since the last call.
///
/// Signals caught while reacting, such as `SIGCHLD` from a job that a
/// forwarded `SIGINT` has killed, are reacted to before this function
/// returns. A signal that is blocked meanwhile stays pending and is left to
/// the next call.
///
/// The result is `Break` if the interpreter should exit.
pub fn run_handlers(env: &mut Env) -> Result {
    loop {
        let signals = env.system.caught_signals();
        if signals.is_empty() {
            return Continue(());
        }
        for signal in signals {
            log::debug!("caught {signal}");
            match signal {
                Signal::SIGCHLD => reap_children(env)?,
                Signal::SIGINT | Signal::SIGTSTP => forward_to_foreground(env, signal),
                Signal::SIGQUIT => {
                    env.print("Terminating after receipt of SIGQUIT signal\n");
                    return Break(Divert::Exit(ExitStatus::FAILURE));
                }
                _ => log::warn!("no reaction defined for {signal}"),
            }
        }
    }
}

/// Sends the signal to the process group of the foreground job.
///
/// Nothing happens if there is no foreground job. A failure to send the
/// signal is logged and otherwise ignored.
pub fn forward_to_foreground(env: &mut Env, signal: Signal) {
    let Some(pid) = env.jobs.foreground_pid() else {
        return;
    };
    let group = Pid::from_raw(-pid.as_raw());
    if let Err(errno) = env.system.kill(group, Some(signal)) {
        log::warn!("cannot send {signal} to process group {pid}: {errno}");
    }
}

/// Collects all pending status changes of child processes.
///
/// A job whose process has exited is removed from the job list. If the
/// process was killed by a signal, a notice is printed before the removal. A
/// job whose process has been stopped becomes [`JobState::Stopped`] and a
/// notice is printed.
///
/// The result is `Break(Divert::Abort(_))` if the status cannot be collected
/// for a reason other than the absence of child processes.
pub fn reap_children(env: &mut Env) -> Result {
    loop {
        match env.system.wait(Pid::from_raw(-1)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return Continue(()),

            Ok(WaitStatus::Exited(pid, status)) => {
                log::debug!("process {pid} exited with {status}");
                if env.jobs.remove(pid).is_none() {
                    log::info!("reaped process {pid} is not a job");
                }
            }

            Ok(WaitStatus::Signaled(pid, signal, _)) => match env.jobs.remove(pid) {
                Some(job) => {
                    let notice = StatusChange {
                        job: &job,
                        change: Change::Terminated,
                        signal,
                    };
                    env.print(&format!("{notice}\n"));
                }
                None => log::info!("reaped process {pid} is not a job"),
            },

            Ok(WaitStatus::Stopped(pid, signal)) => {
                let notice = env.jobs.find_by_pid_mut(pid).map(|mut job| {
                    // Leaving the foreground never conflicts with another job.
                    let _ = job.set_state(JobState::Stopped);
                    StatusChange {
                        job: &job,
                        change: Change::Stopped,
                        signal,
                    }
                    .to_string()
                });
                match notice {
                    Some(notice) => env.print(&format!("{notice}\n")),
                    None => log::info!("stopped process {pid} is not a job"),
                }
            }

            Ok(status) => log::debug!("ignoring {status:?}"),

            Err(errno) => {
                log::error!("cannot collect the status of child processes: {errno}");
                env.print(&format!("waitpid error: {errno}\n"));
                return Break(Divert::Abort(ExitStatus::FAILURE));
            }
        }
    }
}
