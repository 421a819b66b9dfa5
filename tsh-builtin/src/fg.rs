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

//! Fg built-in
//!
//! The **`fg`** built-in resumes a job in the foreground.
//!
//! # Synopsis
//!
//! ```sh
//! fg pid
//! fg %jid
//! ```
//!
//! # Description
//!
//! If the selected job is stopped, the built-in sends `SIGCONT` to its process
//! group. The job becomes the foreground job and the built-in
//! [waits](tsh_semantics::wait::wait_for_foreground) until the job exits or
//! stops again.
//!
//! # Errors
//!
//! If the operand is missing or does not select a job, an error message is
//! printed to the standard output and no job is affected.

use crate::common::{report, select_job};
use std::ops::ControlFlow::Continue;
use tsh_env::job::JobState;
use tsh_env::job::Pid;
use tsh_env::semantics::Result;
use tsh_env::system::Signal;
use tsh_env::Env;
use tsh_semantics::wait::wait_for_foreground;

/// Moves the selected job to the foreground.
///
/// Returns the process ID of the job if successful.
fn resume(env: &mut Env, args: &[String]) -> Option<Pid> {
    let pid = match select_job(&env.jobs, args) {
        Ok(pid) => pid,
        Err(error) => {
            report(env, &error);
            return None;
        }
    };
    let mut job = env.jobs.find_by_pid_mut(pid)?;
    let was_stopped = job.state == JobState::Stopped;
    if let Err(error) = job.set_state(JobState::Foreground) {
        log::warn!("cannot resume job {pid}: {error}");
        return None;
    }

    if was_stopped {
        let group = Pid::from_raw(-pid.as_raw());
        if let Err(errno) = env.system.kill(group, Some(Signal::SIGCONT)) {
            log::warn!("cannot continue job {pid}: {errno}");
        }
    }
    Some(pid)
}

/// Entry point of the `fg` built-in
pub fn main(env: &mut Env, args: Vec<String>) -> Result {
    match env.with_sigchld_blocked(|env, _| resume(env, &args)) {
        Ok(Some(pid)) => wait_for_foreground(env, pid),
        Ok(None) => Continue(()),
        Err(errno) => {
            env.print(&format!("sigprocmask error: {errno}\n"));
            Continue(())
        }
    }
}
