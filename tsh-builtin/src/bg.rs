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

//! Bg built-in
//!
//! The **`bg`** built-in resumes a stopped job in the background.
//!
//! # Synopsis
//!
//! ```sh
//! bg pid
//! bg %jid
//! ```
//!
//! # Description
//!
//! The built-in sets the state of the selected job to running in the
//! background and sends `SIGCONT` to its process group. A [`Notice`] line is
//! printed for the job. The built-in does not wait for the job.
//!
//! # Errors
//!
//! If the operand is missing or does not select a job, an error message is
//! printed to the standard output and no job is affected. See
//! [`TargetError`](crate::common::TargetError).
//!
//! # Implementation notes
//!
//! The signal is sent even if the job is already running. The job is selected
//! and resumed with `SIGCHLD` blocked so that it cannot be removed from the
//! job list in the meantime.

use crate::common::{report, select_job};
use std::ops::ControlFlow::Continue;
use tsh_env::job::fmt::Notice;
use tsh_env::job::JobState;
use tsh_env::job::Pid;
use tsh_env::semantics::Result;
use tsh_env::system::Signal;
use tsh_env::Env;

fn resume(env: &mut Env, args: &[String]) {
    let pid = match select_job(&env.jobs, args) {
        Ok(pid) => pid,
        Err(error) => return report(env, &error),
    };
    let Some(mut job) = env.jobs.find_by_pid_mut(pid) else {
        return;
    };
    // Only the foreground state can be refused.
    let _ = job.set_state(JobState::Background);
    let notice = Notice(&job).to_string();

    let group = Pid::from_raw(-pid.as_raw());
    if let Err(errno) = env.system.kill(group, Some(Signal::SIGCONT)) {
        log::warn!("cannot continue job {pid}: {errno}");
    }
    env.print(&format!("{notice}\n"));
}

/// Entry point of the `bg` built-in
pub fn main(env: &mut Env, args: Vec<String>) -> Result {
    if let Err(errno) = env.with_sigchld_blocked(|env, _| resume(env, &args)) {
        env.print(&format!("sigprocmask error: {errno}\n"));
    }
    Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsh_env::system::r#virtual::ProcessState;
    use tsh_env_test_helper::{add_dummy_job, assert_stdout, virtual_env};

    fn args(operand: &str) -> Vec<String> {
        vec!["bg".to_string(), operand.to_string()]
    }

    #[test]
    fn stopped_job_resumes_in_background() {
        let (mut env, state) = virtual_env();
        let pid = add_dummy_job(&mut env, &state, JobState::Stopped, "/bin/sleep 100 &");

        let result = main(&mut env, args("%1"));
        assert_eq!(result, Continue(()));
        assert_eq!(env.jobs.find_by_pid(pid).unwrap().state, JobState::Background);
        let state = state.borrow();
        assert_eq!(state.processes[&pid].state(), ProcessState::Running);
        assert_eq!(
            state.signals_sent,
            [(Pid::from_raw(-pid.as_raw()), Some(Signal::SIGCONT))]
        );
        assert_eq!(state.stdout_str(), format!("[1] ({pid}) /bin/sleep 100 &\n"));
    }

    #[test]
    fn job_is_signaled_with_sigchld_blocked() {
        let (mut env, state) = virtual_env();
        add_dummy_job(&mut env, &state, JobState::Stopped, "/bin/sleep 100 &");

        let result = main(&mut env, args("%1"));
        assert_eq!(result, Continue(()));
        let state = state.borrow();
        assert_eq!(state.masks_at_kill.len(), 1);
        assert!(state.masks_at_kill[0].contains(Signal::SIGCHLD));
        let shell = &state.processes[&env.system.getpid()];
        assert!(!shell.blocked_signals().contains(Signal::SIGCHLD));
    }

    #[test]
    fn job_selected_by_process_id() {
        let (mut env, state) = virtual_env();
        add_dummy_job(&mut env, &state, JobState::Background, "/bin/sleep 1 &");
        let pid = add_dummy_job(&mut env, &state, JobState::Stopped, "/bin/sleep 2");

        let result = main(&mut env, args(&pid.to_string()));
        assert_eq!(result, Continue(()));
        assert_eq!(env.jobs.find_by_pid(pid).unwrap().state, JobState::Background);
        assert_stdout(&state, |stdout| {
            assert_eq!(stdout, format!("[2] ({pid}) /bin/sleep 2\n"))
        });
    }

    #[test]
    fn running_job_is_signaled_again() {
        let (mut env, state) = virtual_env();
        let pid = add_dummy_job(&mut env, &state, JobState::Background, "/bin/sleep 1 &");

        assert_eq!(main(&mut env, args("%1")), Continue(()));
        assert_eq!(env.jobs.find_by_pid(pid).unwrap().state, JobState::Background);
        assert_eq!(state.borrow().signals_sent.len(), 1);
    }

    #[test]
    fn missing_operand() {
        let (mut env, state) = virtual_env();
        add_dummy_job(&mut env, &state, JobState::Stopped, "/bin/sleep 1");

        let result = main(&mut env, vec!["bg".to_string()]);
        assert_eq!(result, Continue(()));
        assert_stdout(&state, |stdout| {
            assert_eq!(stdout, "bg command requires PID or %jobid argument\n")
        });
        assert_eq!(env.jobs.list()[0].state, JobState::Stopped);
        assert_eq!(state.borrow().signals_sent, []);
    }

    #[test]
    fn no_such_job() {
        let (mut env, state) = virtual_env();
        add_dummy_job(&mut env, &state, JobState::Stopped, "/bin/sleep 1");

        assert_eq!(main(&mut env, args("%2")), Continue(()));
        assert_eq!(main(&mut env, args("99")), Continue(()));
        assert_eq!(main(&mut env, args("x")), Continue(()));
        assert_stdout(&state, |stdout| {
            assert_eq!(
                stdout,
                "%2: No such job\n(99): No such process\nbg: argument must be a PID or %jobid\n"
            )
        });
        assert_eq!(env.jobs.list()[0].state, JobState::Stopped);
        assert_eq!(state.borrow().signals_sent, []);
    }
}
