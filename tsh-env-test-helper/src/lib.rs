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

//! This crate contains utility functions for use in tests that interact with
//! the interpreter environment ([`tsh_env::Env`]).

use std::cell::RefCell;
use std::rc::Rc;
use tsh_env::job::JobState;
use tsh_env::job::Pid;
use tsh_env::system::r#virtual::Event;
use tsh_env::system::r#virtual::Process;
use tsh_env::system::r#virtual::SystemState;
use tsh_env::system::Signal;
use tsh_env::Env;
use tsh_env::VirtualSystem;

/// Path of the program [`virtual_env`] makes executable
pub const SLEEP: &str = "/bin/sleep";

/// Creates an environment with a [`VirtualSystem`].
///
/// The returned state is shared with the system in the environment. The
/// [`SLEEP`] program is registered as an executable.
pub fn virtual_env() -> (Env, Rc<RefCell<SystemState>>) {
    let system = VirtualSystem::new();
    let state = Rc::clone(&system.state);
    state.borrow_mut().executables.insert(SLEEP.to_string());
    (Env::with_system(Box::new(system)), state)
}

/// Adds a job whose process is a child of the current process.
///
/// The process is not created by the interpreter but inserted into the system
/// directly. It leads its own process group. If `job_state` is
/// [`JobState::Stopped`], the process is stopped as well, without the status
/// change being pending for `wait`.
pub fn add_dummy_job(
    env: &mut Env,
    state: &RefCell<SystemState>,
    job_state: JobState,
    command_line: &str,
) -> Pid {
    let mut state = state.borrow_mut();
    let max_pid = state.processes.keys().max().map_or(0, |pid| pid.as_raw());
    let pid = Pid::from_raw(max_pid.max(state.last_pid) + 1);
    state.last_pid = pid.as_raw();

    let mut process = Process::with_parent_and_group(env.system.getpid(), pid);
    if job_state == JobState::Stopped {
        let _ = process.raise_signal(Signal::SIGSTOP);
        process.take_state();
    }
    state.processes.insert(pid, process);
    drop(state);

    env.jobs
        .add(pid, job_state, command_line.to_string())
        .unwrap();
    pid
}

/// Appends an event to the schedule of the virtual system.
pub fn schedule(state: &RefCell<SystemState>, event: Event) {
    state.borrow_mut().scheduled.push_back(event);
}

/// Helper function for asserting on the content of the standard output
///
/// The argument function `f` is called with the content written to the
/// standard output so far.
///
/// # Example
///
/// ```
/// # use tsh_env_test_helper::{assert_stdout, virtual_env};
/// let (mut env, state) = virtual_env();
/// env.print("Hello, world!\n");
/// assert_stdout(&state, |stdout| assert_eq!(stdout, "Hello, world!\n"));
/// ```
pub fn assert_stdout<F, T>(state: &RefCell<SystemState>, f: F) -> T
where
    F: FnOnce(&str) -> T,
{
    f(&state.borrow().stdout_str())
}

/// Helper function for asserting on the content of the standard error
///
/// This function works like [`assert_stdout`] for the standard error.
pub fn assert_stderr<F, T>(state: &RefCell<SystemState>, f: F) -> T
where
    F: FnOnce(&str) -> T,
{
    f(&state.borrow().stderr_str())
}
