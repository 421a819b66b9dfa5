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

//! Starting external programs as jobs

use crate::wait::wait_for_foreground;
use std::ffi::CString;
use std::ops::ControlFlow::Continue;
use std::os::unix::ffi::OsStringExt as _;
use tsh_env::job::fmt::Notice;
use tsh_env::job::AddError;
use tsh_env::job::JobState;
use tsh_env::job::Pid;
use tsh_env::semantics::ExitStatus;
use tsh_env::semantics::Result;
use tsh_env::system::Errno;
use tsh_env::system::SigSet;
use tsh_env::system::SigmaskHow;
use tsh_env::system::Signal;
use tsh_env::Env;

/// Converts words to C strings.
///
/// Words containing a nul byte are dropped.
fn to_c_strings(words: Vec<String>) -> Vec<CString> {
    words
        .into_iter()
        .filter_map(|word| CString::new(word).ok())
        .collect()
}

/// Returns the environment variables of the interpreter in the form `NAME=value`.
fn env_c_strings() -> Vec<CString> {
    std::env::vars_os()
        .filter_map(|(name, value)| {
            let mut bytes = name.into_vec();
            bytes.push(b'=');
            bytes.extend(value.into_vec());
            CString::new(bytes).ok()
        })
        .collect()
}

/// Replaces the child process with the program.
///
/// This function is run in the child process. It makes the child the leader
/// of a new process group and restores the signal mask of the parent before
/// calling `execve`. If `execve` fails, an error message is printed and the
/// exit status with which the child should terminate is returned.
fn exec_in_child(
    env: &mut Env,
    path: CString,
    args: Vec<CString>,
    envs: Vec<CString>,
    mask: SigSet,
) -> ExitStatus {
    let own_group = Pid::from_raw(0);
    if let Err(errno) = env.system.setpgid(own_group, own_group) {
        log::warn!("cannot start a new process group: {errno}");
    }
    if let Err(errno) = env.system.sigmask(SigmaskHow::SIG_SETMASK, Some(&mask), None) {
        log::warn!("cannot restore the signal mask: {errno}");
    }

    let errno = match env.system.execve(&path, &args, &envs) {
        Ok(never) => match never {},
        Err(errno) => errno,
    };
    log::debug!("cannot execute {path:?}: {errno}");
    env.print_error(&format!("{}: Command not found\n", path.to_string_lossy()));
    match errno {
        Errno::ENOENT | Errno::ENOTDIR => ExitStatus::NOT_FOUND,
        _ => ExitStatus::NOEXEC,
    }
}

/// Creates the child process and adds it to the job list.
///
/// This function must be called with `SIGCHLD` blocked so that the child
/// cannot be reaped before it becomes a job. `mask` is the signal mask to be
/// restored in the child.
///
/// Returns the process ID of the new job, or `None` on failure, in which case
/// an error message has been printed.
fn fork_and_add(
    env: &mut Env,
    args: Vec<String>,
    state: JobState,
    command_line: &str,
    mask: SigSet,
) -> Option<Pid> {
    let path = CString::new(args[0].as_str()).unwrap_or_default();
    let args = to_c_strings(args);
    let envs = env_c_strings();

    let starter = match env.system.new_child_process() {
        Ok(starter) => starter,
        Err(errno) => {
            env.print(&format!("fork error: {errno}\n"));
            return None;
        }
    };
    let pid = starter(
        env,
        Box::new(move |env| exec_in_child(env, path, args, envs, mask)),
    );

    // Both the parent and the child set the process group so that it is
    // already in effect whichever runs first. This fails harmlessly if the
    // child has already executed the program.
    if let Err(errno) = env.system.setpgid(pid, pid) {
        log::debug!("setpgid({pid}) in the parent: {errno}");
    }

    match env.jobs.add(pid, state, command_line.to_owned()) {
        Ok(jid) => {
            log::debug!("started job [{jid}] {pid} {command_line}");
            Some(pid)
        }
        Err(error) => {
            // The child must not run untracked.
            let group = Pid::from_raw(-pid.as_raw());
            if let Err(errno) = env.system.kill(group, Some(Signal::SIGKILL)) {
                log::warn!("cannot kill untracked process {pid}: {errno}");
            }
            env.print(&format!("{error}\n"));
            None
        }
    }
}

/// Starts an external program as a job.
///
/// `args` are the words of the command line. The first word is the path to
/// the program. It must not be empty. `command_line` is the text stored in
/// the job list for display.
///
/// A background job is announced with a [`Notice`] and this function returns
/// without waiting. For a foreground job, this function
/// [waits](wait_for_foreground) until the job is no longer in the foreground.
///
/// No process is created if the job list is full or the program cannot be
/// started. An error message is printed in that case and the result is
/// `Continue(())`.
pub fn start_job(
    env: &mut Env,
    args: Vec<String>,
    background: bool,
    command_line: &str,
) -> Result {
    if env.jobs.is_full() {
        env.print(&format!("{}\n", AddError::TableFull));
        return Continue(());
    }

    let state = if background {
        JobState::Background
    } else {
        JobState::Foreground
    };
    let result = env.with_sigchld_blocked(|env, old_mask| {
        fork_and_add(env, args, state, command_line, *old_mask)
    });
    let pid = match result {
        Ok(Some(pid)) => pid,
        Ok(None) => return Continue(()),
        Err(errno) => {
            env.print(&format!("sigprocmask error: {errno}\n"));
            return Continue(());
        }
    };

    if background {
        if let Some(job) = env.jobs.find_by_pid(pid) {
            let notice = Notice(job).to_string();
            env.print(&format!("{notice}\n"));
        }
        Continue(())
    } else {
        wait_for_foreground(env, pid)
    }
}
