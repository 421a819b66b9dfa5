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

//! Waiting for the foreground job

use crate::handler::run_handlers;
use std::ops::ControlFlow::Continue;
use tsh_env::job::Pid;
use tsh_env::semantics::Result;
use tsh_env::system::Errno;
use tsh_env::Env;

/// Blocks until the job is no longer in the foreground.
///
/// The wait ends when the job has been removed from the job list or has
/// changed to another state. Both changes are made by
/// [signal handlers](crate::handler), which this function runs every
/// [`poll_interval`](tsh_env::Options::poll_interval) and whenever a signal
/// interrupts the sleep in between.
///
/// The function returns immediately if `pid` is not the foreground job.
/// A status change of any other job never ends the wait.
///
/// The result is `Break` if a handler has decided that the interpreter should
/// exit.
pub fn wait_for_foreground(env: &mut Env, pid: Pid) -> Result {
    if env.jobs.foreground_pid() != Some(pid) {
        return Continue(());
    }
    log::debug!("waiting for foreground job {pid}");

    loop {
        run_handlers(env)?;
        if env.jobs.foreground_pid() != Some(pid) {
            return Continue(());
        }
        match env.system.sleep(env.options.poll_interval) {
            Ok(()) | Err(Errno::EINTR) => (),
            Err(errno) => log::warn!("cannot sleep: {errno}"),
        }
    }
}
