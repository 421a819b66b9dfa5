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

//! Semantics of the tsh command language.
//!
//! A command line is [split into words](command_line). If the first word
//! names a [built-in](tsh_env::builtin), the built-in is executed in the
//! interpreter. Otherwise, the first word is the path to an external program,
//! which [is started as a job](launch::start_job) in the foreground or the
//! background.
//!
//! Job control depends on [signal handlers](handler) that keep the job list
//! in sync with the child processes, and on the
//! [foreground wait](wait::wait_for_foreground).

pub mod command_line;
pub mod handler;
pub mod launch;
pub mod wait;

#[doc(no_inline)]
pub use tsh_env::semantics::*;

use self::command_line::CommandLine;
use std::ops::ControlFlow::Continue;
use tsh_env::Env;

/// Executes the built-in named by the first word, if any.
///
/// Returns `None` if `args` is empty or the first word is not a built-in.
pub fn run_builtin(env: &mut Env, args: &[String]) -> Option<Result> {
    let name = args.first()?;
    let builtin = *env.builtins.get(name.as_str())?;
    log::debug!("running built-in {name}");
    Some((builtin.execute)(env, args.to_vec()))
}

/// Evaluates a command line.
///
/// A blank line is ignored. The trailing newline, if any, is not part of the
/// command line stored for a new job.
pub fn evaluate(env: &mut Env, line: &str) -> Result {
    let CommandLine { args, background } = command_line::parse(line);
    if args.is_empty() {
        return Continue(());
    }
    if let Some(result) = run_builtin(env, &args) {
        return result;
    }
    let text = line.strip_suffix('\n').unwrap_or(line);
    launch::start_job(env, args, background, text)
}
