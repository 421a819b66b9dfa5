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

//! This is an internal library crate for the tsh shell. It is not intended to
//! be used as a library by other crates.
//!
//! The entry point for the shell is the [`main`] function, which is to be used
//! as the `main` function in the binary crate. The function sets up the shell
//! environment and runs the [read-eval loop](read_eval_loop).

pub mod input;
pub mod startup;

use self::input::{read_line, Input};
use self::startup::args::{Parse, Run};
use std::ops::ControlFlow::{Break, Continue};
use tsh_env::semantics::ExitStatus;
use tsh_env::Env;
use tsh_env::RealSystem;
use tsh_semantics::evaluate;

/// Prompt printed before reading each command line
pub const PROMPT: &str = "tsh> ";

/// Runs the read-eval loop until the end of input or a divert.
///
/// Returns the exit status of the shell.
pub fn read_eval_loop(env: &mut Env, run: &Run) -> ExitStatus {
    loop {
        if run.prompt {
            env.print(PROMPT);
        }

        let line = match read_line(env) {
            Continue(Input::Line(line)) => line,
            Continue(Input::InvalidLine) => {
                env.print("invalid byte sequence in command line\n");
                continue;
            }
            Continue(Input::EndOfInput) => return ExitStatus::SUCCESS,
            Continue(Input::Error(errno)) => {
                log::error!("cannot read the standard input: {errno}");
                env.print("fgets error\n");
                return ExitStatus::FAILURE;
            }
            Break(divert) => return divert.exit_status(),
        };

        if let Break(divert) = evaluate(env, &line) {
            log::debug!("leaving the read-eval loop: {divert:?}");
            return divert.exit_status();
        }
    }
}

fn print_usage_and_exit(env: &mut Env) -> ! {
    env.print(startup::USAGE);
    std::process::exit(ExitStatus::FAILURE.0)
}

pub fn main() -> ! {
    if let Err(errno) = startup::merge_stderr_into_stdout() {
        eprintln!("cannot redirect the standard error: {errno}");
    }

    // SAFETY: This is the only instance of RealSystem we create in the whole
    // process.
    let system = unsafe { RealSystem::new() };
    let mut env = Env::with_system(Box::new(system));

    let run = match startup::args::parse(std::env::args()) {
        Ok(Parse::Run(run)) => run,
        Ok(Parse::Help) => print_usage_and_exit(&mut env),
        Err(e) => {
            let arg0 = std::env::args().next().unwrap_or_else(|| "tsh".to_owned());
            env.print(&format!("{arg0}: {e}\n"));
            print_usage_and_exit(&mut env)
        }
    };

    startup::init_logging(run.verbose);
    if let Err(errno) = startup::configure_environment(&mut env, &run) {
        env.print(&format!("cannot install signal handlers: {errno}\n"));
        std::process::exit(ExitStatus::FAILURE.0)
    }

    let exit_status = read_eval_loop(&mut env, &run);
    std::process::exit(exit_status.0)
}
