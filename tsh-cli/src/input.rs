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

//! Reading command lines
//!
//! The standard input is read one byte at a time so that no input beyond the
//! current line is consumed. Programs started by the shell share the standard
//! input and may read the rest.

use std::ops::ControlFlow::{Break, Continue};
use tsh_env::io::Fd;
use tsh_env::semantics::Result;
use tsh_env::system::Errno;
use tsh_env::system::SigSet;
use tsh_env::Env;
use tsh_semantics::handler::{run_handlers, HANDLED_SIGNALS};

/// Result of [`read_line`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    /// Line including the trailing newline
    Line(String),
    /// Complete line that is not valid UTF-8
    ///
    /// The line has been consumed from the input.
    InvalidLine,
    /// The end of input has been reached.
    ///
    /// A partial line preceding the end of input is discarded.
    EndOfInput,
    /// Reading failed.
    Error(Errno),
}

/// Reads a line from the standard input.
///
/// Signals caught while waiting for input are handled before reading
/// continues. If a handler diverts, the divert is returned and the partial
/// line is lost.
pub fn read_line(env: &mut Env) -> Result<Input> {
    let mut line = Vec::new();
    loop {
        if let Err(errno) = wait_for_input(env)? {
            return Continue(Input::Error(errno));
        }

        let mut byte = [0];
        match env.system.read(Fd::STDIN, &mut byte) {
            Ok(0) => return Continue(Input::EndOfInput),
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    return Continue(match String::from_utf8(line) {
                        Ok(line) => Input::Line(line),
                        Err(_) => Input::InvalidLine,
                    });
                }
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Continue(Input::Error(errno)),
        }
    }
}

/// Handles caught signals and waits until the standard input is readable.
///
/// [`HANDLED_SIGNALS`] are blocked from the handling until the wait begins,
/// and the wait unblocks them atomically. A signal arriving after the
/// handlers have run therefore interrupts the wait and is handled in the next
/// round instead of staying unhandled until more input arrives.
fn wait_for_input(env: &mut Env) -> Result<std::result::Result<(), Errno>> {
    let mut signals = SigSet::empty();
    for signal in HANDLED_SIGNALS {
        signals.add(signal);
    }
    loop {
        let waited = env.with_signals_blocked(
            &signals,
            |env, old_mask| -> Result<std::result::Result<(), Errno>> {
                run_handlers(env)?;
                Continue(env.system.wait_readable(Fd::STDIN, old_mask))
            },
        );
        match waited {
            Ok(Continue(Err(Errno::EINTR))) => continue,
            Ok(Continue(ready)) => return Continue(ready),
            Ok(Break(divert)) => return Break(divert),
            Err(errno) => return Continue(Err(errno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsh_env::job::JobState;
    use tsh_env::job::Pid;
    use tsh_env::semantics::{Divert, ExitStatus};
    use tsh_env::system::r#virtual::Event;
    use tsh_env::system::Signal;
    use tsh_env_test_helper::{add_dummy_job, assert_stdout, schedule, virtual_env};
    use tsh_semantics::handler::install_handlers;

    #[test]
    fn lines_are_read_one_at_a_time() {
        let (mut env, state) = virtual_env();
        state.borrow_mut().stdin.extend(b"jobs\n/bin/sleep 1 &\n");

        assert_eq!(read_line(&mut env), Continue(Input::Line("jobs\n".into())));
        assert_eq!(state.borrow().stdin.len(), 15);
        assert_eq!(
            read_line(&mut env),
            Continue(Input::Line("/bin/sleep 1 &\n".into()))
        );
        assert_eq!(read_line(&mut env), Continue(Input::EndOfInput));
    }

    #[test]
    fn partial_line_at_end_of_input_is_discarded() {
        let (mut env, state) = virtual_env();
        state.borrow_mut().stdin.extend(b"quit");
        assert_eq!(read_line(&mut env), Continue(Input::EndOfInput));
    }

    #[test]
    fn signals_are_handled_while_waiting() {
        let (mut env, state) = virtual_env();
        install_handlers(&mut env).unwrap();
        let pid = add_dummy_job(&mut env, &state, JobState::Background, "/bin/sleep 1 &");
        schedule(&state, Event::Signal(pid, Signal::SIGTERM));

        assert_eq!(read_line(&mut env), Continue(Input::EndOfInput));
        assert!(env.jobs.is_empty());
        assert_stdout(&state, |stdout| {
            assert_eq!(
                stdout,
                format!("Job [1] ({pid}) terminated by signal {}\n", Signal::SIGTERM as i32)
            )
        });
    }

    #[test]
    fn quit_signal_while_waiting() {
        let (mut env, state) = virtual_env();
        install_handlers(&mut env).unwrap();
        let shell = env.system.getpid();
        schedule(&state, Event::Signal(shell, Signal::SIGQUIT));

        let result = read_line(&mut env);
        assert_eq!(result, Break(Divert::Exit(ExitStatus::FAILURE)));
    }

    #[test]
    fn read_error() {
        let (mut env, state) = virtual_env();
        state.borrow_mut().stdin.extend(b"jobs\n");
        state.borrow_mut().read_error = Some(Errno::EIO);
        assert_eq!(read_line(&mut env), Continue(Input::Error(Errno::EIO)));
    }

    #[test]
    fn invalid_utf8_line_is_consumed_and_reported() {
        let (mut env, state) = virtual_env();
        state.borrow_mut().stdin.extend(b"/bin/\xff\n\njobs\n");
        assert_eq!(read_line(&mut env), Continue(Input::InvalidLine));
        assert_eq!(read_line(&mut env), Continue(Input::Line("\n".into())));
        assert_eq!(read_line(&mut env), Continue(Input::Line("jobs\n".into())));
    }

    #[test]
    fn sigchld_caused_by_handler_interrupts_wait() {
        let (mut env, state) = virtual_env();
        install_handlers(&mut env).unwrap();
        let pid = add_dummy_job(&mut env, &state, JobState::Foreground, "/bin/sleep 10");
        let shell = env.system.getpid();
        schedule(&state, Event::Signal(shell, Signal::SIGINT));

        // Forwarding SIGINT kills the job while the handled signals are
        // blocked. The resulting SIGCHLD must still be handled before the end
        // of input is seen.
        assert_eq!(read_line(&mut env), Continue(Input::EndOfInput));
        assert!(env.jobs.is_empty());
        assert_eq!(state.borrow().signals_sent, [(Pid::from_raw(-pid.as_raw()), Some(Signal::SIGINT))]);
        let sigint_mask = state.borrow().masks_at_kill[0];
        assert!(sigint_mask.contains(Signal::SIGCHLD));
        assert_stdout(&state, |stdout| {
            assert_eq!(
                stdout,
                format!("Job [1] ({pid}) terminated by signal {}\n", Signal::SIGINT as i32)
            )
        });
    }

    #[test]
    fn handled_signals_are_unblocked_after_reading() {
        let (mut env, state) = virtual_env();
        state.borrow_mut().stdin.extend(b"jobs\n");
        assert_eq!(read_line(&mut env), Continue(Input::Line("jobs\n".into())));
        let shell = env.system.getpid();
        let mask = state.borrow().processes[&shell].blocked_signals();
        for signal in HANDLED_SIGNALS {
            assert!(!mask.contains(signal), "{signal} is still blocked");
        }
    }
}
