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

//! Shell startup

use log::LevelFilter;
use log::Record;
use std::io::Write;
use tsh_env::system::Errno;
use tsh_env::system::Signal;
use tsh_env::system::SignalHandling;
use tsh_env::Env;
use tsh_semantics::handler::install_handlers;

pub mod args;

/// Usage message printed for `-h` and for an invalid option
pub const USAGE: &str = "\
Usage: shell [-hvp]
   -h   print this message
   -v   print additional diagnostic information
   -p   do not emit a command prompt
";

/// Makes the standard error refer to the standard output.
///
/// A driver that reads the shell's standard output then sees error messages
/// and logs in order with other output.
pub fn merge_stderr_into_stdout() -> Result<(), Errno> {
    // SAFETY: dup2 only operates on the file descriptor table.
    let result = unsafe { libc::dup2(libc::STDOUT_FILENO, libc::STDERR_FILENO) };
    Errno::result(result).map(drop)
}

/// Log target of the job list, whose debug messages `-v` shows
const JOB_LIST_TARGET: &str = "tsh_env::job";

/// Initializes the logger.
///
/// The `RUST_LOG` environment variable is honored. Without it, `verbose`
/// enables the debug messages of the job list along with warnings from
/// anywhere, and nothing is logged otherwise.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        format!("warn,{JOB_LIST_TARGET}=debug")
    } else {
        LevelFilter::Off.as_str().to_owned()
    };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| format_record(buf, record));
    // A logger may already be set in tests.
    let _ = builder.try_init();
}

/// Writes a log record as a single line.
///
/// Job list messages are written as they are, such as `Added job [1] 42
/// /bin/sleep 1 &`. Other messages are prefixed with the program name and
/// the level.
fn format_record(buf: &mut dyn Write, record: &Record<'_>) -> std::io::Result<()> {
    if record.target() == JOB_LIST_TARGET {
        writeln!(buf, "{}", record.args())
    } else {
        let level = record.level().as_str().to_ascii_lowercase();
        writeln!(buf, "tsh: {level}: {}", record.args())
    }
}

/// Prepares the environment for the read-eval loop.
///
/// This function installs the signal handlers and the built-ins.
pub fn configure_environment(env: &mut Env, run: &args::Run) -> Result<(), Errno> {
    env.options.verbose = run.verbose;

    // Rust ignores SIGPIPE, and an ignored signal stays ignored in programs
    // the shell runs.
    env.system
        .sigaction(Signal::SIGPIPE, SignalHandling::Default)?;
    install_handlers(env)?;

    tsh_builtin::install(env);
    log::debug!("shell {} configured", env.system.getpid());
    Ok(())
}
