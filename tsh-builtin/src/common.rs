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

//! Common items for implementing built-ins

use thiserror::Error;
use tsh_env::job::id::{parse, JobTarget};
use tsh_env::job::JobList;
use tsh_env::job::Pid;
use tsh_env::Env;

/// Error in selecting the job operated on by `bg` or `fg`
///
/// The `Display` implementation produces the message printed to the user.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TargetError {
    /// No operand was given to the named built-in.
    #[error("{0} command requires PID or %jobid argument")]
    MissingOperand(String),

    /// The operand given to the named built-in is not a job target.
    #[error("{0}: argument must be a PID or %jobid")]
    InvalidOperand(String),

    /// No job has the process ID.
    #[error("({0}): No such process")]
    NoSuchProcess(Pid),

    /// No job has the job number given in the operand.
    #[error("{0}: No such job")]
    NoSuchJob(String),
}

/// Selects the job specified by the first operand.
///
/// `args` is the whole argument vector including the command name. Operands
/// after the first are ignored. Returns the process ID of the selected job.
pub fn select_job(jobs: &JobList, args: &[String]) -> Result<Pid, TargetError> {
    let name = args.first().map_or("", String::as_str);
    let Some(operand) = args.get(1) else {
        return Err(TargetError::MissingOperand(name.to_owned()));
    };
    let target = parse(operand).map_err(|_| TargetError::InvalidOperand(name.to_owned()))?;
    match target.find(jobs) {
        Some(job) => Ok(job.pid),
        None => match target {
            JobTarget::Pid(pid) => Err(TargetError::NoSuchProcess(pid)),
            JobTarget::Jid(_) => Err(TargetError::NoSuchJob(operand.clone())),
        },
    }
}

/// Prints the error message to the standard output.
pub fn report(env: &mut Env, error: &TargetError) {
    env.print(&format!("{error}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tsh_env::job::JobState;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(|&arg| arg.to_owned()).collect()
    }

    fn two_jobs() -> JobList {
        let mut jobs = JobList::new();
        jobs.add(Pid::from_raw(10), JobState::Background, "a &".into())
            .unwrap();
        jobs.add(Pid::from_raw(20), JobState::Stopped, "b".into())
            .unwrap();
        jobs
    }

    #[test]
    fn select_by_pid_and_jid() {
        let jobs = two_jobs();
        let result = select_job(&jobs, &words(&["bg", "20"]));
        assert_eq!(result, Ok(Pid::from_raw(20)));
        let result = select_job(&jobs, &words(&["fg", "%1", "ignored"]));
        assert_eq!(result, Ok(Pid::from_raw(10)));
    }

    #[test]
    fn missing_operand() {
        let result = select_job(&two_jobs(), &words(&["fg"]));
        let error = result.unwrap_err();
        assert_eq!(error.to_string(), "fg command requires PID or %jobid argument");
    }

    #[test]
    fn invalid_operand() {
        let result = select_job(&two_jobs(), &words(&["bg", "abc"]));
        let error = result.unwrap_err();
        assert_eq!(error.to_string(), "bg: argument must be a PID or %jobid");
    }

    #[test]
    fn unknown_targets() {
        let jobs = two_jobs();
        let error = select_job(&jobs, &words(&["fg", "30"])).unwrap_err();
        assert_matches!(&error, TargetError::NoSuchProcess(pid) if pid.as_raw() == 30);
        assert_eq!(error.to_string(), "(30): No such process");
        let error = select_job(&jobs, &words(&["fg", "%3"])).unwrap_err();
        assert_eq!(error.to_string(), "%3: No such job");
    }
}
