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

//! Type definitions for job management.
//!
//! A [`Job`] is a process group started by the interpreter. The process
//! group ID equals the process ID of its leader, so a job is identified by a
//! single [`Pid`]. Each job also has a small job number ([`Jid`]) for display
//! and for addressing from the `bg` and `fg` built-ins.
//!
//! The [`JobList`] has a fixed number of slots. A job is added when its
//! process is created and removed when the process has terminated. A stopped
//! job remains in the list. At most one job is in the
//! [foreground](JobState::Foreground) state at any time; the list refuses any
//! operation that would break this.
//!
//! A job number is one greater than the largest job number in use when the
//! job is added. A number is therefore never shared by two live jobs, and it
//! becomes available again only after its job has been removed.

use itertools::Itertools as _;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Deref;
use thiserror::Error;

pub mod fmt;
pub mod id;

#[doc(no_inline)]
pub use nix::unistd::Pid;

/// Default number of slots in a [`JobList`]
pub const MAX_JOBS: usize = 16;

/// Job number
///
/// Job numbers start from 1.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Jid(pub usize);

impl Display for Jid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// State of a job
///
/// The `Display` implementation produces the word used in the `jobs`
/// listing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::Display)]
pub enum JobState {
    /// The job is running and the interpreter is waiting for it.
    #[strum(to_string = "Foreground")]
    Foreground,
    /// The job is running and the interpreter is not waiting for it.
    #[strum(to_string = "Running")]
    Background,
    /// The job has been suspended by a signal.
    #[strum(to_string = "Stopped")]
    Stopped,
}

/// Process group managed by the interpreter
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Job {
    /// Process ID of the process group leader
    ///
    /// This is also the process group ID.
    pub pid: Pid,

    /// Job number
    pub jid: Jid,

    /// Current state of the job
    pub state: JobState,

    /// Command line the job was started with
    pub command_line: String,
}

/// Error indicating that another job is already in the foreground
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
#[error("job {0} is already in the foreground")]
pub struct ForegroundOccupied(pub Pid);

/// Error that may occur in [`JobList::add`]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum AddError {
    /// All slots are in use.
    #[error("Tried to create too many jobs")]
    TableFull,

    /// The process ID is not positive.
    #[error("invalid process ID {0}")]
    InvalidPid(Pid),

    /// The process ID already belongs to a job in the list.
    #[error("process {0} is already a job")]
    DuplicatePid(Pid),

    /// A foreground job was added while another job is in the foreground.
    #[error(transparent)]
    ForegroundOccupied(#[from] ForegroundOccupied),
}

/// Mutable reference to a job in a [`JobList`]
///
/// Only the state of the job can be changed through this reference. The
/// process ID and job number are fixed for the lifetime of the job.
#[derive(Debug)]
pub struct JobRefMut<'a> {
    job: &'a mut Job,
    /// Process ID of the foreground job other than `job`, if any
    other_foreground: Option<Pid>,
}

impl JobRefMut<'_> {
    /// Changes the state of the job.
    ///
    /// Moving a job to the foreground fails if another job is already there.
    pub fn set_state(&mut self, state: JobState) -> Result<(), ForegroundOccupied> {
        if state == JobState::Foreground {
            if let Some(pid) = self.other_foreground {
                return Err(ForegroundOccupied(pid));
            }
        }
        self.job.state = state;
        Ok(())
    }
}

impl Deref for JobRefMut<'_> {
    type Target = Job;
    fn deref(&self) -> &Job {
        self.job
    }
}

/// Fixed-capacity collection of jobs
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobList {
    slots: Vec<Option<Job>>,
}

impl Default for JobList {
    fn default() -> Self {
        JobList::new()
    }
}

impl JobList {
    /// Creates an empty list with [`MAX_JOBS`] slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_JOBS)
    }

    /// Creates an empty list with the given number of slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = std::iter::repeat_with(|| None).take(capacity).collect();
        JobList { slots }
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of jobs in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs().count()
    }

    /// Returns true if there is no job in the list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs().next().is_none()
    }

    /// Returns true if no more job can be added.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }

    fn next_jid(&self) -> Jid {
        let max = self.jobs().map(|job| job.jid.0).max().unwrap_or(0);
        Jid(max + 1)
    }

    /// Adds a job to the list.
    ///
    /// The new job gets a job number that is one greater than the largest
    /// job number in the list. The number is returned on success.
    pub fn add(
        &mut self,
        pid: Pid,
        state: JobState,
        command_line: String,
    ) -> Result<Jid, AddError> {
        if pid.as_raw() <= 0 {
            return Err(AddError::InvalidPid(pid));
        }
        if self.find_by_pid(pid).is_some() {
            return Err(AddError::DuplicatePid(pid));
        }
        if state == JobState::Foreground {
            if let Some(foreground) = self.foreground_pid() {
                return Err(ForegroundOccupied(foreground).into());
            }
        }

        let jid = self.next_jid();
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(AddError::TableFull)?;
        log::debug!("Added job [{jid}] {pid} {command_line}");
        *slot = Some(Job {
            pid,
            jid,
            state,
            command_line,
        });
        Ok(jid)
    }

    /// Removes the job with the given process ID.
    ///
    /// Returns the removed job, or `None` if there was no such job.
    pub fn remove(&mut self, pid: Pid) -> Option<Job> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|job| job.pid == pid))?;
        let job = slot.take()?;
        log::debug!("Deleted job [{}] {}", job.jid, job.pid);
        Some(job)
    }

    /// Finds the job with the given process ID.
    #[must_use]
    pub fn find_by_pid(&self, pid: Pid) -> Option<&Job> {
        self.jobs().find(|job| job.pid == pid)
    }

    /// Finds the job with the given job number.
    #[must_use]
    pub fn find_by_jid(&self, jid: Jid) -> Option<&Job> {
        self.jobs().find(|job| job.jid == jid)
    }

    fn ref_mut<P>(&mut self, predicate: P) -> Option<JobRefMut<'_>>
    where
        P: Fn(&Job) -> bool,
    {
        let foreground = self.foreground_pid();
        let job = self.slots.iter_mut().flatten().find(|job| predicate(job))?;
        let other_foreground = foreground.filter(|&pid| pid != job.pid);
        Some(JobRefMut {
            job,
            other_foreground,
        })
    }

    /// Finds the job with the given process ID for modification.
    pub fn find_by_pid_mut(&mut self, pid: Pid) -> Option<JobRefMut<'_>> {
        self.ref_mut(|job| job.pid == pid)
    }

    /// Finds the job with the given job number for modification.
    pub fn find_by_jid_mut(&mut self, jid: Jid) -> Option<JobRefMut<'_>> {
        self.ref_mut(|job| job.jid == jid)
    }

    /// Returns the process ID of the foreground job, if any.
    ///
    /// The answer is computed from the list every time. No other part of the
    /// interpreter remembers which job is in the foreground.
    #[must_use]
    pub fn foreground_pid(&self) -> Option<Pid> {
        self.jobs()
            .find(|job| job.state == JobState::Foreground)
            .map(|job| job.pid)
    }

    /// Returns all jobs ordered by job number.
    #[must_use]
    pub fn list(&self) -> Vec<&Job> {
        self.jobs().sorted_by_key(|job| job.jid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashSet;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn job_numbers_start_from_one_and_increase() {
        let mut list = JobList::new();
        assert_eq!(list.add(pid(10), JobState::Background, "a".into()), Ok(Jid(1)));
        assert_eq!(list.add(pid(20), JobState::Background, "b".into()), Ok(Jid(2)));
        assert_eq!(list.add(pid(30), JobState::Foreground, "c".into()), Ok(Jid(3)));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn removing_largest_job_number_lets_numbering_step_back() {
        let mut list = JobList::new();
        list.add(pid(10), JobState::Background, "a".into()).unwrap();
        list.add(pid(20), JobState::Background, "b".into()).unwrap();
        list.add(pid(30), JobState::Background, "c".into()).unwrap();

        list.remove(pid(20)).unwrap();
        assert_eq!(list.add(pid(40), JobState::Background, "d".into()), Ok(Jid(4)));

        list.remove(pid(40)).unwrap();
        list.remove(pid(30)).unwrap();
        assert_eq!(list.add(pid(50), JobState::Background, "e".into()), Ok(Jid(2)));
    }

    #[test]
    fn add_fails_when_full() {
        let mut list = JobList::with_capacity(2);
        list.add(pid(10), JobState::Background, "a".into()).unwrap();
        assert!(!list.is_full());
        list.add(pid(20), JobState::Background, "b".into()).unwrap();
        assert!(list.is_full());

        let result = list.add(pid(30), JobState::Background, "c".into());
        assert_eq!(result, Err(AddError::TableFull));
        assert_eq!(list.find_by_pid(pid(30)), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn add_rejects_invalid_and_duplicate_pids() {
        let mut list = JobList::new();
        let result = list.add(pid(0), JobState::Background, "a".into());
        assert_eq!(result, Err(AddError::InvalidPid(pid(0))));
        let result = list.add(pid(-5), JobState::Background, "a".into());
        assert_eq!(result, Err(AddError::InvalidPid(pid(-5))));

        list.add(pid(10), JobState::Background, "a".into()).unwrap();
        let result = list.add(pid(10), JobState::Stopped, "b".into());
        assert_eq!(result, Err(AddError::DuplicatePid(pid(10))));
        assert!(list.len() == 1);
    }

    #[test]
    fn at_most_one_foreground_job_on_add() {
        let mut list = JobList::new();
        list.add(pid(10), JobState::Foreground, "a".into()).unwrap();
        let result = list.add(pid(20), JobState::Foreground, "b".into());
        assert_matches!(result, Err(AddError::ForegroundOccupied(ForegroundOccupied(p))) => {
            assert_eq!(p, pid(10));
        });
        assert_eq!(list.add(pid(20), JobState::Background, "b".into()), Ok(Jid(2)));
    }

    #[test]
    fn at_most_one_foreground_job_on_state_change() {
        let mut list = JobList::new();
        list.add(pid(10), JobState::Foreground, "a".into()).unwrap();
        list.add(pid(20), JobState::Stopped, "b".into()).unwrap();

        let mut job = list.find_by_pid_mut(pid(20)).unwrap();
        assert_eq!(
            job.set_state(JobState::Foreground),
            Err(ForegroundOccupied(pid(10)))
        );
        assert_eq!(job.state, JobState::Stopped);

        // Re-setting the foreground job itself is fine.
        let mut job = list.find_by_pid_mut(pid(10)).unwrap();
        assert_eq!(job.set_state(JobState::Foreground), Ok(()));
        assert_eq!(job.set_state(JobState::Stopped), Ok(()));

        let mut job = list.find_by_jid_mut(Jid(2)).unwrap();
        assert_eq!(job.set_state(JobState::Foreground), Ok(()));
        assert_eq!(list.foreground_pid(), Some(pid(20)));
    }

    #[test]
    fn foreground_pid_scans_for_foreground_job() {
        let mut list = JobList::new();
        assert_eq!(list.foreground_pid(), None);
        list.add(pid(10), JobState::Background, "a".into()).unwrap();
        list.add(pid(20), JobState::Stopped, "b".into()).unwrap();
        assert_eq!(list.foreground_pid(), None);
        list.add(pid(30), JobState::Foreground, "c".into()).unwrap();
        assert_eq!(list.foreground_pid(), Some(pid(30)));

        list.find_by_pid_mut(pid(30))
            .unwrap()
            .set_state(JobState::Stopped)
            .unwrap();
        assert_eq!(list.foreground_pid(), None);
    }

    #[test]
    fn lookups_by_pid_and_jid() {
        let mut list = JobList::new();
        list.add(pid(10), JobState::Background, "sleep 1 &".into()).unwrap();
        list.add(pid(20), JobState::Stopped, "sleep 2".into()).unwrap();

        let job = list.find_by_pid(pid(20)).unwrap();
        assert_eq!(job.jid, Jid(2));
        assert_eq!(job.command_line, "sleep 2");
        let job = list.find_by_jid(Jid(1)).unwrap();
        assert_eq!(job.pid, pid(10));
        assert_eq!(list.find_by_pid(pid(30)), None);
        assert_eq!(list.find_by_jid(Jid(3)), None);
        assert_eq!(list.find_by_jid(Jid(0)), None);
    }

    #[test]
    fn removed_job_cannot_be_found_again() {
        let mut list = JobList::new();
        list.add(pid(10), JobState::Background, "a".into()).unwrap();
        list.add(pid(20), JobState::Background, "b".into()).unwrap();

        let removed = list.remove(pid(10)).unwrap();
        assert_eq!(removed.jid, Jid(1));
        assert_eq!(list.find_by_pid(pid(10)), None);
        assert_eq!(list.find_by_jid(Jid(1)), None);
        assert!(list.find_by_pid_mut(pid(10)).is_none());
        assert_eq!(list.remove(pid(10)), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn list_is_ordered_by_job_number() {
        let mut list = JobList::with_capacity(4);
        list.add(pid(10), JobState::Background, "a".into()).unwrap();
        list.add(pid(20), JobState::Background, "b".into()).unwrap();
        list.add(pid(30), JobState::Background, "c".into()).unwrap();
        list.remove(pid(10));
        // The new job takes the first slot but gets the largest number.
        list.add(pid(40), JobState::Background, "d".into()).unwrap();

        let jids = list.list().iter().map(|job| job.jid).collect::<Vec<_>>();
        assert_eq!(jids, [Jid(2), Jid(3), Jid(4)]);
    }

    #[test]
    fn live_jobs_never_share_pid_or_jid() {
        let mut list = JobList::new();
        let mut seed = 12345u32;
        let mut next_pid = 100;
        let mut live = Vec::new();
        for _ in 0..2000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let roll = (seed >> 16) % 3;
            if roll != 0 && !list.is_full() {
                next_pid += 1;
                let jid = list
                    .add(pid(next_pid), JobState::Background, String::new())
                    .unwrap();
                live.push((pid(next_pid), jid));
            } else if !live.is_empty() {
                let index = (seed >> 8) as usize % live.len();
                let (removed_pid, removed_jid) = live.swap_remove(index);
                assert_eq!(list.remove(removed_pid).map(|job| job.jid), Some(removed_jid));
            }

            let jobs = list.list();
            assert_eq!(jobs.len(), live.len());
            let pids = jobs.iter().map(|job| job.pid).collect::<HashSet<_>>();
            let jids = jobs.iter().map(|job| job.jid).collect::<HashSet<_>>();
            assert_eq!(pids.len(), jobs.len());
            assert_eq!(jids.len(), jobs.len());
        }
    }

    #[test]
    fn job_state_display() {
        assert_eq!(JobState::Foreground.to_string(), "Foreground");
        assert_eq!(JobState::Background.to_string(), "Running");
        assert_eq!(JobState::Stopped.to_string(), "Stopped");
    }
}
