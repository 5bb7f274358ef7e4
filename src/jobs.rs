//! Tracks backgrounded processes from launch until their completion has
//! been reported exactly once.
//!
//! The table is shared between the read-eval loop and the child-exit
//! notification thread, with a strict division of labor: the notification
//! side only ever flips the `done` flag of an existing record, while all
//! structural edits (insert, report, remove) belong to the main loop. That
//! keeps a completion from being reported twice or lost while the list is
//! being walked.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nix::unistd::Pid;

#[derive(Debug)]
struct Job {
    pid: Pid,
    done: bool,
}

#[derive(Clone)]
pub struct JobTable {
    inner: Arc<Mutex<Vec<Job>>>,
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Claim the table ahead of spawning a background process. The lock
    /// is held until `Registration::add` inserts the record, so the
    /// notification side cannot observe the new pid before its record
    /// exists; a child that exits instantly still gets its completion
    /// recorded and reported.
    pub fn reserve(&self) -> Registration<'_> {
        Registration {
            jobs: self.inner.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Mark a reaped pid as completed. Called from the notification side,
    /// which never restructures the list. Pids without a record (foreground
    /// children, intermediate pipeline stages) are ignored.
    pub fn mark_done(&self, pid: Pid) {
        if let Ok(mut jobs) = self.inner.lock() {
            if let Some(job) = jobs.iter_mut().find(|job| job.pid == pid) {
                job.done = true;
            }
        }
    }

    /// Remove completed records and print their completion notice. Called
    /// once per loop iteration by the main loop only.
    pub fn reconcile(&self) {
        if let Ok(mut jobs) = self.inner.lock() {
            jobs.retain(|job| {
                if job.done {
                    println!("[{}] completed", job.pid);
                }
                !job.done
            });
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A claim on the job table spanning process creation. There is at most
/// one record per live pid.
pub struct Registration<'a> {
    jobs: MutexGuard<'a, Vec<Job>>,
}

impl Registration<'_> {
    /// Insert the record for the freshly forked pid and release the table.
    pub fn add(mut self, pid: Pid) {
        println!("started [{}]", pid);
        self.jobs.push(Job { pid, done: false });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn test_record_lives_until_reconciled() {
        let jobs = JobTable::new();
        jobs.reserve().add(pid(4242));
        assert_eq!(jobs.len(), 1);

        // not done yet: reconciliation leaves it alone
        jobs.reconcile();
        assert_eq!(jobs.len(), 1);

        jobs.mark_done(pid(4242));
        assert_eq!(jobs.len(), 1, "marking must not remove the record");

        jobs.reconcile();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_reported_exactly_once() {
        let jobs = JobTable::new();
        jobs.reserve().add(pid(100));
        jobs.mark_done(pid(100));
        jobs.reconcile();
        jobs.reconcile();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_unknown_pid_is_ignored() {
        let jobs = JobTable::new();
        jobs.reserve().add(pid(7));
        jobs.mark_done(pid(8));
        jobs.reconcile();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_independent_completions() {
        let jobs = JobTable::new();
        jobs.reserve().add(pid(1));
        jobs.reserve().add(pid(2));
        jobs.reserve().add(pid(3));
        jobs.mark_done(pid(2));
        jobs.reconcile();
        assert_eq!(jobs.len(), 2);
    }
}
