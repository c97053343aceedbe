//! # Live-Table Job Polling
//!
//! Both live tables follow the same protocol: create a job, then poll it by
//! id until it reports `complete` or `failed`. [`JobPoller`] drives that
//! protocol for any entry type implementing [`LiveTableEntry`].
//!
//! A job that does not complete yields [`JobOutcome::Incomplete`] with the
//! reason. Callers must read that as "this table is unavailable", never as
//! "the address is absent".

use std::time::Duration;

use portfind_common::config::DEFAULT_POLL_ATTEMPTS;
use portfind_protocols::entries::{ArpEntry, ForwardingEntry};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{JobKind, JobStatus, LiveTools};
use crate::error::JobError;

/// An entry type that can be decoded from a completed job.
pub trait LiveTableEntry: Sized + Send {
    const KIND: JobKind;

    /// `None` for entries that cannot be used.
    fn parse(value: &Value) -> Option<Self>;
}

impl LiveTableEntry for ForwardingEntry {
    const KIND: JobKind = JobKind::ForwardingTable;

    fn parse(value: &Value) -> Option<Self> {
        ForwardingEntry::from_value(value)
    }
}

impl LiveTableEntry for ArpEntry {
    const KIND: JobKind = JobKind::ArpTable;

    fn parse(value: &Value) -> Option<Self> {
        ArpEntry::from_value(value)
    }
}

/// How long to wait for a job: `attempts` polls, each preceded by a sleep of
/// `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    /// Zero attempts would turn every job into a silent miss, so it is
    /// replaced by the default.
    pub fn new(attempts: u32, interval: Duration) -> Self {
        let attempts = if attempts == 0 {
            warn!("Poll attempts set to 0, using {DEFAULT_POLL_ATTEMPTS} instead");
            DEFAULT_POLL_ATTEMPTS
        } else {
            attempts
        };
        Self { attempts, interval }
    }
}

#[derive(Debug)]
pub enum JobOutcome<T> {
    /// The job finished; malformed entries have already been dropped.
    Completed(Vec<T>),
    Incomplete(JobError),
}

pub struct JobPoller<'a, A: LiveTools + ?Sized> {
    api: &'a A,
    policy: PollPolicy,
}

impl<'a, A: LiveTools + ?Sized> JobPoller<'a, A> {
    pub fn new(api: &'a A, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Creates a job on `serial` and polls it to a terminal state or until
    /// the attempt budget runs out.
    pub async fn run<T: LiveTableEntry>(&self, serial: &str) -> JobOutcome<T> {
        let kind = T::KIND;
        let id = match self.api.create_job(serial, kind).await {
            Ok(id) => id,
            Err(source) => return JobOutcome::Incomplete(JobError::Create { kind, source }),
        };
        debug!("Started {kind} job {id} on {serial}");

        for attempt in 1..=self.policy.attempts {
            tokio::time::sleep(self.policy.interval).await;

            let poll = match self.api.poll_job(serial, kind, &id).await {
                Ok(poll) => poll,
                Err(source) => {
                    return JobOutcome::Incomplete(JobError::Poll { kind, id, source });
                }
            };

            match poll.status {
                JobStatus::Complete => {
                    let total = poll.entries.len();
                    let entries: Vec<T> = poll.entries.iter().filter_map(T::parse).collect();
                    debug!(
                        "{kind} job {id} on {serial} complete after {attempt} poll(s): {} of {total} entries usable",
                        entries.len()
                    );
                    return JobOutcome::Completed(entries);
                }
                JobStatus::Failed => return JobOutcome::Incomplete(JobError::Failed { kind, id }),
                JobStatus::Pending => {}
            }
        }

        JobOutcome::Incomplete(JobError::Exhausted {
            kind,
            id,
            attempts: self.policy.attempts,
        })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
