//! In-memory job store: job ids, status records, and the read-side status query.

use crate::config::StoreConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Opaque job identifier, a v4 UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
    /// Query-only: the id was never registered (or has expired).
    NotFound,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::NotFound => "not_found",
        }
    }
}

/// What a poll returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: JobStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl StatusRecord {
    pub fn processing(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Processing,
            message: message.into(),
            video_url: None,
        }
    }

    pub fn completed(message: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Completed,
            message: message.into(),
            video_url: Some(video_url.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            message: message.into(),
            video_url: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: JobStatus::NotFound,
            message: "Job not found".to_string(),
            video_url: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

struct Entry {
    record: StatusRecord,
    updated: Instant,
}

#[derive(Default)]
struct Inner {
    records: HashMap<JobId, Entry>,
    /// Registration order, oldest first; drives capacity eviction.
    order: VecDeque<JobId>,
    /// Issued by `create` but not yet written.
    pending: HashSet<JobId>,
}

/// Job id → status record. Shared by `Arc` between the orchestrator and readers.
///
/// Terminal records are sticky: once a job is `completed` or `failed`, writes
/// for it are refused. With a capacity, the oldest terminal records are
/// evicted to make room; running jobs are never evicted. With a TTL, terminal
/// records older than the TTL read as not found and are purged on the next write.
pub struct JobStore {
    inner: RwLock<Inner>,
    capacity: Option<usize>,
    ttl: Option<Duration>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl JobStore {
    pub fn unbounded() -> Self {
        Self::with_limits(None, None)
    }

    pub fn with_limits(capacity: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity,
            ttl,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::with_limits(config.capacity, config.ttl())
    }

    /// Allocate a fresh id. Does not register a record, but the id is reserved
    /// until its first write.
    pub fn create(&self) -> JobId {
        self.create_with(JobId::random)
    }

    fn create_with(&self, mut next: impl FnMut() -> JobId) -> JobId {
        let mut inner = self.inner.write();
        loop {
            let id = next();
            if !inner.records.contains_key(&id) && inner.pending.insert(id) {
                return id;
            }
        }
    }

    /// Overwrite the record for `id`. Returns `false` if the job is already terminal.
    pub fn set(&self, id: JobId, record: StatusRecord) -> bool {
        let mut inner = self.inner.write();
        self.purge_expired(&mut inner);

        if let Some(entry) = inner.records.get_mut(&id) {
            if entry.record.is_terminal() {
                tracing::warn!(
                    job_id = %id,
                    current = entry.record.status.as_str(),
                    attempted = record.status.as_str(),
                    "refusing write to terminal job"
                );
                return false;
            }
            entry.record = record;
            entry.updated = Instant::now();
            return true;
        }

        inner.pending.remove(&id);
        self.make_room(&mut inner);
        inner.records.insert(
            id,
            Entry {
                record,
                updated: Instant::now(),
            },
        );
        inner.order.push_back(id);
        true
    }

    pub fn set_processing(&self, id: JobId, message: impl Into<String>) -> bool {
        self.set(id, StatusRecord::processing(message))
    }

    pub fn set_completed(&self, id: JobId, message: impl Into<String>, video_url: impl Into<String>) -> bool {
        self.set(id, StatusRecord::completed(message, video_url))
    }

    pub fn set_failed(&self, id: JobId, message: impl Into<String>) -> bool {
        self.set(id, StatusRecord::failed(message))
    }

    /// Current record, or the not-found record. Never fails.
    pub fn get(&self, id: &JobId) -> StatusRecord {
        let inner = self.inner.read();
        match inner.records.get(id) {
            Some(entry) if !self.is_expired(entry) => entry.record.clone(),
            _ => StatusRecord::not_found(),
        }
    }

    /// Lookup by the string form of an id; unparseable ids are simply unknown.
    pub fn get_str(&self, id: &str) -> StatusRecord {
        match id.parse::<JobId>() {
            Ok(id) => self.get(&id),
            Err(_) => StatusRecord::not_found(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.record.is_terminal() && self.ttl.is_some_and(|ttl| entry.updated.elapsed() >= ttl)
    }

    fn purge_expired(&self, inner: &mut Inner) {
        if self.ttl.is_none() {
            return;
        }
        let expired: HashSet<JobId> = inner
            .records
            .iter()
            .filter(|(_, e)| self.is_expired(e))
            .map(|(id, _)| *id)
            .collect();
        if expired.is_empty() {
            return;
        }
        inner.records.retain(|id, _| !expired.contains(id));
        inner.order.retain(|id| !expired.contains(id));
    }

    fn make_room(&self, inner: &mut Inner) {
        let Some(capacity) = self.capacity else { return };
        while inner.records.len() >= capacity {
            let oldest_terminal = inner.order.iter().position(|id| {
                inner.records.get(id).is_some_and(|e| e.record.is_terminal())
            });
            let Some(pos) = oldest_terminal else {
                tracing::warn!(capacity, "job store full of running jobs; growing past capacity");
                return;
            };
            if let Some(id) = inner.order.remove(pos) {
                inner.records.remove(&id);
                tracing::debug!(job_id = %id, "evicted terminal job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn create_returns_unique_ids() {
        let store = JobStore::unbounded();
        let ids: HashSet<JobId> = (0..1000).map(|_| store.create()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(store.is_empty());
    }

    #[test]
    fn create_rerolls_on_pending_or_held_id() {
        let store = JobStore::unbounded();
        let (a, b, c) = (JobId::random(), JobId::random(), JobId::random());
        let mut seq = vec![a, a, b, a, b, c].into_iter();
        let mut next = move || seq.next().unwrap();

        assert_eq!(store.create_with(&mut next), a);
        assert_eq!(store.create_with(&mut next), b);
        store.set_processing(a, "working");
        assert_eq!(store.create_with(&mut next), c);
    }

    #[test]
    fn job_id_round_trips_through_string() {
        let id = JobStore::unbounded().create();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn get_unknown_is_not_found() {
        let store = JobStore::unbounded();
        let r = store.get(&store.create());
        assert_eq!(r.status, JobStatus::NotFound);
        assert_eq!(r.message, "Job not found");
        assert_eq!(store.get_str("garbage").status, JobStatus::NotFound);
    }

    #[test]
    fn set_overwrites_while_processing() {
        let store = JobStore::unbounded();
        let id = store.create();
        assert!(store.set_processing(id, "generating script..."));
        assert!(store.set_processing(id, "generating audio..."));
        let r = store.get_str(&id.to_string());
        assert_eq!(r.status, JobStatus::Processing);
        assert_eq!(r.message, "generating audio...");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn completed_is_sticky() {
        let store = JobStore::unbounded();
        let id = store.create();
        store.set_processing(id, "working");
        assert!(store.set_completed(id, "done", "https://x/final.mp4"));
        assert!(!store.set_processing(id, "again"));
        assert!(!store.set_failed(id, "late failure"));
        let r = store.get(&id);
        assert_eq!(r.status, JobStatus::Completed);
        assert_eq!(r.video_url.as_deref(), Some("https://x/final.mp4"));
    }

    #[test]
    fn failed_is_sticky() {
        let store = JobStore::unbounded();
        let id = store.create();
        store.set_failed(id, "gemini: bad key");
        assert!(!store.set_completed(id, "done", "https://x/final.mp4"));
        let r = store.get(&id);
        assert_eq!(r.status, JobStatus::Failed);
        assert!(r.video_url.is_none());
    }

    #[test]
    fn capacity_evicts_oldest_terminal_first() {
        let store = JobStore::with_limits(Some(2), None);
        let running = store.create();
        store.set_processing(running, "working");
        let done = store.create();
        store.set_completed(done, "done", "u");
        let third = store.create();
        store.set_processing(third, "working");

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&done).status, JobStatus::NotFound);
        assert_eq!(store.get(&running).status, JobStatus::Processing);
        assert_eq!(store.get(&third).status, JobStatus::Processing);
    }

    #[test]
    fn capacity_never_evicts_running_jobs() {
        let store = JobStore::with_limits(Some(1), None);
        let a = store.create();
        store.set_processing(a, "working");
        let b = store.create();
        store.set_processing(b, "working");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a).status, JobStatus::Processing);
    }

    #[test]
    fn ttl_expires_terminal_records_only() {
        let store = JobStore::with_limits(None, Some(Duration::ZERO));
        let running = store.create();
        store.set_processing(running, "working");
        let done = store.create();
        store.set_failed(done, "kling: timeout");

        assert_eq!(store.get(&done).status, JobStatus::NotFound);
        assert_eq!(store.get(&running).status, JobStatus::Processing);

        let other = store.create();
        store.set_processing(other, "working");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ttl_purge_drops_every_expired_record_in_one_write() {
        let store = JobStore::with_limits(Some(3), Some(Duration::ZERO));
        let mut done = Vec::new();
        for _ in 0..3 {
            let id = store.create();
            store.set_processing(id, "working");
            store.set_completed(id, "done", "u");
            done.push(id);
        }
        let running = store.create();
        store.set_processing(running, "working");

        assert_eq!(store.len(), 1);
        assert_eq!(store.inner.read().order, VecDeque::from([running]));
        for id in done {
            assert_eq!(store.get(&id).status, JobStatus::NotFound);
        }
    }

    #[test]
    fn long_ttl_keeps_records() {
        let store = JobStore::with_limits(None, Some(Duration::from_secs(3600)));
        let id = store.create();
        store.set_completed(id, "done", "u");
        assert_eq!(store.get(&id).status, JobStatus::Completed);
    }

    #[test]
    fn record_serializes_without_absent_url() {
        let j = serde_json::to_value(StatusRecord::processing("generating script...")).unwrap();
        assert_eq!(j, serde_json::json!({"status": "processing", "message": "generating script..."}));
        let j = serde_json::to_value(StatusRecord::completed("done", "https://x/v.mp4")).unwrap();
        assert_eq!(j["video_url"], "https://x/v.mp4");
        let j = serde_json::to_value(StatusRecord::not_found()).unwrap();
        assert_eq!(j["status"], "not_found");
    }
}
