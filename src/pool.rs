//! Core proxy pool implementation: record store, rotation, health gating.

use crate::binder::ProxyConfig;
use crate::config::PoolConfig;
use crate::error::ParseError;
use crate::parser;
use crate::prober::{self, NetworkProbe};
use crate::proxy::{HealthState, ProxyRecord};

use futures::future;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;

/// Outcome of registering a batch of raw descriptors.
///
/// A malformed entry never aborts the batch; it lands in `rejected` with the
/// error kind and the remaining entries are still processed.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Descriptors parsed and appended to the pool.
    pub added: usize,
    /// Descriptors skipped because an identical record already exists.
    pub duplicates: usize,
    /// Descriptors that failed validation, with the reason each was refused.
    pub rejected: Vec<(String, ParseError)>,
}

/// Mutable pool state: the records in insertion order plus the rotation
/// cursor. Everything behind one lock so selection and health write-backs
/// stay mutually exclusive.
struct PoolState {
    records: Vec<ProxyRecord>,
    cursor: usize,
}

/// What the selector decided about one rotation candidate while the state
/// lock was held.
enum Step {
    Accept(ProxyRecord),
    Probe(ProxyRecord),
    Skip,
}

/// A pool of proxies handed out in health-gated round-robin order.
pub struct ProxyPool {
    state: Mutex<PoolState>,
    probe: Arc<dyn NetworkProbe>,
    /// Configuration for the pool.
    pub config: PoolConfig,
}

impl ProxyPool {
    /// Create an empty pool with the given configuration and probe
    /// collaborator. Records arrive via [`ProxyPool::register`].
    pub fn new(config: PoolConfig, probe: Arc<dyn NetworkProbe>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                records: Vec::new(),
                cursor: 0,
            }),
            probe,
            config,
        }
    }

    /// Parse and append a batch of raw descriptors.
    pub fn register<I, S>(&self, descriptors: I) -> RegistrationReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = RegistrationReport::default();
        let mut parsed = Vec::new();

        for descriptor in descriptors {
            let raw = descriptor.as_ref();
            match parser::parse(raw, self.config.max_requests_per_second) {
                Ok(record) => parsed.push(record),
                Err(err) => {
                    warn!("Rejected descriptor {:?}: {}", raw, err);
                    report.rejected.push((raw.to_string(), err));
                }
            }
        }

        let (added, duplicates) = self.add_records(parsed);
        report.added = added;
        report.duplicates = duplicates;

        info!(
            "Registered {} proxies ({} duplicates, {} rejected)",
            report.added,
            report.duplicates,
            report.rejected.len()
        );
        report
    }

    /// Append already-parsed records, skipping exact duplicates by identity
    /// tuple. Duplication is idempotent registration, not an error.
    pub fn add_records(&self, records: Vec<ProxyRecord>) -> (usize, usize) {
        let mut state = self.state.lock();
        let mut added = 0;
        let mut skipped = 0;
        for record in records {
            if state.records.iter().any(|r| r.key() == record.key()) {
                skipped += 1;
            } else {
                state.records.push(record);
                added += 1;
            }
        }
        (added, skipped)
    }

    /// Atomically swap the entire pool and reset the rotation cursor.
    pub fn replace_all(&self, records: Vec<ProxyRecord>) {
        let mut fresh: Vec<ProxyRecord> = Vec::with_capacity(records.len());
        for record in records {
            if !fresh.iter().any(|r| r.key() == record.key()) {
                fresh.push(record);
            }
        }
        let mut state = self.state.lock();
        info!(
            "Replacing pool: {} records out, {} records in",
            state.records.len(),
            fresh.len()
        );
        state.records = fresh;
        state.cursor = 0;
    }

    /// Number of records in the pool.
    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only copy of the pool contents, in insertion order.
    pub fn snapshot(&self) -> Vec<ProxyRecord> {
        self.state.lock().records.clone()
    }

    /// `(total, alive)` counts for observability.
    pub fn stats(&self) -> (usize, usize) {
        let state = self.state.lock();
        let total = state.records.len();
        let alive = state
            .records
            .iter()
            .filter(|r| r.health == HealthState::Alive)
            .count();
        (total, alive)
    }

    /// Hand out the next proxy in rotation order.
    ///
    /// With `check_health` false every candidate is accepted unconditionally.
    /// With it true, a cached Alive verdict is trusted, a Dead verdict inside
    /// `dead_retry_window` skips the candidate without probing, and anything
    /// else is probed on the spot. The cursor advances for every candidate
    /// examined, so repeated calls cycle fairly instead of hammering the
    /// first live entry. At most one full cycle is scanned; an empty or
    /// fully-dead pool yields `None` in bounded time.
    pub async fn next(&self, check_health: bool) -> Option<ProxyRecord> {
        let budget = self.state.lock().records.len();

        for _ in 0..budget {
            let step = {
                let mut state = self.state.lock();
                if state.records.is_empty() {
                    return None;
                }
                let len = state.records.len();
                let idx = state.cursor % len;
                state.cursor = (idx + 1) % len;
                let record = &state.records[idx];

                if !check_health {
                    Step::Accept(record.clone())
                } else {
                    match record.effective_health(self.config.dead_retry_window, Instant::now()) {
                        HealthState::Alive => Step::Accept(record.clone()),
                        HealthState::Dead => Step::Skip,
                        HealthState::Unknown => Step::Probe(record.clone()),
                    }
                }
            };

            match step {
                Step::Accept(record) => return Some(record),
                Step::Skip => continue,
                Step::Probe(record) => {
                    // Probe without holding the state lock; another caller
                    // may probe the same record concurrently and the last
                    // write-back wins.
                    let target = endpoint(&record);
                    let verdict =
                        prober::probe(&target, self.probe.as_ref(), self.config.probe_timeout)
                            .await;

                    let mut state = self.state.lock();
                    match state.records.iter_mut().find(|r| r.key() == record.key()) {
                        Some(live) => {
                            live.mark(verdict, Instant::now());
                            if verdict == HealthState::Alive {
                                return Some(live.clone());
                            }
                            debug!("Proxy {} probed dead, rotating on", record);
                        }
                        // The pool was replaced while we probed; the verdict
                        // has nothing to attach to.
                        None => debug!("Proxy {} vanished during probe", record),
                    }
                }
            }
        }
        None
    }

    /// Record that a real request through this proxy succeeded.
    pub fn report_success(&self, record: &ProxyRecord) {
        let mut state = self.state.lock();
        if let Some(live) = state.records.iter_mut().find(|r| r.key() == record.key()) {
            live.success_count += 1;
            live.mark(HealthState::Alive, Instant::now());
        }
    }

    /// Record that a real request through this proxy failed. The record is
    /// distrusted for `dead_retry_window` just as if a probe had failed.
    pub fn report_failure(&self, record: &ProxyRecord) {
        let mut state = self.state.lock();
        if let Some(live) = state.records.iter_mut().find(|r| r.key() == record.key()) {
            live.failure_count += 1;
            let old = live.health;
            live.mark(HealthState::Dead, Instant::now());
            if old != HealthState::Dead {
                warn!(
                    "Proxy {} marked dead: {} failures, {} successes",
                    live, live.failure_count, live.success_count
                );
            }
        }
    }

    /// Probe every record concurrently and write all verdicts back.
    pub async fn check_all(&self) {
        let records = self.snapshot();
        if records.is_empty() {
            return;
        }
        info!("Starting health check for {} proxies", records.len());

        let timeout = self.config.probe_timeout;
        let checks = records.iter().map(|record| {
            let target = endpoint(record);
            async move {
                let verdict = prober::probe(&target, self.probe.as_ref(), timeout).await;
                (target, verdict)
            }
        });
        let results = future::join_all(checks).await;

        let now = Instant::now();
        let mut alive = 0;
        let mut dead = 0;
        let mut state = self.state.lock();
        for (target, verdict) in results {
            match verdict {
                HealthState::Alive => alive += 1,
                _ => dead += 1,
            }
            if let Some(record) = state
                .records
                .iter_mut()
                .find(|r| r.key() == (target.scheme, target.host.as_str(), target.port, target.credentials.as_ref()))
            {
                let old = record.health;
                record.mark(verdict, now);
                if old != verdict {
                    info!("Proxy {} status changed: {:?} -> {:?}", record, old, verdict);
                }
            }
        }
        drop(state);

        info!("Health check completed: {} alive, {} dead", alive, dead);
    }

    /// Spawn a background task re-probing the whole pool every `interval`.
    pub fn start_background_checks(self: &Arc<Self>, interval: Duration) {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                time::sleep(interval).await;
                pool.check_all().await;
                let (total, alive) = pool.stats();
                info!("Proxy pool status update: {}/{} alive proxies", alive, total);
            }
        });
    }
}

fn endpoint(record: &ProxyRecord) -> ProxyConfig {
    ProxyConfig {
        scheme: record.scheme,
        host: record.host.clone(),
        port: record.port,
        credentials: record.credentials.clone(),
    }
}
