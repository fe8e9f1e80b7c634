//! Parallel dispatcher - runs scan tasks on a bounded worker pool.
//!
//! Every task is spawned onto the tokio runtime and waits for a semaphore
//! permit before calling the scanner, so at most `workers` scans are in
//! flight. Each worker sends exactly one message back to the dispatching
//! task, which is the only owner of the result list. Progress snapshots are
//! taken on a timer from that same loop and never influence scheduling.

mod progress;

pub use progress::{format_elapsed, Progress};

use crate::scanner::{RawScanResult, ScanOutcome, Scanner};
use crate::types::ScanTask;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default delay between two progress snapshots.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Number of workers used when none is configured: the machine's available
/// parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Everything a dispatch run produced.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// One entry per task that yielded a result, in completion order.
    pub results: Vec<RawScanResult>,
    /// Tasks that yielded nothing and were dropped.
    pub dropped: usize,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
}

/// Runs scan tasks with bounded concurrency.
pub struct Dispatcher {
    scanner: Arc<dyn Scanner>,
    workers: usize,
    progress_interval: Duration,
    task_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher sized to the machine's available parallelism.
    pub fn new(scanner: Arc<dyn Scanner>) -> Self {
        Self {
            scanner,
            workers: default_workers(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            task_timeout: None,
        }
    }

    /// Set the number of concurrent scans (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the delay between progress snapshots.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Drop any task still running after `timeout`. Disabled by default.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Run every task, logging progress snapshots.
    pub async fn dispatch(&self, tasks: Vec<ScanTask>) -> DispatchOutcome {
        self.dispatch_with_progress(tasks, |progress| info!("{}", progress))
            .await
    }

    /// Run every task, handing each progress snapshot to `on_progress`.
    ///
    /// Blocks until every task has either produced a result or been dropped.
    /// The final snapshot has `finished` set and is emitted exactly once.
    pub async fn dispatch_with_progress<F>(
        &self,
        tasks: Vec<ScanTask>,
        mut on_progress: F,
    ) -> DispatchOutcome
    where
        F: FnMut(&Progress),
    {
        let start = Instant::now();
        let total = tasks.len();

        if total == 0 {
            debug!("no scan tasks to dispatch");
            return DispatchOutcome {
                results: Vec::new(),
                dropped: 0,
                elapsed: start.elapsed(),
            };
        }

        info!(
            tasks = total,
            workers = self.workers,
            scanner = self.scanner.name(),
            "dispatching scan tasks"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<Option<RawScanResult>>();

        for task in tasks {
            let semaphore = Arc::clone(&semaphore);
            let scanner = Arc::clone(&self.scanner);
            let tx = tx.clone();
            let deadline = self.task_timeout;

            tokio::spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => run_task(scanner.as_ref(), &task, deadline).await,
                    Err(_) => None,
                };
                let _ = tx.send(outcome.map(|outcome| RawScanResult::new(task, outcome)));
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        let mut finished = 0;
        let mut dropped = 0;

        let mut ticker = interval_at(start + self.progress_interval, self.progress_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while finished < total {
            // Ticker first: a due snapshot is never skipped behind queued results.
            tokio::select! {
                biased;

                _ = ticker.tick() => on_progress(&Progress {
                    completed: results.len(),
                    total,
                    elapsed: start.elapsed(),
                    finished: false,
                }),

                message = rx.recv() => match message {
                    Some(Some(result)) => {
                        finished += 1;
                        results.push(result);
                    }
                    Some(None) => {
                        finished += 1;
                        dropped += 1;
                    }
                    None => {
                        // Only panicked workers leave without reporting.
                        let lost = total - finished;
                        warn!(lost, "scan workers exited without reporting");
                        dropped += lost;
                        break;
                    }
                },
            }
        }

        let elapsed = start.elapsed();
        on_progress(&Progress {
            completed: results.len(),
            total,
            elapsed,
            finished: true,
        });

        if dropped > 0 {
            warn!(dropped, total, "some scan tasks produced no result");
        }

        DispatchOutcome {
            results,
            dropped,
            elapsed,
        }
    }
}

async fn run_task(
    scanner: &dyn Scanner,
    task: &ScanTask,
    deadline: Option<Duration>,
) -> Option<ScanOutcome> {
    debug!(task = %task, "scan task started");

    let outcome = match deadline {
        Some(limit) => match tokio::time::timeout(limit, scanner.scan(task)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(task = %task, timeout_secs = limit.as_secs(), "scan task timed out");
                None
            }
        },
        None => scanner.scan(task).await,
    };

    match &outcome {
        Some(outcome) => debug!(task = %task, up = outcome.host_up, "scan task finished"),
        None => debug!(task = %task, "scan task dropped"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PortInfo, Protocol, ResolvedHost, Target};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Up(Duration),
        Down,
        Fail,
        Hang,
        Panic,
    }

    struct ScriptedScanner {
        behavior: HashMap<IpAddr, Behavior>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedScanner {
        fn new(behavior: Vec<(&str, Behavior)>) -> Self {
            Self {
                behavior: behavior
                    .into_iter()
                    .map(|(ip, b)| (ip.parse().unwrap(), b))
                    .collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Scanner for ScriptedScanner {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn requires_privileges(&self) -> bool {
            false
        }

        async fn scan(&self, task: &ScanTask) -> Option<ScanOutcome> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let outcome = match self.behavior.get(&task.host.ip) {
                Some(Behavior::Up(delay)) => {
                    tokio::time::sleep(*delay).await;
                    Some(ScanOutcome::up().with_port(22, PortInfo::new("open", "ssh")))
                }
                Some(Behavior::Down) | None => Some(ScanOutcome::down()),
                Some(Behavior::Fail) => None,
                Some(Behavior::Hang) => {
                    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                    None
                }
                Some(Behavior::Panic) => panic!("scanner blew up"),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    fn task(ip: &str) -> ScanTask {
        ScanTask::new(
            Target::new(ip),
            ResolvedHost::new(ip.parse().unwrap()),
            Protocol::Tcp,
            None,
        )
    }

    #[tokio::test]
    async fn test_empty_dispatch_is_noop() {
        let scanner = Arc::new(ScriptedScanner::new(vec![]));
        let mut snapshots = 0;
        let outcome = Dispatcher::new(scanner)
            .dispatch_with_progress(Vec::new(), |_| snapshots += 1)
            .await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.dropped, 0);
        assert_eq!(snapshots, 0);
    }

    #[tokio::test]
    async fn test_failed_tasks_are_dropped() {
        let scanner = Arc::new(ScriptedScanner::new(vec![
            ("10.0.0.1", Behavior::Up(Duration::from_millis(5))),
            ("10.0.0.2", Behavior::Fail),
            ("10.0.0.3", Behavior::Down),
        ]));
        let tasks = vec![task("10.0.0.1"), task("10.0.0.2"), task("10.0.0.3")];

        let outcome = Dispatcher::new(scanner).with_workers(2).dispatch(tasks).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.dropped, 1);
        let up: Vec<String> = outcome
            .results
            .iter()
            .filter(|r| r.outcome.host_up)
            .map(|r| r.task.host.to_string())
            .collect();
        assert_eq!(up, vec!["10.0.0.1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let behavior = (1..=12)
            .map(|i| (format!("10.0.1.{}", i), i))
            .collect::<Vec<_>>();
        let scanner = Arc::new(ScriptedScanner::new(
            behavior
                .iter()
                .map(|(ip, i)| (ip.as_str(), Behavior::Up(Duration::from_secs(*i))))
                .collect(),
        ));
        let tasks = behavior.iter().map(|(ip, _)| task(ip)).collect();

        let dispatcher = Dispatcher::new(Arc::clone(&scanner) as Arc<dyn Scanner>).with_workers(3);
        let outcome = dispatcher.dispatch(tasks).await;

        assert_eq!(outcome.results.len(), 12);
        assert!(scanner.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(scanner.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let ips: Vec<String> = (1..=6).map(|i| format!("10.0.2.{}", i)).collect();
        let scanner = Arc::new(ScriptedScanner::new(
            ips.iter()
                .enumerate()
                .map(|(i, ip)| (ip.as_str(), Behavior::Up(Duration::from_secs(5 * (i as u64 + 1)))))
                .collect(),
        ));
        let tasks = ips.iter().map(|ip| task(ip)).collect();

        let mut snapshots = Vec::new();
        let outcome = Dispatcher::new(scanner)
            .with_workers(2)
            .with_progress_interval(Duration::from_secs(2))
            .dispatch_with_progress(tasks, |p| snapshots.push(*p))
            .await;

        assert_eq!(outcome.results.len(), 6);
        assert!(snapshots.len() > 2);

        let percentages: Vec<f64> = snapshots.iter().map(Progress::percentage).collect();
        for pair in percentages.windows(2) {
            assert!(pair[0] <= pair[1], "progress regressed: {:?}", percentages);
        }

        let (last, rest) = snapshots.split_last().unwrap();
        assert!(last.finished);
        assert_eq!(last.percentage(), 100.0);
        assert!(rest.iter().all(|p| !p.finished && p.percentage() < 100.0));
        assert!(rest.windows(2).all(|w| w[0].elapsed <= w[1].elapsed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_reported_while_results_are_pending() {
        let ips: Vec<String> = (1..=8).map(|i| format!("10.0.5.{}", i)).collect();
        let scanner = Arc::new(ScriptedScanner::new(
            ips.iter()
                .map(|ip| (ip.as_str(), Behavior::Up(Duration::from_secs(2))))
                .collect(),
        ));
        let tasks = ips.iter().map(|ip| task(ip)).collect();

        let mut snapshots = Vec::new();
        let outcome = Dispatcher::new(scanner)
            .with_workers(8)
            .with_progress_interval(Duration::from_secs(2))
            .dispatch_with_progress(tasks, |p| snapshots.push(*p))
            .await;

        assert_eq!(outcome.results.len(), 8);
        let (last, rest) = snapshots.split_last().unwrap();
        assert!(last.finished);
        assert!(!rest.is_empty(), "tick due with results queued was skipped");
        assert!(rest.iter().all(|p| !p.finished && p.completed < p.total));
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_timeout_drops_hung_scan() {
        let scanner = Arc::new(ScriptedScanner::new(vec![
            ("10.0.3.1", Behavior::Hang),
            ("10.0.3.2", Behavior::Up(Duration::from_secs(1))),
        ]));
        let tasks = vec![task("10.0.3.1"), task("10.0.3.2")];

        let outcome = Dispatcher::new(scanner)
            .with_task_timeout(Some(Duration::from_secs(30)))
            .dispatch(tasks)
            .await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.dropped, 1);
        assert!(outcome.elapsed < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_panicking_worker_counts_as_dropped() {
        let scanner = Arc::new(ScriptedScanner::new(vec![
            ("10.0.4.1", Behavior::Panic),
            ("10.0.4.2", Behavior::Down),
            ("10.0.4.3", Behavior::Down),
        ]));
        let tasks = vec![task("10.0.4.1"), task("10.0.4.2"), task("10.0.4.3")];

        let outcome = Dispatcher::new(scanner).dispatch(tasks).await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }
}
