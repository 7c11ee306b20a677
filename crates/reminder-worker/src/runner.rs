//! Tick loop around the reminder scheduler

use chrono::Utc;
use pactforge_common::Result;
use pactforge_workflow::{ReminderScheduler, TickReport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Consecutive failed ticks before the worker backs off
const MAX_FAILURES: u32 = 5;
const CIRCUIT_BREAK_DURATION: Duration = Duration::from_secs(300);

/// Counts consecutive failures; opens after `max` in a row
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreaker {
    consecutive_failures: u32,
    max: u32,
}

impl CircuitBreaker {
    pub fn new(max: u32) -> Self {
        Self {
            consecutive_failures: 0,
            max,
        }
    }

    pub fn record(&mut self, success: bool) {
        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
    }

    pub fn is_open(&self) -> bool {
        self.consecutive_failures >= self.max
    }

    pub fn failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}

pub struct TickRunner {
    scheduler: Arc<ReminderScheduler>,
    interval: Duration,
    breaker: CircuitBreaker,
}

impl TickRunner {
    pub fn new(scheduler: Arc<ReminderScheduler>, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
            breaker: CircuitBreaker::new(MAX_FAILURES),
        }
    }

    /// One scheduler pass with timing and a summary log line
    pub async fn run_once(&mut self) -> Result<TickReport> {
        let started = Instant::now();
        let result = self.scheduler.tick(Utc::now()).await;

        match &result {
            Ok(report) => {
                info!(
                    cadences_dispatched = report.cadences.iter().filter(|c| c.dispatched).count(),
                    templates_escalated = report.escalation.templates.successful,
                    contracts_escalated = report.escalation.contracts.successful,
                    failed = report.escalation.templates.failed + report.escalation.contracts.failed,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Reminder tick complete"
                );
                self.breaker.record(true);
            }
            Err(e) => {
                self.breaker.record(false);
                error!(error = %e, failures = self.breaker.failures(), "Reminder tick failed");
            }
        }
        result
    }

    /// Tick every interval until ctrl-c
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if self.breaker.is_open() {
                warn!(
                    failures = self.breaker.failures(),
                    "Circuit breaker open, pausing..."
                );
                tokio::time::sleep(CIRCUIT_BREAK_DURATION).await;
                self.breaker.reset();
                info!("Circuit breaker reset, resuming...");
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    // Errors are logged and counted inside
                    let _ = self.run_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactforge_common::auth::ConfigDirectory;
    use pactforge_common::mail::LogMailer;
    use pactforge_common::AppConfig;
    use pactforge_workflow::{Stores, Workflow};

    #[test]
    fn test_circuit_breaker() {
        let mut breaker = CircuitBreaker::new(2);
        breaker.record(false);
        assert!(!breaker.is_open());
        breaker.record(false);
        assert!(breaker.is_open());
        breaker.reset();
        assert!(!breaker.is_open());

        breaker.record(false);
        breaker.record(true);
        breaker.record(false);
        assert!(!breaker.is_open());
        assert_eq!(breaker.failures(), 1);
    }

    #[tokio::test]
    async fn test_run_once_on_empty_store() {
        let config = AppConfig::default();
        let workflow = Workflow::assemble(
            &config,
            Stores::memory(),
            Arc::new(LogMailer),
            Arc::new(ConfigDirectory::from_emails(["approver@example.com".to_string()])),
            None,
        );
        let mut runner = TickRunner::new(workflow.reminders, Duration::from_secs(3600));

        let report = runner.run_once().await.unwrap();
        assert_eq!(report.cadences.len(), 2);
        assert!(report.cadences.iter().all(|c| c.dispatched && c.pending == 0));
        assert_eq!(report.escalation.templates.total, 0);

        // Cadences were claimed by the first pass
        let again = runner.run_once().await.unwrap();
        assert!(again.cadences.iter().all(|c| !c.dispatched));
        assert_eq!(runner.breaker.failures(), 0);
    }

    #[tokio::test]
    async fn test_separate_runs_share_cadence_claims() {
        let config = AppConfig::default();
        let stores = Stores::memory();
        let workflow = |stores: Stores| {
            Workflow::assemble(
                &config,
                stores,
                Arc::new(LogMailer),
                Arc::new(ConfigDirectory::from_emails(["approver@example.com".to_string()])),
                None,
            )
        };

        // each one-shot invocation builds its own scheduler
        let first = TickRunner::new(workflow(stores.clone()).reminders, Duration::from_secs(3600))
            .run_once()
            .await
            .unwrap();
        let second = TickRunner::new(workflow(stores).reminders, Duration::from_secs(3600))
            .run_once()
            .await
            .unwrap();

        assert!(first.cadences.iter().all(|c| c.dispatched));
        assert!(second.cadences.iter().all(|c| !c.dispatched));
    }

    #[test]
    fn test_tick_records_one_batch_duration() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let workflow = Workflow::assemble(
            &AppConfig::default(),
            Stores::memory(),
            Arc::new(LogMailer),
            Arc::new(ConfigDirectory::from_emails(["approver@example.com".to_string()])),
            None,
        );
        let mut runner = TickRunner::new(workflow.reminders, Duration::from_secs(3600));
        metrics::with_local_recorder(&recorder, || runtime.block_on(runner.run_once())).unwrap();

        assert!(handle
            .render()
            .contains("pactforge_reminder_batch_duration_seconds_count 1"));
    }
}
