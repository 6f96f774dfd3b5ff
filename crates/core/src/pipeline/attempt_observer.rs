use std::sync::Mutex;

use crate::liveness::domain::motion_score::LivenessResult;
use crate::recognition::domain::audit::AuditStatus;
use crate::recognition::domain::outcome::{RecognitionOutcome, RegistrationOutcome};

/// Subscription interface for check-in events.
///
/// Use cases report what happened; consumers (dashboards, caches that
/// need to refetch, the CLI) decide what to do with it. Passed in
/// explicitly rather than broadcast globally.
pub trait AttemptObserver: Send + Sync {
    fn liveness_evaluated(&self, result: &LivenessResult);

    /// `status` is the audit status written for the attempt, or `None`
    /// when no audit record was attempted.
    fn attempt_recorded(&self, outcome: &RecognitionOutcome, status: Option<AuditStatus>);

    fn registration_completed(&self, user_id: &str, outcome: &RegistrationOutcome);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Observer that discards all events.
pub struct NullAttemptObserver;

impl AttemptObserver for NullAttemptObserver {
    fn liveness_evaluated(&self, _result: &LivenessResult) {}
    fn attempt_recorded(&self, _outcome: &RecognitionOutcome, _status: Option<AuditStatus>) {}
    fn registration_completed(&self, _user_id: &str, _outcome: &RegistrationOutcome) {}
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttemptCounts {
    pub liveness_passed: usize,
    pub liveness_failed: usize,
    pub approved: usize,
    pub rejected: usize,
    pub unaudited: usize,
    pub registrations: usize,
    pub failed_registrations: usize,
}

/// Logs every event through `log` and keeps running totals.
#[derive(Default)]
pub struct LoggingAttemptObserver {
    counts: Mutex<AttemptCounts>,
}

impl LoggingAttemptObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> AttemptCounts {
        self.counts
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Returns the formatted summary, or `None` if nothing happened.
    pub fn summary_string(&self) -> Option<String> {
        let c = self.counts();
        if c == AttemptCounts::default() {
            return None;
        }
        let attempts = c.approved + c.rejected + c.unaudited;
        Some(format!(
            "Session summary:\n  liveness: {} passed, {} failed\n  recognition: {attempts} attempts, {} approved, {} rejected, {} not audited\n  registration: {} ok, {} failed",
            c.liveness_passed,
            c.liveness_failed,
            c.approved,
            c.rejected,
            c.unaudited,
            c.registrations,
            c.failed_registrations
        ))
    }

    fn update(&self, f: impl FnOnce(&mut AttemptCounts)) {
        if let Ok(mut counts) = self.counts.lock() {
            f(&mut counts);
        }
    }
}

impl AttemptObserver for LoggingAttemptObserver {
    fn liveness_evaluated(&self, result: &LivenessResult) {
        log::info!(
            "Liveness {} (score {:.2})",
            if result.passed { "passed" } else { "failed" },
            result.score
        );
        self.update(|c| {
            if result.passed {
                c.liveness_passed += 1;
            } else {
                c.liveness_failed += 1;
            }
        });
    }

    fn attempt_recorded(&self, outcome: &RecognitionOutcome, status: Option<AuditStatus>) {
        match (&outcome.user_id, &outcome.error) {
            (Some(user), _) => log::info!(
                "Recognized {user} ({:.1}%), audit {}",
                outcome.confidence.unwrap_or_default(),
                outcome.audit_id.as_deref().unwrap_or("not written")
            ),
            (None, Some(error)) => log::info!("Recognition rejected: {error}"),
            (None, None) => log::info!("Recognition finished without a result"),
        }
        self.update(|c| match status {
            Some(AuditStatus::Approved) => c.approved += 1,
            Some(AuditStatus::Rejected) | Some(AuditStatus::Pending) => c.rejected += 1,
            None => c.unaudited += 1,
        });
    }

    fn registration_completed(&self, user_id: &str, outcome: &RegistrationOutcome) {
        match &outcome.error {
            None => log::info!("Registered face for {user_id}"),
            Some(error) => log::info!("Registration for {user_id} failed: {error}"),
        }
        self.update(|c| {
            if outcome.success {
                c.registrations += 1;
            } else {
                c.failed_registrations += 1;
            }
        });
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
