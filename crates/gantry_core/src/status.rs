//! Status reported to callers polling an apply.

use serde::Serialize;

use crate::session::ApplyOutcome;

/// Answer to a status query, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ApplyStatus {
    /// An apply is executing.
    Running,
    /// No apply has run yet.
    Pending,
    /// The last apply succeeded but live infrastructure no longer matches.
    DriftDetected { diff: String },
    /// The last apply cycle finished.
    Completed { outcome: ApplyOutcome },
    /// The drift probe itself failed.
    Error { message: String },
}

impl ApplyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApplyStatus::Running => "running",
            ApplyStatus::Pending => "pending",
            ApplyStatus::DriftDetected { .. } => "drift-detected",
            ApplyStatus::Completed { .. } => "completed",
            ApplyStatus::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_payloads() {
        let running = serde_json::to_value(ApplyStatus::Running).unwrap();
        assert_eq!(running, serde_json::json!({"status": "running"}));

        let drift = serde_json::to_value(ApplyStatus::DriftDetected {
            diff: "~ update in-place".to_string(),
        })
        .unwrap();
        assert_eq!(drift["status"], "drift-detected");
        assert_eq!(drift["diff"], "~ update in-place");

        let completed = serde_json::to_value(ApplyStatus::Completed {
            outcome: ApplyOutcome::NotYetRun,
        })
        .unwrap();
        assert_eq!(completed["outcome"]["state"], "not-yet-run");
    }
}
