//! Session summaries
//!
//! Human-readable and JSON-lines renderings of where a debugging session stands.

use super::session::{DebugSession, StepStatus};

/// Format the session for the terminal
pub fn format_session_summary(session: &DebugSession) -> String {
    let mut output = String::new();
    output.push_str("\n═══════════════════════════════════════════════════════════════════\n");
    output.push_str(&format!("  CHAIN: {}\n", session.chain().name));
    output.push_str("═══════════════════════════════════════════════════════════════════\n\n");

    for (i, step) in session.steps().iter().enumerate() {
        let status = session.status(i).unwrap_or(StepStatus::Pending);
        let icon = match status {
            StepStatus::Succeeded => "✓",
            StepStatus::Failed => "✗",
            StepStatus::Cancelled => "⊘",
            StepStatus::Running => "…",
            StepStatus::Pending => "·",
        };
        let marker = if i == session.cursor() && !session.is_exhausted() { "▶" } else { " " };

        output.push_str(&format!(
            " {} {} Step {}: {} [{}] ({})\n",
            marker, icon, i + 1, step.display_name(), step.id, status.as_str()
        ));

        if let Some(message) = session.message(i) {
            output.push_str(&format!("      Error: {}\n", message));
        }
    }

    if !session.context().is_empty() {
        output.push_str("\n  Context:\n");
        for (key, value) in session.context().iter() {
            output.push_str(&format!("    {} = {}\n", key, value));
        }
    }

    let total = session.steps().len();
    let succeeded = count(session, StepStatus::Succeeded);
    let failed = count(session, StepStatus::Failed) + count(session, StepStatus::Cancelled);

    output.push_str("\n───────────────────────────────────────────────────────────────────\n");
    output.push_str(&format!(
        "  Total: {} | Succeeded: {} | Failed: {} | Remaining: {}\n",
        total, succeeded, failed, total - session.cursor().min(total)
    ));
    output.push_str("═══════════════════════════════════════════════════════════════════\n");

    output
}

/// Format the session as JSON lines (one line per step plus a summary line)
pub fn format_session_summary_json(session: &DebugSession) -> String {
    let mut output = String::new();

    for (i, step) in session.steps().iter().enumerate() {
        let status = session.status(i).unwrap_or(StepStatus::Pending);
        let json = serde_json::json!({
            "level": if status == StepStatus::Failed || status == StepStatus::Cancelled { "error" } else { "info" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": "step_status",
            "index": i,
            "step_id": step.id,
            "step_name": step.display_name(),
            "status": status.as_str(),
            "error": session.message(i),
        });
        output.push_str(&serde_json::to_string(&json).unwrap_or_default());
        output.push('\n');
    }

    let failed = count(session, StepStatus::Failed) + count(session, StepStatus::Cancelled);
    let summary = serde_json::json!({
        "level": "info",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "event": "session_summary",
        "chain": session.chain().name,
        "total": session.steps().len(),
        "cursor": session.cursor(),
        "exhausted": session.is_exhausted(),
        "failed": failed,
        "context": session.context(),
    });
    output.push_str(&serde_json::to_string(&summary).unwrap_or_default());
    output.push('\n');

    output
}

fn count(session: &DebugSession, status: StepStatus) -> usize {
    session.statuses().iter().filter(|s| **s == status).count()
}
