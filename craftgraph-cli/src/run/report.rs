//! Plain-text rendering of reports and thread status for the terminal.

use std::fmt::Write;

use craftgraph::{ReportStatus, RunReport, StatusView};

pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    let status = match report.status {
        ReportStatus::Started => "started",
        ReportStatus::WaitingForInput => "waiting for input",
        ReportStatus::PhaseComplete => "complete",
        ReportStatus::Error => "error",
    };
    let _ = writeln!(
        out,
        "thread {}: {} (phase {}, node {})",
        report.thread_id, status, report.phase, report.node
    );
    for question in &report.questions {
        let _ = writeln!(out, "  ? {}", question);
    }
    if let Some(message) = &report.message {
        let _ = writeln!(out, "  ! {}", message);
    }
    out
}

pub fn render_status(view: &StatusView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "thread {}: phase {}, node {}{}",
        view.thread_id,
        view.phase,
        if view.node.is_empty() { "-" } else { view.node.as_str() },
        if view.running { " (running)" } else { "" }
    );
    if view.needs_user_input {
        for question in &view.user_questions {
            let _ = writeln!(out, "  ? {}", question);
        }
    }
    if let Some(option) = &view.selected_option {
        let _ = writeln!(out, "  selected: {} ({})", option.title, option.id);
    }
    for error in &view.errors {
        let _ = writeln!(
            out,
            "  {} [{}] {}: {}",
            if error.recoverable { "warn" } else { "error" },
            error.node,
            error.kind,
            error.message
        );
    }
    out
}
