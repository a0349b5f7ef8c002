//! Plain-text rendering of call results for the terminal.

use serde_json::Value;

use crate::model::{Trace, User};

const RULE: &str = "------------------------------------------------------------";

/// Three sections: what was sent, how it travelled, what came back.
pub fn render_trace(trace: Option<&Trace>) -> String {
    let Some(trace) = trace else {
        return "No trace yet.\n".to_string();
    };

    let mut lines = vec![section("SENT"), pretty(&trace.request_wire)];

    lines.push(section("PROCESSED"));
    lines.push(format!("Transport: {}", trace.transport));
    lines.push(format!("Endpoint:  {}", trace.endpoint));
    if let Some(meta) = &trace.meta {
        lines.push(format!("Meta:      {meta}"));
    }
    if let Some(status) = trace.status {
        lines.push(format!("Status:    {status}"));
    }
    if let Some(ms) = trace.ms {
        lines.push(format!("Duration:  {} ms", ms.round()));
    }

    lines.push(section("RECEIVED"));
    lines.push(pretty(&trace.response_wire));
    terminate(lines)
}

pub fn render_users(users: &[User]) -> String {
    if users.is_empty() {
        return "(no users)\n".to_string();
    }
    terminate(
        users
            .iter()
            .map(|user| format!("#{:<4} {:<24} {}", user.id, user.name, user.email))
            .collect(),
    )
}

fn section(title: &str) -> String {
    format!("{RULE}\n{title}\n{RULE}")
}

/// Joins lines, each ending in a newline.
fn terminate(lines: Vec<String>) -> String {
    lines.into_iter().fold(String::new(), |mut out, line| {
        out.push_str(&line);
        out.push('\n');
        out
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
