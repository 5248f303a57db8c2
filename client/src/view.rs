//! Mounts display structures onto the terminal.

use std::fmt::Write as _;

use common::{
    badge::{Badge, Tone},
    data::Statistics,
};
use kdam::term::Colorizer;

use crate::{
    render::{
        result::{ErrorPanel, ScanPanel},
        LogTable, PageControl, ResultPanel,
    },
    selection::SelectedFile,
};

fn tone_code(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Success => Some("green"),
        Tone::Warning => Some("yellow"),
        Tone::Danger => Some("red"),
        Tone::Info => Some("cyan"),
        Tone::Secondary => Some("white"),
        Tone::Plain => None,
    }
}

pub fn paint(text: &str, tone: Tone) -> String {
    match tone_code(tone) {
        Some(code) => text.colorize(code),
        None => text.to_string(),
    }
}

pub fn badge(badge: &Badge) -> String {
    paint(&format!("[{}]", badge.label), badge.tone)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Cuts `s` to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn selected_file(file: &SelectedFile) -> String {
    format!("Selected {} ({})", file.name, file.display_size())
}

fn scan_panel(out: &mut String, panel: &ScanPanel) {
    let _ = writeln!(out, "  File ID:        {}", panel.file_id);
    let _ = writeln!(out, "  File Name:      {}", panel.file_name);
    let _ = writeln!(out, "  Risk Score:     {}", badge(&panel.risk_score));
    let _ = writeln!(out, "  Sensitive Data: {}", yes_no(panel.sensitive_data_found));
    let _ = writeln!(out, "  Action:         {}", badge(&panel.policy_action));
    if let Some(storage) = &panel.storage_location {
        let _ = writeln!(out, "  Storage:        {storage}");
    }
    if let Some(reason) = &panel.reason {
        let _ = writeln!(out, "  Reason:         {reason}");
    }
}

fn error_panel(out: &mut String, panel: &ErrorPanel) {
    let _ = writeln!(out, "  {} (HTTP {})", panel.message, panel.status_code);
}

pub fn result_panel(panel: &ResultPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", paint(panel.title(), panel.tone()));
    match panel {
        ResultPanel::Allowed(scan) => {
            scan_panel(&mut out, scan);
            if !scan.detected_types.is_empty() {
                let types: Vec<String> = scan.detected_types.iter().map(badge).collect();
                let _ = writeln!(out, "  Detected Types: {}", types.join(" "));
            }
        }
        ResultPanel::Blocked(scan) => {
            scan_panel(&mut out, scan);
            if !scan.detected_types.is_empty() {
                let types: Vec<String> = scan.detected_types.iter().map(badge).collect();
                let _ = writeln!(out, "  Detected Sensitive Data: {}", types.join(" "));
            }
            if let Some(notice) = scan.notice {
                let _ = writeln!(out, "  {}", paint(notice, Tone::Warning));
            }
        }
        ResultPanel::Error(error) => error_panel(&mut out, error),
    }
    out
}

pub fn notice(message: &str) -> String {
    paint(message, Tone::Danger)
}

pub fn statistics(stats: Option<&Statistics>) -> String {
    let field = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    format!(
        "Total: {}  Allowed: {}  Blocked: {}  Quarantined: {}",
        field(stats.map(|s| s.total_uploads)),
        paint(&field(stats.map(|s| s.allowed_uploads)), Tone::Success),
        paint(&field(stats.map(|s| s.blocked_uploads)), Tone::Danger),
        paint(&field(stats.map(|s| s.quarantined_uploads)), Tone::Warning),
    )
}

pub fn log_table(table: &LogTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<19}  {:<30}  {:>10}  {:<16}  {:<13}  {:<5}  {:<9}  {:<12}",
        "Timestamp", "File", "Size", "User", "Status", "Risk", "Sensitive", "Action"
    );
    let _ = writeln!(out, "{}", "-".repeat(128));
    if let Some(placeholder) = table.placeholder() {
        let tone = match table {
            LogTable::Failed => Tone::Danger,
            _ => Tone::Secondary,
        };
        let _ = writeln!(out, "{}", paint(placeholder, tone));
        return out;
    }
    let LogTable::Rows(rows) = table else {
        return out;
    };
    for row in rows {
        // Pad before painting; escape codes would throw the widths off.
        let _ = write!(
            out,
            "{:<19}  {:<30}  {:>10}  {:<16}  {}  {}  {}  {}",
            row.timestamp,
            truncate(&row.file_name, 30),
            row.file_size,
            truncate(&row.user_id, 16),
            paint(&format!("{:<13}", row.status.label), row.status.tone),
            paint(&format!("{:<5}", row.risk.label), row.risk.tone),
            paint(&format!("{:<9}", row.sensitive.label), row.sensitive.tone),
            paint(&row.action.label, row.action.tone),
        );
        if !row.sensitive_types.is_empty() {
            let _ = write!(out, "  ({})", row.sensitive_types);
        }
        out.push('\n');
    }
    out
}

const PREVIOUS: &str = "« prev";
const NEXT: &str = "next »";

/// Page numbers are shown one-based. Previous and next stay in the row when
/// they lead nowhere, dimmed.
pub fn page_controls(controls: &[PageControl]) -> String {
    let parts: Vec<String> = controls
        .iter()
        .map(|control| match control {
            PageControl::Previous { target: Some(_) } => PREVIOUS.to_string(),
            PageControl::Previous { target: None } => paint(PREVIOUS, Tone::Secondary),
            PageControl::Next { target: Some(_) } => NEXT.to_string(),
            PageControl::Next { target: None } => paint(NEXT, Tone::Secondary),
            PageControl::Page { index, active: true } => format!("[{}]", index + 1),
            PageControl::Page { index, active: false } => (index + 1).to_string(),
            PageControl::Ellipsis => "...".to_string(),
        })
        .collect();
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate("short.txt", 30), "short.txt");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn controls_are_one_based() {
        let controls = [
            PageControl::Previous { target: None },
            PageControl::Page { index: 0, active: true },
            PageControl::Page { index: 1, active: false },
            PageControl::Ellipsis,
            PageControl::Page { index: 9, active: false },
            PageControl::Next { target: Some(1) },
        ];
        assert_eq!(
            page_controls(&controls),
            format!("{} [1] 2 ... 10 next »", paint("« prev", Tone::Secondary))
        );
    }

    #[test]
    fn disabled_controls_keep_their_place() {
        let controls = [
            PageControl::Previous { target: Some(0) },
            PageControl::Page { index: 0, active: false },
            PageControl::Page { index: 1, active: true },
            PageControl::Next { target: None },
        ];
        assert_eq!(
            page_controls(&controls),
            format!("« prev 1 [2] {}", paint("next »", Tone::Secondary))
        );
    }

    #[test]
    fn plain_tone_is_not_painted() {
        assert_eq!(paint("ARCHIVED", Tone::Plain), "ARCHIVED");
    }
}
