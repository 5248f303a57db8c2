use common::{
    badge::{action_badge, risk_badge, status_badge, Badge, Tone},
    data::LogEntry,
    format_file_size,
};

pub const NO_LOGS: &str = "No logs found";
pub const LOAD_FAILED: &str = "Error loading logs";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRow {
    pub timestamp: String,
    pub file_name: String,
    pub file_size: String,
    pub user_id: String,
    pub status: Badge,
    pub risk: Badge,
    pub sensitive: Badge,
    /// Comma separated, empty when nothing was found.
    pub sensitive_types: String,
    pub action: Badge,
}

/// What the log table currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LogTable {
    #[default]
    NotLoaded,
    Rows(Vec<LogRow>),
    Empty,
    Failed,
}

impl LogTable {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        if entries.is_empty() {
            Self::Empty
        } else {
            Self::Rows(entries.iter().map(log_row).collect())
        }
    }

    /// Single-row text shown instead of rows.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Empty => Some(NO_LOGS),
            Self::Failed => Some(LOAD_FAILED),
            Self::NotLoaded | Self::Rows(_) => None,
        }
    }
}

pub fn log_row(entry: &LogEntry) -> LogRow {
    let found = entry.sensitive_data_found.unwrap_or(false);
    LogRow {
        timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        file_name: entry.file_name.clone(),
        file_size: format_file_size(entry.file_size),
        user_id: entry.user_id.clone(),
        status: status_badge(&entry.status),
        risk: risk_badge(entry.risk_score),
        sensitive: if found {
            Badge::new(Tone::Danger, "Yes")
        } else {
            Badge::new(Tone::Success, "No")
        },
        sensitive_types: if found {
            entry.sensitive_types().join(", ")
        } else {
            String::new()
        },
        action: action_badge(&entry.policy_action),
    }
}
