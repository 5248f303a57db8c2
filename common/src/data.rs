use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Verdict of a single upload as reported by the scanning backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    /// The file passed the policy checks and was stored.
    Allowed,
    /// The file was rejected by policy.
    Blocked,
    /// The backend failed to process the file.
    Error,
    /// Anything the client does not recognise. Rendered like an error.
    #[serde(untagged)]
    Other(serde_json::Value),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyAction {
    Upload,
    Block,
    Quarantine,
    Alert,
    #[serde(untagged)]
    Other(String),
}

impl PolicyAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Upload => "UPLOAD",
            Self::Block => "BLOCK",
            Self::Quarantine => "QUARANTINE",
            Self::Alert => "ALERT",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a historical scan record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    Allowed,
    Blocked,
    /// The file is held rather than stored or rejected.
    Quarantined,
    Error,
    #[serde(untagged)]
    Other(String),
}

impl LogStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::Blocked => "BLOCKED",
            Self::Quarantined => "QUARANTINED",
            Self::Error => "ERROR",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStatus {
    type Err = String;

    /// Only the four known statuses are accepted; the backend rejects anything else.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOWED" => Ok(Self::Allowed),
            "BLOCKED" => Ok(Self::Blocked),
            "QUARANTINED" => Ok(Self::Quarantined),
            "ERROR" => Ok(Self::Error),
            _ => Err(format!(
                "unknown status {s:?} (expected ALLOWED, BLOCKED, QUARANTINED or ERROR)"
            )),
        }
    }
}

/// Response body of `POST /upload`.
///
/// Every field is nullable on the wire: error responses only carry a
/// file name, a reason and a message.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub status: Option<OutcomeStatus>,
    pub file_id: Option<String>,
    pub file_name: Option<String>,
    pub risk_score: Option<u32>,
    pub sensitive_data_found: Option<bool>,
    pub sensitive_types: Option<Vec<String>>,
    pub policy_action: Option<PolicyAction>,
    /// Only present when the upload was allowed.
    pub storage_location: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<String>,
}

impl UploadOutcome {
    pub fn sensitive_types(&self) -> &[String] {
        self.sensitive_types.as_deref().unwrap_or_default()
    }

    pub fn sensitive_data_found(&self) -> bool {
        self.sensitive_data_found.unwrap_or(false)
    }
}

/// One row of the audit log.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub file_name: String,
    pub file_size: u64,
    pub user_id: String,
    pub status: LogStatus,
    pub risk_score: u32,
    #[serde(default)]
    pub sensitive_data_found: Option<bool>,
    #[serde(default)]
    pub sensitive_types: Option<Vec<String>>,
    pub policy_action: PolicyAction,
}

impl LogEntry {
    pub fn sensitive_types(&self) -> &[String] {
        self.sensitive_types.as_deref().unwrap_or_default()
    }
}

/// A page of log entries, as returned by the paged log endpoints.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub content: Vec<LogEntry>,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub number: Option<u32>,
}

impl PageResult {
    /// Wraps an unpaged list into a single page.
    pub fn single(content: Vec<LogEntry>) -> Self {
        Self {
            total_elements: Some(content.len() as u64),
            content,
            total_pages: 1,
            first: true,
            last: true,
            number: Some(0),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_uploads: u64,
    pub allowed_uploads: u64,
    pub blocked_uploads: u64,
    pub quarantined_uploads: u64,
}

/// Active dashboard filter. Replaced wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub status: Option<LogStatus>,
    pub user_id: Option<String>,
    pub risk_threshold: Option<u32>,
}

impl FilterCriteria {
    /// Blank user ids count as "no user filter".
    pub fn new(status: Option<LogStatus>, user_id: Option<String>, risk_threshold: Option<u32>) -> Self {
        let user_id = user_id
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Self {
            status,
            user_id,
            risk_threshold,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.user_id.is_none() && self.risk_threshold.is_none()
    }

    /// Filters that are set but will not reach the backend, because only one
    /// dimension can be queried at a time (status, then user, then risk).
    pub fn shadowed(&self) -> Vec<&'static str> {
        let mut shadowed = Vec::new();
        if self.status.is_some() && self.user_id.is_some() {
            shadowed.push("user");
        }
        if (self.status.is_some() || self.user_id.is_some()) && self.risk_threshold.is_some() {
            shadowed.push("risk");
        }
        shadowed
    }
}
