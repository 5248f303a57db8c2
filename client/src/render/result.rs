//! Upload outcome to result panel.

use common::{
    badge::{Badge, Tone},
    data::{OutcomeStatus, UploadOutcome},
};

pub const NOT_APPLICABLE: &str = "N/A";
pub const REMEDIATION_NOTICE: &str =
    "This file has been blocked due to policy violations. Please remove sensitive data and try again.";
pub const DEFAULT_ERROR: &str = "An error occurred during upload";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultPanel {
    Allowed(ScanPanel),
    Blocked(ScanPanel),
    Error(ErrorPanel),
}

/// Details of a scan that reached a verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanPanel {
    pub status_code: u16,
    pub file_id: String,
    pub file_name: String,
    pub risk_score: Badge,
    pub sensitive_data_found: bool,
    pub policy_action: Badge,
    /// Shown on allowed uploads only.
    pub storage_location: Option<String>,
    /// Shown on blocked uploads only.
    pub reason: Option<String>,
    pub detected_types: Vec<Badge>,
    pub notice: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorPanel {
    pub status_code: u16,
    pub message: String,
}

impl ResultPanel {
    pub fn tone(&self) -> Tone {
        match self {
            Self::Allowed(_) => Tone::Success,
            Self::Blocked(_) | Self::Error(_) => Tone::Danger,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Allowed(_) => "Upload Successful!",
            Self::Blocked(_) => "Upload Blocked!",
            Self::Error(_) => "Error",
        }
    }
}

fn or_na(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

fn scan_panel(outcome: &UploadOutcome, status_code: u16, tone: Tone) -> ScanPanel {
    ScanPanel {
        status_code,
        file_id: or_na(&outcome.file_id),
        file_name: or_na(&outcome.file_name),
        risk_score: Badge::new(tone, outcome.risk_score.unwrap_or(0).to_string()),
        sensitive_data_found: outcome.sensitive_data_found(),
        policy_action: Badge::new(
            tone,
            outcome
                .policy_action
                .as_ref()
                .map_or(NOT_APPLICABLE, |a| a.as_str()),
        ),
        storage_location: None,
        reason: None,
        detected_types: Vec::new(),
        notice: None,
    }
}

/// Maps an outcome to its panel. Anything that is neither allowed nor
/// blocked, including a missing status, becomes an error panel.
pub fn render_outcome(outcome: &UploadOutcome, status_code: u16) -> ResultPanel {
    match outcome.status {
        Some(OutcomeStatus::Allowed) => {
            let mut panel = scan_panel(outcome, status_code, Tone::Success);
            panel.storage_location = Some(or_na(&outcome.storage_location));
            panel.detected_types = outcome
                .sensitive_types()
                .iter()
                .map(|t| Badge::new(Tone::Warning, t.as_str()))
                .collect();
            ResultPanel::Allowed(panel)
        }
        Some(OutcomeStatus::Blocked) => {
            let mut panel = scan_panel(outcome, status_code, Tone::Danger);
            panel.reason = Some(or_na(&outcome.reason));
            panel.detected_types = outcome
                .sensitive_types()
                .iter()
                .map(|t| Badge::new(Tone::Danger, t.as_str()))
                .collect();
            panel.notice = Some(REMEDIATION_NOTICE);
            ResultPanel::Blocked(panel)
        }
        _ => ResultPanel::Error(ErrorPanel {
            status_code,
            message: outcome
                .reason
                .clone()
                .or_else(|| outcome.message.clone())
                .unwrap_or_else(|| DEFAULT_ERROR.to_string()),
        }),
    }
}
