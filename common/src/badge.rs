//! Display classification for statuses, risk scores and policy actions.

use crate::data::{LogStatus, PolicyAction};

/// Risk scores at or above this are dangerous.
pub const HIGH_RISK: u32 = 70;
/// Risk scores at or above this (and below [`HIGH_RISK`]) deserve a warning.
pub const MEDIUM_RISK: u32 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
    Secondary,
    /// No styling, used for values the client does not recognise.
    Plain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Badge {
    pub tone: Tone,
    pub label: String,
}

impl Badge {
    pub fn new(tone: Tone, label: impl Into<String>) -> Self {
        Self {
            tone,
            label: label.into(),
        }
    }
}

pub fn risk_tone(score: u32) -> Tone {
    if score >= HIGH_RISK {
        Tone::Danger
    } else if score >= MEDIUM_RISK {
        Tone::Warning
    } else {
        Tone::Success
    }
}

pub fn risk_badge(score: u32) -> Badge {
    Badge::new(risk_tone(score), score.to_string())
}

pub fn status_badge(status: &LogStatus) -> Badge {
    match status {
        LogStatus::Allowed => Badge::new(Tone::Success, "Allowed"),
        LogStatus::Blocked => Badge::new(Tone::Danger, "Blocked"),
        LogStatus::Quarantined => Badge::new(Tone::Warning, "Quarantined"),
        LogStatus::Error => Badge::new(Tone::Secondary, "Error"),
        LogStatus::Other(s) => Badge::new(Tone::Plain, s.as_str()),
    }
}

pub fn action_badge(action: &PolicyAction) -> Badge {
    match action {
        PolicyAction::Upload => Badge::new(Tone::Success, "Upload"),
        PolicyAction::Block => Badge::new(Tone::Danger, "Block"),
        PolicyAction::Quarantine => Badge::new(Tone::Warning, "Quarantine"),
        PolicyAction::Alert => Badge::new(Tone::Info, "Alert"),
        PolicyAction::Other(s) => Badge::new(Tone::Plain, s.as_str()),
    }
}
