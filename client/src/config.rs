use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Timings of the upload progress indicator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Interval between two simulated advances.
    pub tick: Duration,
    /// Percentage added on every simulated tick.
    pub step: u8,
    /// The indicator never passes this before the response arrives.
    pub ceiling: u8,
    /// How long a completed upload stays at 100% before the result is shown.
    pub hold: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            step: 10,
            ceiling: 90,
            hold: Duration::from_millis(500),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub page_size: u32,
    /// Stream the multipart body so the indicator follows real byte counts.
    pub streamed_upload: bool,
    pub progress: ProgressConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            streamed_upload: true,
            progress: ProgressConfig::default(),
        }
    }
}
