use chrono::NaiveDateTime;

use crate::data::{FilterCriteria, LogStatus};

/// Wire format of the `start`/`end` bounds of a date range listing.
pub const RANGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// Request payloads

/// Multipart field carrying the file body.
pub const UPLOAD_FILE_FIELD: &str = "file";
/// Optional multipart field carrying the uploader's identifier.
pub const UPLOAD_USER_FIELD: &str = "userId";

/// Shape of a log listing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogQuery {
    All { page: u32, size: u32 },
    ByStatus { status: LogStatus, page: u32, size: u32 },
    ByUser { user_id: String, page: u32, size: u32 },
    /// Logs stamped between `start` and `end`, newest first.
    DateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
        page: u32,
        size: u32,
    },
    /// Unpaged: every blocked upload.
    Blocked,
    /// Unpaged: every log at or above the threshold.
    HighRisk { threshold: u32 },
    /// Unpaged: the ten most recent logs.
    Recent,
}

impl LogQuery {
    /// Picks the single filter dimension sent to the backend.
    /// Status wins over user, user wins over risk threshold.
    pub fn select(filter: &FilterCriteria, page: u32, size: u32) -> Self {
        if let Some(status) = &filter.status {
            Self::ByStatus {
                status: status.clone(),
                page,
                size,
            }
        } else if let Some(user_id) = &filter.user_id {
            Self::ByUser {
                user_id: user_id.clone(),
                page,
                size,
            }
        } else if let Some(threshold) = filter.risk_threshold {
            Self::HighRisk { threshold }
        } else {
            Self::All { page, size }
        }
    }

    /// Path segments below the API base.
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = vec!["logs".to_string()];
        match self {
            Self::All { .. } => {}
            Self::ByStatus { status, .. } => {
                segments.push("status".to_string());
                segments.push(status.to_string());
            }
            Self::ByUser { user_id, .. } => {
                segments.push("user".to_string());
                segments.push(user_id.clone());
            }
            Self::DateRange { .. } => segments.push("daterange".to_string()),
            Self::Blocked => segments.push("blocked".to_string()),
            Self::HighRisk { .. } => segments.push("highrisk".to_string()),
            Self::Recent => segments.push("recent".to_string()),
        }
        segments
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::All { page, size }
            | Self::ByStatus { page, size, .. }
            | Self::ByUser { page, size, .. } => {
                vec![("page", page.to_string()), ("size", size.to_string())]
            }
            Self::DateRange { start, end, page, size } => vec![
                ("start", start.format(RANGE_TIMESTAMP_FORMAT).to_string()),
                ("end", end.format(RANGE_TIMESTAMP_FORMAT).to_string()),
                ("page", page.to_string()),
                ("size", size.to_string()),
            ],
            Self::HighRisk { threshold } => vec![("threshold", threshold.to_string())],
            Self::Blocked | Self::Recent => vec![],
        }
    }

    /// Whether the endpoint answers with a page object rather than a bare list.
    pub fn is_paged(&self) -> bool {
        !matches!(self, Self::HighRisk { .. } | Self::Blocked | Self::Recent)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::LogQuery;
    use crate::data::{FilterCriteria, LogStatus};

    #[test]
    fn status_filter_wins() {
        let filter = FilterCriteria::new(Some(LogStatus::Blocked), Some("bob".to_string()), Some(80));
        let query = LogQuery::select(&filter, 2, 10);
        assert_eq!(
            query,
            LogQuery::ByStatus {
                status: LogStatus::Blocked,
                page: 2,
                size: 10
            }
        );
        assert_eq!(query.path_segments(), ["logs", "status", "BLOCKED"]);
        assert_eq!(
            query.query_pairs(),
            [("page", "2".to_string()), ("size", "10".to_string())]
        );
    }

    #[test]
    fn user_then_risk_then_all() {
        let filter = FilterCriteria::new(None, Some("bob".to_string()), Some(80));
        assert!(matches!(LogQuery::select(&filter, 0, 10), LogQuery::ByUser { .. }));

        let filter = FilterCriteria::new(None, None, Some(80));
        let query = LogQuery::select(&filter, 4, 10);
        assert_eq!(query, LogQuery::HighRisk { threshold: 80 });
        assert!(!query.is_paged());
        assert_eq!(query.path_segments(), ["logs", "highrisk"]);
        assert_eq!(query.query_pairs(), [("threshold", "80".to_string())]);

        let query = LogQuery::select(&FilterCriteria::default(), 1, 25);
        assert_eq!(query, LogQuery::All { page: 1, size: 25 });
        assert_eq!(query.path_segments(), ["logs"]);
        assert!(query.is_paged());
    }

    #[test]
    fn date_range_sends_iso_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let query = LogQuery::DateRange {
            start: day.and_hms_opt(0, 0, 0).unwrap(),
            end: day.and_hms_opt(23, 59, 59).unwrap(),
            page: 1,
            size: 20,
        };
        assert!(query.is_paged());
        assert_eq!(query.path_segments(), ["logs", "daterange"]);
        assert_eq!(
            query.query_pairs(),
            [
                ("start", "2024-05-01T00:00:00".to_string()),
                ("end", "2024-05-01T23:59:59".to_string()),
                ("page", "1".to_string()),
                ("size", "20".to_string()),
            ]
        );

        assert!(!LogQuery::Blocked.is_paged());
        assert_eq!(LogQuery::Blocked.path_segments(), ["logs", "blocked"]);
        assert!(LogQuery::Blocked.query_pairs().is_empty());
    }
}
