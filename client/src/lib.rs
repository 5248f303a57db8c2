//! Client for a content-scanning upload gateway: upload files, read the
//! verdict, browse the scan log.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod render;
pub mod selection;
pub mod shell;
pub mod upload;
pub mod view;

pub use api::{Gateway, HttpGateway};
pub use config::{ClientConfig, ProgressConfig};
pub use dashboard::{Dashboard, DashboardStatsLoader, LogQueryManager};
pub use error::{ClientError, Result};
pub use upload::{UploadController, UploadState};
