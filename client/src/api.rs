//! Backend seam: the [`Gateway`] trait and its reqwest implementation.

use std::{io, sync::Arc, time::Duration};

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use common::{
    data::{LogEntry, PageResult, Statistics, UploadOutcome},
    payloads::{LogQuery, UPLOAD_FILE_FIELD, UPLOAD_USER_FIELD},
};
use futures_util::Stream;
use reqwest::{
    multipart::{Form, Part},
    Body, Client,
};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
};

/// Bytes of the upload body handed to the transport so far.
pub type ByteProgress = Arc<watch::Sender<u64>>;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub file_name: String,
    pub content: Bytes,
    /// Already trimmed; `None` when the user left it blank.
    pub user_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UploadResponse {
    pub status_code: u16,
    pub outcome: UploadOutcome,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Whether [`Gateway::upload`] publishes byte counts through its progress sender.
    /// When it does not, callers fall back to a simulated indicator.
    fn reports_progress(&self) -> bool {
        false
    }

    async fn upload(&self, request: UploadRequest, progress: ByteProgress) -> Result<UploadResponse>;

    async fn statistics(&self) -> Result<Statistics>;

    async fn logs(&self, query: &LogQuery) -> Result<PageResult>;

    async fn health(&self) -> Result<String>;
}

#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    streamed: bool,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        let client = Client::builder()
            .user_agent(concat!("scangate/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .build()?;
        Ok(Self {
            client,
            base_url,
            streamed: config.streamed_upload,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut target = self.base_url.clone();
        target
            .path_segments_mut()
            .map_err(|_| ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(target)
    }

    /// Checks the status code and decodes the JSON body.
    async fn process_response<Resp: DeserializeOwned>(res: reqwest::Response) -> Result<Resp> {
        let status = res.status();
        if !status.is_success() {
            return Err(ClientError::BadStatusCode {
                code: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }
        let text = res.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<Resp: DeserializeOwned>(&self, url: Url) -> Result<Resp> {
        debug!(%url, "GET");
        let res = self.client.get(url).send().await?;
        Self::process_response(res).await
    }
}

/// Splits the body into chunks and reports every chunk once the transport
/// has taken it.
fn chunked(content: Bytes, progress: ByteProgress) -> impl Stream<Item = io::Result<Bytes>> {
    stream! {
        let mut offset = 0;
        while offset < content.len() {
            let end = (offset + CHUNK_SIZE).min(content.len());
            yield Ok(content.slice(offset..end));
            offset = end;
            progress.send_replace(offset as u64);
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    fn reports_progress(&self) -> bool {
        self.streamed
    }

    async fn upload(&self, request: UploadRequest, progress: ByteProgress) -> Result<UploadResponse> {
        let url = self.endpoint(["upload"])?;
        let length = request.content.len() as u64;
        let part = if self.streamed {
            Part::stream_with_length(Body::wrap_stream(chunked(request.content, progress)), length)
        } else {
            Part::stream_with_length(request.content, length)
        };
        let mut form = Form::new().part(UPLOAD_FILE_FIELD, part.file_name(request.file_name.clone()));
        if let Some(user_id) = request.user_id {
            form = form.text(UPLOAD_USER_FIELD, user_id);
        }

        info!(file = %request.file_name, bytes = length, %url, "uploading");
        let res = self.client.post(url).multipart(form).send().await?;
        // Blocked and failed scans come back as 403/4xx/5xx with a regular body.
        let status_code = res.status().as_u16();
        let text = res.text().await?;
        let outcome: UploadOutcome = serde_json::from_str(&text)?;
        debug!(status_code, status = ?outcome.status, "upload answered");
        Ok(UploadResponse {
            status_code,
            outcome,
        })
    }

    async fn statistics(&self) -> Result<Statistics> {
        self.get(self.endpoint(["logs", "statistics"])?).await
    }

    async fn logs(&self, query: &LogQuery) -> Result<PageResult> {
        let mut url = self.endpoint(query.path_segments())?;
        let pairs = query.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        if query.is_paged() {
            self.get(url).await
        } else {
            let entries: Vec<LogEntry> = self.get(url).await?;
            Ok(PageResult::single(entries))
        }
    }

    async fn health(&self) -> Result<String> {
        let url = self.endpoint(["health"])?;
        debug!(%url, "GET");
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ClientError::BadStatusCode {
                code: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
