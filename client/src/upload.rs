//! Upload lifecycle: `Idle -> Selected -> Uploading -> Completed | Failed`.
//!
//! The progress indicator follows real byte counts when the gateway can
//! report them. Otherwise a simulated indicator advances on a timer. The
//! simulated one is cosmetic only: it says nothing about how much of the
//! file has actually been sent.

use std::{path::Path, sync::Arc};

use common::data::UploadOutcome;
use tokio::{
    select, spawn,
    sync::watch,
    task::JoinHandle,
    time::{interval, sleep, MissedTickBehavior},
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{error, info, warn};

use crate::{
    api::{Gateway, UploadRequest},
    config::ProgressConfig,
    error::{ClientError, Result},
    render::{render_outcome, ResultPanel},
    selection::{FileSelectionManager, SelectedFile},
};

pub const UPLOAD_FAILED_NOTICE: &str = "Failed to upload file. Please try again.";

/// Real transfers stop short of 100 until the backend has answered.
const TRANSFER_CEILING: u8 = 99;

/// Percentage shown by the indicator; `None` while it is hidden.
pub type Progress = Option<u8>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Selected,
    Uploading,
    Completed,
    Failed,
}

/// A running indicator task. Dropping it cancels the task.
struct Indicator {
    handle: JoinHandle<()>,
    guard: DropGuard,
}

impl Indicator {
    fn start(
        progress: Arc<watch::Sender<Progress>>,
        bytes: Option<(watch::Receiver<u64>, u64)>,
        config: &ProgressConfig,
    ) -> Self {
        let token = CancellationToken::new();
        let handle = match bytes {
            Some((receiver, total)) => spawn(follow_transfer(progress, receiver, total, token.clone())),
            None => spawn(simulate(progress, config.clone(), token.clone())),
        };
        Self {
            handle,
            guard: token.drop_guard(),
        }
    }

    /// Cancels the task and waits for it, so it cannot write after we do.
    async fn stop(self) {
        let Self { handle, guard } = self;
        drop(guard);
        if let Err(e) = handle.await {
            warn!("progress indicator task failed: {e}");
        }
    }
}

async fn simulate(progress: Arc<watch::Sender<Progress>>, config: ProgressConfig, token: CancellationToken) {
    let mut timer = interval(config.tick);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    timer.tick().await;
    let mut value: u8 = 0;
    loop {
        select! {
            biased;
            _ = token.cancelled() => {
                return;
            }
            _ = timer.tick() => {
                value = value.saturating_add(config.step).min(config.ceiling);
                progress.send_replace(Some(value));
            }
        }
    }
}

async fn follow_transfer(
    progress: Arc<watch::Sender<Progress>>,
    mut bytes: watch::Receiver<u64>,
    total: u64,
    token: CancellationToken,
) {
    loop {
        select! {
            biased;
            _ = token.cancelled() => {
                return;
            }
            changed = bytes.changed() => {
                if changed.is_err() {
                    return;
                }
                let sent = *bytes.borrow_and_update();
                progress.send_replace(Some(transfer_percent(sent, total)));
            }
        }
    }
}

/// Held for the length of an upload. If the upload future is dropped before
/// it lands, the controller falls back to `Selected` with the indicator hidden.
struct InFlight {
    state: Arc<watch::Sender<UploadState>>,
    progress: Arc<watch::Sender<Progress>>,
    landed: bool,
}

impl InFlight {
    fn take_off(state: Arc<watch::Sender<UploadState>>, progress: Arc<watch::Sender<Progress>>) -> Self {
        state.send_replace(UploadState::Uploading);
        progress.send_replace(Some(0));
        Self {
            state,
            progress,
            landed: false,
        }
    }

    fn land(mut self, state: UploadState) {
        self.state.send_replace(state);
        self.landed = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.landed {
            warn!("upload abandoned before it finished");
            self.progress.send_replace(None);
            self.state.send_replace(UploadState::Selected);
        }
    }
}

fn transfer_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return TRANSFER_CEILING;
    }
    let percent = sent.min(total).saturating_mul(100) / total;
    (percent as u8).min(TRANSFER_CEILING)
}

/// Owns the selected file, the upload state and whatever the upload view shows.
#[derive(Debug)]
pub struct UploadController {
    selection: FileSelectionManager,
    state: Arc<watch::Sender<UploadState>>,
    result: Option<ResultPanel>,
    notice: Option<String>,
    progress: Arc<watch::Sender<Progress>>,
    config: ProgressConfig,
}

impl UploadController {
    pub fn new(config: ProgressConfig) -> Self {
        let (progress, _) = watch::channel(None);
        let (state, _) = watch::channel(UploadState::Idle);
        Self {
            selection: FileSelectionManager::default(),
            state: Arc::new(state),
            result: None,
            notice: None,
            progress: Arc::new(progress),
            config,
        }
    }

    pub fn state(&self) -> UploadState {
        *self.state.borrow()
    }

    /// Follows state changes, including while an upload is running.
    pub fn subscribe_state(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selection.selected()
    }

    pub fn selection(&self) -> &FileSelectionManager {
        &self.selection
    }

    pub fn result(&self) -> Option<&ResultPanel> {
        self.result.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Whether the upload action is available right now.
    pub fn upload_enabled(&self) -> bool {
        self.selection.selected().is_some() && self.state() != UploadState::Uploading
    }

    fn reset_view(&mut self) {
        self.result = None;
        self.notice = None;
    }

    /// Selects the first offered file and starts a fresh cycle.
    pub fn select<I>(&mut self, files: I) -> Result<Option<&SelectedFile>>
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        if self.state() == UploadState::Uploading {
            return Err(ClientError::UploadInProgress);
        }
        let mut files = files.into_iter().peekable();
        if files.peek().is_none() {
            return Ok(self.selection.selected());
        }
        self.reset_view();
        self.state.send_replace(UploadState::Selected);
        Ok(self.selection.select(files))
    }

    pub async fn select_path(&mut self, path: &Path) -> Result<&SelectedFile> {
        if self.state() == UploadState::Uploading {
            return Err(ClientError::UploadInProgress);
        }
        if let Err(e) = self.selection.select_path(path).await {
            warn!(path = %path.display(), "could not read file: {e}");
            self.notice = Some(format!("Could not read {}: {e}", path.display()));
            return Err(e);
        }
        self.reset_view();
        self.state.send_replace(UploadState::Selected);
        self.selection
            .selected()
            .ok_or(ClientError::NoFileSelected)
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.state() == UploadState::Uploading {
            return Err(ClientError::UploadInProgress);
        }
        self.selection.clear();
        self.reset_view();
        self.state.send_replace(UploadState::Idle);
        Ok(())
    }

    /// Sends the selected file, waits for the verdict and renders it.
    ///
    /// `user_id` is trimmed and only sent when something is left. Exactly one
    /// request is made per call.
    pub async fn upload<G>(&mut self, gateway: &G, user_id: &str) -> Result<&ResultPanel>
    where
        G: Gateway + ?Sized,
    {
        if self.state() == UploadState::Uploading {
            return Err(ClientError::UploadInProgress);
        }
        let Some(file) = self.selection.selected().cloned() else {
            self.notice = Some(ClientError::NoFileSelected.to_string());
            return Err(ClientError::NoFileSelected);
        };

        let user_id = user_id.trim();
        let request = UploadRequest {
            file_name: file.name.clone(),
            content: file.content.clone(),
            user_id: (!user_id.is_empty()).then(|| user_id.to_string()),
        };

        self.reset_view();
        let flight = InFlight::take_off(self.state.clone(), self.progress.clone());

        let (bytes_sender, bytes_receiver) = watch::channel(0u64);
        let follow = gateway
            .reports_progress()
            .then(|| (bytes_receiver, file.size));
        let indicator = Indicator::start(self.progress.clone(), follow, &self.config);

        let response = gateway.upload(request, Arc::new(bytes_sender)).await;
        indicator.stop().await;

        match response {
            Ok(response) => {
                self.progress.send_replace(Some(100));
                sleep(self.config.hold).await;
                self.progress.send_replace(None);
                let panel = render_outcome(&response.outcome, response.status_code);
                info!(
                    file = %file.name,
                    status_code = response.status_code,
                    verdict = panel.title(),
                    "upload finished"
                );
                flight.land(UploadState::Completed);
                Ok(&*self.result.insert(panel))
            }
            Err(e) => {
                self.progress.send_replace(None);
                error!(file = %file.name, "Upload error: {e}");
                self.notice = Some(UPLOAD_FAILED_NOTICE.to_string());
                flight.land(UploadState::Failed);
                Err(e)
            }
        }
    }

    /// Renders an outcome obtained elsewhere, bypassing the transport.
    pub fn show_outcome(&mut self, outcome: &UploadOutcome, status_code: u16) -> &ResultPanel {
        self.result.insert(render_outcome(outcome, status_code))
    }
}
