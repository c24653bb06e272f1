use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::{runtime::Handle, sync::Mutex, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use super::{
    config::SegmenterConfig,
    loop_worker::{monitor_loop, LoopContext},
    sink::SwitchSink,
    state::{MonitorSnapshot, SegmentSession},
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Running loop. Dropping the last monitor clone drops this slot, and the guard
/// cancels the loop.
struct LoopWorker {
    handle: JoinHandle<()>,
    cancel_guard: DropGuard,
}

/// Watches the active recording file and asks the host to roll over to a new
/// segment before it outgrows `max_segment_size_bytes`.
///
/// Cloning is cheap; all clones drive the same session. `stop` waits until the
/// polling task has exited, so no switch request is delivered after it returns.
/// Dropping every clone without `stop` cancels the task without waiting for it.
#[derive(Clone)]
pub struct SegmentMonitor {
    state: Arc<Mutex<SegmentSession>>,
    config: Arc<SegmenterConfig>,
    /// Also serializes `start`/`stop` so at most one loop exists at a time.
    worker: Arc<Mutex<Option<LoopWorker>>>,
    runtime: Option<Handle>,
}

impl SegmentMonitor {
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        config.validate().context("invalid segmenter config")?;
        Ok(Self {
            state: Arc::new(Mutex::new(SegmentSession::new())),
            config: Arc::new(config),
            worker: Arc::new(Mutex::new(None)),
            runtime: None,
        })
    }

    /// Runs the polling loop on `runtime` instead of the caller's runtime.
    pub fn with_runtime(config: SegmenterConfig, runtime: Handle) -> Result<Self> {
        let mut monitor = Self::new(config)?;
        monitor.runtime = Some(runtime);
        Ok(monitor)
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Binds a new session to `file`, replacing any session already running.
    pub async fn start(
        &self,
        file: impl Into<PathBuf>,
        sink: impl SwitchSink,
    ) -> Result<MonitorSnapshot> {
        let file = file.into();
        ensure_utf8_file_name(&file)?;
        let mut worker_guard = self.worker.lock().await;

        if let Err(err) = self.shutdown_worker(&mut worker_guard).await {
            log_error!("previous segment monitor loop ended abnormally: {err:?}");
        }

        let session_id = Uuid::new_v4().to_string();
        let snapshot = {
            let mut state = self.state.lock().await;
            state.begin_session(session_id.clone(), &file, Utc::now());
            state.snapshot()
        };

        let cancel_token = CancellationToken::new();
        let ctx = LoopContext {
            session_id: session_id.clone(),
            state: self.state.clone(),
            config: self.config.clone(),
            sink: Arc::new(sink),
        };
        let fut = monitor_loop(ctx, cancel_token.clone());
        let handle = match &self.runtime {
            Some(runtime) => runtime.spawn(fut),
            None => tokio::spawn(fut),
        };

        *worker_guard = Some(LoopWorker {
            handle,
            cancel_guard: cancel_token.drop_guard(),
        });

        log_info!(
            "segment session {} started on {} (base {:?}, index {})",
            session_id,
            file.display(),
            snapshot.base_identity,
            snapshot.segment_index
        );
        Ok(snapshot)
    }

    /// Ends the session and waits for the polling task to exit. No-op when idle.
    pub async fn stop(&self) -> Result<()> {
        let mut worker_guard = self.worker.lock().await;
        let joined = self.shutdown_worker(&mut worker_guard).await;

        let session_id = {
            let mut state = self.state.lock().await;
            let session_id = state.session_id.take();
            state.reset();
            session_id
        };
        if let Some(session_id) = session_id {
            log_info!("segment session {} stopped", session_id);
        }

        joined
    }

    /// Host confirmation that the rollover finished and `file` is now being written.
    /// Returns the new segment index.
    pub async fn update_current_file(&self, file: impl Into<PathBuf>) -> Result<u32> {
        let file = file.into();
        ensure_utf8_file_name(&file)?;
        let mut state = self.state.lock().await;
        if state.session_id.is_none() {
            bail!("no active segment session to update");
        }

        state.confirm_rollover(file);
        log_info!(
            "segment {} confirmed: {}",
            state.segment_index,
            state
                .current_file
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        );
        Ok(state.segment_index)
    }

    pub async fn is_monitoring(&self) -> bool {
        self.state.lock().await.is_monitoring()
    }

    pub async fn current_segment_index(&self) -> u32 {
        self.state.lock().await.segment_index
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Disables the session, cancels the loop and joins it. The caller holds the
    /// worker slot so nothing can spawn a new loop in between.
    async fn shutdown_worker(&self, worker: &mut Option<LoopWorker>) -> Result<()> {
        self.state.lock().await.enabled = false;

        let Some(LoopWorker {
            handle,
            cancel_guard,
        }) = worker.take()
        else {
            return Ok(());
        };

        cancel_guard.disarm().cancel();
        handle
            .await
            .context("segment monitor loop task failed to join")
    }
}

/// Segment names are derived from the file name as text; a lossy conversion would
/// produce a base that no longer matches the file on disk.
fn ensure_utf8_file_name(file: &Path) -> Result<()> {
    match file.file_name() {
        Some(name) if name.to_str().is_none() => {
            bail!("segment file name is not valid UTF-8: {}", file.display())
        }
        _ => Ok(()),
    }
}
