use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{
    sync::Mutex,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    config::SegmenterConfig,
    naming::next_segment_path,
    sink::SwitchSink,
    state::{SegmentSession, SwitchRequest},
};

// Set to false to silence this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Outcome of one size measurement of the active file.
#[derive(Debug)]
pub(crate) enum SizeProbe {
    Size(u64),
    /// Expected while the host renames or recreates the file.
    Missing,
    Failed(io::Error),
}

pub(crate) struct LoopContext {
    pub session_id: String,
    pub state: Arc<Mutex<SegmentSession>>,
    pub config: Arc<SegmenterConfig>,
    pub sink: Arc<dyn SwitchSink>,
}

pub(crate) async fn monitor_loop(ctx: LoopContext, cancel_token: CancellationToken) {
    let trigger_size = ctx.config.trigger_size();
    let mut ticker = time::interval(ctx.config.check_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "segment monitor {} polling every {}ms, trigger at {} bytes",
        ctx.session_id,
        ctx.config.check_interval_ms,
        trigger_size
    );

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("segment monitor {} shutting down", ctx.session_id);
                break;
            }
            _ = ticker.tick() => {}
        }

        let target = {
            let mut guard = ctx.state.lock().await;
            if !guard.enabled {
                break;
            }
            let Some(file) = guard.current_file.clone() else {
                log_info!(
                    "segment monitor {} has no file bound, ending session",
                    ctx.session_id
                );
                guard.finish();
                break;
            };
            if !guard.armed {
                log_debug!(
                    "rollover of {} still pending host confirmation",
                    file.display()
                );
                continue;
            }
            file
        };

        let size = match probe_size(&target).await {
            SizeProbe::Size(size) => size,
            SizeProbe::Missing => {
                log_info!(
                    "{} not found, waiting for it to reappear",
                    target.display()
                );
                continue;
            }
            SizeProbe::Failed(err) => {
                log_warn!("failed to read size of {}: {err}", target.display());
                continue;
            }
        };

        log_debug!("{} is {} bytes", target.display(), size);
        if size < trigger_size {
            continue;
        }

        let request = {
            let mut guard = ctx.state.lock().await;
            if cancel_token.is_cancelled() || !guard.enabled {
                break;
            }
            // The host may have rolled over while the probe was in flight.
            if !guard.armed || guard.current_file.as_deref() != Some(target.as_path()) {
                continue;
            }
            guard.mark_rollover_requested();
            SwitchRequest {
                next_file_path: next_segment_path(
                    &target,
                    &guard.base_identity,
                    guard.segment_index,
                    &ctx.config.extension,
                ),
                current_file: target,
            }
        };

        log_info!(
            "{} reached {} bytes (limit {}), requesting switch to {}",
            request.current_file.display(),
            size,
            ctx.config.max_segment_size_bytes,
            request.next_file_path.display()
        );
        ctx.sink.on_switch_requested(request);

        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("segment monitor {} cancelled during cool-down", ctx.session_id);
                break;
            }
            _ = time::sleep(ctx.config.cooldown()) => {}
        }
    }
}

/// Reads the file size on the blocking pool; the file belongs to the host and is
/// never opened here.
pub(crate) async fn probe_size(path: &Path) -> SizeProbe {
    let path: PathBuf = path.to_path_buf();
    match tokio::task::spawn_blocking(move || std::fs::metadata(&path)).await {
        Ok(Ok(metadata)) => SizeProbe::Size(metadata.len()),
        Ok(Err(err)) if err.kind() == io::ErrorKind::NotFound => SizeProbe::Missing,
        Ok(Err(err)) => SizeProbe::Failed(err),
        Err(join_err) => SizeProbe::Failed(io::Error::other(join_err)),
    }
}
