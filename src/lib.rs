//! Rollover controller for size-bounded recording segments.
//!
//! A [`SegmentMonitor`] polls the file a recorder is writing and, once it nears
//! the configured size limit, asks the host to switch to the next segment
//! (`<base>_partNNN<ext>`). The host performs the cut-over and confirms it with
//! [`SegmentMonitor::update_current_file`].

pub mod segmenter;
mod utils;

pub use segmenter::{
    channel_sink, naming, ChannelSink, MonitorSnapshot, MonitorStatus, SegmentMonitor,
    SegmenterConfig, SwitchRequest, SwitchSink,
};

/// Installs `env_logger` reading `RUST_LOG`, defaulting to `info`.
/// Does nothing if the host already installed a logger.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
