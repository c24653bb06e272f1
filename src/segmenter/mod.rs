pub mod config;
pub mod controller;
mod loop_worker;
pub mod naming;
pub mod sink;
pub mod state;

pub use config::SegmenterConfig;
pub use controller::SegmentMonitor;
pub use sink::{channel_sink, ChannelSink, SwitchSink};
pub use state::{MonitorSnapshot, MonitorStatus, SegmentSession, SwitchRequest};
