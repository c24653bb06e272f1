use tokio::sync::mpsc;

use super::state::SwitchRequest;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Receiver of rollover requests, implemented by the host that owns the writer.
///
/// Called from the polling task, at most once per threshold crossing. Implementations
/// should return quickly; hosts that need to await their own rollover logic should
/// forward the request to their control-plane task, e.g. through [`channel_sink`].
pub trait SwitchSink: Send + Sync + 'static {
    fn on_switch_requested(&self, request: SwitchRequest);
}

impl<F> SwitchSink for F
where
    F: Fn(SwitchRequest) + Send + Sync + 'static,
{
    fn on_switch_requested(&self, request: SwitchRequest) {
        self(request)
    }
}

/// Sink that forwards every request over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SwitchRequest>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<SwitchRequest>) -> Self {
        Self { tx }
    }
}

impl SwitchSink for ChannelSink {
    fn on_switch_requested(&self, request: SwitchRequest) {
        if let Err(err) = self.tx.send(request) {
            log_warn!(
                "switch request for {} dropped, receiver is gone",
                err.0.current_file.display()
            );
        }
    }
}

pub fn channel_sink() -> (ChannelSink, mpsc::UnboundedReceiver<SwitchRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink::new(tx), rx)
}
