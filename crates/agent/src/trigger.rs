//! Response triggering
//!
//! The remote session never replies on its own (manual turn detection). After
//! a user utterance is finalized the trigger waits `delay` and then sends
//! `response.create`, giving the user a window to keep talking. Scheduling a
//! new request aborts the one still waiting, so at most one is outstanding.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use voice_coach_core::{ClientMessage, ControlChannel, ResponseOptions};

use crate::events::ConversationEvent;
use crate::metrics;

/// Delayed, cancellable `response.create` sender
pub struct ResponseTrigger {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl ResponseTrigger {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a request is still waiting to be sent
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Schedule a request after the delay, superseding any pending one
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(
        &mut self,
        control: Arc<dyn ControlChannel>,
        response: ResponseOptions,
        events: broadcast::Sender<ConversationEvent>,
    ) {
        if self.cancel() {
            tracing::debug!("Superseded pending response request");
        }

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if send_response_request(control.as_ref(), response, "delayed") {
                let _ = events.send(ConversationEvent::ResponseRequested);
            }
        }));
    }

    /// Abort a pending request; returns whether one was waiting
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            },
            _ => false,
        }
    }
}

impl Drop for ResponseTrigger {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Send `response.create`
///
/// Best effort: failures are logged and reported as `false`.
pub fn send_response_request(
    control: &dyn ControlChannel,
    response: ResponseOptions,
    trigger: &'static str,
) -> bool {
    let payload = match ClientMessage::response_create(response).to_json() {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode response request");
            return false;
        },
    };

    match control.send(&payload) {
        Ok(()) => {
            metrics::record_response_requested(trigger);
            tracing::debug!(trigger, "Response requested");
            true
        },
        Err(e) => {
            tracing::debug!(error = %e, trigger, "Response request not sent");
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use voice_coach_core::{ChannelState, Error, Result};

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<String>>,
        closed: bool,
    }

    impl ControlChannel for RecordingChannel {
        fn ready_state(&self) -> ChannelState {
            if self.closed {
                ChannelState::Closed
            } else {
                ChannelState::Open
            }
        }

        fn send(&self, payload: &str) -> Result<()> {
            if self.closed {
                return Err(Error::ChannelNotOpen);
            }
            self.sent.lock().push(payload.to_string());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_after_delay() {
        let channel = Arc::new(RecordingChannel::default());
        let (events, mut rx) = broadcast::channel(8);
        let mut trigger = ResponseTrigger::new(Duration::from_millis(1200));

        trigger.schedule(channel.clone(), ResponseOptions::full(), events);
        assert!(trigger.is_pending());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(channel.sent.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let sent = channel.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains(r#""type":"response.create""#));
        assert!(!sent[0].contains("voice"));
        assert_eq!(rx.try_recv().unwrap(), ConversationEvent::ResponseRequested);
        assert!(!trigger.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_supersedes() {
        let channel = Arc::new(RecordingChannel::default());
        let (events, _rx) = broadcast::channel(8);
        let mut trigger = ResponseTrigger::new(Duration::from_millis(1000));

        trigger.schedule(channel.clone(), ResponseOptions::full(), events.clone());
        tokio::time::sleep(Duration::from_millis(600)).await;
        trigger.schedule(channel.clone(), ResponseOptions::full(), events);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(channel.sent.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(channel.sent.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let channel = Arc::new(RecordingChannel::default());
        let (events, _rx) = broadcast::channel(8);
        let mut trigger = ResponseTrigger::new(Duration::from_millis(500));

        trigger.schedule(channel.clone(), ResponseOptions::full(), events);
        assert!(trigger.cancel());
        assert!(!trigger.cancel());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(channel.sent.lock().is_empty());
    }

    #[test]
    fn test_send_on_closed_channel() {
        let channel = RecordingChannel {
            closed: true,
            ..Default::default()
        };
        assert!(!send_response_request(&channel, ResponseOptions::full(), "immediate"));
    }
}
