//! Push channels streaming medication and vital-sign updates.
//!
//! Each topic owns one websocket connection. Payloads are normalized and
//! forwarded to the controller; a malformed payload is logged and dropped
//! without touching the connection. Whenever the connection closes, the
//! channel waits for the delay chosen by its [`ReconnectPolicy`] and dials
//! again, forever.

use std::fmt;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use vitals_core::{ClinicalRecord, ReconnectPolicy, VitalsError};

use crate::api::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Medications,
    Vitals,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Medications, Topic::Vitals];

    pub fn path(self) -> &'static str {
        match self {
            Topic::Medications => "/medications",
            Topic::Vitals => "/vitals",
        }
    }

    /// Collection whose state slice a pushed batch replaces.
    pub fn resource(self) -> Resource {
        match self {
            Topic::Medications => Resource::MedicationLogs,
            Topic::Vitals => Resource::Vitals,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// A normalized batch pushed on one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub topic: Topic,
    pub records: Vec<ClinicalRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    ConnectAttempt,
    Opened,
    Message,
    Error,
    Closed,
}

impl ChannelState {
    /// State after `event`. Events that make no sense in the current state leave it unchanged.
    pub fn next(self, event: ChannelEvent) -> ChannelState {
        match (self, event) {
            (ChannelState::Disconnected, ChannelEvent::ConnectAttempt) => ChannelState::Connecting,
            (ChannelState::Connecting, ChannelEvent::Opened) => ChannelState::Connected,
            (ChannelState::Connected, ChannelEvent::Message) => ChannelState::Connected,
            (_, ChannelEvent::Error) | (_, ChannelEvent::Closed) => ChannelState::Disconnected,
            (state, _) => state,
        }
    }
}

/// Parse and normalize one pushed text frame.
pub fn decode_message(topic: Topic, text: &str) -> Result<LiveUpdate, VitalsError> {
    let records = vitals_fhir::normalize_str(text)?;
    Ok(LiveUpdate { topic, records })
}

pub struct LiveChannel {
    topic: Topic,
    url: String,
    policy: ReconnectPolicy,
    updates: mpsc::Sender<LiveUpdate>,
    state: watch::Sender<ChannelState>,
}

impl LiveChannel {
    /// Channel for `topic` under `ws_base`, plus a handle observing its state.
    pub fn new(
        topic: Topic,
        ws_base: &str,
        policy: ReconnectPolicy,
        updates: mpsc::Sender<LiveUpdate>,
    ) -> (Self, watch::Receiver<ChannelState>) {
        let (state, observer) = watch::channel(ChannelState::Disconnected);
        let url = format!("{}{}", ws_base.trim_end_matches('/'), topic.path());
        let channel = Self {
            topic,
            url,
            policy,
            updates,
            state,
        };
        (channel, observer)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect, forward updates and reconnect until the receiving side goes away.
    pub async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            self.transition(ChannelEvent::ConnectAttempt);
            match connect_async(self.url.as_str()).await {
                Ok((mut stream, _response)) => {
                    self.transition(ChannelEvent::Opened);
                    attempt = 0;
                    info!(topic = %self.topic, url = %self.url, "live channel connected");

                    while let Some(frame) = stream.next().await {
                        match frame {
                            Ok(Message::Close(_)) => break,
                            Ok(message @ (Message::Text(_) | Message::Binary(_))) => {
                                self.transition(ChannelEvent::Message);
                                if !self.forward(&message).await {
                                    info!(topic = %self.topic, "dashboard stopped; closing live channel");
                                    return;
                                }
                            }
                            Ok(_) => {}
                            Err(err) => {
                                warn!(topic = %self.topic, error = %err, "live channel error");
                                self.transition(ChannelEvent::Error);
                                break;
                            }
                        }
                    }

                    self.transition(ChannelEvent::Closed);
                    info!(topic = %self.topic, "live channel closed");
                }
                Err(err) => {
                    error!(topic = %self.topic, url = %self.url, error = %err, "live channel could not connect");
                    self.transition(ChannelEvent::Error);
                }
            }

            if self.updates.is_closed() {
                return;
            }
            let delay = self.policy.delay(attempt, rand::random::<f64>());
            attempt = attempt.saturating_add(1);
            debug!(topic = %self.topic, ?delay, attempt, "scheduling reconnect");
            tokio::time::sleep(delay).await;
        }
    }

    /// Returns `false` once nobody is listening for updates.
    async fn forward(&self, message: &Message) -> bool {
        let text = match message.to_text() {
            Ok(text) => text,
            Err(err) => {
                error!(topic = %self.topic, error = %err, "dropping non-UTF-8 push payload");
                return true;
            }
        };
        match decode_message(self.topic, text) {
            Ok(update) => {
                debug!(topic = %self.topic, records = update.records.len(), "push received");
                self.updates.send(update).await.is_ok()
            }
            Err(err) => {
                error!(topic = %self.topic, error = %err, "dropping malformed push payload");
                true
            }
        }
    }

    fn transition(&self, event: ChannelEvent) {
        self.state.send_modify(|state| *state = state.next(event));
    }
}
