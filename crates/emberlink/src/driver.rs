//! The client event loop.
//!
//! Everything happens on one task, one event at a time:
//!
//! ```text
//!            ┌──────────── select! ────────────┐
//! socket ──→ │ bytes → frames → Message → Session → EntityStore ──→ world watch
//! handle ──→ │ SetIntent / Disconnect                              │
//! ticker ──→ │ IntentEncoder diff → Move frames → socket           │
//! linger ──→ │ grace period after Disconnect expired               │
//!            └─────────────────────────────────┘
//! ```
//!
//! Inbound frames are handled strictly in arrival order and a tick never
//! interleaves with a frame, so the store needs no locking.

use std::sync::Arc;

use emberlink_protocol::{Codec, DisconnectReason, Message, encode_frame};
use emberlink_session::{ConnectionState, Step};
use emberlink_transport::{Connection, TransportError};
use tokio::time::{self, Instant};
use tracing::Instrument;

use crate::client::ClientCommand;
use crate::{Client, EmberlinkError, SessionEnd};

impl<C, K> Client<C, K>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    /// Runs the session to completion: handshake, world sync, input, close.
    ///
    /// Returns how the session ended. Protocol-fatal conditions (version
    /// mismatch, refused login, undecodable frame) and transport failures
    /// come back as errors so the caller can show them. Either way the
    /// transport is released before this returns.
    pub async fn run(mut self) -> Result<SessionEnd, EmberlinkError> {
        let span = self.session.span().clone();
        async move {
            let result = self.drive().await;

            match &result {
                Ok(end) => tracing::info!(%end, "session ended"),
                Err(e) => tracing::error!(error = %e, "session failed"),
            }

            // `finish` completes a local close; anything still open failed.
            self.session.finish();
            self.session.fail();
            if let Err(e) = self.conn.close().await {
                tracing::debug!(error = %e, "error while closing transport");
            }
            self.publish_state();

            result
        }
        .instrument(span)
        .await
    }

    async fn drive(&mut self) -> Result<SessionEnd, EmberlinkError> {
        let connect = self.session.open()?;
        self.send(&connect).await?;
        self.publish_state();

        loop {
            let closing = self.linger_until.is_some();

            tokio::select! {
                received = self.conn.recv() => {
                    match received? {
                        Some(bytes) => {
                            if let Some(end) = self.on_bytes(&bytes).await? {
                                return Ok(end);
                            }
                        }
                        None => {
                            if self.frames.buffered() > 0 {
                                tracing::debug!(
                                    pending = self.frames.buffered(),
                                    "stream ended inside a frame"
                                );
                            }
                            return Ok(match self.session.state() {
                                ConnectionState::Disconnecting => SessionEnd::LocalQuit,
                                _ => SessionEnd::ConnectionClosed,
                            });
                        }
                    }
                }

                _ = time::sleep_until(self.linger_until.unwrap_or_else(Instant::now)), if closing => {
                    tracing::debug!("disconnect grace elapsed");
                    return Ok(SessionEnd::LocalQuit);
                }

                cmd = self.commands.recv(), if self.commands_open && !closing => {
                    match cmd {
                        Some(cmd) => {
                            if let Some(end) = self.on_command(cmd).await? {
                                return Ok(end);
                            }
                        }
                        None => {
                            tracing::debug!("all client handles dropped");
                            self.commands_open = false;
                        }
                    }
                }

                // Paused until login, so this only fires while active.
                info = self.ticker.wait_for_tick(), if !closing => {
                    let sent = self.flush_intent().await?;
                    tracing::trace!(
                        tick = info.tick,
                        skipped = info.ticks_skipped,
                        sent,
                        "input tick"
                    );
                }
            }
        }
    }

    /// Feeds one network read through reassembly and dispatch.
    async fn on_bytes(&mut self, bytes: &[u8]) -> Result<Option<SessionEnd>, EmberlinkError> {
        self.frames.push(bytes);

        while let Some(payload) = self.frames.next_frame() {
            let msg: Message = match self.codec.decode(&payload) {
                Ok(msg) => msg,
                Err(e) => {
                    // Frame boundaries after a bad payload can't be trusted.
                    self.session.fail();
                    return Err(e.into());
                }
            };

            let step = self.session.on_message(msg, &mut self.world);
            self.publish_state();

            match step? {
                Step::Send(reply) => self.send(&reply).await?,
                Step::Established => {
                    if self.ticker.is_event_driven() {
                        self.flush_intent().await?;
                    } else {
                        self.ticker.resume();
                    }
                }
                Step::Applied(outcome) => {
                    if outcome.is_applied() {
                        self.publish_world();
                    }
                }
                Step::Ignored => {}
                Step::PeerClosed { reason, reason_str } => {
                    return Ok(Some(SessionEnd::PeerDisconnected { reason, reason_str }));
                }
            }
        }
        Ok(None)
    }

    async fn on_command(
        &mut self,
        cmd: ClientCommand,
    ) -> Result<Option<SessionEnd>, EmberlinkError> {
        match cmd {
            ClientCommand::SetIntent(intent) => {
                self.intent = intent;
                if self.ticker.is_event_driven() && self.session.state().is_active() {
                    self.flush_intent().await?;
                }
                Ok(None)
            }
            ClientCommand::Disconnect { reason_str } => self.begin_close(&reason_str).await,
        }
    }

    /// Sends `Disconnect` and starts the grace period.
    async fn begin_close(&mut self, reason_str: &str) -> Result<Option<SessionEnd>, EmberlinkError> {
        let Some(msg) = self.session.close(DisconnectReason::Quit, reason_str) else {
            return Ok(Some(SessionEnd::LocalQuit));
        };
        self.send(&msg).await?;
        self.ticker.pause();
        self.publish_state();

        if self.disconnect_grace.is_zero() {
            return Ok(Some(SessionEnd::LocalQuit));
        }
        self.linger_until = Some(Instant::now() + self.disconnect_grace);
        Ok(None)
    }

    /// Sends whatever changed since the last flush. Returns how many
    /// `Move` messages went out.
    async fn flush_intent(&mut self) -> Result<usize, EmberlinkError> {
        let moves = self.encoder.encode(self.intent);
        for msg in &moves {
            self.send(msg).await?;
        }
        Ok(moves.len())
    }

    async fn send(&self, msg: &Message) -> Result<(), EmberlinkError> {
        let payload = self.codec.encode(msg)?;
        let frame = encode_frame(&payload)?;
        tracing::trace!(kind = %msg.kind(), len = payload.len(), ">>");
        self.conn.send(&frame).await?;
        Ok(())
    }

    fn publish_world(&self) {
        self.world_tx.send_replace(Arc::new(self.world.snapshot()));
    }

    fn publish_state(&self) {
        let state = self.session.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}
