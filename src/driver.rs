//! Periodic tick loop on the tokio runtime.
//!
//! The arbiter itself is synchronous; this drives it at a fixed period and
//! forwards completion events to a channel until shutdown is signalled.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::arbiter::Arbiter;
use crate::channel::LinkEvent;
use crate::transport::LinkRegisters;

impl<R: LinkRegisters> Arbiter<R> {
    /// Tick every `period` until `shutdown` turns true or its sender is
    /// dropped. Events are forwarded to `events` after each tick; if the
    /// receiving side is gone they are dropped.
    ///
    /// Returns the number of ticks run.
    pub async fn run(
        &mut self,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> u64 {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        tracing::info!(
            period_ms = period.as_millis(),
            channels = self.channel_count(),
            "tick loop starting"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                    ticks += 1;
                    for event in self.drain_events() {
                        if events.send(event).is_err() {
                            tracing::trace!("event receiver closed, dropping event");
                        }
                    }
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!(ticks, "tick loop shutting down");
                        break;
                    }
                }
            }
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::handshake::{HandshakeFrame, HandshakeState};
    use crate::testing::{ManualClock, MockRegisters, ScriptedNonces};
    use crate::transport::StaticStatus;
    use crate::types::{DpofConfig, TransactionId};

    fn arbiter() -> Arbiter<MockRegisters> {
        Arbiter::builder(MockRegisters::new(), DpofConfig::default())
            .clock(ManualClock::new())
            .nonces(ScriptedNonces::new([0x10]))
            .status(StaticStatus::default())
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_shutdown() {
        let mut arbiter = arbiter();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, _events_rx) = mpsc::unbounded_channel();

        let (ticks, ()) = tokio::join!(
            arbiter.run(Duration::from_millis(10), shutdown_rx, events_tx),
            async {
                tokio::time::sleep(Duration::from_millis(55)).await;
                shutdown_tx.send(true).unwrap();
            }
        );

        assert!((5..=6).contains(&ticks), "ran {ticks} ticks");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_on_spawned_task() {
        let mut arbiter = arbiter();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, _events_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            arbiter
                .run(Duration::from_millis(10), shutdown_rx, events_tx)
                .await
        });
        tokio::time::sleep(Duration::from_millis(35)).await;
        shutdown_tx.send(true).unwrap();

        let ticks = handle.await.unwrap();
        assert!(ticks >= 3, "ran {ticks} ticks");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_sender_dropped() {
        let mut arbiter = arbiter();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        drop(shutdown_tx);

        let ticks = arbiter
            .run(Duration::from_millis(10), shutdown_rx, events_tx)
            .await;

        assert!(ticks <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_forwards_events() {
        let mut arbiter = arbiter();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        // Peer asks for a write and the buffer already reports arrival,
        // so the responder completes within a few ticks
        let regs = arbiter.registers_mut();
        regs.set_peer_frame(HandshakeFrame::new(
            HandshakeState::Init,
            TransactionId::WRITE_COMMAND,
            0x30,
        ));
        regs.buffer_size = 1;
        regs.buffer_status = 0x0b;

        let (_, event) = tokio::join!(
            arbiter.run(Duration::from_millis(10), shutdown_rx, events_tx),
            async {
                let event = events_rx.recv().await;
                shutdown_tx.send(true).unwrap();
                event
            }
        );

        assert!(matches!(event, Some(LinkEvent::WriteReceived { .. })));
    }
}
