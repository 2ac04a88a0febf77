//! Poll cycle driver
//!
//! Once per tick: drain the buffered frames, fold the decoded control changes
//! into the snapshot, and publish it only when something was applied.

use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::device::FrameSource;
use crate::midi::{decode_all, ControlEvent};
use crate::normalize::ScalingPolicy;
use crate::profile::SlotTable;
use crate::sink::SnapshotSink;
use crate::snapshot::Snapshot;

/// Default poll cadence
pub const DEFAULT_RATE_HZ: u32 = 10;

/// Apply every event to `snapshot`.
///
/// Returns true when at least one event was written to a slot. Unmapped
/// controllers, and slots the snapshot does not have, are skipped.
pub fn drain_and_apply<I>(
    events: I,
    snapshot: &mut Snapshot,
    slots: &SlotTable,
    policy: ScalingPolicy,
) -> bool
where
    I: IntoIterator<Item = ControlEvent>,
{
    let mut applied = false;
    for event in events {
        match slots.resolve(event.control_id) {
            Some(slot) => {
                if snapshot.apply(slot, event.value, policy) {
                    applied = true;
                } else {
                    debug!("Control {} maps to {:?}, outside the snapshot", event.control_id, slot);
                }
            }
            None => trace!("Unmapped control: {}", event),
        }
    }
    applied
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub frames: usize,
    pub emitted: bool,
}

/// Owns the snapshot and moves frames from a source to a sink
pub struct PollCycle<S, K> {
    source: S,
    sink: K,
    slots: SlotTable,
    policy: ScalingPolicy,
    snapshot: Snapshot,
    seq: u64,
}

impl<S, K> PollCycle<S, K>
where
    S: FrameSource,
    K: SnapshotSink,
{
    /// Bind the snapshot to `slots`; it keeps this shape for its whole life
    pub fn new(source: S, sink: K, slots: SlotTable, policy: ScalingPolicy) -> Self {
        let snapshot = Snapshot::for_slots(&slots);
        Self {
            source,
            sink,
            slots,
            policy,
            snapshot,
            seq: 0,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Run one drain/apply/emit pass
    pub async fn tick(&mut self) -> Result<TickReport> {
        let frames = self.source.drain()?;
        let applied = drain_and_apply(
            decode_all(&frames),
            &mut self.snapshot,
            &self.slots,
            self.policy,
        );

        if applied {
            let message = self.snapshot.stamped(self.seq, Utc::now());
            self.sink.publish(&message).await?;
            self.seq += 1;
        }

        Ok(TickReport {
            frames: frames.len(),
            emitted: applied,
        })
    }

    /// Tick at `rate_hz` until `shutdown` resolves or a tick fails.
    ///
    /// The sink is shut down on both paths; a tick error takes precedence
    /// over a shutdown error.
    pub async fn run(
        &mut self,
        rate_hz: u32,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let period = Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling {} at {} Hz via {}",
            self.slots.variant(),
            rate_hz,
            self.sink.name()
        );

        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(report) if report.emitted => {
                            debug!("Tick: {} frame(s), published seq {}", report.frames, self.seq - 1);
                        }
                        Ok(_) => {}
                        Err(e) => break Err(e),
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping poll loop");
                    break Ok(());
                }
            }
        };

        let shutdown_result = self.sink.shutdown().await;
        result.and(shutdown_result)
    }
}

#[cfg(test)]
mod tests;
