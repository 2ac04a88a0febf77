//! Tests for the poll cycle driver

use super::*;
use crate::midi::RawFrame;
use crate::profile::{lookup, DeviceVariant};
use crate::snapshot::JoyMessage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Hands out one batch of frames per drain
#[derive(Default)]
struct ScriptedSource {
    batches: VecDeque<Vec<RawFrame>>,
}

impl ScriptedSource {
    fn push(&mut self, batch: Vec<RawFrame>) {
        self.batches.push_back(batch);
    }
}

impl FrameSource for ScriptedSource {
    fn drain(&mut self) -> Result<Vec<RawFrame>> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}

struct FailingSource;

impl FrameSource for FailingSource {
    fn drain(&mut self) -> Result<Vec<RawFrame>> {
        anyhow::bail!("port closed")
    }
}

/// Keeps every published message as JSON
#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<serde_json::Value>>,
    shut_down: AtomicBool,
}

impl RecordingSink {
    fn messages(&self) -> Vec<serde_json::Value> {
        self.messages.lock().unwrap().clone()
    }

    fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish(&self, message: &JoyMessage<'_>) -> Result<()> {
        let value = serde_json::to_value(message)?;
        self.messages.lock().unwrap().push(value);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn slots(variant: DeviceVariant) -> SlotTable {
    SlotTable::bind(lookup(variant)).unwrap()
}

fn cc(control_id: u8, value: u8) -> ControlEvent {
    ControlEvent {
        status: crate::midi::CONTROL_CHANGE,
        control_id,
        value,
    }
}

#[test]
fn test_button_event_sets_slot() {
    let slots = slots(DeviceVariant::NanoKontrol);
    let mut snapshot = Snapshot::for_slots(&slots);

    let applied = drain_and_apply([cc(23, 127)], &mut snapshot, &slots, ScalingPolicy::Centered);

    assert!(applied);
    assert_eq!(snapshot.buttons()[0], 1);
    assert!(snapshot.buttons()[1..].iter().all(|b| *b == 0));
    assert!(snapshot.axes().iter().all(|a| *a == 0.0));
}

#[test]
fn test_unmapped_event_changes_nothing() {
    let slots = slots(DeviceVariant::NanoKontrol);
    let mut snapshot = Snapshot::for_slots(&slots);
    let before = snapshot.clone();

    // 7 is not wired on the first generation surface
    let applied = drain_and_apply([cc(7, 100)], &mut snapshot, &slots, ScalingPolicy::Centered);

    assert!(!applied);
    assert_eq!(snapshot, before);
}

#[test]
fn test_axis_event_uses_policy() {
    let slots = slots(DeviceVariant::NanoKontrol2);

    let mut centered = Snapshot::for_slots(&slots);
    drain_and_apply([cc(16, 0)], &mut centered, &slots, ScalingPolicy::Centered);
    assert_eq!(centered.axes()[8], -1.0);

    let mut unipolar = Snapshot::for_slots(&slots);
    drain_and_apply([cc(16, 0)], &mut unipolar, &slots, ScalingPolicy::Unipolar);
    assert_eq!(unipolar.axes()[8], 0.0);
}

#[test]
fn test_last_event_for_a_slot_wins() {
    let slots = slots(DeviceVariant::NanoKontrol2);
    let mut snapshot = Snapshot::for_slots(&slots);

    let events = [cc(0, 10), cc(99, 1), cc(0, 127), cc(32, 1), cc(32, 0)];
    let applied = drain_and_apply(events, &mut snapshot, &slots, ScalingPolicy::Unipolar);

    assert!(applied);
    assert_eq!(snapshot.axes()[0], 1.0);
    assert_eq!(snapshot.buttons()[0], 0);
}

#[test]
fn test_mixed_batch_with_one_hit_is_applied() {
    let slots = slots(DeviceVariant::NanoKontrol);
    let mut snapshot = Snapshot::for_slots(&slots);

    let applied = drain_and_apply(
        [cc(0, 1), cc(2, 127), cc(120, 0)],
        &mut snapshot,
        &slots,
        ScalingPolicy::Unipolar,
    );

    assert!(applied);
    assert_eq!(snapshot.axes()[0], 1.0);
}

#[test]
fn test_table_from_other_variant_does_not_panic() {
    let small = slots(DeviceVariant::NanoKontrol2);
    let large = slots(DeviceVariant::NanoKontrol);
    let mut snapshot = Snapshot::for_slots(&small);
    let before = snapshot.clone();

    // 22 is axis slot 17 on the first generation, past the 16 axes here
    let applied = drain_and_apply([cc(22, 127)], &mut snapshot, &large, ScalingPolicy::Centered);

    assert!(!applied);
    assert_eq!(snapshot, before);

    // 23 is button slot 0, which the snapshot does have
    assert!(drain_and_apply([cc(23, 127)], &mut snapshot, &large, ScalingPolicy::Centered));
    assert_eq!(snapshot.buttons()[0], 1);
}

#[tokio::test]
async fn test_tick_emits_only_when_applied() {
    let mut source = ScriptedSource::default();
    source.push(vec![vec![176, 23, 127]]);
    source.push(vec![]);
    source.push(vec![vec![144, 23, 100], vec![176, 23], vec![176, 7, 5]]);
    source.push(vec![vec![176, 2, 127], vec![176, 3, 0]]);

    let mut cycle = PollCycle::new(
        source,
        RecordingSink::default(),
        slots(DeviceVariant::NanoKontrol),
        ScalingPolicy::Centered,
    );

    let reports = [
        cycle.tick().await.unwrap(),
        cycle.tick().await.unwrap(),
        cycle.tick().await.unwrap(),
        cycle.tick().await.unwrap(),
    ];

    assert_eq!(
        reports.map(|r| r.emitted),
        [true, false, false, true]
    );
    assert_eq!(reports[2].frames, 3);

    let messages = cycle.sink().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["header"]["seq"], 0);
    assert_eq!(messages[1]["header"]["seq"], 1);
    assert_eq!(messages[0]["header"]["frame_id"], "kontrol");
    assert_eq!(messages[0]["buttons"][0], 1);
    assert_eq!(messages[1]["axes"][0], 1.0);
    assert_eq!(messages[1]["axes"][1], -1.0);
    // Earlier state is carried forward
    assert_eq!(messages[1]["buttons"][0], 1);
}

#[tokio::test]
async fn test_snapshot_keeps_its_shape() {
    let mut source = ScriptedSource::default();
    source.push(vec![vec![176, 71, 1], vec![176, 23, 64]]);

    let mut cycle = PollCycle::new(
        source,
        RecordingSink::default(),
        slots(DeviceVariant::NanoKontrol2),
        ScalingPolicy::Unipolar,
    );
    cycle.tick().await.unwrap();

    assert_eq!(cycle.snapshot().axes().len(), 16);
    assert_eq!(cycle.snapshot().buttons().len(), 35);
    assert_eq!(cycle.snapshot().buttons()[23], 1);
    assert_eq!(cycle.snapshot().frame_id(), "kontrol2");
}

#[tokio::test]
async fn test_source_failure_is_fatal() {
    let mut cycle = PollCycle::new(
        FailingSource,
        RecordingSink::default(),
        slots(DeviceVariant::NanoKontrol),
        ScalingPolicy::Centered,
    );

    assert!(cycle.tick().await.is_err());
    assert!(!cycle.sink().is_shut_down());

    assert!(cycle.run(DEFAULT_RATE_HZ, std::future::pending()).await.is_err());
    assert!(cycle.sink().messages().is_empty());
    assert!(cycle.sink().is_shut_down());
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let mut source = ScriptedSource::default();
    source.push(vec![vec![176, 2, 0]]);

    let mut cycle = PollCycle::new(
        source,
        RecordingSink::default(),
        slots(DeviceVariant::NanoKontrol),
        ScalingPolicy::Centered,
    );

    cycle
        .run(100, tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    // The first interval tick fires immediately
    assert_eq!(cycle.sink().messages().len(), 1);
    assert!(cycle.sink().is_shut_down());
    assert!(cycle.source_mut().batches.is_empty());
}
