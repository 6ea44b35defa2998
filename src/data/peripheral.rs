//! Peripheral telemetry store.
//!
//! Merges snapshot batches keyed by device identity into per-parameter
//! timelines. A batch is authoritative for its peripheral kind: devices of
//! that kind which the batch does not mention are evicted.

use std::collections::{BTreeMap, BTreeSet};

use robowatch_types::{DeviceId, PeripheralKind, SampleMap};
use tracing::debug;

use super::catalog::{self, DeviceType};
use super::timeline::BoundedTimeline;

/// Identity of a peripheral: its class plus device id.
///
/// Orders by kind first (declaration order), then numerically by id, so
/// device classes stay grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeripheralId {
    pub kind: PeripheralKind,
    pub device: DeviceId,
}

impl PeripheralId {
    pub fn new(kind: PeripheralKind, device: DeviceId) -> Self {
        Self { kind, device }
    }
}

/// A connected peripheral and its parameter histories.
#[derive(Debug, Clone, PartialEq)]
pub struct Peripheral {
    pub id: PeripheralId,
    pub params: BTreeMap<String, BoundedTimeline>,
}

impl Peripheral {
    fn new(id: PeripheralId) -> Self {
        Self {
            id,
            params: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> PeripheralKind {
        self.id.kind
    }

    /// Display type resolved from the device catalog.
    pub fn device_type(&self) -> DeviceType {
        catalog::classify(self.id.kind, self.id.device)
    }

    /// Timeline for a parameter, if it has been reported.
    pub fn param(&self, name: &str) -> Option<&BoundedTimeline> {
        self.params.get(name)
    }
}

/// All currently connected peripherals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Peripherals {
    entities: BTreeMap<PeripheralId, Peripheral>,
}

impl Peripherals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a snapshot for one peripheral kind.
    ///
    /// Every reading is appended to its parameter timeline. Devices of `kind`
    /// known before this call but absent from `samples` are removed, so an
    /// empty batch clears the kind entirely.
    ///
    /// Returns true if the batch counts as a telemetry arrival for link
    /// health: gamepad batches and disconnect notices do not.
    pub fn apply_snapshot(
        &mut self,
        kind: PeripheralKind,
        timestamp_ms: i64,
        samples: &SampleMap,
        disconnect: bool,
    ) -> bool {
        let mut absent: BTreeSet<PeripheralId> =
            self.entities.keys().filter(|id| id.kind == kind).copied().collect();

        for (device, params) in samples {
            let id = PeripheralId::new(kind, *device);
            let entity = self.entities.entry(id).or_insert_with(|| {
                debug!("Peripheral connected: {:?} {}", kind, device);
                Peripheral::new(id)
            });
            for (name, value) in params {
                entity
                    .params
                    .entry(name.clone())
                    .or_default()
                    .push(timestamp_ms, value.clone());
            }
            absent.remove(&id);
        }

        for id in absent {
            debug!("Peripheral disconnected: {:?} {}", id.kind, id.device);
            self.entities.remove(&id);
        }

        kind != PeripheralKind::Gamepad && !disconnect
    }

    /// Peripherals sorted by `(kind, id)`.
    pub fn sorted(&self) -> impl Iterator<Item = &Peripheral> {
        self.entities.values()
    }

    /// Peripherals of one kind, sorted by id.
    pub fn of_kind(&self, kind: PeripheralKind) -> impl Iterator<Item = &Peripheral> {
        self.entities.values().filter(move |p| p.id.kind == kind)
    }

    pub fn get(&self, id: &PeripheralId) -> Option<&Peripheral> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robowatch_types::{ParamValue, TelemetryBatch};

    fn apply(store: &mut Peripherals, batch: &TelemetryBatch) -> bool {
        store.apply_snapshot(
            batch.kind,
            batch.timestamp_ms.unwrap_or_default(),
            &batch.samples,
            batch.disconnect,
        )
    }

    fn smart(ts: i64, ids: &[u64]) -> TelemetryBatch {
        ids.iter()
            .fold(
                TelemetryBatch::builder(PeripheralKind::SmartDevice).timestamp_ms(ts),
                |b, id| b.device(*id, |d| d.param("switch0", true)),
            )
            .build()
    }

    #[test]
    fn test_empty_snapshot_clears_kind() {
        let mut store = Peripherals::new();
        apply(&mut store, &smart(1000, &[5]));
        assert_eq!(store.len(), 1);

        apply(&mut store, &smart(1100, &[]));
        assert_eq!(store.of_kind(PeripheralKind::SmartDevice).count(), 0);
    }

    #[test]
    fn test_absent_devices_are_evicted() {
        let mut store = Peripherals::new();
        apply(&mut store, &smart(1000, &[1, 2, 3]));
        apply(&mut store, &smart(1100, &[2, 4]));

        let ids: Vec<u128> = store.sorted().map(|p| p.id.device.get()).collect();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn test_snapshot_only_evicts_its_own_kind() {
        let mut store = Peripherals::new();
        let pad = TelemetryBatch::builder(PeripheralKind::Gamepad)
            .timestamp_ms(10)
            .device(0u64, |d| d.param("button_a", false))
            .build();
        apply(&mut store, &pad);
        apply(&mut store, &smart(20, &[9]));
        apply(&mut store, &smart(30, &[]));

        assert_eq!(store.len(), 1);
        assert_eq!(store.sorted().next().map(|p| p.kind()), Some(PeripheralKind::Gamepad));
    }

    #[test]
    fn test_readings_accumulate_per_param() {
        let mut store = Peripherals::new();
        for ts in 0..60 {
            let batch = TelemetryBatch::builder(PeripheralKind::SmartDevice)
                .timestamp_ms(ts)
                .device(3u64, |d| d.param("enc", ts))
                .build();
            apply(&mut store, &batch);
        }

        let id = PeripheralId::new(PeripheralKind::SmartDevice, DeviceId::new(3));
        let timeline = store.get(&id).and_then(|p| p.param("enc")).unwrap();
        assert_eq!(timeline.len(), 50);
        assert_eq!(timeline.iter().next().map(|s| s.value.clone()), Some(ParamValue::Int(10)));
    }

    #[test]
    fn test_sorted_groups_kind_before_numeric_id() {
        let mut store = Peripherals::new();
        apply(&mut store, &smart(1, &[100, 7]));
        let pad = TelemetryBatch::builder(PeripheralKind::Gamepad)
            .timestamp_ms(1)
            .device(500u64, |d| d.param("button_a", true))
            .build();
        apply(&mut store, &pad);

        let order: Vec<(PeripheralKind, u128)> =
            store.sorted().map(|p| (p.kind(), p.id.device.get())).collect();
        assert_eq!(
            order,
            vec![
                (PeripheralKind::Gamepad, 500),
                (PeripheralKind::SmartDevice, 7),
                (PeripheralKind::SmartDevice, 100),
            ]
        );
    }

    #[test]
    fn test_arrival_forwarding_rules() {
        let mut store = Peripherals::new();
        assert!(apply(&mut store, &smart(1, &[1])));

        let pad = TelemetryBatch::builder(PeripheralKind::Gamepad).timestamp_ms(2).build();
        assert!(!apply(&mut store, &pad));

        let notice = TelemetryBatch::disconnect(PeripheralKind::SmartDevice, 3);
        assert!(!apply(&mut store, &notice));
        assert!(store.is_empty());
    }

    #[test]
    fn test_text_value_is_stored_as_is() {
        let mut store = Peripherals::new();
        let batch = TelemetryBatch::builder(PeripheralKind::SmartDevice)
            .timestamp_ms(1)
            .device(1u64, |d| d.param("duty_cycle", "n/a"))
            .build();
        apply(&mut store, &batch);

        let id = PeripheralId::new(PeripheralKind::SmartDevice, DeviceId::new(1));
        let timeline = store.get(&id).and_then(|p| p.param("duty_cycle")).unwrap();
        assert_eq!(timeline.latest().map(|s| &s.value), Some(&ParamValue::from("n/a")));
        assert!(timeline.plottable().is_none());
    }
}
