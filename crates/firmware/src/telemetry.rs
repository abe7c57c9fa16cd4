//! Battery temperature extremes, kept in backup RAM.
//!
//! The record survives resets and power cycles for as long as backup RAM is
//! powered. The minimum only ever decreases and the maximum only ever
//! increases; the record is rewritten only when one of them moves.
//!
//! # On-media layout (12 bytes, little-endian)
//!
//! | Offset | Size | Field                       |
//! |--------|------|-----------------------------|
//! | 0      | 2    | version (`0x0001`)          |
//! | 2      | 1    | initialized (1 = valid)     |
//! | 3      | 1    | reserved (0)                |
//! | 4      | 4    | minimum, °C, IEEE-754 `f32` |
//! | 8      | 4    | maximum, °C, IEEE-754 `f32` |
//!
//! A failed read, a size mismatch or an unknown version all read as "no
//! data"; the next update then starts a fresh record.

use platform::{BackupRam, BackupRamKey, ItemVisibility};

/// Record layout version.
pub const TELEMETRY_VERSION: u16 = 0x0001;

/// Encoded record size, bytes.
pub const TELEMETRY_RECORD_LEN: usize = 12;

/// Decoded telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRecord {
    /// Set once a first temperature has been stored.
    pub initialized: bool,
    /// Lowest battery temperature seen, °C.
    pub min_temp_c: f32,
    /// Highest battery temperature seen, °C.
    pub max_temp_c: f32,
}

impl TelemetryRecord {
    /// Record holding a single sample.
    pub const fn first(temp_c: f32) -> Self {
        Self {
            initialized: true,
            min_temp_c: temp_c,
            max_temp_c: temp_c,
        }
    }

    /// Serialise to the on-media layout.
    pub fn to_bytes(&self) -> [u8; TELEMETRY_RECORD_LEN] {
        let mut out = [0u8; TELEMETRY_RECORD_LEN];
        let (version, rest) = out.split_at_mut(2);
        version.copy_from_slice(&TELEMETRY_VERSION.to_le_bytes());
        let (flags, rest) = rest.split_at_mut(2);
        flags.copy_from_slice(&[u8::from(self.initialized), 0]);
        let (min, max) = rest.split_at_mut(4);
        min.copy_from_slice(&self.min_temp_c.to_le_bytes());
        max.copy_from_slice(&self.max_temp_c.to_le_bytes());
        out
    }

    /// Parse the on-media layout. `None` on a version mismatch.
    pub fn from_bytes(bytes: &[u8; TELEMETRY_RECORD_LEN]) -> Option<Self> {
        let [v0, v1, initialized, _reserved, n0, n1, n2, n3, x0, x1, x2, x3] = *bytes;
        if u16::from_le_bytes([v0, v1]) != TELEMETRY_VERSION {
            return None;
        }
        Some(Self {
            initialized: initialized == 1,
            min_temp_c: f32::from_le_bytes([n0, n1, n2, n3]),
            max_temp_c: f32::from_le_bytes([x0, x1, x2, x3]),
        })
    }

    /// Fold `temp_c` into the extremes. Returns `true` if either moved.
    pub fn observe(&mut self, temp_c: f32) -> bool {
        let mut changed = false;
        if temp_c < self.min_temp_c {
            self.min_temp_c = temp_c;
            changed = true;
        }
        if temp_c > self.max_temp_c {
            self.max_temp_c = temp_c;
            changed = true;
        }
        changed
    }
}

/// Telemetry store on top of a [`BackupRam`].
pub struct Telemetry<B> {
    ram: B,
}

impl<B: BackupRam> Telemetry<B> {
    /// Use `ram` as the backing store.
    pub fn new(ram: B) -> Self {
        Self { ram }
    }

    /// Backing store, for inspection.
    pub fn backup_ram(&self) -> &B {
        &self.ram
    }

    /// Give the backing store back.
    pub fn into_inner(self) -> B {
        self.ram
    }

    fn read(&mut self) -> Option<TelemetryRecord> {
        let mut buf = [0u8; TELEMETRY_RECORD_LEN];
        match self.ram.read(BackupRamKey::Telemetry, &mut buf) {
            Ok(Some(TELEMETRY_RECORD_LEN)) => TelemetryRecord::from_bytes(&buf),
            Ok(_) => None,
            Err(_) => {
                debug!("telemetry read failed");
                None
            }
        }
    }

    fn write(&mut self, record: &TelemetryRecord) -> Result<(), B::Error> {
        self.ram.write(
            BackupRamKey::Telemetry,
            ItemVisibility::Public,
            &record.to_bytes(),
        )
    }

    /// Record the current battery temperature.
    ///
    /// Non-finite readings are ignored. Backup RAM is written only when the
    /// stored extremes change or no valid record exists yet.
    pub fn update_battery_temp(&mut self, temp_c: f32) -> Result<(), B::Error> {
        if !temp_c.is_finite() {
            return Ok(());
        }

        match self.read().filter(|r| r.initialized) {
            None => self.write(&TelemetryRecord::first(temp_c)),
            Some(mut record) => {
                if record.observe(temp_c) {
                    self.write(&record)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Stored `(min, max)` battery temperature, °C, if any.
    pub fn battery_temp_min_max(&mut self) -> Option<(f32, f32)> {
        self.read()
            .filter(|r| r.initialized)
            .map(|r| (r.min_temp_c, r.max_temp_c))
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use platform::mocks::MockBackupRam;

    fn telemetry() -> Telemetry<MockBackupRam> {
        Telemetry::new(MockBackupRam::new())
    }

    #[test]
    fn layout_is_little_endian() {
        let bytes = TelemetryRecord::first(1.0).to_bytes();
        assert_eq!(bytes[..4], [0x01, 0x00, 0x01, 0x00]);
        assert_eq!(bytes[4..8], 1.0_f32.to_le_bytes());
        assert_eq!(bytes[8..], 1.0_f32.to_le_bytes());
    }

    #[test]
    fn empty_store_has_no_data() {
        assert_eq!(telemetry().battery_temp_min_max(), None);
    }

    #[test]
    fn first_sample_sets_both_extremes() {
        let mut t = telemetry();
        assert!(t.update_battery_temp(21.5).is_ok());
        assert_eq!(t.battery_temp_min_max(), Some((21.5, 21.5)));
        assert_eq!(
            t.backup_ram().visibility(BackupRamKey::Telemetry),
            Some(ItemVisibility::Public)
        );
    }

    #[test]
    fn extremes_only_widen() {
        let mut t = telemetry();
        for temp in [20.0, 25.0, 15.0, 22.0, 30.0, 10.0, 12.0] {
            assert!(t.update_battery_temp(temp).is_ok());
        }
        assert_eq!(t.battery_temp_min_max(), Some((10.0, 30.0)));
    }

    #[test]
    fn unchanged_sample_does_not_write() {
        let mut t = telemetry();
        assert!(t.update_battery_temp(20.0).is_ok());
        assert!(t.update_battery_temp(25.0).is_ok());
        assert!(t.update_battery_temp(22.0).is_ok());
        assert!(t.update_battery_temp(25.0).is_ok());
        assert_eq!(t.backup_ram().write_count(), 2);
    }

    #[test]
    fn wrong_version_is_replaced() {
        let mut ram = MockBackupRam::new();
        let mut stale = TelemetryRecord::first(-40.0).to_bytes();
        stale[0] = 0x02;
        assert!(ram.write(BackupRamKey::Telemetry, ItemVisibility::Public, &stale).is_ok());

        let mut t = Telemetry::new(ram);
        assert_eq!(t.battery_temp_min_max(), None);
        assert!(t.update_battery_temp(5.0).is_ok());
        assert_eq!(t.battery_temp_min_max(), Some((5.0, 5.0)));
    }

    #[test]
    fn short_record_reads_as_no_data() {
        let mut ram = MockBackupRam::new();
        assert!(ram
            .write(BackupRamKey::Telemetry, ItemVisibility::Public, &[1, 0, 1, 0])
            .is_ok());
        let mut t = Telemetry::new(ram);
        assert_eq!(t.battery_temp_min_max(), None);
    }

    #[test]
    fn uninitialized_flag_reads_as_no_data() {
        let mut ram = MockBackupRam::new();
        let mut record = TelemetryRecord::first(3.0);
        record.initialized = false;
        assert!(ram
            .write(BackupRamKey::Telemetry, ItemVisibility::Public, &record.to_bytes())
            .is_ok());
        let mut t = Telemetry::new(ram);
        assert_eq!(t.battery_temp_min_max(), None);
        assert!(t.update_battery_temp(8.0).is_ok());
        assert_eq!(t.battery_temp_min_max(), Some((8.0, 8.0)));
    }

    #[test]
    fn read_failure_reads_as_no_data() {
        let mut t = telemetry();
        assert!(t.update_battery_temp(20.0).is_ok());
        let mut ram = t.into_inner();
        ram.set_fail_reads(true);
        let mut t = Telemetry::new(ram);
        assert_eq!(t.battery_temp_min_max(), None);
    }

    #[test]
    fn write_failure_is_reported() {
        let mut ram = MockBackupRam::new();
        ram.set_fail_writes(true);
        let mut t = Telemetry::new(ram);
        assert!(t.update_battery_temp(20.0).is_err());
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut t = telemetry();
        assert!(t.update_battery_temp(f32::NAN).is_ok());
        assert_eq!(t.backup_ram().write_count(), 0);
        assert!(t.update_battery_temp(20.0).is_ok());
        assert!(t.update_battery_temp(f32::INFINITY).is_ok());
        assert_eq!(t.battery_temp_min_max(), Some((20.0, 20.0)));
    }
}
