//! Fixed identifier sets for the addressable subsystems.
//!
//! Every identifier type validates on construction, so once a `ChannelId`,
//! `ValveId`, `PressureId` or `Probe` exists it always refers to real hardware.
//! Unknown indices are reported, never clamped.

use std::fmt;

use crate::error::{DeviceError, DeviceResult, SubsystemKind};

pub const CHANNEL_COUNT: usize = 6;
pub const VALVE_COUNT: usize = 10;

/// Pressure gauges fitted to the fridge. Gauge 4 is not present.
pub const PRESSURE_SENSORS: [u8; 4] = [1, 2, 3, 5];

/// A temperature sensor channel, index 0 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    pub fn new(index: u32) -> DeviceResult<Self> {
        if (index as usize) < CHANNEL_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(DeviceError::unknown(SubsystemKind::Channel, index.to_string()))
        }
    }

    /// Parses a decimal index. Non-numeric text is a grammar error, a number
    /// outside the fitted range is an unknown subsystem.
    pub fn parse(text: &str) -> DeviceResult<Self> {
        Self::new(parse_index(text)?)
    }

    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..CHANNEL_COUNT as u8).map(ChannelId)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

/// A gas-handling valve, index 1 to 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValveId(u8);

impl ValveId {
    pub fn new(index: u32) -> DeviceResult<Self> {
        if (1..=VALVE_COUNT as u32).contains(&index) {
            Ok(Self(index as u8))
        } else {
            Err(DeviceError::unknown(SubsystemKind::Valve, index.to_string()))
        }
    }

    pub fn parse(text: &str) -> DeviceResult<Self> {
        Self::new(parse_index(text)?)
    }

    pub fn all() -> impl Iterator<Item = ValveId> {
        (1..=VALVE_COUNT as u8).map(ValveId)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub(crate) fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

/// A pressure gauge from the sparse set {1, 2, 3, 5}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PressureId(u8);

impl PressureId {
    pub fn new(index: u32) -> DeviceResult<Self> {
        PRESSURE_SENSORS
            .iter()
            .find(|&&fitted| u32::from(fitted) == index)
            .map(|&fitted| Self(fitted))
            .ok_or_else(|| DeviceError::unknown(SubsystemKind::PressureSensor, index.to_string()))
    }

    pub fn parse(text: &str) -> DeviceResult<Self> {
        Self::new(parse_index(text)?)
    }

    pub fn all() -> impl Iterator<Item = PressureId> {
        PRESSURE_SENSORS.into_iter().map(PressureId)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub(crate) fn slot(self) -> usize {
        PRESSURE_SENSORS
            .iter()
            .position(|&fitted| fitted == self.0)
            .unwrap_or_default()
    }
}

/// Temperature probes, keyed by the controller's internal identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Still
    Stil,
    /// Mixing chamber
    Mc,
    /// Sorption pump
    Sorb,
    /// Pulse tube stage 1
    Pt1,
    /// Pulse tube stage 2
    Pt2,
}

impl Probe {
    pub const ALL: [Probe; 5] = [Probe::Stil, Probe::Mc, Probe::Sorb, Probe::Pt1, Probe::Pt2];

    pub fn id(self) -> &'static str {
        match self {
            Probe::Stil => "STIL",
            Probe::Mc => "MC",
            Probe::Sorb => "SORB",
            Probe::Pt1 => "PT1",
            Probe::Pt2 => "PT2",
        }
    }

    pub fn from_id(id: &str) -> DeviceResult<Self> {
        Self::ALL
            .into_iter()
            .find(|probe| probe.id() == id)
            .ok_or_else(|| DeviceError::unknown(SubsystemKind::Probe, id))
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

fn parse_index(text: &str) -> DeviceResult<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeviceError::parse(text, "index must be a decimal number"));
    }
    // All digits but too large for u32 is still a well-formed, unknown index.
    Ok(text.parse::<u32>().unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_cover_zero_to_five() {
        let ids: Vec<u8> = ChannelId::all().map(ChannelId::index).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert!(ChannelId::new(6).is_err());
    }

    #[test]
    fn valves_are_one_based() {
        assert!(ValveId::new(0).is_err());
        assert_eq!(ValveId::new(10).unwrap().slot(), 9);
        assert_eq!(ValveId::all().count(), VALVE_COUNT);
    }

    #[test]
    fn pressure_sensor_four_is_missing() {
        let err = PressureId::new(4).unwrap_err();
        assert_eq!(
            err,
            DeviceError::UnknownSubsystem {
                kind: SubsystemKind::PressureSensor,
                id: "4".into()
            }
        );
        assert_eq!(PressureId::new(5).unwrap().slot(), 3);
    }

    #[test]
    fn non_numeric_index_is_a_parse_error() {
        assert!(matches!(ChannelId::parse("x"), Err(DeviceError::Parse { .. })));
        assert!(matches!(ChannelId::parse(""), Err(DeviceError::Parse { .. })));
        assert!(matches!(
            ChannelId::parse("99999999999"),
            Err(DeviceError::UnknownSubsystem { .. })
        ));
    }

    #[test]
    fn probes_resolve_by_internal_id_only() {
        assert_eq!(Probe::from_id("PT1").unwrap(), Probe::Pt1);
        assert!(Probe::from_id("JTHX").is_err());
        assert!(Probe::from_id("mc").is_err());
    }
}
