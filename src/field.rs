//! Resolved references to individual device fields.
//!
//! Both the wire protocol and the logical store paths (`channel[3].resistance`,
//! `valve[7].open`, `heater.range`, ...) resolve to a [`Field`], so every
//! access path is checked exhaustively against the same set of subsystems.

use std::fmt;
use std::str::FromStr;

use crate::error::{DeviceError, DeviceResult};
use crate::registry::{ChannelId, PressureId, Probe, ValveId};
use crate::value::ValueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PidTerm {
    P,
    I,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaterAttr {
    Range,
    Power,
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelAttr {
    Enabled,
    Temperature,
    Resistance,
    Excitation,
    Pause,
    Dwell,
}

impl ChannelAttr {
    pub const ALL: [ChannelAttr; 6] = [
        ChannelAttr::Enabled,
        ChannelAttr::Temperature,
        ChannelAttr::Resistance,
        ChannelAttr::Excitation,
        ChannelAttr::Pause,
        ChannelAttr::Dwell,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChannelAttr::Enabled => "enabled",
            ChannelAttr::Temperature => "temperature",
            ChannelAttr::Resistance => "resistance",
            ChannelAttr::Excitation => "excitation",
            ChannelAttr::Pause => "pause",
            ChannelAttr::Dwell => "dwell",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Status,
    Automation,
}

/// One addressable field of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Pid(PidTerm),
    TemperatureSetpoint,
    Heater(HeaterAttr),
    /// Computed from heater current and range, never stored.
    HeaterPercentPower,
    ClosedLoop,
    Text(TextField),
    Channel(ChannelId, ChannelAttr),
    Valve(ValveId),
    Pressure(PressureId),
    Probe(Probe),
}

impl Field {
    pub fn kind(&self) -> ValueKind {
        match self {
            Field::ClosedLoop | Field::Valve(_) | Field::Channel(_, ChannelAttr::Enabled) => {
                ValueKind::Bool
            }
            Field::Text(_) => ValueKind::Text,
            _ => ValueKind::Number,
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Field::HeaterPercentPower)
    }

    /// Every field the device exposes, in a stable order.
    pub fn all() -> Vec<Field> {
        let mut fields = vec![
            Field::Pid(PidTerm::P),
            Field::Pid(PidTerm::I),
            Field::Pid(PidTerm::D),
            Field::TemperatureSetpoint,
            Field::Heater(HeaterAttr::Range),
            Field::Heater(HeaterAttr::Power),
            Field::Heater(HeaterAttr::Current),
            Field::HeaterPercentPower,
            Field::ClosedLoop,
            Field::Text(TextField::Status),
            Field::Text(TextField::Automation),
        ];
        for channel in ChannelId::all() {
            fields.extend(ChannelAttr::ALL.map(|attr| Field::Channel(channel, attr)));
        }
        fields.extend(ValveId::all().map(Field::Valve));
        fields.extend(PressureId::all().map(Field::Pressure));
        fields.extend(Probe::ALL.map(Field::Probe));
        fields
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Pid(PidTerm::P) => f.write_str("pid.p"),
            Field::Pid(PidTerm::I) => f.write_str("pid.i"),
            Field::Pid(PidTerm::D) => f.write_str("pid.d"),
            Field::TemperatureSetpoint => f.write_str("temperature_setpoint"),
            Field::Heater(HeaterAttr::Range) => f.write_str("heater.range"),
            Field::Heater(HeaterAttr::Power) => f.write_str("heater.power"),
            Field::Heater(HeaterAttr::Current) => f.write_str("heater.current"),
            Field::HeaterPercentPower => f.write_str("heater.percent_power"),
            Field::ClosedLoop => f.write_str("closed_loop"),
            Field::Text(TextField::Status) => f.write_str("status"),
            Field::Text(TextField::Automation) => f.write_str("automation"),
            Field::Channel(id, attr) => write!(f, "channel[{}].{}", id.index(), attr.name()),
            Field::Valve(id) => write!(f, "valve[{}].open", id.index()),
            Field::Pressure(id) => write!(f, "pressure[{}].pressure", id.index()),
            Field::Probe(probe) => write!(f, "probe[{}].temperature", probe.id()),
        }
    }
}

impl FromStr for Field {
    type Err = DeviceError;

    fn from_str(path: &str) -> DeviceResult<Self> {
        let (head, attr) = match path.split_once('.') {
            Some((head, attr)) => (head, Some(attr)),
            None => (path, None),
        };

        let (name, key) = match head.split_once('[') {
            Some((name, rest)) => {
                let key = rest
                    .strip_suffix(']')
                    .ok_or_else(|| DeviceError::parse(path, "unterminated '['"))?;
                (name, Some(key))
            }
            None => (head, None),
        };

        let missing = || DeviceError::not_found(path);

        let field = match (name, key, attr) {
            ("pid", None, Some("p")) => Field::Pid(PidTerm::P),
            ("pid", None, Some("i")) => Field::Pid(PidTerm::I),
            ("pid", None, Some("d")) => Field::Pid(PidTerm::D),
            ("temperature_setpoint", None, None) => Field::TemperatureSetpoint,
            ("heater", None, Some("range")) => Field::Heater(HeaterAttr::Range),
            ("heater", None, Some("power")) => Field::Heater(HeaterAttr::Power),
            ("heater", None, Some("current")) => Field::Heater(HeaterAttr::Current),
            ("heater", None, Some("percent_power")) => Field::HeaterPercentPower,
            ("closed_loop", None, None) => Field::ClosedLoop,
            ("status", None, None) => Field::Text(TextField::Status),
            ("automation", None, None) => Field::Text(TextField::Automation),
            ("channel", Some(key), Some(attr)) => {
                let id = ChannelId::parse(key)?;
                Field::Channel(id, ChannelAttr::from_name(attr).ok_or_else(missing)?)
            }
            ("valve", Some(key), Some(attr)) => {
                let id = ValveId::parse(key)?;
                if attr != "open" {
                    return Err(missing());
                }
                Field::Valve(id)
            }
            ("pressure", Some(key), Some(attr)) => {
                let id = PressureId::parse(key)?;
                if attr != "pressure" {
                    return Err(missing());
                }
                Field::Pressure(id)
            }
            ("probe", Some(key), Some(attr)) => {
                let probe = Probe::from_id(key)?;
                if attr != "temperature" {
                    return Err(missing());
                }
                Field::Probe(probe)
            }
            _ => return Err(missing()),
        };
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubsystemKind;

    #[test]
    fn every_field_parses_back_from_its_path() {
        for field in Field::all() {
            let path = field.to_string();
            assert_eq!(path.parse::<Field>().unwrap(), field, "{}", path);
        }
    }

    #[test]
    fn known_paths_resolve() {
        let id = ChannelId::new(3).unwrap();
        assert_eq!(
            "channel[3].resistance".parse::<Field>().unwrap(),
            Field::Channel(id, ChannelAttr::Resistance)
        );
        assert_eq!(
            "valve[7].open".parse::<Field>().unwrap(),
            Field::Valve(ValveId::new(7).unwrap())
        );
        assert_eq!(
            "heater.range".parse::<Field>().unwrap(),
            Field::Heater(HeaterAttr::Range)
        );
    }

    #[test]
    fn unknown_index_differs_from_unknown_field() {
        assert_eq!(
            "channel[6].resistance".parse::<Field>().unwrap_err(),
            DeviceError::UnknownSubsystem {
                kind: SubsystemKind::Channel,
                id: "6".into()
            }
        );
        assert_eq!(
            "channel[2].colour".parse::<Field>().unwrap_err(),
            DeviceError::NotFound {
                path: "channel[2].colour".into()
            }
        );
        assert!(matches!(
            "probe[JTHX].temperature".parse::<Field>(),
            Err(DeviceError::UnknownSubsystem { .. })
        ));
    }

    #[test]
    fn malformed_paths_are_parse_errors() {
        assert!(matches!(
            "channel[2.enabled".parse::<Field>(),
            Err(DeviceError::Parse { .. })
        ));
        assert!(matches!(
            "valve[a].open".parse::<Field>(),
            Err(DeviceError::Parse { .. })
        ));
    }

    #[test]
    fn field_kinds() {
        assert_eq!(Field::ClosedLoop.kind(), ValueKind::Bool);
        assert_eq!(Field::Text(TextField::Status).kind(), ValueKind::Text);
        assert_eq!(Field::HeaterPercentPower.kind(), ValueKind::Number);
        assert!(Field::HeaterPercentPower.is_derived());
        assert_eq!(Field::all().len(), 11 + 36 + 10 + 4 + 5);
    }
}
