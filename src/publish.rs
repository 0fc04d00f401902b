//! Boundary between the device and the process-variable publishing layer.
//!
//! Published names and display strings live here only. The device keys its
//! probes by internal identifier and stores raw booleans; this module owns the
//! rename (PT1 is published as JTHX, PT2 as 4KHX) and the `On`/`OPEN`/`ON`
//! style formatting.

use crate::device::Device;
use crate::error::{DeviceError, DeviceResult};
use crate::field::{ChannelAttr, Field, HeaterAttr, PidTerm, TextField};
use crate::registry::Probe;
use crate::text::is_native_string;
use crate::value::{Value, ValueKind};

/// Shown in place of a reading that cannot be computed.
pub const INVALID_READING: &str = "INVALID";

const PROBE_NAMES: [(Probe, &str); 5] = [
    (Probe::Stil, "STIL"),
    (Probe::Mc, "MC"),
    (Probe::Sorb, "SORB"),
    (Probe::Pt1, "JTHX"),
    (Probe::Pt2, "4KHX"),
];

pub fn published_probe_name(probe: Probe) -> &'static str {
    PROBE_NAMES
        .iter()
        .find(|(p, _)| *p == probe)
        .map(|(_, name)| *name)
        .unwrap_or_else(|| probe.id())
}

pub fn probe_from_published(name: &str) -> Option<Probe> {
    PROBE_NAMES
        .iter()
        .find(|(_, published)| *published == name)
        .map(|(probe, _)| *probe)
}

/// The published name of a field, e.g. `CHANNELS:T3:RES` or `JTHX:TEMP`.
pub fn pv_name(field: &Field) -> String {
    match field {
        Field::Pid(PidTerm::P) => "P".into(),
        Field::Pid(PidTerm::I) => "I".into(),
        Field::Pid(PidTerm::D) => "D".into(),
        Field::TemperatureSetpoint => "TEMP:SP".into(),
        Field::Heater(HeaterAttr::Range) => "HEATER:RANGE".into(),
        Field::Heater(HeaterAttr::Power) => "HEATER:POWER".into(),
        Field::Heater(HeaterAttr::Current) => "HEATER:CURR".into(),
        Field::HeaterPercentPower => "HEATER:PERCENT".into(),
        Field::ClosedLoop => "CLOSEDLOOP".into(),
        Field::Text(TextField::Status) => "STATUS".into(),
        Field::Text(TextField::Automation) => "AUTOMATION".into(),
        Field::Channel(id, attr) => {
            let suffix = match attr {
                ChannelAttr::Enabled => "STATE",
                ChannelAttr::Temperature => "TEMP",
                ChannelAttr::Resistance => "RES",
                ChannelAttr::Excitation => "EXCITATION",
                ChannelAttr::Pause => "PAUSE",
                ChannelAttr::Dwell => "DWELL",
            };
            format!("CHANNELS:T{}:{}", id.index(), suffix)
        }
        Field::Valve(id) => format!("VALVES:V{}:STATE", id.index()),
        Field::Pressure(id) => format!("PRESSURE:P{}", id.index()),
        Field::Probe(probe) => format!("{}:TEMP", published_probe_name(*probe)),
    }
}

/// Finds the field behind a published name.
pub fn resolve(pv: &str) -> DeviceResult<Field> {
    Field::all()
        .into_iter()
        .find(|field| pv_name(field) == pv)
        .ok_or_else(|| DeviceError::not_found(pv))
}

/// Record type a text value needs when published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRecord {
    /// Fits a native short string.
    Native,
    /// Too long for a native string; published as a character array.
    Waveform,
}

pub fn text_record(text: &str) -> TextRecord {
    if is_native_string(text) {
        TextRecord::Native
    } else {
        TextRecord::Waveform
    }
}

// Display words for boolean fields, as (true, false).
fn display_words(field: &Field) -> (&'static str, &'static str) {
    match field {
        Field::ClosedLoop => ("On", "Off"),
        Field::Valve(_) => ("OPEN", "CLOSED"),
        _ => ("ON", "OFF"),
    }
}

pub fn display(field: &Field, value: &Value) -> String {
    match value {
        Value::Bool(b) => {
            let (on, off) = display_words(field);
            String::from(if *b { on } else { off })
        }
        other => other.to_string(),
    }
}

pub fn parse_display(field: &Field, text: &str) -> DeviceResult<Value> {
    let mismatch = || DeviceError::TypeMismatch {
        field: field.to_string(),
        expected: field.kind(),
        found: text.to_string(),
    };
    match field.kind() {
        ValueKind::Number => text.parse::<f64>().map(Value::Number).map_err(|_| mismatch()),
        ValueKind::Bool => {
            let (on, off) = display_words(field);
            match text {
                t if t == on => Ok(Value::Bool(true)),
                t if t == off => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            }
        }
        ValueKind::Text => Ok(Value::from(text)),
    }
}

/// Reads a published value as display text. An uncomputable reading is shown
/// as [`INVALID_READING`] rather than failing.
pub fn read_pv(device: &Device, pv: &str) -> DeviceResult<String> {
    let field = resolve(pv)?;
    render(device, &field)
}

/// Writes a published value from its display text.
pub fn write_pv(device: &mut Device, pv: &str, text: &str) -> DeviceResult<()> {
    let field = resolve(pv)?;
    let value = parse_display(&field, text)?;
    device.set(&field, value)
}

/// Every published name with its current display text.
pub fn snapshot(device: &Device) -> Vec<(String, String)> {
    Field::all()
        .iter()
        .map(|field| {
            let shown = render(device, field).unwrap_or_else(|_| INVALID_READING.to_string());
            (pv_name(field), shown)
        })
        .collect()
}

fn render(device: &Device, field: &Field) -> DeviceResult<String> {
    match device.get(field) {
        Ok(value) => Ok(display(field, &value)),
        Err(DeviceError::DivisionByZero) => Ok(INVALID_READING.to_string()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backdoor::Backdoor;

    #[test]
    fn probe_rename_is_bidirectional() {
        for probe in Probe::ALL {
            assert_eq!(probe_from_published(published_probe_name(probe)), Some(probe));
        }
        assert_eq!(published_probe_name(Probe::Pt1), "JTHX");
        assert_eq!(published_probe_name(Probe::Pt2), "4KHX");
        assert_eq!(probe_from_published("PT1"), None);
    }

    #[test]
    fn every_field_has_a_unique_published_name() {
        let names: Vec<String> = Field::all().iter().map(pv_name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
        for field in Field::all() {
            assert_eq!(resolve(&pv_name(&field)).unwrap(), field);
        }
    }

    #[test]
    fn valves_display_open_and_closed() {
        let mut device = Device::default();
        for valve in 1..=10 {
            let pv = format!("VALVES:V{}:STATE", valve);
            for open in [false, true, false] {
                Backdoor::new(&mut device).set_valve_state(valve, open).unwrap();
                let expected = if open { "OPEN" } else { "CLOSED" };
                assert_eq!(read_pv(&device, &pv).unwrap(), expected);
            }
        }
    }

    #[test]
    fn closed_loop_displays_on_off() {
        let mut device = Device::default();
        for state in [false, true, false] {
            let text = if state { "On" } else { "Off" };
            write_pv(&mut device, "CLOSEDLOOP", text).unwrap();
            assert_eq!(read_pv(&device, "CLOSEDLOOP").unwrap(), text);
            assert_eq!(device.closed_loop(), state);
        }
        assert!(write_pv(&mut device, "CLOSEDLOOP", "ON").is_err());
    }

    #[test]
    fn renamed_probes_publish_under_new_names() {
        let mut device = Device::default();
        Backdoor::new(&mut device).set_probe_temperature("PT1", 5.4321).unwrap();
        Backdoor::new(&mut device).set_probe_temperature("PT2", 250.0).unwrap();
        assert_eq!(read_pv(&device, "JTHX:TEMP").unwrap(), "5.4321");
        assert_eq!(read_pv(&device, "4KHX:TEMP").unwrap(), "250");
        assert!(read_pv(&device, "PT1:TEMP").is_err());
    }

    #[test]
    fn long_text_needs_a_waveform_record() {
        let mut device = Device::default();
        let short_status = "Device status";
        let medium_status = "This is a device status that contains a bit more information";
        Backdoor::new(&mut device).set_status(short_status).unwrap();
        assert_eq!(text_record(&read_pv(&device, "STATUS").unwrap()), TextRecord::Native);
        Backdoor::new(&mut device).set_status(medium_status).unwrap();
        assert_eq!(text_record(&read_pv(&device, "STATUS").unwrap()), TextRecord::Waveform);
        assert_eq!(text_record(&"µ".repeat(39)), TextRecord::Native);
    }

    #[test]
    fn percent_fault_is_shown_as_invalid() {
        let device = Device::default();
        assert_eq!(read_pv(&device, "HEATER:PERCENT").unwrap(), INVALID_READING);
        let snapshot = snapshot(&device);
        assert!(snapshot
            .iter()
            .any(|(name, shown)| name == "HEATER:PERCENT" && shown == INVALID_READING));
        assert_eq!(snapshot.len(), Field::all().len());
    }
}
