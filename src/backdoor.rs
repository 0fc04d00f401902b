//! Out-of-band setters used to simulate hardware-originated changes.
//!
//! These bypass the protocol grammar but write through [`Device::set`], so a
//! value set here reads back exactly like one set by a `SET:` command.

use tracing::debug;

use crate::device::Device;
use crate::error::{DeviceError, DeviceResult};
use crate::field::{ChannelAttr, Field, HeaterAttr, TextField};
use crate::registry::{ChannelId, PressureId, Probe, ValveId};
use crate::value::{Value, ValueKind};

/// Direct mutation handle over a borrowed [`Device`].
pub struct Backdoor<'a> {
    device: &'a mut Device,
}

impl<'a> Backdoor<'a> {
    pub fn new(device: &'a mut Device) -> Self {
        Self { device }
    }

    /// Sets a channel attribute by name (`enabled`, `temperature`, `resistance`,
    /// `excitation`, `pause` or `dwell`).
    pub fn set_channel_property(&mut self, index: u32, field: &str, value: Value) -> DeviceResult<()> {
        let id = ChannelId::new(index)?;
        let attr = ChannelAttr::from_name(field)
            .ok_or_else(|| DeviceError::not_found(format!("channel[{}].{}", index, field)))?;
        self.device.set(&Field::Channel(id, attr), value)
    }

    pub fn set_valve_state(&mut self, index: u32, open: bool) -> DeviceResult<()> {
        let id = ValveId::new(index)?;
        self.device.set(&Field::Valve(id), Value::Bool(open))
    }

    pub fn set_pressure(&mut self, sensor_id: u32, value: f64) -> DeviceResult<()> {
        let id = PressureId::new(sensor_id)?;
        self.device.set(&Field::Pressure(id), Value::Number(value))
    }

    pub fn set_probe_temperature(&mut self, probe_id: &str, value: f64) -> DeviceResult<()> {
        let probe = Probe::from_id(probe_id)?;
        self.device.set(&Field::Probe(probe), Value::Number(value))
    }

    pub fn set_heater_current(&mut self, value: f64) -> DeviceResult<()> {
        self.device.set(&Field::Heater(HeaterAttr::Current), Value::Number(value))
    }

    pub fn set_heater_range(&mut self, value: f64) -> DeviceResult<()> {
        self.device.set(&Field::Heater(HeaterAttr::Range), Value::Number(value))
    }

    pub fn set_heater_power(&mut self, value: f64) -> DeviceResult<()> {
        self.device.set(&Field::Heater(HeaterAttr::Power), Value::Number(value))
    }

    pub fn set_closed_loop(&mut self, closed: bool) -> DeviceResult<()> {
        self.device.set(&Field::ClosedLoop, Value::Bool(closed))
    }

    pub fn set_status(&mut self, status: &str) -> DeviceResult<()> {
        self.device.set(&Field::Text(TextField::Status), Value::from(status))
    }

    pub fn set_automation(&mut self, automation: &str) -> DeviceResult<()> {
        self.device.set(&Field::Text(TextField::Automation), Value::from(automation))
    }

    /// Runs a backdoor command line such as `set status Cooling  down`.
    ///
    /// The value of a `set` command is taken verbatim from the rest of the
    /// line, so its inner spacing survives. Other commands are split on
    /// whitespace and passed to [`Backdoor::execute`].
    pub fn execute_line(&mut self, line: &str) -> DeviceResult<()> {
        let line = line.trim();
        if let Some(("set", rest)) = line.split_once(char::is_whitespace) {
            debug!(line, "backdoor command");
            return match rest.trim_start().split_once(char::is_whitespace) {
                Some((attribute, raw)) => self.set_attribute(attribute, raw.trim_start()),
                None => Err(DeviceError::parse(line, "set needs an attribute and a value")),
            };
        }
        let args: Vec<&str> = line.split_whitespace().collect();
        self.execute(&args)
    }

    /// Runs a textual backdoor command, e.g.
    /// `["set_valve_state_backdoor", "3", "True"]` or `["set", "status", "Cooling"]`.
    ///
    /// The words of a `set` value are joined with single spaces; use
    /// [`Backdoor::execute_line`] to keep the original spacing.
    pub fn execute(&mut self, args: &[&str]) -> DeviceResult<()> {
        debug!(?args, "backdoor command");
        match args {
            ["set", attribute, words @ ..] if !words.is_empty() => {
                let raw = words.join(" ");
                self.set_attribute(attribute, &raw)
            }
            ["set_sensor_property_backdoor", index, field, value] => {
                let index = parse_index(index)?;
                let id = ChannelId::new(index)?;
                let attr = ChannelAttr::from_name(unquote(field))
                    .ok_or_else(|| DeviceError::not_found(format!("channel[{}].{}", index, field)))?;
                let field = Field::Channel(id, attr);
                let value = parse_literal(&field, value)?;
                self.device.set(&field, value)
            }
            ["set_valve_state_backdoor", index, state] => {
                let index = parse_index(index)?;
                let id = ValveId::new(index)?;
                let field = Field::Valve(id);
                let value = parse_literal(&field, state)?;
                self.device.set(&field, value)
            }
            ["set_pressure_backdoor", sensor, value] => {
                let id = PressureId::new(parse_index(sensor)?)?;
                let field = Field::Pressure(id);
                let value = parse_literal(&field, value)?;
                self.device.set(&field, value)
            }
            ["set_temperature_backdoor", probe, value] => {
                let field = Field::Probe(Probe::from_id(unquote(probe))?);
                let value = parse_literal(&field, value)?;
                self.device.set(&field, value)
            }
            _ => Err(DeviceError::parse(&args.join(" "), "unknown backdoor command")),
        }
    }

    // Attributes addressable with `set <attribute> <value>`.
    fn set_attribute(&mut self, attribute: &str, raw: &str) -> DeviceResult<()> {
        let field = match attribute {
            "heater_power" => Field::Heater(HeaterAttr::Power),
            "heater_current" => Field::Heater(HeaterAttr::Current),
            "heater_range" => Field::Heater(HeaterAttr::Range),
            "closed_loop" => Field::ClosedLoop,
            "status" => Field::Text(TextField::Status),
            "automation" => Field::Text(TextField::Automation),
            other => return Err(DeviceError::not_found(other)),
        };
        let value = parse_literal(&field, raw)?;
        self.device.set(&field, value)
    }
}

fn parse_index(text: &str) -> DeviceResult<u32> {
    text.parse()
        .map_err(|_| DeviceError::parse(text, "index must be a decimal number"))
}

// Strips one matched pair of surrounding quotes; anything else is kept as is.
fn unquote(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return inner;
        }
    }
    text
}

// Literals follow the simulation harness: `True`/`False` for booleans,
// optionally quoted strings for text.
fn parse_literal(field: &Field, text: &str) -> DeviceResult<Value> {
    let mismatch = || DeviceError::TypeMismatch {
        field: field.to_string(),
        expected: field.kind(),
        found: text.to_string(),
    };
    match field.kind() {
        ValueKind::Number => text.parse::<f64>().map(Value::Number).map_err(|_| mismatch()),
        ValueKind::Bool => match text {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        ValueKind::Text => Ok(Value::from(unquote(text))),
    }
}
