//! The simulated controller and its value store.
//!
//! [`Device`] owns every subsystem. All writes, whether they come from the
//! command protocol, the backdoor or the publishing layer, go through
//! [`Device::set`], which validates the value before the single write.

use tracing::debug;

use crate::derived;
use crate::error::{DeviceError, DeviceResult};
use crate::field::{ChannelAttr, Field, HeaterAttr, PidTerm, TextField};
use crate::registry::{ChannelId, PressureId, Probe, ValveId, CHANNEL_COUNT, PRESSURE_SENSORS, VALVE_COUNT};
use crate::text::{self, TextLimit};
use crate::value::Value;

// Gains of the temperature control loop.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pid {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

// Heater output stage.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Heater {
    pub range: f64,
    pub power: f64,
    pub current: f64,
}

// One temperature sensor channel on the resistance bridge.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Channel {
    pub enabled: bool,
    pub temperature: f64,
    pub resistance: f64,
    pub excitation: f64,
    // Scan timing
    pub pause: f64,
    pub dwell: f64,
}

/// Construction-time settings for a [`Device`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub text_limit: TextLimit,
}

// The main struct that holds the entire state of the simulated fridge controller.
#[derive(Debug, Clone)]
pub struct Device {
    pid: Pid,
    temperature_setpoint: f64,
    heater: Heater,
    closed_loop: bool,
    status: String,
    automation: String,
    channels: [Channel; CHANNEL_COUNT],
    // Indexed by valve number minus one.
    valves: [bool; VALVE_COUNT],
    // Same order as PRESSURE_SENSORS.
    pressures: [f64; PRESSURE_SENSORS.len()],
    probes: [f64; Probe::ALL.len()],
    config: DeviceConfig,
}

impl Default for Device {
    fn default() -> Self {
        Self::new(DeviceConfig::default())
    }
}

impl Device {
    /// Creates a device with every field zeroed, switched off or empty.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            pid: Pid::default(),
            temperature_setpoint: 0.0,
            heater: Heater::default(),
            closed_loop: false,
            status: String::new(),
            automation: String::new(),
            channels: Default::default(),
            valves: [false; VALVE_COUNT],
            pressures: [0.0; PRESSURE_SENSORS.len()],
            probes: [0.0; Probe::ALL.len()],
            config,
        }
    }

    pub fn config(&self) -> DeviceConfig {
        self.config
    }

    /// Reads a field. Text fields are returned as their bounded projection and
    /// the heater percent power is computed on demand.
    pub fn get(&self, field: &Field) -> DeviceResult<Value> {
        let value = match *field {
            Field::Pid(term) => Value::Number(match term {
                PidTerm::P => self.pid.p,
                PidTerm::I => self.pid.i,
                PidTerm::D => self.pid.d,
            }),
            Field::TemperatureSetpoint => Value::Number(self.temperature_setpoint),
            Field::Heater(attr) => Value::Number(match attr {
                HeaterAttr::Range => self.heater.range,
                HeaterAttr::Power => self.heater.power,
                HeaterAttr::Current => self.heater.current,
            }),
            Field::HeaterPercentPower => Value::Number(self.heater_percent_power()?),
            Field::ClosedLoop => Value::Bool(self.closed_loop),
            Field::Text(which) => Value::Text(self.text(which).to_string()),
            Field::Channel(id, attr) => {
                let channel = &self.channels[id.slot()];
                match attr {
                    ChannelAttr::Enabled => Value::Bool(channel.enabled),
                    ChannelAttr::Temperature => Value::Number(channel.temperature),
                    ChannelAttr::Resistance => Value::Number(channel.resistance),
                    ChannelAttr::Excitation => Value::Number(channel.excitation),
                    ChannelAttr::Pause => Value::Number(channel.pause),
                    ChannelAttr::Dwell => Value::Number(channel.dwell),
                }
            }
            Field::Valve(id) => Value::Bool(self.valves[id.slot()]),
            Field::Pressure(id) => Value::Number(self.pressures[id.slot()]),
            Field::Probe(probe) => Value::Number(self.probes[probe.slot()]),
        };
        Ok(value)
    }

    /// Replaces a field's value. On error the device is left unchanged.
    pub fn set(&mut self, field: &Field, value: Value) -> DeviceResult<()> {
        if field.is_derived() {
            return Err(DeviceError::ReadOnly {
                field: field.to_string(),
            });
        }
        if value.kind() != field.kind() {
            return Err(DeviceError::TypeMismatch {
                field: field.to_string(),
                expected: field.kind(),
                found: value.to_string(),
            });
        }
        debug!(%field, %value, "field updated");

        match (*field, value) {
            (Field::Pid(term), Value::Number(n)) => match term {
                PidTerm::P => self.pid.p = n,
                PidTerm::I => self.pid.i = n,
                PidTerm::D => self.pid.d = n,
            },
            (Field::TemperatureSetpoint, Value::Number(n)) => self.temperature_setpoint = n,
            (Field::Heater(attr), Value::Number(n)) => match attr {
                HeaterAttr::Range => self.heater.range = n,
                HeaterAttr::Power => self.heater.power = n,
                HeaterAttr::Current => self.heater.current = n,
            },
            (Field::ClosedLoop, Value::Bool(b)) => self.closed_loop = b,
            (Field::Text(TextField::Status), Value::Text(s)) => self.status = s,
            (Field::Text(TextField::Automation), Value::Text(s)) => self.automation = s,
            (Field::Channel(id, ChannelAttr::Enabled), Value::Bool(b)) => {
                self.channels[id.slot()].enabled = b
            }
            (Field::Channel(id, attr), Value::Number(n)) => {
                let channel = &mut self.channels[id.slot()];
                match attr {
                    ChannelAttr::Temperature => channel.temperature = n,
                    ChannelAttr::Resistance => channel.resistance = n,
                    ChannelAttr::Excitation => channel.excitation = n,
                    ChannelAttr::Pause => channel.pause = n,
                    ChannelAttr::Dwell => channel.dwell = n,
                    // Kind was checked above; enabled only takes a bool.
                    ChannelAttr::Enabled => {}
                }
            }
            (Field::Valve(id), Value::Bool(open)) => self.valves[id.slot()] = open,
            (Field::Pressure(id), Value::Number(n)) => self.pressures[id.slot()] = n,
            (Field::Probe(probe), Value::Number(n)) => self.probes[probe.slot()] = n,
            // Every remaining combination was rejected by the kind check.
            _ => {}
        }
        Ok(())
    }

    /// Reads a field by its logical path, e.g. `channel[3].resistance`.
    pub fn get_value(&self, path: &str) -> DeviceResult<Value> {
        self.get(&path.parse()?)
    }

    /// Writes a field by its logical path, e.g. `valve[7].open`.
    pub fn set_value(&mut self, path: &str, value: Value) -> DeviceResult<()> {
        self.set(&path.parse()?, value)
    }

    pub fn heater_percent_power(&self) -> DeviceResult<f64> {
        derived::heater_percent_power(&self.heater)
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn temperature_setpoint(&self) -> f64 {
        self.temperature_setpoint
    }

    pub fn heater(&self) -> &Heater {
        &self.heater
    }

    pub fn closed_loop(&self) -> bool {
        self.closed_loop
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.slot()]
    }

    pub fn valve_open(&self, id: ValveId) -> bool {
        self.valves[id.slot()]
    }

    pub fn pressure(&self, id: PressureId) -> f64 {
        self.pressures[id.slot()]
    }

    pub fn probe_temperature(&self, probe: Probe) -> f64 {
        self.probes[probe.slot()]
    }

    /// The full stored status, without projection.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The full stored automation text, without projection.
    pub fn automation(&self) -> &str {
        &self.automation
    }

    fn text(&self, which: TextField) -> &str {
        let stored = match which {
            TextField::Status => &self.status,
            TextField::Automation => &self.automation,
        };
        text::project(stored, self.config.text_limit)
    }
}
