//! The line-oriented command protocol.
//!
//! A line is `READ:<path>` or `SET:<path>:<value>`. Paths are colon-delimited
//! and case-sensitive, e.g. `SYS:DR:CHAN:MC` or `DEV:T3:TEMP:SIG:RES`.
//! Successful commands answer with a `STAT:` line echoing the request path
//! verbatim; failures answer with an `ERR:` line.

use tracing::{debug, warn};

use crate::device::Device;
use crate::error::{DeviceError, DeviceResult};
use crate::field::{ChannelAttr, Field, HeaterAttr, PidTerm, TextField};
use crate::registry::{ChannelId, PressureId, Probe, ValveId};
use crate::value::{Value, ValueKind};

// A parsed protocol line. The path is kept as the caller wrote it so the
// response can echo it exactly.
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Read { path: &'a str, field: Field },
    Set { path: &'a str, field: Field, value: &'a str },
}

/// Executes protocol commands against a borrowed [`Device`].
pub struct Dispatcher<'a> {
    device: &'a mut Device,
}

impl<'a> Dispatcher<'a> {
    pub fn new(device: &'a mut Device) -> Self {
        Self { device }
    }

    /// Reads the field at `path` and formats `STAT:<path>:<value>`.
    pub fn read(&self, path: &str) -> DeviceResult<String> {
        let field = resolve_exact(path)?;
        self.read_field(path, &field)
    }

    /// Writes `value` to the field at `path` and formats the acknowledgement.
    pub fn set(&mut self, path: &str, value: &str) -> DeviceResult<String> {
        let field = resolve_exact(path)?;
        self.execute(Command::Set { path, field, value })
    }

    /// Processes a full protocol line and returns the response.
    pub fn process_command(&mut self, line: &str) -> DeviceResult<String> {
        debug!(line, "dispatching command");
        let command = parse_command(line)?;
        self.execute(command)
    }

    /// Like [`Dispatcher::process_command`], but failures become an
    /// `ERR:<code>:<line>` response instead of an error.
    pub fn respond(&mut self, line: &str) -> String {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        match self.process_command(line) {
            Ok(response) => response,
            Err(err) => {
                warn!(line, error = %err, "command rejected");
                error_response(&err, line)
            }
        }
    }

    fn execute(&mut self, command: Command<'_>) -> DeviceResult<String> {
        match command {
            Command::Read { path, field } => self.read_field(path, &field),
            Command::Set { path, field, value } => {
                let parsed = parse_wire(&field, value)?;
                self.device.set(&field, parsed)?;
                Ok(format!("STAT:SET:{}:{}:VALID", path, value))
            }
        }
    }

    fn read_field(&self, path: &str, field: &Field) -> DeviceResult<String> {
        let value = self.device.get(field)?;
        Ok(format!("STAT:{}:{}", path, format_wire(field, &value)))
    }
}

/// Formats an error as a protocol response. Never begins with `STAT:`.
pub fn error_response(err: &DeviceError, line: &str) -> String {
    format!("ERR:{}:{}", err.code(), line)
}

fn parse_command(line: &str) -> DeviceResult<Command<'_>> {
    let (verb, rest) = line
        .split_once(':')
        .ok_or_else(|| DeviceError::parse(line, "expected READ: or SET:"))?;

    match verb {
        "READ" => Ok(Command::Read {
            path: rest,
            field: resolve_exact(rest)?,
        }),
        "SET" => {
            let tokens = tokenize(rest, true)?;
            // Only the segments before the first empty one can name the
            // field. An empty segment inside the path is malformed, as it
            // is for READ.
            let leading = tokens.iter().position(|t| t.is_empty()).unwrap_or(tokens.len());
            let (field, used) = match resolve(&tokens[..leading], rest) {
                Ok(resolved) => resolved,
                Err(_) if leading < tokens.len().min(MAX_PATH_SEGMENTS) => {
                    return Err(DeviceError::parse(rest, "empty segment"));
                }
                Err(err) => return Err(err),
            };
            if tokens.len() == used {
                return Err(DeviceError::parse(line, "SET without a value"));
            }
            // The path is a prefix of `rest`; the value is everything after
            // the separating colon and may itself contain colons.
            let path_len = tokens[..used].iter().map(|t| t.len()).sum::<usize>() + used - 1;
            Ok(Command::Set {
                path: &rest[..path_len],
                field,
                value: &rest[path_len + 1..],
            })
        }
        _ => Err(DeviceError::parse(line, "expected READ: or SET:")),
    }
}

// Resolves a path that must consist only of field tokens.
fn resolve_exact(path: &str) -> DeviceResult<Field> {
    let tokens = tokenize(path, false)?;
    let (field, used) = resolve(&tokens, path)?;
    if used != tokens.len() {
        return Err(DeviceError::parse(path, "unexpected trailing segments"));
    }
    Ok(field)
}

fn tokenize(path: &str, allow_empty: bool) -> DeviceResult<Vec<&str>> {
    if path.is_empty() {
        return Err(DeviceError::parse(path, "empty path"));
    }
    let tokens: Vec<&str> = path.split(':').collect();
    if !allow_empty {
        check_segments(&tokens, path)?;
    }
    Ok(tokens)
}

fn check_segments(tokens: &[&str], path: &str) -> DeviceResult<()> {
    if tokens.iter().any(|t| t.is_empty()) {
        return Err(DeviceError::parse(path, "empty segment"));
    }
    Ok(())
}

// No field path is longer than this many segments.
const MAX_PATH_SEGMENTS: usize = 5;

/// Walks the leading tokens of a path and returns the field they name along
/// with the number of tokens consumed.
fn resolve(tokens: &[&str], path: &str) -> DeviceResult<(Field, usize)> {
    let not_found = || DeviceError::not_found(path);

    let resolved = match tokens {
        ["DEV", "TEMP", "LOOP", term, ..] => {
            let field = match *term {
                "P" => Field::Pid(PidTerm::P),
                "I" => Field::Pid(PidTerm::I),
                "D" => Field::Pid(PidTerm::D),
                "TSET" => Field::TemperatureSetpoint,
                "MODE" => Field::ClosedLoop,
                _ => return Err(not_found()),
            };
            (field, 4)
        }
        ["DEV", "H1", "HTR", "RANGE", ..] => (Field::Heater(HeaterAttr::Range), 4),
        ["DEV", "H1", "HTR", "SIG", signal, ..] => {
            let field = match *signal {
                "POWR" => Field::Heater(HeaterAttr::Power),
                "CURR" => Field::Heater(HeaterAttr::Current),
                "PCNT" => Field::HeaterPercentPower,
                _ => return Err(not_found()),
            };
            (field, 5)
        }
        ["DEV", unit, rest @ ..] => (resolve_unit(unit, rest, path)?, 5),
        ["SYS", "DR", "CHAN", probe, ..] => (Field::Probe(Probe::from_id(probe)?), 4),
        ["SYS", "DR", "STATUS", ..] => (Field::Text(TextField::Status), 3),
        ["SYS", "DR", "ACTN", ..] => (Field::Text(TextField::Automation), 3),
        ["DEV" | "SYS", ..] => return Err(not_found()),
        _ => return Err(DeviceError::parse(path, "unknown root segment")),
    };
    Ok(resolved)
}

// Resolves `T<n>`, `V<n>` and `P<n>` units followed by exactly three
// attribute tokens.
fn resolve_unit(unit: &str, rest: &[&str], path: &str) -> DeviceResult<Field> {
    let not_found = || DeviceError::not_found(path);
    let attr = match rest {
        [a, b, c, ..] => (*a, *b, *c),
        _ => return Err(not_found()),
    };

    if let Some(index) = unit.strip_prefix('T') {
        let id = ChannelId::parse(index)?;
        let attr = match attr {
            ("TEMP", "MEAS", "ENAB") => ChannelAttr::Enabled,
            ("TEMP", "SIG", "TEMP") => ChannelAttr::Temperature,
            ("TEMP", "SIG", "RES") => ChannelAttr::Resistance,
            ("TEMP", "EXCT", "MAG") => ChannelAttr::Excitation,
            ("TEMP", "MEAS", "PAUS") => ChannelAttr::Pause,
            ("TEMP", "MEAS", "DWEL") => ChannelAttr::Dwell,
            _ => return Err(not_found()),
        };
        return Ok(Field::Channel(id, attr));
    }
    if let Some(index) = unit.strip_prefix('V') {
        let id = ValveId::parse(index)?;
        return match attr {
            ("VALV", "SIG", "STATE") => Ok(Field::Valve(id)),
            _ => Err(not_found()),
        };
    }
    if let Some(index) = unit.strip_prefix('P') {
        let id = PressureId::parse(index)?;
        return match attr {
            ("PRES", "SIG", "PRES") => Ok(Field::Pressure(id)),
            _ => Err(not_found()),
        };
    }
    Err(not_found())
}

// On-wire words for boolean fields, as (true, false).
fn bool_words(field: &Field) -> (&'static str, &'static str) {
    match field {
        Field::Valve(_) => ("OPEN", "CLOSE"),
        _ => ("ON", "OFF"),
    }
}

fn format_wire(field: &Field, value: &Value) -> String {
    match value {
        Value::Bool(b) => {
            let (on, off) = bool_words(field);
            String::from(if *b { on } else { off })
        }
        // Line breaks would split the response on a line-framed transport.
        Value::Text(text) => text.replace('\r', "\\r").replace('\n', "\\n"),
        other => other.to_string(),
    }
}

fn parse_wire(field: &Field, text: &str) -> DeviceResult<Value> {
    let mismatch = || DeviceError::TypeMismatch {
        field: field.to_string(),
        expected: field.kind(),
        found: text.to_string(),
    };

    match field.kind() {
        ValueKind::Number => text.parse::<f64>().map(Value::Number).map_err(|_| mismatch()),
        ValueKind::Bool => {
            let (on, off) = bool_words(field);
            match text {
                t if t == on => Ok(Value::Bool(true)),
                t if t == off => Ok(Value::Bool(false)),
                _ => Err(mismatch()),
            }
        }
        ValueKind::Text => Ok(Value::Text(text.to_string())),
    }
}
