//! # Triton Simulator Library
//!
//! This library contains the core logic for simulating an Oxford Instruments
//! Triton dilution refrigerator controller. It manages the internal state of
//! the simulated hardware and processes `READ:`/`SET:` commands against that
//! state, returning `STAT:` responses in the format the real controller uses.
//!
//! ```
//! use triton_sim::{Device, Dispatcher};
//!
//! let mut device = Device::default();
//! let mut dispatcher = Dispatcher::new(&mut device);
//! dispatcher.respond("SET:DEV:TEMP:LOOP:P:123.45");
//! assert_eq!(dispatcher.respond("READ:DEV:TEMP:LOOP:P"), "STAT:DEV:TEMP:LOOP:P:123.45");
//! ```

pub mod backdoor;
pub mod derived;
pub mod device;
pub mod error;
pub mod field;
pub mod protocol;
pub mod publish;
pub mod registry;
pub mod shared;
pub mod text;
pub mod value;

pub use backdoor::Backdoor;
pub use device::{Channel, Device, DeviceConfig, Heater, Pid};
pub use error::{DeviceError, DeviceResult, SubsystemKind};
pub use field::{ChannelAttr, Field, HeaterAttr, PidTerm, TextField};
pub use protocol::Dispatcher;
pub use registry::{ChannelId, PressureId, Probe, ValveId};
pub use shared::SharedDevice;
pub use text::TextLimit;
pub use value::{Value, ValueKind};
