//! A cloneable handle for using one [`Device`] from several threads.
//!
//! Each call holds the lock for exactly one field read, one field write, one
//! protocol line or one backdoor batch, so pollers never observe a torn field.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backdoor::Backdoor;
use crate::device::{Device, DeviceConfig};
use crate::error::DeviceResult;
use crate::protocol::Dispatcher;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct SharedDevice {
    inner: Arc<RwLock<Device>>,
}

impl SharedDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self::from_device(Device::new(config))
    }

    pub fn from_device(device: Device) -> Self {
        Self {
            inner: Arc::new(RwLock::new(device)),
        }
    }

    pub fn get_value(&self, path: &str) -> DeviceResult<Value> {
        self.read().get_value(path)
    }

    pub fn set_value(&self, path: &str, value: Value) -> DeviceResult<()> {
        self.write().set_value(path, value)
    }

    /// Runs one protocol line and returns the `STAT:` or `ERR:` response.
    pub fn respond(&self, line: &str) -> String {
        let mut device = self.write();
        Dispatcher::new(&mut device).respond(line)
    }

    /// Runs `f` against the backdoor while holding the write lock.
    pub fn with_backdoor<T>(&self, f: impl FnOnce(&mut Backdoor<'_>) -> T) -> T {
        let mut device = self.write();
        f(&mut Backdoor::new(&mut device))
    }

    /// Runs `f` with shared access, e.g. to take a consistent snapshot.
    pub fn inspect<T>(&self, f: impl FnOnce(&Device) -> T) -> T {
        let device = self.read();
        f(&*device)
    }

    // Writes are single-field and validated first, so a panicking holder
    // cannot leave the device half-updated.
    fn read(&self) -> RwLockReadGuard<'_, Device> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Device> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_share_one_device() {
        let shared = SharedDevice::default();
        let other = shared.clone();
        other.set_value("valve[4].open", Value::Bool(true)).unwrap();
        assert_eq!(shared.get_value("valve[4].open").unwrap(), Value::Bool(true));
    }

    #[test]
    fn concurrent_writers_never_tear_a_field() {
        let shared = SharedDevice::default();
        let writers: Vec<_> = [0.316, 1000.0]
            .into_iter()
            .map(|range| {
                let handle = shared.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        handle.with_backdoor(|b| b.set_heater_range(range)).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..500 {
            let range = shared.get_value("heater.range").unwrap().as_number().unwrap();
            assert!(range == 0.0 || range == 0.316 || range == 1000.0);
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }

    #[test]
    fn protocol_and_backdoor_share_state() {
        let shared = SharedDevice::default();
        assert_eq!(
            shared.respond("SET:DEV:T1:TEMP:MEAS:ENAB:ON"),
            "STAT:SET:DEV:T1:TEMP:MEAS:ENAB:ON:VALID"
        );
        assert_eq!(
            shared.get_value("channel[1].enabled").unwrap(),
            Value::Bool(true)
        );
        shared
            .with_backdoor(|b| b.set_channel_property(1, "enabled", Value::Bool(false)))
            .unwrap();
        assert_eq!(
            shared.respond("READ:DEV:T1:TEMP:MEAS:ENAB"),
            "STAT:DEV:T1:TEMP:MEAS:ENAB:OFF"
        );
        assert!(!shared.inspect(|d| d.channel(crate::ChannelId::new(1).unwrap()).enabled));
    }
}
