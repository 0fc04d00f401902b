use proptest::prelude::*;
use triton_sim::{ChannelAttr, ChannelId, Device, Dispatcher, Field, Value};

const NUMERIC_ATTRS: [(ChannelAttr, &str); 5] = [
    (ChannelAttr::Temperature, "TEMP:SIG:TEMP"),
    (ChannelAttr::Resistance, "TEMP:SIG:RES"),
    (ChannelAttr::Excitation, "TEMP:EXCT:MAG"),
    (ChannelAttr::Pause, "TEMP:MEAS:PAUS"),
    (ChannelAttr::Dwell, "TEMP:MEAS:DWEL"),
];

proptest! {
    #[test]
    fn channel_values_round_trip(
        chan in 0u32..6,
        attr in 0usize..NUMERIC_ATTRS.len(),
        value in -1e9_f64..1e9_f64,
    ) {
        let mut device = Device::default();
        let (attr, suffix) = NUMERIC_ATTRS[attr];
        let field = Field::Channel(ChannelId::new(chan).unwrap(), attr);

        device.set(&field, Value::Number(value)).unwrap();
        prop_assert_eq!(device.get(&field).unwrap(), Value::Number(value));

        // The wire text must parse back to exactly the stored value.
        let path = format!("DEV:T{}:{}", chan, suffix);
        let response = Dispatcher::new(&mut device).read(&path).unwrap();
        let prefix = format!("STAT:{}:", path);
        prop_assert!(response.starts_with(&prefix));
        let shown: f64 = response[prefix.len()..].parse().unwrap();
        prop_assert_eq!(shown, value);
    }

    #[test]
    fn protocol_set_matches_store(chan in 0u32..6, value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let mut device = Device::default();
        let path = format!("DEV:T{}:TEMP:SIG:TEMP", chan);
        Dispatcher::new(&mut device).set(&path, &value.to_string()).unwrap();
        let stored = device
            .get_value(&format!("channel[{}].temperature", chan))
            .unwrap();
        prop_assert_eq!(stored, Value::Number(value));
    }

    #[test]
    fn status_projection_is_a_prefix(status in ".{0,2000}") {
        let mut device = Device::default();
        device.set_value("status", Value::Text(status.clone())).unwrap();
        let shown = device.get_value("status").unwrap();
        let shown = shown.as_text().unwrap();
        prop_assert!(status.starts_with(shown));
        prop_assert_eq!(shown.chars().count(), status.chars().count().min(1024));
    }

    #[test]
    fn rejected_lines_never_look_like_stat(line in "[A-Z:0-9]{0,30}") {
        let mut device = Device::default();
        let mut dispatcher = Dispatcher::new(&mut device);
        match dispatcher.process_command(&line) {
            Ok(response) => prop_assert!(response.starts_with("STAT:")),
            Err(_) => prop_assert!(dispatcher.respond(&line).starts_with("ERR:")),
        }
    }
}
