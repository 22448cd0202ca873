// decoder.rs
use serde_json::Value;

use crate::{
    error::DecodeError,
    models::{DevicePayload, DeviceType, Packet},
};

/// Decodes a raw packet into a typed payload.
///
/// The `device_type` discriminator is resolved before the variant fields are
/// parsed, so an unsupported device type is reported as
/// [`DecodeError::UnknownDeviceType`] rather than as a generic parse failure.
pub fn decode(raw: &str) -> Result<DevicePayload, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::Malformed)?;

    let tag = value
        .pointer("/payload/device_type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingDeviceType)?;
    let device_type =
        DeviceType::from_tag(tag).ok_or_else(|| DecodeError::UnknownDeviceType(tag.to_string()))?;

    let packet: Packet = serde_json::from_value(value)
        .map_err(|source| DecodeError::InvalidPayload { device_type, source })?;

    Ok(packet.into_payload())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Reading, utils::parse_timestamp};
    use chrono::Utc;
    use serde_json::json;

    const DEVICE_ID: &str = "5b0a3b5e-8c1e-4d4f-9d55-1f0c2b6e9a01";

    fn packet(payload: Value) -> Value {
        json!({
            "device_id": DEVICE_ID,
            "timestamp": "2024-05-01T12:30:00.125Z",
            "payload": payload,
        })
    }

    fn assert_round_trip(original: Value) {
        let payload = decode(&original.to_string()).expect("decodes");
        let timestamp = parse_timestamp(original["timestamp"].as_str().unwrap()).unwrap();
        let encoded = serde_json::to_value(Packet::new(payload, timestamp)).unwrap();

        assert_eq!(encoded["device_id"], original["device_id"]);
        assert_eq!(encoded["payload"], original["payload"]);
        let reencoded_ts = parse_timestamp(encoded["timestamp"].as_str().unwrap()).unwrap();
        assert_eq!(reencoded_ts, timestamp);
    }

    #[test]
    fn thermostat_round_trip() {
        assert_round_trip(packet(json!({
            "device_type": "THERMOSTAT",
            "name": "Living Room Thermostat",
            "location": "living_room",
            "current_temp": 21.5,
            "target_temp": 23.0,
            "humidity": 41.25,
        })));
    }

    #[test]
    fn bulb_round_trip() {
        assert_round_trip(packet(json!({
            "device_type": "BULB",
            "name": "Bedroom Light",
            "location": "bedroom",
            "is_on": true,
            "brightness": 80,
        })));
    }

    #[test]
    fn camera_round_trip() {
        assert_round_trip(packet(json!({
            "device_type": "CAMERA",
            "name": "Garage Camera",
            "location": "garage",
            "motion_detected": false,
            "battery_level": -2.5,
            "last_snapshot": null,
            "is_on": true,
        })));
    }

    #[test]
    fn camera_snapshot_timestamp_is_parsed() {
        let raw = packet(json!({
            "device_type": "CAMERA",
            "name": "Garden Camera",
            "location": "garden",
            "motion_detected": true,
            "battery_level": 88.0,
            "last_snapshot": "2024-05-01T12:00:00",
            "is_on": true,
        }));
        let payload = decode(&raw.to_string()).unwrap();
        let Reading::Camera(camera) = payload.reading else {
            panic!("expected a camera reading");
        };
        assert_eq!(
            camera.last_snapshot,
            Some(parse_timestamp("2024-05-01T12:00:00Z").unwrap())
        );
    }

    #[test]
    fn naive_envelope_timestamp_is_accepted() {
        let raw = json!({
            "device_id": DEVICE_ID,
            "timestamp": "2024-05-01T12:30:00.123456",
            "payload": {
                "device_type": "BULB",
                "name": "Hall Light",
                "location": "hallway",
                "is_on": false,
                "brightness": 0,
            },
        });
        assert!(decode(&raw.to_string()).is_ok());
    }

    #[test]
    fn unknown_device_type_is_reported_by_tag() {
        let raw = packet(json!({
            "device_type": "UNKNOWN_X",
            "name": "Mystery",
            "location": "office",
        }));
        match decode(&raw.to_string()) {
            Err(DecodeError::UnknownDeviceType(tag)) => assert_eq!(tag, "UNKNOWN_X"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_discriminator() {
        let raw = packet(json!({ "name": "Nameless", "location": "office" }));
        assert!(matches!(
            decode(&raw.to_string()),
            Err(DecodeError::MissingDeviceType)
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            decode("{\"device_id\": "),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn missing_variant_field() {
        let raw = packet(json!({
            "device_type": "THERMOSTAT",
            "name": "Office Thermostat",
            "location": "office",
            "current_temp": 21.0,
            "humidity": 40.0,
        }));
        assert!(matches!(
            decode(&raw.to_string()),
            Err(DecodeError::InvalidPayload {
                device_type: DeviceType::Thermostat,
                ..
            })
        ));
    }

    #[test]
    fn mistyped_variant_field() {
        let raw = packet(json!({
            "device_type": "BULB",
            "name": "Kitchen Light",
            "location": "kitchen",
            "is_on": "yes",
            "brightness": 50,
        }));
        assert!(matches!(
            decode(&raw.to_string()),
            Err(DecodeError::InvalidPayload {
                device_type: DeviceType::Bulb,
                ..
            })
        ));
    }

    #[test]
    fn brightness_above_100_is_invalid() {
        let raw = packet(json!({
            "device_type": "BULB",
            "name": "Porch Light",
            "location": "garden",
            "is_on": true,
            "brightness": 150,
        }));
        assert!(matches!(
            decode(&raw.to_string()),
            Err(DecodeError::InvalidPayload {
                device_type: DeviceType::Bulb,
                ..
            })
        ));

        let raw = packet(json!({
            "device_type": "BULB",
            "name": "Porch Light",
            "location": "garden",
            "is_on": true,
            "brightness": 100,
        }));
        assert!(decode(&raw.to_string()).is_ok());
    }

    #[test]
    fn unknown_location_is_invalid() {
        let raw = json!({
            "device_id": DEVICE_ID,
            "timestamp": Utc::now().to_rfc3339(),
            "payload": {
                "device_type": "BULB",
                "name": "Attic Light",
                "location": "attic",
                "is_on": true,
                "brightness": 10,
            },
        });
        assert!(matches!(
            decode(&raw.to_string()),
            Err(DecodeError::InvalidPayload { .. })
        ));
    }
}
