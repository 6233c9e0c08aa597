//! Bit-exact wire encoding for [`CredentialBundle`] (§6): platforms appear
//! as their [`Platform::credential_key`] (`"BIGBASKET"`, `"DMART"`, ...)
//! rather than their internal variant name, and a malformed or unrecognized
//! per-platform blob is dropped rather than failing the whole request — the
//! same "absent ⇒ re-acquire" treatment §3 gives an incomplete credential.

use serde_json::{Map, Value};

use crate::domain::{CredentialBundle, Platform, PlatformCredential};

/// Resolve a wire key (`"BIGBASKET"`, case-insensitively, or the internal
/// variant name) back to a [`Platform`].
#[must_use]
pub fn platform_from_wire_key(key: &str) -> Option<Platform> {
    Platform::ALL
        .into_iter()
        .find(|p| p.credential_key().eq_ignore_ascii_case(key) || p.as_str().eq_ignore_ascii_case(key))
}

/// Encode a [`CredentialBundle`] into the `{"<PLATFORM>": {...}}` shape §6
/// specifies, keyed by [`Platform::credential_key`].
#[must_use]
pub fn credentials_to_wire(bundle: &CredentialBundle) -> Map<String, Value> {
    let mut map = Map::with_capacity(bundle.len());
    for (platform, credential) in bundle {
        if let Ok(value) = serde_json::to_value(credential) {
            map.insert(platform.credential_key().to_string(), value);
        }
    }
    map
}

/// Decode a caller-supplied credentials object back into a
/// [`CredentialBundle`]. Tolerant: unknown keys, blobs for the wrong
/// platform, and blobs missing required fields are silently dropped rather
/// than failing the request — that platform is simply treated as having no
/// prior credential and gets re-acquired.
#[must_use]
pub fn credentials_from_wire(value: &Value) -> CredentialBundle {
    let mut bundle = CredentialBundle::new();
    let Some(object) = value.as_object() else {
        return bundle;
    };
    for (key, raw) in object {
        let Some(platform) = platform_from_wire_key(key) else {
            continue;
        };
        let Ok(credential) = serde_json::from_value::<PlatformCredential>(raw.clone()) else {
            continue;
        };
        if credential.platform() == platform {
            bundle.insert(platform, credential);
        }
    }
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn credentials_round_trip_through_the_wire_shape() {
        let mut bundle = CredentialBundle::new();
        bundle.insert(
            Platform::Dmart,
            PlatformCredential::Dmart {
                place_id: "place-1".to_string(),
                serviceable: false,
            },
        );

        let wire = credentials_to_wire(&bundle);
        assert!(wire.contains_key("DMART"));

        let decoded = credentials_from_wire(&Value::Object(wire));
        let decoded_cred = decoded.get(&Platform::Dmart).unwrap();
        assert!(decoded_cred.is_non_serviceable());
    }

    #[test]
    fn unknown_platform_keys_are_dropped() {
        let mut object = Map::new();
        object.insert("NOT_A_PLATFORM".to_string(), Value::String("x".to_string()));
        let bundle = credentials_from_wire(&Value::Object(object));
        assert!(bundle.is_empty());
    }

    #[test]
    fn mismatched_platform_blob_is_dropped() {
        let mut object = Map::new();
        object.insert(
            "DMART".to_string(),
            serde_json::json!({"platform": "Zepto", "store_id": "s", "device_id": "d", "session_id": "sess", "xsrf_token": "t", "non_serviceable": false}),
        );
        let bundle = credentials_from_wire(&Value::Object(object));
        assert!(bundle.is_empty());
    }

    #[test]
    fn empty_bundle_encodes_to_empty_object() {
        let bundle: CredentialBundle = HashMap::new();
        assert!(credentials_to_wire(&bundle).is_empty());
    }
}
