// ── Response normalizer ──
//
// Turns each scheme's raw JSON into one flat `Measurements` map. The two
// upstream APIs describe the same inverter + battery + grid system with
// different vocabularies; everything scheme-specific lives in the two
// submodules. Values are copied, never re-signed: consumers split signed
// readings into their positive and negative parts themselves.

pub mod private;
pub mod public;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::CoreError;
use crate::measurements::Measurements;

pub use private::{private_energy, private_info};
pub use public::{public_energy, public_info};

/// The raw payload did not have the shape the normalizer expects.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected {expected} at `{path}`")]
pub struct NormalizeError {
    pub path: String,
    pub expected: &'static str,
}

impl From<NormalizeError> for CoreError {
    fn from(err: NormalizeError) -> Self {
        CoreError::MalformedResponse {
            message: err.to_string(),
        }
    }
}

/// Model/firmware key pairs that mean the same thing across schemes.
/// Whichever side is present fills in the other.
const ALIASES: [(&str, &[&str]); 4] = [
    ("ModelName", &["Model"]),
    ("Model", &["ModelName"]),
    ("FirmwareVersion", &["Firmware", "SoftwareVersion"]),
    ("Firmware", &["FirmwareVersion", "SoftwareVersion"]),
];

/// Add the cross-scheme model/firmware aliases to `out`.
pub(crate) fn synthesize_aliases(out: &mut Measurements) {
    for (alias, sources) in ALIASES {
        if out.contains_key(alias) {
            continue;
        }
        if let Some(value) = sources.iter().find_map(|k| out.get(k).cloned()) {
            out.insert(alias, value);
        }
    }
}

/// Look up `key` in `obj` and require it to be an object.
pub(crate) fn object_at<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, NormalizeError> {
    obj.get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| NormalizeError {
            path: format!("{path}.{key}"),
            expected: "an object",
        })
}

/// Require the payload root to be an object.
pub(crate) fn root(value: &Value, name: &str) -> Result<Map<String, Value>, NormalizeError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        _ => Err(NormalizeError {
            path: name.to_owned(),
            expected: "an object",
        }),
    }
}

/// Round to one decimal place.
pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
