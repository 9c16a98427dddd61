// Public (OAuth2) scheme: nested site/node structures flattened to scalars.

use serde_json::{Map, Value};
use tracing::debug;

use super::{NormalizeError, object_at, root, round1, synthesize_aliases};
use crate::measurements::Measurements;

/// Nested fields of the dynamic payload that are replaced by flat keys.
const NESTED_DYNAMIC_KEYS: [&str; 6] = [
    "TimestampUtc",
    "SiteId",
    "Inverters",
    "Phases",
    "Battery",
    "PVs",
];

// ── Static info ──────────────────────────────────────────────────────

/// Flatten `EnergyData/{site}/Static`.
///
/// Site-level static data first, then the first node's static data on top
/// (node 0 is the inverter). Nested objects are lifted one level; string
/// lists such as `BatteryModels` become one comma-separated string.
pub fn public_info(body: &Value) -> Result<Measurements, NormalizeError> {
    let body = root(body, "Static")?;
    let data = object_at(&body, "Data", "Static")?;
    let mut out = Measurements::new();

    if let Some(site_static) = data.get("StaticData").and_then(Value::as_object) {
        flatten_static(&mut out, site_static);
    }

    let inverter = data
        .get("Nodes")
        .and_then(Value::as_array)
        .and_then(|nodes| nodes.first())
        .and_then(Value::as_object);
    if let Some(node) = inverter {
        if let Some(node_static) = node.get("StaticData").and_then(Value::as_object) {
            flatten_static(&mut out, node_static);
        }
        if let Some(id) = node.get("Id") {
            out.insert("InverterSerialNumber", id.clone());
        }
    }

    if let Some(id) = data.get("Id") {
        out.insert("SiteId", id.clone());
    }

    synthesize_aliases(&mut out);
    Ok(out)
}

fn flatten_static(out: &mut Measurements, obj: &Map<String, Value>) {
    for (key, value) in obj {
        if let Value::Object(inner) = value {
            for (inner_key, inner_value) in inner {
                if let Some(v) = scalar_or_joined(inner_value) {
                    out.insert(inner_key.clone(), v);
                }
            }
        } else if let Some(v) = scalar_or_joined(value) {
            out.insert(key.clone(), v);
        }
    }
}

/// Scalars pass through; string lists join with `", "`; anything else
/// has no flat form.
fn scalar_or_joined(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => None,
        Value::Array(items) => items
            .iter()
            .map(Value::as_str)
            .collect::<Option<Vec<_>>>()
            .map(|names| Value::String(names.join(", "))),
        other => Some(other.clone()),
    }
}

// ── Dynamic data ─────────────────────────────────────────────────────

/// Flatten `EnergyData/{site}/Dynamic`.
///
/// Top-level scalars are kept as-is. Per-phase readings, the battery
/// object, and the PV string list are projected into suffixed keys, and
/// the nested originals are dropped.
pub fn public_energy(body: &Value) -> Result<Measurements, NormalizeError> {
    let body = root(body, "Dynamic")?;
    let data = object_at(&body, "Data", "Dynamic")?;
    let mut out = Measurements::from_map(data.clone());

    if let Some(phases) = data.get("Phases") {
        let phases = phases.as_array().ok_or_else(|| NormalizeError {
            path: "Dynamic.Data.Phases".into(),
            expected: "an array",
        })?;
        flatten_phases(&mut out, phases);
    }

    if let Some(battery) = data.get("Battery").and_then(Value::as_object) {
        if let Some(current) = battery.get("CurrentNegativeIsChargingA") {
            out.insert("BatteryCurrentNegativeIsChargingA", current.clone());
        }
        if let Some(voltage) = battery.get("VoltageV") {
            out.insert("BatteryVoltageV", voltage.clone());
        }
    }

    if let Some(pvs) = data.get("PVs").and_then(Value::as_array) {
        flatten_pvs(&mut out, pvs);
    }

    for key in NESTED_DYNAMIC_KEYS {
        out.remove(key);
    }
    let leftovers: Vec<String> = out
        .iter()
        .filter(|(_, v)| v.is_object() || v.is_array())
        .map(|(k, _)| k.clone())
        .collect();
    for key in leftovers {
        debug!(key, "dropping nested dynamic field");
        out.remove(&key);
    }

    Ok(out)
}

fn flatten_phases(out: &mut Measurements, phases: &[Value]) {
    let mut voltages = Vec::with_capacity(phases.len());
    let mut exported = 0.0;
    let mut imported = 0.0;

    for (position, phase) in phases.iter().enumerate() {
        let Some(phase) = phase.as_object() else {
            continue;
        };
        let id = match phase.get("Id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => position.to_string(),
        };

        if let Some(v) = phase.get("VoltageInstantaneousV") {
            out.insert(format!("VoltageInstantaneousV_{id}"), v.clone());
            voltages.extend(v.as_f64());
        }
        if let Some(c) = phase.get("CurrentInstantaneousA") {
            out.insert(format!("CurrentInstantaneousA_{id}"), c.clone());
        }
        exported += phase
            .get("ActiveExportedPowerInstantaneouskW")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        imported += phase
            .get("ActiveImportedPowerInstantaneouskW")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
    }

    if let Some(voltage) = equivalent_voltage(&voltages) {
        out.insert("VoltageInstantaneousV", voltage);
    }
    if !phases.is_empty() {
        out.insert("ActiveExportedPowerInstantaneouskW", exported);
        out.insert("ActiveImportedPowerInstantaneouskW", imported);
    }
}

/// `round(mean(phase voltages) * sqrt(n), 1)`: the line-to-line equivalent
/// of `n` balanced phase-to-neutral readings.
pub fn equivalent_voltage(phase_voltages: &[f64]) -> Option<f64> {
    if phase_voltages.is_empty() {
        return None;
    }
    let n = f64::from(u32::try_from(phase_voltages.len()).unwrap_or(u32::MAX));
    let mean = phase_voltages.iter().sum::<f64>() / n;
    Some(round1(mean * n.sqrt()))
}

fn flatten_pvs(out: &mut Measurements, pvs: &[Value]) {
    for (position, pv) in pvs.iter().enumerate() {
        let Some(pv) = pv.as_object() else {
            continue;
        };
        let index = pv
            .get("PvIndex")
            .and_then(Value::as_u64)
            .map_or_else(|| position.to_string(), |i| i.to_string());

        for (field, suffix) in [
            ("VoltageV", "VoltageV"),
            ("CurrentA", "CurrentA"),
            ("PowerkW", "PowerkW"),
        ] {
            if let Some(v) = pv.get(field) {
                out.insert(format!("PV_{index}_{suffix}"), v.clone());
            }
        }
    }
}
