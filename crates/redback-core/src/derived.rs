// ── Derived measurements ──
//
// A fixed set of values computed from the flat measurement map. Each
// variant is a pure function over `Measurements`; nothing is evaluated
// from strings at runtime.
//
// Private-scheme readings are signed watts (`...NegativeIsImportW`,
// `...NegativeIsChargingW`); public-scheme readings are kilowatts, with
// export and import already split into separate non-negative fields.
// Every derived value is a kilowatt magnitude (never negative) so
// consumers do not have to know which scheme produced the map.

use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::measurements::Measurements;

const W_PER_KW: f64 = 1000.0;

/// One derived power value, in kW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
pub enum DerivedMeasurement {
    /// Household consumption: PV + battery − export + import.
    SiteLoad,
    /// Power supplied by the backup (EPS) circuit.
    BackupLoad,
    GridExport,
    GridImport,
    BatteryDischarge,
    BatteryCharge,
    SolarGeneration,
}

impl DerivedMeasurement {
    /// Output key, e.g. `SiteLoadkW`.
    pub fn key(self) -> String {
        format!("{self}kW")
    }

    /// Output key of the energy accumulated from this power, e.g. `SiteLoadkWh`.
    pub fn energy_key(self) -> String {
        format!("{self}kWh")
    }

    /// Evaluate against `m`. `None` when the inputs are absent.
    pub fn evaluate(self, m: &Measurements) -> Option<f64> {
        match self {
            Self::SiteLoad => site_load(m),
            Self::BackupLoad => m.get_f64("BackupLoadW").map(|w| positive(w) / W_PER_KW),
            Self::GridExport => m
                .get_f64("ActiveExportedPowerInstantaneouskW")
                .map(positive)
                .or_else(|| m.get_f64("GridNegativeIsImportW").map(|w| positive(w) / W_PER_KW)),
            Self::GridImport => m
                .get_f64("ActiveImportedPowerInstantaneouskW")
                .map(positive)
                .or_else(|| m.get_f64("GridNegativeIsImportW").map(|w| negative(w) / W_PER_KW)),
            Self::BatteryDischarge => signed_kw(
                m,
                "BatteryPowerNegativeIsChargingkW",
                "BatteryNegativeIsChargingW",
            )
            .map(positive),
            Self::BatteryCharge => signed_kw(
                m,
                "BatteryPowerNegativeIsChargingkW",
                "BatteryNegativeIsChargingW",
            )
            .map(negative),
            Self::SolarGeneration => {
                signed_kw(m, "PvPowerInstantaneouskW", "PVW").map(positive)
            }
        }
    }
}

/// Evaluate every derived measurement that has its inputs present.
pub fn derive_all(m: &Measurements) -> Measurements {
    DerivedMeasurement::iter()
        .filter_map(|d| d.evaluate(m).map(|v| (d.key(), Value::from(v))))
        .collect()
}

fn site_load(m: &Measurements) -> Option<f64> {
    let public = || {
        let pv = m.get_f64("PvPowerInstantaneouskW")?;
        let battery = m.get_f64("BatteryPowerNegativeIsChargingkW")?;
        let export = m.get_f64("ActiveExportedPowerInstantaneouskW")?;
        let import = m.get_f64("ActiveImportedPowerInstantaneouskW")?;
        Some(positive(pv + battery - export + import))
    };
    public().or_else(|| m.get_f64("ACLoadW").map(|w| positive(w) / W_PER_KW))
}

/// Read a kW field, falling back to a W field scaled to kW.
fn signed_kw(m: &Measurements, kw_key: &str, w_key: &str) -> Option<f64> {
    m.get_f64(kw_key)
        .or_else(|| m.get_f64(w_key).map(|w| w / W_PER_KW))
}

fn positive(x: f64) -> f64 {
    x.max(0.0)
}

/// Magnitude of the negative part.
fn negative(x: f64) -> f64 {
    (-x).max(0.0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn private_sample() -> Measurements {
        let mut m = Measurements::new();
        m.insert("ACLoadW", 850.0);
        m.insert("BackupLoadW", 120.0);
        m.insert("PVW", 3200.0);
        m.insert("GridNegativeIsImportW", -400.0);
        m.insert("BatteryNegativeIsChargingW", -1500.0);
        m
    }

    #[test]
    fn private_fields_split_by_direction() {
        let m = private_sample();
        assert!(close(DerivedMeasurement::GridImport.evaluate(&m), 0.4));
        assert!(close(DerivedMeasurement::GridExport.evaluate(&m), 0.0));
        assert!(close(DerivedMeasurement::BatteryCharge.evaluate(&m), 1.5));
        assert!(close(DerivedMeasurement::BatteryDischarge.evaluate(&m), 0.0));
        assert!(close(DerivedMeasurement::SolarGeneration.evaluate(&m), 3.2));
        assert!(close(DerivedMeasurement::SiteLoad.evaluate(&m), 0.85));
        assert!(close(DerivedMeasurement::BackupLoad.evaluate(&m), 0.12));
    }

    #[test]
    fn public_site_load_formula() {
        let mut m = Measurements::new();
        m.insert("PvPowerInstantaneouskW", 4.0);
        m.insert("BatteryPowerNegativeIsChargingkW", -1.0);
        m.insert("ActiveExportedPowerInstantaneouskW", 0.5);
        m.insert("ActiveImportedPowerInstantaneouskW", 0.25);
        assert!(close(DerivedMeasurement::SiteLoad.evaluate(&m), 2.75));
        assert!(close(DerivedMeasurement::GridExport.evaluate(&m), 0.5));
        assert!(close(DerivedMeasurement::GridImport.evaluate(&m), 0.25));
        assert!(close(DerivedMeasurement::BatteryCharge.evaluate(&m), 1.0));
    }

    #[test]
    fn missing_inputs_yield_none() {
        let m = Measurements::new();
        for d in DerivedMeasurement::iter() {
            assert_eq!(d.evaluate(&m), None, "{d}");
        }
        assert!(derive_all(&m).is_empty());
    }

    #[test]
    fn keys_are_stable() {
        assert_eq!(DerivedMeasurement::SiteLoad.key(), "SiteLoadkW");
        assert_eq!(DerivedMeasurement::GridImport.energy_key(), "GridImportkWh");
    }

    #[test]
    fn derive_all_covers_present_inputs() {
        let out = derive_all(&private_sample());
        assert_eq!(out.len(), 7);
        assert!(out.iter().all(|(_, v)| v.as_f64().is_some_and(|x| x >= 0.0)));
    }
}
