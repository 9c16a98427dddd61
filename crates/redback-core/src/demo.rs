// Offline demo source: fixed private-scheme payloads, no network.

use serde_json::{Value, json};

/// Serial number reported by the demo inverter.
pub const DEMO_SERIAL: &str = "RB-DEMO-0001";

/// A canned three-phase inverter with a battery, exporting to the grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn serial(self) -> &'static str {
        DEMO_SERIAL
    }

    pub fn inverter_info(self) -> Value {
        json!({
            "Model": "ST10000",
            "Firmware": "080819",
            "RossVersion": "2.15.32207.13",
            "IsThreePhaseInverter": true,
            "IsSmartBatteryInverter": false,
            "IsSinglePhaseInverter": false,
            "IsGridTieInverter": false
        })
    }

    pub fn banner_info(self) -> Value {
        json!({
            "ProductDisplayname": "Smart Inverter DEMO",
            "InstalledPvSizeWatts": 9960.0,
            "BatteryCapacityWattHours": 14000.001
        })
    }

    pub fn energy_flow(self) -> Value {
        json!({
            "Data": {
                "Input": {
                    "ACLoadW": 123.0,
                    "BackupLoadW": 0.0,
                    "SupportsConnectedPV": true,
                    "PVW": 456.0,
                    "ThirdPartyW": null,
                    "GridStatus": "Export",
                    "GridNegativeIsImportW": -123.0,
                    "ConfiguredWithBatteries": true,
                    "BatteryNegativeIsChargingW": 403.308,
                    "BatteryStatus": "Discharging",
                    "BatterySoC0to100": 51.0,
                    "CtComms": true
                }
            }
        })
    }
}
