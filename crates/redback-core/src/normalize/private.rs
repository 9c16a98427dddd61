// Private (portal) scheme: the payloads are already flat.

use serde_json::Value;

use super::{NormalizeError, object_at, root, synthesize_aliases};
use crate::measurements::Measurements;

/// Merge `inverterinfo` and `BannerInfo` into one static-info map.
///
/// Banner fields (display name, PV size, battery capacity) are copied
/// verbatim on top of the device info.
pub fn private_info(info: &Value, banner: &Value) -> Result<Measurements, NormalizeError> {
    let mut out = Measurements::from_map(root(info, "inverterinfo")?);
    for (key, value) in root(banner, "BannerInfo")? {
        out.insert(key, value);
    }
    synthesize_aliases(&mut out);
    Ok(out)
}

/// `energyflowd2` readings: the `Data.Input` object, unchanged.
pub fn private_energy(flow: &Value) -> Result<Measurements, NormalizeError> {
    let body = root(flow, "energyflowd2")?;
    let data = object_at(&body, "Data", "energyflowd2")?;
    let input = object_at(data, "Input", "energyflowd2.Data")?;
    Ok(Measurements::from_map(input.clone()))
}
