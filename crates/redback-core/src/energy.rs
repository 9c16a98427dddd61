// ── Energy accumulation ──
//
// The upstream samples once per minute, so each reading stands for the
// power sustained over one sampling interval: kWh = kW × interval / 1h.
// With the default 60 s interval that is W / 60000.
//
// A fresh sample is credited the time since the previous fresh sample.
// The first sample has nothing before it and is credited one nominal
// interval. Polling faster than the cache TTL therefore neither loses
// nor double-counts energy.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::derived::DerivedMeasurement;
use crate::measurements::Measurements;

/// Sampling resolution of the upstream device.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(60);

/// Running energy totals per derived measurement.
#[derive(Debug, Clone)]
pub struct EnergyAccumulator {
    interval: Duration,
    totals: HashMap<DerivedMeasurement, f64>,
    last_sample: Option<DateTime<Utc>>,
    samples: u64,
}

impl Default for EnergyAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }
}

impl EnergyAccumulator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            totals: HashMap::new(),
            last_sample: None,
            samples: 0,
        }
    }

    /// Energy in kWh represented by one nominal-interval sample of `d`.
    pub fn increment(&self, d: DerivedMeasurement, sample: &Measurements) -> Option<f64> {
        kwh_over(d, sample, self.interval)
    }

    /// Time credited to a sample fetched at `fetched_at`.
    fn span_before(&self, fetched_at: DateTime<Utc>) -> Duration {
        match self.last_sample {
            None => self.interval,
            Some(prev) => (fetched_at - prev).to_std().unwrap_or(Duration::ZERO),
        }
    }

    /// Add one sample. A sample with the same fetch time as the previous
    /// one is the same cached snapshot and is not counted twice. Returns
    /// whether the sample was counted.
    pub fn record(&mut self, sample: &Measurements, fetched_at: DateTime<Utc>) -> bool {
        if self.last_sample.is_some_and(|prev| fetched_at <= prev) {
            return false;
        }
        let span = self.span_before(fetched_at);
        for d in DerivedMeasurement::iter() {
            if let Some(kwh) = kwh_over(d, sample, span) {
                *self.totals.entry(d).or_default() += kwh;
            }
        }
        self.last_sample = Some(fetched_at);
        self.samples += 1;
        true
    }

    pub fn total(&self, d: DerivedMeasurement) -> f64 {
        self.totals.get(&d).copied().unwrap_or_default()
    }

    /// Totals keyed by energy key (`SiteLoadkWh`, ...), in enum order.
    pub fn totals(&self) -> Measurements {
        DerivedMeasurement::iter()
            .filter_map(|d| {
                self.totals
                    .get(&d)
                    .map(|kwh| (d.energy_key(), Value::from(*kwh)))
            })
            .collect()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn reset(&mut self) {
        self.totals.clear();
        self.last_sample = None;
        self.samples = 0;
    }
}

fn kwh_over(d: DerivedMeasurement, sample: &Measurements, span: Duration) -> Option<f64> {
    d.evaluate(sample).map(|kw| kw * span.as_secs_f64() / 3600.0)
}
