use anyhow::{Context, Result};
use mrf_engine::Observation;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// How weekly %-change fields are written in an observation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// `0.008` means +0.8%.
    #[default]
    Fraction,
    /// `0.8` means +0.8%. Converted to fractions before evaluation.
    Percent,
}

/// Observation file as operators write it.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationFile {
    #[serde(default)]
    pub units: Units,
    /// Free-form period label (e.g. `2026-W41`), echoed in output.
    #[serde(default)]
    pub period: Option<String>,
    #[serde(flatten)]
    pub observation: Observation,
}

impl ObservationFile {
    /// Engine-ready observation: weekly changes always fractional.
    pub fn into_observation(self) -> Observation {
        let mut o = self.observation;
        if self.units == Units::Percent {
            o.currency_weekly_change /= 100.0;
            o.global_equity_weekly_change /= 100.0;
            o.local_broad_weekly_change /= 100.0;
            o.local_financials_weekly_change /= 100.0;
        }
        o
    }
}

pub fn load_observation(path: &Path) -> Result<ObservationFile> {
    let bytes =
        fs::read(path).with_context(|| format!("read observation failed: {}", path.display()))?;
    // Strip UTF-8 BOM if present.
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    serde_json::from_slice(bytes)
        .with_context(|| format!("observation must be a JSON object with all nine indicators: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_units_are_converted_to_fractions() {
        let raw = r#"{
            "units": "percent",
            "currency_weekly_change": 0.8,
            "spread_level_bp": 204,
            "spread_weekly_delta_bp": 12,
            "volatility_index": 17.5,
            "global_equity_weekly_change": 1.0,
            "local_broad_weekly_change": 2.0,
            "local_financials_weekly_change": 2.5,
            "volume_ratio": 1.0,
            "rate_proxy_score": 60
        }"#;
        let f: ObservationFile = serde_json::from_str(raw).unwrap();
        let o = f.into_observation();
        assert!((o.currency_weekly_change - 0.008).abs() < 1e-12);
        assert!((o.local_financials_weekly_change - 0.025).abs() < 1e-12);
        assert_eq!(o.spread_weekly_delta_bp, 12.0, "basis points are not rescaled");
        assert_eq!(o.volume_ratio, 1.0);
    }

    #[test]
    fn fraction_is_the_default() {
        let raw = r#"{
            "currency_weekly_change": 0.008,
            "spread_level_bp": 204,
            "spread_weekly_delta_bp": 0,
            "volatility_index": 17.5,
            "global_equity_weekly_change": 0.01,
            "local_broad_weekly_change": 0.02,
            "local_financials_weekly_change": 0.025,
            "volume_ratio": 1.0,
            "rate_proxy_score": 60
        }"#;
        let f: ObservationFile = serde_json::from_str(raw).unwrap();
        assert_eq!(f.units, Units::Fraction);
        assert_eq!(f.into_observation().currency_weekly_change, 0.008);
    }

    #[test]
    fn missing_indicator_is_an_error() {
        let raw = r#"{ "currency_weekly_change": 0.008 }"#;
        assert!(serde_json::from_str::<ObservationFile>(raw).is_err());
    }
}
