use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scope::coords::{Span, CHANNEL_STEP};
use crate::scope::ScopeError;
use crate::types::ChartKind;

/// Waveform synthesis and time-axis parameters of one chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    /// Phase advance per sample, in radians.
    pub base_frequency: f64,
    /// Nominal peak amplitude, in volts.
    pub amplitude: f64,
    /// Length of the x axis in `time_unit`.
    pub time_window: f64,
    pub time_unit: String,
}

impl GeneratorParams {
    pub fn high_freq() -> Self {
        Self {
            base_frequency: 0.05,
            amplitude: 1.0,
            time_window: 20.0,
            time_unit: "µs".to_owned(),
        }
    }

    pub fn low_freq() -> Self {
        Self {
            base_frequency: 0.01,
            amplitude: 0.5,
            time_window: 5.0,
            time_unit: "ms".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub refresh_interval_ms: u64,
    pub points_per_channel: usize,
    pub channel_step: f64,
    #[serde(with = "span_token")]
    pub default_span: Span,
    pub initially_visible: usize,
    pub high_freq: GeneratorParams,
    pub low_freq: GeneratorParams,
    /// Fixed generator seed for reproducible traces; random when absent.
    pub seed: Option<u64>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 100,
            points_per_channel: 2600,
            channel_step: CHANNEL_STEP,
            default_span: Span::V5,
            initially_visible: 3,
            high_freq: GeneratorParams::high_freq(),
            low_freq: GeneratorParams::low_freq(),
            seed: None,
        }
    }
}

impl ScopeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ScopeError> {
        let config: ScopeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScopeError> {
        if self.points_per_channel < 2 {
            return Err(ScopeError::Config(format!(
                "points_per_channel must be at least 2, got {}",
                self.points_per_channel
            )));
        }
        if !(self.channel_step > 0.0) {
            return Err(ScopeError::Config(format!(
                "channel_step must be positive, got {}",
                self.channel_step
            )));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ScopeError::Config("refresh_interval_ms must be non-zero".into()));
        }
        for (kind, params) in [
            (ChartKind::HighFreq, &self.high_freq),
            (ChartKind::LowFreq, &self.low_freq),
        ] {
            if !(params.time_window > 0.0) {
                return Err(ScopeError::Config(format!(
                    "{kind} time_window must be positive"
                )));
            }
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn generator(&self, kind: ChartKind) -> &GeneratorParams {
        match kind {
            ChartKind::HighFreq => &self.high_freq,
            ChartKind::LowFreq => &self.low_freq,
        }
    }
}

// Spans are written the way the range selector shows them ("100mV").
mod span_token {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::scope::coords::Span;

    pub fn serialize<S: Serializer>(span: &Span, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(span.token())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Span, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_scope() {
        let config = ScopeConfig::default();
        assert_eq!(config.points_per_channel, 2600);
        assert_eq!(config.refresh_interval(), Duration::from_millis(100));
        assert_eq!(config.default_span, Span::V5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config =
            ScopeConfig::from_json_str(r#"{ "points_per_channel": 500, "default_span": "100mv" }"#)
                .unwrap();
        assert_eq!(config.points_per_channel, 500);
        assert_eq!(config.default_span, Span::Mv100);
        assert_eq!(config.low_freq, GeneratorParams::low_freq());
        assert_eq!(config.seed, None);
    }

    #[test]
    fn serialised_span_uses_selector_token() {
        let json = serde_json::to_string(&ScopeConfig::default()).unwrap();
        assert!(json.contains(r#""default_span":"5V""#));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ScopeConfig::from_json_str(r#"{ "points_per_channel": 1 }"#),
            Err(ScopeError::Config(_))
        ));
        assert!(matches!(
            ScopeConfig::from_json_str(r#"{ "refresh_interval_ms": 0 }"#),
            Err(ScopeError::Config(_))
        ));
        assert!(matches!(
            ScopeConfig::from_json_str(r#"{ "default_span": "3V" }"#),
            Err(ScopeError::Json(_))
        ));
        assert!(matches!(
            ScopeConfig::from_json_str("not json"),
            Err(ScopeError::Json(_))
        ));
    }
}
