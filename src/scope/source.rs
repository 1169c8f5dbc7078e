use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::scope::buffer::{indexed, SamplePoint};
use crate::scope::config::{GeneratorParams, ScopeConfig};
use crate::scope::ScopeError;
use crate::types::{ChartKind, ChartPair};

/// What the refresh loop asks a source for: one full trace for one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeriesRequest {
    pub chart: ChartKind,
    pub channel: usize,
    /// Vertical centre the returned samples must already include.
    pub center: f64,
    pub len: usize,
}

/// Anything that can produce fresh sample arrays on demand.
pub trait SignalSource {
    /// `Ok(None)` means no new data this tick; the current buffer stays.
    fn next_series(&mut self, request: SeriesRequest)
        -> Result<Option<Vec<SamplePoint>>, ScopeError>;
}

/// Randomised multi-harmonic waveforms, regenerated from scratch on every request.
pub struct SyntheticSource {
    rng: StdRng,
    params: ChartPair<GeneratorParams>,
}

impl SyntheticSource {
    pub fn new(config: &ScopeConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: &ScopeConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &ScopeConfig, rng: StdRng) -> Self {
        Self {
            rng,
            params: ChartPair::from_fn(|kind| config.generator(kind).clone()),
        }
    }

    fn generate(&mut self, request: SeriesRequest) -> Vec<SamplePoint> {
        let params = self.params.get(request.chart);
        // HF channels 3-5 carry the larger, spikier signals.
        let loud = request.chart == ChartKind::HighFreq && (2..=4).contains(&request.channel);
        let frequency = params.base_frequency * self.rng.gen_range(0.8..1.2);
        let mut amplitude = params.amplitude * self.rng.gen_range(0.7..1.3);
        if loud {
            amplitude *= 2.0;
        }
        let spike_probability = if loud { 0.1 } else { 0.05 };
        let phase = self.rng.gen_range(0.0..2.0 * PI);
        let limit = amplitude * 1.5;

        let rng = &mut self.rng;
        let values = (0..request.len).map(|i| {
            let t = i as f64 * frequency;
            let mut y = (phase + t).sin() * amplitude;
            y += (phase * 1.3 + t * 2.0).sin() * amplitude * 0.3;
            y += (phase * 1.7 + t * 3.0).sin() * amplitude * 0.15;
            y += (rng.gen::<f64>() - 0.5) * amplitude * 0.3;
            if rng.gen_bool(spike_probability) {
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                y += sign * amplitude * 0.8;
            }
            y.clamp(-limit, limit) + request.center
        });
        indexed(values.collect::<Vec<_>>())
    }
}

impl SignalSource for SyntheticSource {
    fn next_series(
        &mut self,
        request: SeriesRequest,
    ) -> Result<Option<Vec<SamplePoint>>, ScopeError> {
        Ok(Some(self.generate(request)))
    }
}
