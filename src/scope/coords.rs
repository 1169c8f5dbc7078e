use std::fmt;
use std::str::FromStr;

use crate::scope::config::GeneratorParams;
use crate::scope::ScopeError;
use crate::types::CHANNEL_COUNT;

/// Vertical distance between neighbouring channel centres, in volts.
pub const CHANNEL_STEP: f64 = 0.8;
/// How far inside the axis a re-clamped channel centre is pinned.
pub const EDGE_INSET: f64 = 0.001;

/// Fixed centre of a channel before any user adjustment.
///
/// The channels are stacked evenly and symmetrically around zero:
/// `-(C-1)/2 * step + index * step`.
pub fn base_spacing(index: usize, step: f64) -> f64 {
    -((CHANNEL_COUNT - 1) as f64) / 2.0 * step + index as f64 * step
}

pub fn vertical_center(index: usize, step: f64, adjustment: f64) -> f64 {
    base_spacing(index, step) + adjustment
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Bounds wide enough to show every stacked channel plus half a span of headroom.
    pub fn overview(step: f64, span: Span) -> Self {
        let half = span.volts() / 2.0;
        Self {
            min: base_spacing(0, step) - half,
            max: base_spacing(CHANNEL_COUNT - 1, step) + half,
        }
    }
}

/// Selectable full-scale voltage range of a chart's vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Span {
    Mv10,
    Mv50,
    Mv100,
    Mv500,
    V1,
    V5,
    V10,
}

impl Span {
    pub const ALL: [Span; 7] = [
        Span::Mv10,
        Span::Mv50,
        Span::Mv100,
        Span::Mv500,
        Span::V1,
        Span::V5,
        Span::V10,
    ];

    pub fn volts(self) -> f64 {
        match self {
            Span::Mv10 => 0.01,
            Span::Mv50 => 0.05,
            Span::Mv100 => 0.1,
            Span::Mv500 => 0.5,
            Span::V1 => 1.0,
            Span::V5 => 5.0,
            Span::V10 => 10.0,
        }
    }

    pub fn unit(self) -> AxisUnit {
        match self {
            Span::Mv10 | Span::Mv50 | Span::Mv100 | Span::Mv500 => AxisUnit::Millivolts,
            Span::V1 | Span::V5 | Span::V10 => AxisUnit::Volts,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Span::Mv10 => "10mV",
            Span::Mv50 => "50mV",
            Span::Mv100 => "100mV",
            Span::Mv500 => "500mV",
            Span::V1 => "1V",
            Span::V5 => "5V",
            Span::V10 => "10V",
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::V5
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Span {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Span::ALL
            .into_iter()
            .find(|span| span.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| ScopeError::InvalidRangeToken(s.to_owned()))
    }
}

pub fn axis_bounds_for_span(span: Span) -> AxisBounds {
    AxisBounds::new(-span.volts(), span.volts())
}


/// Unit the y-axis tick labels are shown in. Data is always in volts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AxisUnit {
    #[default]
    Millivolts,
    Volts,
}

impl AxisUnit {
    pub fn name(self) -> &'static str {
        match self {
            AxisUnit::Millivolts => "mV",
            AxisUnit::Volts => "V",
        }
    }

    pub fn format_tick(self, volts: f64) -> String {
        match self {
            AxisUnit::Millivolts => format!("{:.1}", volts * 1000.0),
            AxisUnit::Volts => format!("{:.2}", volts),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeBase {
    pub window: f64,
    pub unit: String,
    pub samples: usize,
}

impl TimeBase {
    pub fn new(params: &GeneratorParams, samples: usize) -> Self {
        Self {
            window: params.time_window,
            unit: params.time_unit.clone(),
            samples,
        }
    }

    pub fn format_tick(&self, sample_index: f64) -> String {
        let per_sample = self.window / (self.samples.saturating_sub(1).max(1)) as f64;
        let t = (sample_index * per_sample).clamp(0.0, self.window);
        format!("{:.2} {}", t, self.unit)
    }
}
