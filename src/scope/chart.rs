use crate::scope::buffer::{SampleBuffer, SamplePoint};
use crate::scope::config::ScopeConfig;
use crate::scope::coords::{base_spacing, vertical_center, AxisBounds, AxisUnit, TimeBase};
use crate::scope::measure::MeasurementLines;
use crate::scope::offset::MarkerDrag;
use crate::scope::ScopeError;
use crate::types::{ChartKind, CHANNEL_COUNT};

/// One trace of a chart. Owns its buffer, offset, visibility and label.
#[derive(Clone, Debug)]
pub struct Channel {
    pub index: usize,
    pub color: [u8; 3],
    pub label: String,
    pub visible: bool,
    adjustment: f64,
    step: f64,
    buffer: SampleBuffer,
    pub(crate) marker: MarkerDrag,
}

impl Channel {
    fn new(kind: ChartKind, index: usize, config: &ScopeConfig) -> Self {
        let hue_origin = match kind {
            ChartKind::HighFreq => 0.0,
            ChartKind::LowFreq => 180.0,
        };
        let hue = hue_origin + index as f32 * (360.0 / CHANNEL_COUNT as f32);
        Self {
            index,
            color: hsl_to_rgb(hue, 0.70, 0.45),
            label: kind.default_label(index),
            visible: index < config.initially_visible,
            adjustment: 0.0,
            step: config.channel_step,
            buffer: SampleBuffer::new(config.points_per_channel),
            marker: MarkerDrag::Idle,
        }
    }

    pub fn base(&self) -> f64 {
        base_spacing(self.index, self.step)
    }

    pub fn adjustment(&self) -> f64 {
        self.adjustment
    }

    pub fn center(&self) -> f64 {
        vertical_center(self.index, self.step, self.adjustment)
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn marker(&self) -> MarkerDrag {
        self.marker
    }

    pub(crate) fn set_adjustment_raw(&mut self, adjustment: f64) {
        self.adjustment = adjustment;
    }

    /// Points the renderer should show: the buffer when visible, nothing when hidden.
    pub fn rendered_points(&self) -> Vec<SamplePoint> {
        if self.visible {
            self.buffer.points().to_vec()
        } else {
            Vec::new()
        }
    }
}

/// Aggregate for one waveform view: channels, axis state and measurement lines.
#[derive(Clone, Debug)]
pub struct Chart {
    pub kind: ChartKind,
    channels: Vec<Channel>,
    pub axis: AxisBounds,
    pub unit: AxisUnit,
    pub time_base: TimeBase,
    pub measurements: MeasurementLines,
}

impl Chart {
    pub fn new(kind: ChartKind, config: &ScopeConfig) -> Self {
        let channels = (0..CHANNEL_COUNT)
            .map(|idx| Channel::new(kind, idx, config))
            .collect();
        Self {
            kind,
            channels,
            axis: AxisBounds::overview(config.channel_step, config.default_span),
            unit: AxisUnit::default(),
            time_base: TimeBase::new(config.generator(kind), config.points_per_channel),
            measurements: MeasurementLines::new(kind),
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Result<&Channel, ScopeError> {
        self.channels
            .get(index)
            .ok_or(ScopeError::ChannelOutOfRange { index })
    }

    pub fn channel_mut(&mut self, index: usize) -> Result<&mut Channel, ScopeError> {
        self.channels
            .get_mut(index)
            .ok_or(ScopeError::ChannelOutOfRange { index })
    }

    pub fn replace(&mut self, index: usize, samples: Vec<SamplePoint>) -> Result<(), ScopeError> {
        self.channel_mut(index)?.buffer.replace(samples)
    }

    pub fn shift_y(&mut self, index: usize, delta: f64) -> Result<(), ScopeError> {
        self.channel_mut(index)?.buffer.shift_y(delta);
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<&[SamplePoint]> {
        self.channels.iter().map(|c| c.buffer.points()).collect()
    }
}

fn hsl_to_rgb(hue_deg: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let h = hue_deg.rem_euclid(360.0) / 60.0;
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_byte = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}
