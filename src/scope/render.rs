//! Seam to the chart-drawing collaborator.
//!
//! The renderer is retained-mode: callers send partial patches keyed by series name and
//! guide id, never by position, and the renderer merges each patch in one step.

use std::fmt;

use crate::scope::buffer::SamplePoint;
use crate::scope::chart::Channel;
use crate::scope::coords::{AxisBounds, AxisUnit};
use crate::scope::ScopeError;
use crate::types::ChartKind;

/// Position on the drawing surface, in the renderer's pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position in data space: sample index and volts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataPos {
    pub x: f64,
    pub y: f64,
}

impl DataPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel rectangle of the plotting area (excludes legend, title and marker column).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn contains(&self, pixel: PixelPos) -> bool {
        self.left <= pixel.x && pixel.x <= self.right && self.top <= pixel.y && pixel.y <= self.bottom
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuideId(String);

impl GuideId {
    pub fn new(kind: ChartKind, serial: u64, slot: usize) -> Self {
        Self(format!("measure_line_{}_{}_{}", kind.tag(), serial, slot))
    }
}

impl fmt::Display for GuideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vertical cursor guide in data space.
#[derive(Clone, Debug, PartialEq)]
pub struct GuideLine {
    pub id: GuideId,
    pub x: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GuideOp {
    Add(GuideLine),
    Remove(GuideId),
}

/// Full replacement of one series' data, addressed by series name.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesUpdate {
    pub name: String,
    pub points: Vec<SamplePoint>,
}

impl SeriesUpdate {
    pub fn for_channel(kind: ChartKind, channel: &Channel) -> Self {
        Self {
            name: kind.series_name(channel.index),
            points: channel.rendered_points(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisPatch {
    pub bounds: AxisBounds,
    pub unit: AxisUnit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkerPlacement {
    Hidden,
    Shown { pixel_y: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerUpdate {
    pub channel: usize,
    pub placement: MarkerPlacement,
}

/// Partial redraw. Empty fields leave the renderer's current state alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartPatch {
    pub axis: Option<AxisPatch>,
    pub series: Vec<SeriesUpdate>,
    pub guides: Vec<GuideOp>,
    pub markers: Vec<MarkerUpdate>,
}

impl ChartPatch {
    pub fn is_empty(&self) -> bool {
        self.axis.is_none()
            && self.series.is_empty()
            && self.guides.is_empty()
            && self.markers.is_empty()
    }
}

/// The drawing surface of one chart.
pub trait Renderer {
    fn pixel_to_data(&self, pixel: PixelPos) -> Result<DataPos, ScopeError>;
    fn data_to_pixel(&self, data: DataPos) -> Result<PixelPos, ScopeError>;
    fn plot_area(&self) -> Result<PlotArea, ScopeError>;
    fn apply_update(&mut self, patch: ChartPatch);
    fn current_axis_bounds(&self) -> AxisBounds;
}
