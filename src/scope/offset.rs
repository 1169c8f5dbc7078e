use log::debug;

use crate::scope::chart::{Channel, Chart};
use crate::scope::render::{
    ChartPatch, DataPos, MarkerPlacement, MarkerUpdate, PixelPos, Renderer, SeriesUpdate,
};
use crate::scope::ScopeError;

/// Adjustment changes smaller than this are ignored.
pub const ADJUST_EPSILON: f64 = 1e-9;
/// Markers may overhang the plot area by this many pixels before they are hidden.
const MARKER_MARGIN_PX: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MarkerDrag {
    #[default]
    Idle,
    Dragging { moved: bool },
}

/// How a press/release pair on a marker is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    Moved,
    Clicked,
}

impl MarkerDrag {
    pub fn press(&mut self) {
        *self = MarkerDrag::Dragging { moved: false };
    }

    /// Records movement; false when no press is in progress.
    pub fn mark_moved(&mut self) -> bool {
        match self {
            MarkerDrag::Dragging { moved } => {
                *moved = true;
                true
            }
            MarkerDrag::Idle => false,
        }
    }

    pub fn release(&mut self) -> Option<DragOutcome> {
        let outcome = match *self {
            MarkerDrag::Idle => None,
            MarkerDrag::Dragging { moved: true } => Some(DragOutcome::Moved),
            MarkerDrag::Dragging { moved: false } => Some(DragOutcome::Clicked),
        };
        *self = MarkerDrag::Idle;
        outcome
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, MarkerDrag::Dragging { .. })
    }
}

/// Moves a channel to `new_adjust`, shifting its buffer and redrawing only that channel.
///
/// Returns `Ok(false)` when the change is below `ADJUST_EPSILON` and nothing was touched.
pub fn set_adjustment(
    chart: &mut Chart,
    index: usize,
    new_adjust: f64,
    renderer: &mut dyn Renderer,
) -> Result<bool, ScopeError> {
    let delta = new_adjust - chart.channel(index)?.adjustment();
    if delta.abs() < ADJUST_EPSILON {
        return Ok(false);
    }
    chart.channel_mut(index)?.set_adjustment_raw(new_adjust);
    chart.shift_y(index, delta)?;
    let channel = chart.channel(index)?;
    let marker = MarkerUpdate {
        channel: index,
        placement: place_marker(&*renderer, channel),
    };
    renderer.apply_update(ChartPatch {
        series: vec![SeriesUpdate::for_channel(chart.kind, channel)],
        markers: vec![marker],
        ..ChartPatch::default()
    });
    Ok(true)
}

/// Follows a dragged marker to `pixel`, clamped to the chart's axis.
///
/// Does nothing unless the marker was pressed first. Conversion failures skip this move.
pub fn drag_to(
    chart: &mut Chart,
    index: usize,
    pixel: PixelPos,
    renderer: &mut dyn Renderer,
) -> Result<bool, ScopeError> {
    if !chart.channel_mut(index)?.marker.mark_moved() {
        return Ok(false);
    }
    let data = match renderer.pixel_to_data(pixel) {
        Ok(data) => data,
        Err(err) => {
            debug!("{} marker {index}: drag skipped ({err})", chart.kind);
            return Ok(false);
        }
    };
    let center = chart.axis.clamp(data.y);
    let base = chart.channel(index)?.base();
    set_adjustment(chart, index, center - base, renderer)
}

pub fn place_marker(renderer: &dyn Renderer, channel: &Channel) -> MarkerPlacement {
    if !channel.visible {
        return MarkerPlacement::Hidden;
    }
    let located = renderer.plot_area().and_then(|area| {
        renderer
            .data_to_pixel(DataPos::new(0.0, channel.center()))
            .map(|pixel| (area, pixel))
    });
    match located {
        Ok((area, pixel)) => {
            if pixel.y < area.top - MARKER_MARGIN_PX || pixel.y > area.bottom + MARKER_MARGIN_PX {
                MarkerPlacement::Hidden
            } else {
                MarkerPlacement::Shown { pixel_y: pixel.y }
            }
        }
        Err(err) => {
            debug!("marker {} hidden: {err}", channel.index);
            MarkerPlacement::Hidden
        }
    }
}

pub fn marker_updates(renderer: &dyn Renderer, chart: &Chart) -> Vec<MarkerUpdate> {
    chart
        .channels()
        .iter()
        .map(|channel| MarkerUpdate {
            channel: channel.index,
            placement: place_marker(renderer, channel),
        })
        .collect()
}
