use std::collections::HashMap;

use log::info;

use crate::scope::chart::Chart;
use crate::scope::coords::{axis_bounds_for_span, Span, EDGE_INSET};
use crate::scope::offset::{marker_updates, set_adjustment};
use crate::scope::render::{AxisPatch, ChartPatch, Renderer};
use crate::scope::ScopeError;
use crate::types::{ChannelId, ChartKind};

/// Range selector state: a remembered span per channel and the channel currently selected.
///
/// The span is stored per channel but applied to the owning chart's single axis.
#[derive(Clone, Debug)]
pub struct RangeSelection {
    ranges: HashMap<ChannelId, Span>,
    selected: ChannelId,
}

impl RangeSelection {
    pub fn new(default_span: Span) -> Self {
        Self {
            ranges: ChannelId::all().map(|id| (id, default_span)).collect(),
            selected: ChannelId {
                chart: ChartKind::HighFreq,
                index: 0,
            },
        }
    }

    pub fn selected(&self) -> ChannelId {
        self.selected
    }

    pub fn range_of(&self, id: ChannelId) -> Span {
        self.ranges.get(&id).copied().unwrap_or_default()
    }

    pub fn selected_range(&self) -> Span {
        self.range_of(self.selected)
    }

    pub fn select(&mut self, id: ChannelId) -> Span {
        self.selected = id;
        self.range_of(id)
    }

    pub fn set_selected_range(&mut self, span: Span) {
        self.ranges.insert(self.selected, span);
    }
}

/// Sets the chart's axis to `±span` and pulls every channel centre back inside it.
///
/// Out-of-range channels are pinned `EDGE_INSET` inside the nearest bound through
/// `set_adjustment`. Returns how many channels were moved.
pub fn apply_range(
    chart: &mut Chart,
    span: Span,
    renderer: &mut dyn Renderer,
) -> Result<usize, ScopeError> {
    let bounds = axis_bounds_for_span(span);
    chart.axis = bounds;
    chart.unit = span.unit();
    let guides = chart.measurements.redraw(bounds);
    renderer.apply_update(ChartPatch {
        axis: Some(AxisPatch {
            bounds,
            unit: chart.unit,
        }),
        guides,
        ..ChartPatch::default()
    });

    let mut moved = 0;
    for index in 0..chart.channels().len() {
        let channel = chart.channel(index)?;
        let (base, center) = (channel.base(), channel.center());
        if bounds.contains(center) {
            continue;
        }
        let target = if center < bounds.min {
            bounds.min - base + EDGE_INSET
        } else {
            bounds.max - base - EDGE_INSET
        };
        if set_adjustment(chart, index, target, renderer)? {
            moved += 1;
        }
    }

    let markers = marker_updates(&*renderer, chart);
    renderer.apply_update(ChartPatch {
        markers,
        ..ChartPatch::default()
    });
    info!("{} axis set to ±{} ({moved} channels re-clamped)", chart.kind, span);
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::buffer::indexed;
    use crate::scope::config::ScopeConfig;
    use crate::scope::coords::AxisBounds;
    use crate::scope::render::testing::RecordingRenderer;
    use proptest::prelude::*;

    fn chart() -> Chart {
        let config = ScopeConfig {
            points_per_channel: 2,
            ..ScopeConfig::default()
        };
        let mut chart = Chart::new(ChartKind::HighFreq, &config);
        for idx in 0..chart.channels().len() {
            let center = chart.channel(idx).unwrap().center();
            chart.replace(idx, indexed([center; 2])).unwrap();
        }
        chart
    }

    #[test]
    fn hundred_millivolts_pins_outer_channels_inside() {
        let mut chart = chart();
        let mut renderer = RecordingRenderer::new(1.0);
        let span: Span = "100mv".parse().unwrap();
        let moved = apply_range(&mut chart, span, &mut renderer).unwrap();
        assert_eq!(chart.axis, AxisBounds::new(-0.1, 0.1));
        assert_eq!(renderer.axis, AxisBounds::new(-0.1, 0.1));
        // Every base centre is at least 0.4 V from zero.
        assert_eq!(moved, 12);
        let top = chart.channel(11).unwrap();
        assert!(top.center() <= 0.1 - EDGE_INSET + 1e-12);
        assert!((top.center() - 0.099).abs() < 1e-9);
        // The buffer follows the centre.
        assert!((top.buffer().points()[0].y - 0.099).abs() < 1e-9);
        let bottom = chart.channel(0).unwrap();
        assert!((bottom.center() + 0.099).abs() < 1e-9);
    }

    #[test]
    fn widening_the_range_moves_nothing() {
        let mut chart = chart();
        let mut renderer = RecordingRenderer::new(1.0);
        assert_eq!(apply_range(&mut chart, Span::V10, &mut renderer).unwrap(), 0);
        assert_eq!(chart.channel(11).unwrap().adjustment(), 0.0);
    }

    #[test]
    fn unit_follows_the_span() {
        let mut chart = chart();
        let mut renderer = RecordingRenderer::new(1.0);
        apply_range(&mut chart, Span::Mv500, &mut renderer).unwrap();
        assert_eq!(renderer.unit.map(|u| u.name()), Some("mV"));
        apply_range(&mut chart, Span::V1, &mut renderer).unwrap();
        assert_eq!(renderer.unit.map(|u| u.name()), Some("V"));
    }

    #[test]
    fn guides_are_resized_with_the_axis() {
        let mut chart = chart();
        let mut renderer = RecordingRenderer::new(1.0);
        chart.measurements.insert(0.5);
        apply_range(&mut chart, Span::V1, &mut renderer).unwrap();
        let guide = renderer.guides.values().next().unwrap();
        assert_eq!((guide.y_min, guide.y_max), (-1.0, 1.0));
    }

    #[test]
    fn selection_remembers_span_per_channel() {
        let mut selection = RangeSelection::new(Span::V5);
        assert_eq!(selection.selected().to_string(), "HF_1");
        selection.set_selected_range(Span::Mv50);
        let lf3: ChannelId = "LF_3".parse().unwrap();
        assert_eq!(selection.select(lf3), Span::V5);
        selection.set_selected_range(Span::V1);
        let hf1: ChannelId = "HF_1".parse().unwrap();
        assert_eq!(selection.select(hf1), Span::Mv50);
        assert_eq!(selection.range_of(lf3), Span::V1);
    }

    proptest! {
        #[test]
        fn every_center_lies_within_bounds_after_apply(
            span_idx in 0usize..Span::ALL.len(),
            adjustments in proptest::collection::vec(-20.0f64..20.0, 12),
        ) {
            let mut chart = chart();
            let mut renderer = RecordingRenderer::new(1.0);
            for (idx, adj) in adjustments.iter().enumerate() {
                set_adjustment(&mut chart, idx, *adj, &mut renderer).unwrap();
            }
            let span = Span::ALL[span_idx];
            apply_range(&mut chart, span, &mut renderer).unwrap();
            for channel in chart.channels() {
                prop_assert!(chart.axis.contains(channel.center()),
                    "channel {} at {} outside {:?}", channel.index, channel.center(), chart.axis);
            }
        }
    }
}
