use std::collections::BTreeMap;

use log::{debug, info};

use crate::scope::chart::Chart;
use crate::scope::config::ScopeConfig;
use crate::scope::intersect::{intersect, Intersection};
use crate::scope::measure::Measurement;
use crate::scope::offset::{self, marker_updates, place_marker, DragOutcome};
use crate::scope::range::{apply_range, RangeSelection};
use crate::scope::render::{
    AxisPatch, ChartPatch, MarkerUpdate, PixelPos, Renderer, SeriesUpdate,
};
use crate::scope::ScopeError;
use crate::types::{ChannelId, ChartKind, ChartPair};

/// All interactive state of the dual scope: both charts, the range selector and the
/// measurement switch. Every UI action goes through here.
pub struct ScopeSession {
    charts: ChartPair<Chart>,
    ranges: RangeSelection,
    measurement_enabled: bool,
}

impl ScopeSession {
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            charts: ChartPair::from_fn(|kind| Chart::new(kind, config)),
            ranges: RangeSelection::new(config.default_span),
            measurement_enabled: false,
        }
    }

    pub fn chart(&self, kind: ChartKind) -> &Chart {
        self.charts.get(kind)
    }

    pub fn chart_mut(&mut self, kind: ChartKind) -> &mut Chart {
        self.charts.get_mut(kind)
    }

    pub fn ranges(&self) -> &RangeSelection {
        &self.ranges
    }

    pub fn measurement_enabled(&self) -> bool {
        self.measurement_enabled
    }

    /// Flips the measurement switch. Existing lines stay put either way.
    pub fn toggle_measurement(&mut self) -> bool {
        self.measurement_enabled = !self.measurement_enabled;
        info!(
            "measurement {}",
            if self.measurement_enabled { "enabled" } else { "disabled" }
        );
        self.measurement_enabled
    }

    /// First full draw of both charts, then the selected channel's range is applied.
    pub fn init<R: Renderer>(&mut self, renderers: &mut ChartPair<R>) -> Result<(), ScopeError> {
        for kind in ChartKind::ALL {
            let chart = self.charts.get(kind);
            let renderer = renderers.get_mut(kind);
            renderer.apply_update(ChartPatch {
                axis: Some(AxisPatch {
                    bounds: chart.axis,
                    unit: chart.unit,
                }),
                series: chart
                    .channels()
                    .iter()
                    .map(|channel| SeriesUpdate::for_channel(kind, channel))
                    .collect(),
                ..ChartPatch::default()
            });
            let markers = marker_updates(&*renderer, chart);
            renderer.apply_update(ChartPatch {
                markers,
                ..ChartPatch::default()
            });
        }
        let selected = self.ranges.selected();
        apply_range(
            self.charts.get_mut(selected.chart),
            self.ranges.selected_range(),
            renderers.get_mut(selected.chart),
        )?;
        Ok(())
    }

    /// Places a measurement cursor at the clicked pixel and returns its crossings.
    ///
    /// `None` when measurement is off, the click is outside the plot area, or the
    /// renderer cannot convert the position yet.
    pub fn place_measurement(
        &mut self,
        kind: ChartKind,
        pixel: PixelPos,
        renderer: &mut dyn Renderer,
    ) -> Option<Vec<Intersection>> {
        if !self.measurement_enabled {
            return None;
        }
        match renderer.plot_area() {
            Ok(area) if area.contains(pixel) => {}
            Ok(_) => {
                debug!("{kind} click at ({:.0}, {:.0}) outside plot area", pixel.x, pixel.y);
                return None;
            }
            Err(err) => {
                debug!("{kind} click ignored: {err}");
                return None;
            }
        }
        let data = match renderer.pixel_to_data(pixel) {
            Ok(data) => data,
            Err(err) => {
                debug!("{kind} click ignored: {err}");
                return None;
            }
        };

        let chart = self.charts.get_mut(kind);
        if let Some(evicted) = chart.measurements.insert(data.x) {
            debug!("{kind} cursor at x={:.2} evicted", evicted.x);
        }
        let guides = chart.measurements.redraw(renderer.current_axis_bounds());
        renderer.apply_update(ChartPatch {
            guides,
            ..ChartPatch::default()
        });
        let points = intersect(&chart.snapshot(), data.x);
        info!(
            "{kind} measurement at x={:.2}: {} crossings, cursors {:?} ({:?})",
            data.x,
            points.len(),
            chart.measurements.positions(),
            chart.measurements.state()
        );
        Some(points)
    }

    pub fn get_measurements(&self, kind: ChartKind) -> Vec<Measurement> {
        let chart = self.charts.get(kind);
        chart.measurements.measurements(&chart.snapshot())
    }

    pub fn measurements_json(&self) -> Result<String, ScopeError> {
        let all: BTreeMap<&str, Vec<Measurement>> = ChartKind::ALL
            .into_iter()
            .map(|kind| (kind.tag(), self.get_measurements(kind)))
            .collect();
        Ok(serde_json::to_string_pretty(&all)?)
    }

    pub fn clear_measurements<R: Renderer>(&mut self, renderers: &mut ChartPair<R>) {
        for kind in ChartKind::ALL {
            let patch = ChartPatch {
                guides: self.charts.get_mut(kind).measurements.clear(),
                ..ChartPatch::default()
            };
            if !patch.is_empty() {
                renderers.get_mut(kind).apply_update(patch);
            }
        }
        info!("all measurement lines cleared");
    }

    /// Hides (empties) or restores a channel's series; its buffer keeps refreshing either way.
    pub fn set_channel_visible(
        &mut self,
        kind: ChartKind,
        index: usize,
        visible: bool,
        renderer: &mut dyn Renderer,
    ) -> Result<(), ScopeError> {
        let chart = self.charts.get_mut(kind);
        chart.channel_mut(index)?.visible = visible;
        let channel = chart.channel(index)?;
        let marker = MarkerUpdate {
            channel: index,
            placement: place_marker(&*renderer, channel),
        };
        renderer.apply_update(ChartPatch {
            series: vec![SeriesUpdate::for_channel(kind, channel)],
            markers: vec![marker],
            ..ChartPatch::default()
        });
        debug!("{kind} channel {} visible={visible}", index + 1);
        Ok(())
    }

    pub fn set_channel_label(
        &mut self,
        kind: ChartKind,
        index: usize,
        text: &str,
    ) -> Result<(), ScopeError> {
        self.charts.get_mut(kind).channel_mut(index)?.label = text.to_owned();
        Ok(())
    }

    pub fn select_channel<R: Renderer>(
        &mut self,
        id: ChannelId,
        renderers: &mut ChartPair<R>,
    ) -> Result<(), ScopeError> {
        self.select_on(id, renderers.get_mut(id.chart))
    }

    fn select_on(&mut self, id: ChannelId, renderer: &mut dyn Renderer) -> Result<(), ScopeError> {
        let span = self.ranges.select(id);
        info!("selected {id} ({span})");
        apply_range(self.charts.get_mut(id.chart), span, renderer)?;
        Ok(())
    }

    /// Stores `token` as the selected channel's span and applies it.
    pub fn set_range<R: Renderer>(
        &mut self,
        token: &str,
        renderers: &mut ChartPair<R>,
    ) -> Result<usize, ScopeError> {
        let span = token.parse()?;
        self.ranges.set_selected_range(span);
        let selected = self.ranges.selected();
        apply_range(
            self.charts.get_mut(selected.chart),
            span,
            renderers.get_mut(selected.chart),
        )
    }

    /// Re-fits guides and markers after the renderer's visible extent moved (zoom or pan).
    pub fn view_changed(&mut self, kind: ChartKind, renderer: &mut dyn Renderer) {
        let chart = self.charts.get_mut(kind);
        let extent = renderer.current_axis_bounds();
        let guides = chart.measurements.redraw(extent);
        let markers = marker_updates(&*renderer, chart);
        renderer.apply_update(ChartPatch {
            guides,
            markers,
            ..ChartPatch::default()
        });
        debug!("{kind} view now {:.3}..{:.3}", extent.min, extent.max);
    }

    pub fn marker_pointer_down(&mut self, kind: ChartKind, index: usize) -> Result<(), ScopeError> {
        self.charts.get_mut(kind).channel_mut(index)?.marker.press();
        Ok(())
    }

    pub fn marker_pointer_move(
        &mut self,
        kind: ChartKind,
        index: usize,
        pixel: PixelPos,
        renderer: &mut dyn Renderer,
    ) -> Result<bool, ScopeError> {
        offset::drag_to(self.charts.get_mut(kind), index, pixel, renderer)
    }

    /// Ends a marker gesture; a release without movement selects the channel.
    pub fn marker_pointer_up(
        &mut self,
        kind: ChartKind,
        index: usize,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<DragOutcome>, ScopeError> {
        let outcome = self.charts.get_mut(kind).channel_mut(index)?.marker.release();
        if outcome == Some(DragOutcome::Clicked) {
            self.select_on(ChannelId::new(kind, index)?, renderer)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::buffer::indexed;
    use crate::scope::coords::{AxisBounds, Span};
    use crate::scope::render::testing::RecordingRenderer;
    use crate::scope::render::MarkerPlacement;

    const N: usize = 11;

    fn session() -> (ScopeSession, ChartPair<RecordingRenderer>) {
        let config = ScopeConfig {
            points_per_channel: N,
            ..ScopeConfig::default()
        };
        let mut session = ScopeSession::new(&config);
        for kind in ChartKind::ALL {
            let chart = session.chart_mut(kind);
            for idx in 0..chart.channels().len() {
                let center = chart.channel(idx).unwrap().center();
                // Ramp of slope 0.01 around each centre.
                let ys = (0..N).map(|i| center + i as f64 * 0.01);
                chart.replace(idx, indexed(ys)).unwrap();
            }
        }
        let mut renderers = ChartPair::from_fn(|_| RecordingRenderer::new((N - 1) as f64));
        session.init(&mut renderers).unwrap();
        (session, renderers)
    }

    // Pixel x of sample index 5 on the recording renderer.
    const MID_X: f64 = 550.0;

    #[test]
    fn init_draws_everything_and_applies_first_channel_range() {
        let (session, renderers) = session();
        assert_eq!(renderers.high.series.len(), 12);
        assert_eq!(renderers.low.series.len(), 12);
        assert_eq!(renderers.high.axis, AxisBounds::new(-5.0, 5.0));
        // LF keeps its overview bounds until one of its channels is selected.
        assert!((renderers.low.axis.max - 6.9).abs() < 1e-12);
        assert_eq!(session.ranges().selected().to_string(), "HF_1");
        assert!(renderers.high.series["HF Channel 4"].is_empty());
        assert_eq!(renderers.high.series["HF Channel 1"].len(), N);
    }

    #[test]
    fn placement_is_ignored_while_disabled() {
        let (mut session, mut renderers) = session();
        let hit = session.place_measurement(
            ChartKind::HighFreq,
            PixelPos::new(MID_X, 200.0),
            &mut renderers.high,
        );
        assert!(hit.is_none());
        assert!(renderers.high.guides.is_empty());
        assert!(session.get_measurements(ChartKind::HighFreq).is_empty());
    }

    #[test]
    fn placement_intersects_every_channel_and_caps_at_two_lines() {
        let (mut session, mut renderers) = session();
        session.toggle_measurement();
        let points = session
            .place_measurement(ChartKind::HighFreq, PixelPos::new(MID_X, 200.0), &mut renderers.high)
            .unwrap();
        // Hidden channels still answer.
        assert_eq!(points.len(), 12);
        assert!((points[0].x - 5.0).abs() < 1e-9);
        assert!((points[0].y - (-4.4 + 0.05)).abs() < 1e-9);
        assert_eq!(renderers.high.guide_xs().len(), 1);

        for px in [150.0, 950.0] {
            session.place_measurement(ChartKind::HighFreq, PixelPos::new(px, 300.0), &mut renderers.high);
        }
        let mut xs = renderers.high.guide_xs();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs.len(), 2);
        assert!((xs[0] - 1.0).abs() < 1e-9 && (xs[1] - 9.0).abs() < 1e-9);
        let guide = renderers.high.guides.values().next().unwrap();
        assert_eq!((guide.y_min, guide.y_max), (-5.0, 5.0));
        assert!(renderers.low.guides.is_empty());
    }

    #[test]
    fn clicks_outside_the_plot_or_before_layout_do_nothing() {
        let (mut session, mut renderers) = session();
        session.toggle_measurement();
        // Over the legend strip above the plot.
        assert!(session
            .place_measurement(ChartKind::HighFreq, PixelPos::new(MID_X, 40.0), &mut renderers.high)
            .is_none());
        // Right of the plot, where the markers are.
        assert!(session
            .place_measurement(ChartKind::HighFreq, PixelPos::new(1100.0, 200.0), &mut renderers.high)
            .is_none());
        let mut unlaid = RecordingRenderer::unlaid((N - 1) as f64);
        assert!(session
            .place_measurement(ChartKind::HighFreq, PixelPos::new(MID_X, 200.0), &mut unlaid)
            .is_none());
        assert!(session.get_measurements(ChartKind::HighFreq).is_empty());
    }

    #[test]
    fn measurements_track_live_buffers() {
        let (mut session, mut renderers) = session();
        session.toggle_measurement();
        session.place_measurement(ChartKind::LowFreq, PixelPos::new(MID_X, 200.0), &mut renderers.low);
        let before = session.get_measurements(ChartKind::LowFreq);
        assert!((before[0].points[2].y - (-2.8 + 0.05)).abs() < 1e-9);

        session
            .chart_mut(ChartKind::LowFreq)
            .replace(2, indexed([1.0; N]))
            .unwrap();
        let after = session.get_measurements(ChartKind::LowFreq);
        assert_eq!(after[0].cursor_x, before[0].cursor_x);
        assert_eq!(after[0].points[2].y, 1.0);

        let json = session.measurements_json().unwrap();
        assert!(json.contains("\"LF\""));
        assert!(json.contains("cursor_x"));
    }

    #[test]
    fn clear_removes_guides_on_both_charts() {
        let (mut session, mut renderers) = session();
        session.toggle_measurement();
        session.place_measurement(ChartKind::HighFreq, PixelPos::new(MID_X, 200.0), &mut renderers.high);
        session.place_measurement(ChartKind::LowFreq, PixelPos::new(MID_X, 200.0), &mut renderers.low);
        session.clear_measurements(&mut renderers);
        assert!(renderers.high.guides.is_empty());
        assert!(renderers.low.guides.is_empty());
        assert!(session.get_measurements(ChartKind::HighFreq).is_empty());
        assert!(session.measurement_enabled());
    }

    #[test]
    fn visibility_toggle_empties_and_restores_series() {
        let (mut session, mut renderers) = session();
        session
            .set_channel_visible(ChartKind::HighFreq, 0, false, &mut renderers.high)
            .unwrap();
        assert!(renderers.high.series["HF Channel 1"].is_empty());
        assert_eq!(renderers.high.markers[&0], MarkerPlacement::Hidden);
        assert_eq!(session.chart(ChartKind::HighFreq).channel(0).unwrap().buffer().points().len(), N);

        session
            .set_channel_visible(ChartKind::HighFreq, 0, true, &mut renderers.high)
            .unwrap();
        assert_eq!(renderers.high.series["HF Channel 1"].len(), N);
        assert!(session
            .set_channel_visible(ChartKind::HighFreq, 12, true, &mut renderers.high)
            .is_err());
    }

    #[test]
    fn labels_are_editable() {
        let (mut session, _) = session();
        session.set_channel_label(ChartKind::LowFreq, 4, "EMG left").unwrap();
        assert_eq!(session.chart(ChartKind::LowFreq).channel(4).unwrap().label, "EMG left");
        assert!(session.set_channel_label(ChartKind::LowFreq, 40, "x").is_err());
    }

    #[test]
    fn marker_click_selects_channel_and_restores_its_range() {
        let (mut session, mut renderers) = session();
        session.set_range("100mV", &mut renderers).unwrap();
        assert_eq!(renderers.high.axis, AxisBounds::new(-0.1, 0.1));

        session.marker_pointer_down(ChartKind::LowFreq, 2).unwrap();
        let outcome = session
            .marker_pointer_up(ChartKind::LowFreq, 2, &mut renderers.low)
            .unwrap();
        assert_eq!(outcome, Some(DragOutcome::Clicked));
        assert_eq!(session.ranges().selected().to_string(), "LF_3");
        assert_eq!(session.ranges().selected_range(), Span::V5);
        assert_eq!(renderers.low.axis, AxisBounds::new(-5.0, 5.0));

        let hf1 = ChannelId::new(ChartKind::HighFreq, 0).unwrap();
        session.select_channel(hf1, &mut renderers).unwrap();
        assert_eq!(session.ranges().selected_range(), Span::Mv100);
        assert_eq!(renderers.high.axis, AxisBounds::new(-0.1, 0.1));
    }

    #[test]
    fn marker_drag_moves_the_channel_without_selecting() {
        let (mut session, mut renderers) = session();
        session.marker_pointer_down(ChartKind::HighFreq, 1).unwrap();
        // Vertical middle of the plot is y = 0.
        assert!(session
            .marker_pointer_move(ChartKind::HighFreq, 1, PixelPos::new(1060.0, 280.0), &mut renderers.high)
            .unwrap());
        let outcome = session
            .marker_pointer_up(ChartKind::HighFreq, 1, &mut renderers.high)
            .unwrap();
        assert_eq!(outcome, Some(DragOutcome::Moved));
        assert_eq!(session.ranges().selected().to_string(), "HF_1");
        let channel = session.chart(ChartKind::HighFreq).channel(1).unwrap();
        assert!(channel.center().abs() < 1e-9);
        assert!((renderers.high.series["HF Channel 2"][0].y).abs() < 1e-9);
    }

    #[test]
    fn zoomed_view_refits_guides_until_range_resets_it() {
        let (mut session, mut renderers) = session();
        session.toggle_measurement();
        session.place_measurement(ChartKind::HighFreq, PixelPos::new(MID_X, 200.0), &mut renderers.high);

        // Wheel zoom on the renderer side: the visible extent shrinks to ±1 V.
        renderers.high.axis = AxisBounds::new(-1.0, 1.0);
        session.view_changed(ChartKind::HighFreq, &mut renderers.high);
        let guide = renderers.high.guides.values().next().unwrap();
        assert_eq!((guide.y_min, guide.y_max), (-1.0, 1.0));
        assert_eq!(renderers.high.guides.len(), 1);
        // Outer channels scrolled out of view, inner ones remain.
        assert_eq!(renderers.high.markers[&0], MarkerPlacement::Hidden);
        assert!(matches!(renderers.high.markers[&5], MarkerPlacement::Shown { .. }));
        // The logical axis used for clamping is untouched by zoom.
        assert_eq!(session.chart(ChartKind::HighFreq).axis, AxisBounds::new(-5.0, 5.0));

        session.set_range("5V", &mut renderers).unwrap();
        assert_eq!(renderers.high.axis, AxisBounds::new(-5.0, 5.0));
        let guide = renderers.high.guides.values().next().unwrap();
        assert_eq!((guide.y_min, guide.y_max), (-5.0, 5.0));
        assert!(matches!(renderers.high.markers[&0], MarkerPlacement::Shown { .. }));
    }

    #[test]
    fn fresh_press_clears_an_unfinished_drag() {
        let (mut session, mut renderers) = session();
        // A drag whose release never arrived.
        session.marker_pointer_down(ChartKind::LowFreq, 3).unwrap();
        session
            .marker_pointer_move(ChartKind::LowFreq, 3, PixelPos::new(1060.0, 250.0), &mut renderers.low)
            .unwrap();
        assert!(session.chart(ChartKind::LowFreq).channel(3).unwrap().marker().is_dragging());

        session.marker_pointer_down(ChartKind::LowFreq, 3).unwrap();
        let outcome = session
            .marker_pointer_up(ChartKind::LowFreq, 3, &mut renderers.low)
            .unwrap();
        assert_eq!(outcome, Some(DragOutcome::Clicked));
        assert_eq!(session.ranges().selected().to_string(), "LF_4");
    }

    #[test]
    fn unknown_range_token_keeps_stored_span() {
        let (mut session, mut renderers) = session();
        let patches = renderers.high.patches.len();
        assert!(matches!(
            session.set_range("7V", &mut renderers),
            Err(ScopeError::InvalidRangeToken(_))
        ));
        assert_eq!(session.ranges().selected_range(), Span::V5);
        assert_eq!(renderers.high.patches.len(), patches);
    }
}
