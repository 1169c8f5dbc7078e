// src/gui.rs
use std::collections::BTreeMap;
use std::time::Instant;

use eframe::egui;
use egui::{Color32, Pos2, Vec2};
use egui_plot::{Line, LineStyle, Plot, PlotBounds, PlotPoint, PlotPoints, PlotTransform};
use log::warn;

use crate::engine::{RefreshLoop, TickReport};
use crate::scope::chart::Chart;
use crate::scope::coords::{AxisBounds, AxisUnit, Span};
use crate::scope::measure::MAX_LINES;
use crate::scope::render::{
    ChartPatch, DataPos, GuideId, GuideLine, GuideOp, MarkerPlacement, PixelPos, PlotArea,
    Renderer,
};
use crate::scope::{ScopeConfig, ScopeError, ScopeSession, SignalSource, SyntheticSource};
use crate::types::{ChannelId, ChartKind, ChartPair, GuiCommand};
use crate::visualizer::{self, MARKER_COLUMN_WIDTH};

// 滚轮缩放灵敏度（每个滚动点）
const ZOOM_PER_POINT: f64 = 0.001;

/// egui-side drawing state of one chart. Holds whatever the session last patched in and
/// the plot transform of the previous layout pass.
pub struct PlotSurface {
    transform: Option<PlotTransform>,
    x_max: f64,
    axis: AxisBounds,
    unit: AxisUnit,
    series: BTreeMap<String, Vec<[f64; 2]>>,
    guides: BTreeMap<GuideId, GuideLine>,
    markers: BTreeMap<usize, MarkerPlacement>,
}

impl PlotSurface {
    pub fn new(samples: usize) -> Self {
        Self {
            transform: None,
            x_max: samples.saturating_sub(1).max(1) as f64,
            axis: AxisBounds::new(-1.0, 1.0),
            unit: AxisUnit::default(),
            series: BTreeMap::new(),
            guides: BTreeMap::new(),
            markers: BTreeMap::new(),
        }
    }

    /// Last frame's transform, re-targeted at the current axis so patches applied since
    /// the last layout are already reflected.
    fn transform(&self) -> Result<PlotTransform, ScopeError> {
        let frame = match &self.transform {
            Some(transform) if transform.frame().width() > 0.0 && transform.frame().height() > 0.0 => {
                *transform.frame()
            }
            _ => return Err(ScopeError::CoordinateConversionFailure("plot not laid out yet")),
        };
        if !(self.axis.max > self.axis.min) {
            return Err(ScopeError::CoordinateConversionFailure("degenerate axis"));
        }
        Ok(PlotTransform::new(frame, self.plot_bounds(), false, false))
    }

    fn plot_bounds(&self) -> PlotBounds {
        PlotBounds::from_min_max([0.0, self.axis.min], [self.x_max, self.axis.max])
    }

    /// Scales the visible y extent about `anchor`; factors above 1 zoom in.
    fn zoom_y(&mut self, factor: f64, anchor: f64) -> bool {
        if !(factor > 0.0) || factor == 1.0 {
            return false;
        }
        let min = anchor - (anchor - self.axis.min) / factor;
        let max = anchor + (self.axis.max - anchor) / factor;
        if !(max - min > f64::EPSILON) {
            return false;
        }
        self.axis = AxisBounds::new(min, max);
        true
    }

    /// Pans by a vertical pointer drag of `dy` screen points (down is positive).
    fn pan_y(&mut self, dy: f64) -> bool {
        let Ok(transform) = self.transform() else {
            return false;
        };
        let shift = dy / transform.frame().height() as f64 * (self.axis.max - self.axis.min);
        if shift == 0.0 {
            return false;
        }
        self.axis = AxisBounds::new(self.axis.min + shift, self.axis.max + shift);
        true
    }
}

impl Renderer for PlotSurface {
    fn pixel_to_data(&self, pixel: PixelPos) -> Result<DataPos, ScopeError> {
        let point = self
            .transform()?
            .value_from_position(Pos2::new(pixel.x as f32, pixel.y as f32));
        Ok(DataPos::new(point.x, point.y))
    }

    fn data_to_pixel(&self, data: DataPos) -> Result<PixelPos, ScopeError> {
        let pos = self
            .transform()?
            .position_from_point(&PlotPoint::new(data.x, data.y));
        Ok(PixelPos::new(pos.x as f64, pos.y as f64))
    }

    fn plot_area(&self) -> Result<PlotArea, ScopeError> {
        let transform = self.transform()?;
        let frame = transform.frame();
        Ok(PlotArea {
            left: frame.left() as f64,
            top: frame.top() as f64,
            right: frame.right() as f64,
            bottom: frame.bottom() as f64,
        })
    }

    fn apply_update(&mut self, patch: ChartPatch) {
        if let Some(axis) = patch.axis {
            self.axis = axis.bounds;
            self.unit = axis.unit;
        }
        for update in patch.series {
            let points = update.points.iter().map(|p| p.as_array()).collect();
            self.series.insert(update.name, points);
        }
        for op in patch.guides {
            match op {
                GuideOp::Add(guide) => {
                    self.guides.insert(guide.id.clone(), guide);
                }
                GuideOp::Remove(id) => {
                    self.guides.remove(&id);
                }
            }
        }
        for marker in patch.markers {
            self.markers.insert(marker.channel, marker.placement);
        }
    }

    fn current_axis_bounds(&self) -> AxisBounds {
        self.axis
    }
}

pub struct DualScopeApp {
    session: ScopeSession,
    surfaces: ChartPair<PlotSurface>,
    source: Box<dyn SignalSource>,
    refresh: RefreshLoop,
    last_report: TickReport,
    label_edit: Option<(ChartKind, usize, String)>,
    status: String,
}

impl DualScopeApp {
    pub fn new(config: &ScopeConfig) -> Self {
        let mut session = ScopeSession::new(config);
        let mut surfaces = ChartPair::from_fn(|_| PlotSurface::new(config.points_per_channel));
        if let Err(err) = session.init(&mut surfaces) {
            warn!("initial draw incomplete: {err}");
        }
        Self {
            session,
            surfaces,
            source: Box::new(match config.seed {
                Some(seed) => SyntheticSource::seeded(config, seed),
                None => SyntheticSource::new(config),
            }),
            refresh: RefreshLoop::new(config.refresh_interval()),
            last_report: TickReport::default(),
            label_edit: None,
            status: String::new(),
        }
    }

    fn apply(&mut self, command: GuiCommand, ctx: &egui::Context) {
        let result = match command {
            GuiCommand::PlaceMeasurement(kind, pixel) => {
                self.session
                    .place_measurement(kind, pixel, self.surfaces.get_mut(kind));
                Ok(())
            }
            GuiCommand::ClearMeasurements => {
                self.session.clear_measurements(&mut self.surfaces);
                Ok(())
            }
            GuiCommand::ViewChanged(kind) => {
                self.session.view_changed(kind, self.surfaces.get_mut(kind));
                Ok(())
            }
            GuiCommand::ToggleMeasurement => {
                self.session.toggle_measurement();
                Ok(())
            }
            GuiCommand::CopyMeasurements => self.session.measurements_json().map(|json| {
                ctx.output_mut(|o| o.copied_text = json);
                self.status = "Measurements copied to clipboard".to_owned();
            }),
            GuiCommand::SetVisible(kind, index, visible) => {
                self.session
                    .set_channel_visible(kind, index, visible, self.surfaces.get_mut(kind))
            }
            GuiCommand::SelectChannel(id) => self.session.select_channel(id, &mut self.surfaces),
            GuiCommand::SetRange(token) => self
                .session
                .set_range(&token, &mut self.surfaces)
                .map(|_| ()),
            GuiCommand::MarkerDown(kind, index) => self.session.marker_pointer_down(kind, index),
            GuiCommand::MarkerMove(kind, index, pixel) => self
                .session
                .marker_pointer_move(kind, index, pixel, self.surfaces.get_mut(kind))
                .map(|_| ()),
            GuiCommand::MarkerUp(kind, index) => self
                .session
                .marker_pointer_up(kind, index, self.surfaces.get_mut(kind))
                .map(|_| ()),
            GuiCommand::EditLabel(kind, index) => self
                .session
                .chart(kind)
                .channel(index)
                .map(|channel| self.label_edit = Some((kind, index, channel.label.clone()))),
            GuiCommand::CommitLabel(kind, index, text) => {
                self.session.set_channel_label(kind, index, &text)
            }
        };
        if let Err(err) = result {
            warn!("{err}");
            self.status = err.to_string();
        }
    }

    fn controls(&self, ui: &mut egui::Ui, commands: &mut Vec<GuiCommand>) {
        ui.horizontal(|ui| {
            let current = self.session.ranges().selected();
            let mut selected = current;
            ui.label("Channel");
            egui::ComboBox::from_id_source("channel_select")
                .selected_text(current.to_string())
                .show_ui(ui, |ui| {
                    for id in ChannelId::all() {
                        ui.selectable_value(&mut selected, id, id.to_string());
                    }
                });
            if selected != current {
                commands.push(GuiCommand::SelectChannel(selected));
            }

            let span = self.session.ranges().selected_range();
            let mut picked = span;
            ui.label("Range");
            egui::ComboBox::from_id_source("range_select")
                .selected_text(span.token())
                .show_ui(ui, |ui| {
                    for candidate in Span::ALL {
                        ui.selectable_value(&mut picked, candidate, candidate.token());
                    }
                });
            if picked != span {
                commands.push(GuiCommand::SetRange(picked.token().to_owned()));
            }

            ui.separator();
            let measuring = self.session.measurement_enabled();
            let (text, fill) = if measuring {
                ("Stop measuring", Color32::from_rgb(211, 47, 47))
            } else {
                ("Start measuring", Color32::from_rgb(76, 175, 80))
            };
            let toggle = egui::Button::new(egui::RichText::new(text).color(Color32::WHITE)).fill(fill);
            if ui.add(toggle).clicked() {
                commands.push(GuiCommand::ToggleMeasurement);
            }
            if ui.button("Clear lines").clicked() {
                commands.push(GuiCommand::ClearMeasurements);
            }
            if ui.button("Copy JSON").clicked() {
                commands.push(GuiCommand::CopyMeasurements);
            }
        });
    }

    fn readout(&self, ui: &mut egui::Ui) {
        for kind in ChartKind::ALL {
            let chart = self.session.chart(kind);
            if chart.measurements.is_empty() {
                continue;
            }
            let unit = self.surfaces.get(kind).unit;
            ui.small(format!("{kind}: {}/{MAX_LINES} cursors", chart.measurements.len()));
            for measurement in self.session.get_measurements(kind) {
                let values: Vec<String> = measurement
                    .points
                    .iter()
                    .filter_map(|point| {
                        let channel = chart.channel(point.channel).ok()?;
                        channel.visible.then(|| {
                            format!("{} {} {}", channel.label, unit.format_tick(point.y), unit.name())
                        })
                    })
                    .collect();
                ui.monospace(format!(
                    "{kind} @ {}: {}",
                    chart.time_base.format_tick(measurement.cursor_x),
                    values.join("  ")
                ));
            }
        }
        ui.horizontal(|ui| {
            ui.small(format!(
                "tick {}  ({} failed)",
                self.last_report.tick, self.last_report.failed
            ));
            if !self.status.is_empty() {
                ui.small(&self.status);
            }
        });
    }

    fn label_editor(&mut self, ctx: &egui::Context, commands: &mut Vec<GuiCommand>) {
        let Some((kind, index, text)) = self.label_edit.as_mut() else {
            return;
        };
        let (kind, index) = (*kind, *index);
        let mut done = None;
        egui::Window::new("Edit channel label")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let edit = ui.text_edit_singleline(text);
                let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() || entered {
                        done = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        done = Some(false);
                    }
                });
            });
        match done {
            Some(true) => {
                commands.push(GuiCommand::CommitLabel(kind, index, text.clone()));
                self.label_edit = None;
            }
            Some(false) => self.label_edit = None,
            None => {}
        }
    }
}

/// Legend row, plot and marker column of one chart.
fn chart_view(
    ui: &mut egui::Ui,
    chart: &Chart,
    surface: &mut PlotSurface,
    selected: ChannelId,
    height: f32,
    commands: &mut Vec<GuiCommand>,
) {
    let kind = chart.kind;
    ui.horizontal_wrapped(|ui| {
        ui.strong(format!("{kind} ({})", surface.unit.name()));
        for channel in chart.channels() {
            let color = visualizer::to_color32(channel.color);
            if visualizer::legend_chip(ui, color, &channel.label, channel.visible).clicked() {
                commands.push(GuiCommand::SetVisible(kind, channel.index, !channel.visible));
            }
        }
    });

    ui.horizontal(|ui| {
        let width = (ui.available_width() - MARKER_COLUMN_WIDTH).max(100.0);
        let bounds = surface.plot_bounds();
        let time_base = chart.time_base.clone();
        let unit = surface.unit;

        let response = Plot::new(format!("{kind}_plot"))
            .width(width)
            .height(height)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .show_x(false)
            .show_y(false)
            .x_axis_formatter(move |x, _, _| time_base.format_tick(x))
            .y_axis_formatter(move |y, _, _| unit.format_tick(y))
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(bounds);
                for channel in chart.channels() {
                    let name = kind.series_name(channel.index);
                    let Some(points) = surface.series.get(&name) else {
                        continue;
                    };
                    if points.is_empty() {
                        continue;
                    }
                    plot_ui.line(
                        Line::new(PlotPoints::new(points.clone()))
                            .color(visualizer::to_color32(channel.color))
                            .width(1.0)
                            .name(&channel.label),
                    );
                }
                for guide in surface.guides.values() {
                    plot_ui.line(
                        Line::new(PlotPoints::new(vec![
                            [guide.x, guide.y_min],
                            [guide.x, guide.y_max],
                        ]))
                        .color(Color32::from_rgb(255, 80, 80))
                        .style(LineStyle::Dashed { length: 6.0 }),
                    );
                }
            });

        surface.transform = Some(response.transform);
        let plot = &response.response;
        if plot.clicked() || plot.secondary_clicked() {
            if let Some(pos) = plot.interact_pointer_pos() {
                commands.push(GuiCommand::PlaceMeasurement(
                    kind,
                    PixelPos::new(pos.x as f64, pos.y as f64),
                ));
            }
        }

        // Y 轴滚轮缩放与拖动平移，X 轴固定
        let mut view_moved = false;
        if plot.hovered() {
            let scroll = ui.input(|i| i.scroll_delta.y) as f64;
            if scroll != 0.0 {
                if let Some(pos) = plot.hover_pos() {
                    if let Ok(anchor) = surface.pixel_to_data(PixelPos::new(pos.x as f64, pos.y as f64)) {
                        let factor = (1.0 + scroll * ZOOM_PER_POINT).clamp(0.5, 2.0);
                        view_moved |= surface.zoom_y(factor, anchor.y);
                    }
                }
            }
        }
        if plot.dragged_by(egui::PointerButton::Primary) {
            view_moved |= surface.pan_y(plot.drag_delta().y as f64);
        }
        if view_moved {
            commands.push(GuiCommand::ViewChanged(kind));
        }

        let (column, _) = ui.allocate_exact_size(
            Vec2::new(MARKER_COLUMN_WIDTH, height),
            egui::Sense::hover(),
        );
        for channel in chart.channels() {
            let Some(MarkerPlacement::Shown { pixel_y }) = surface.markers.get(&channel.index)
            else {
                continue;
            };
            let rect = visualizer::marker_rect(column, *pixel_y as f32);
            let id = ui.id().with((kind, channel.index));
            let marker = ui.interact(rect, id, egui::Sense::click_and_drag());
            visualizer::paint_marker(
                ui.painter(),
                rect,
                visualizer::to_color32(channel.color),
                &channel.label,
                selected == ChannelId { chart: kind, index: channel.index }
                    || channel.marker().is_dragging(),
            );
            marker_events(&marker, kind, channel.index, commands);
        }
    });
}

// 每次按下都重新开始手势，不依赖上一次残留的拖动状态
fn marker_events(
    marker: &egui::Response,
    kind: ChartKind,
    index: usize,
    commands: &mut Vec<GuiCommand>,
) {
    if marker.drag_started() || marker.clicked() {
        commands.push(GuiCommand::MarkerDown(kind, index));
    }
    if marker.dragged() && marker.drag_delta() != Vec2::ZERO {
        if let Some(pos) = marker.interact_pointer_pos() {
            commands.push(GuiCommand::MarkerMove(
                kind,
                index,
                PixelPos::new(pos.x as f64, pos.y as f64),
            ));
        }
    }
    if marker.drag_released() || marker.clicked() {
        commands.push(GuiCommand::MarkerUp(kind, index));
    }
    if marker.double_clicked() {
        commands.push(GuiCommand::EditLabel(kind, index));
    }
}

impl eframe::App for DualScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 定时刷新（在界面线程内完成，不与交互交错）
        let now = Instant::now();
        if let Some(report) =
            self.refresh
                .poll(now, &mut self.session, self.source.as_mut(), &mut self.surfaces)
        {
            self.last_report = report;
        }
        ctx.request_repaint_after(self.refresh.time_until_next(Instant::now()));

        // 2. UI 绘制，操作先收集后执行
        let mut commands = Vec::new();
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.controls(ui, &mut commands);
            ui.add_space(4.0);
        });
        egui::TopBottomPanel::bottom("readout").show(ctx, |ui| self.readout(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            let selected = self.session.ranges().selected();
            let height = ((ui.available_height() - 80.0) / 2.0).max(120.0);
            for kind in ChartKind::ALL {
                chart_view(
                    ui,
                    self.session.chart(kind),
                    self.surfaces.get_mut(kind),
                    selected,
                    height,
                    &mut commands,
                );
            }
        });
        self.label_editor(ctx, &mut commands);

        // 3. 执行本帧收集的操作
        for command in commands {
            self.apply(command, ctx);
        }
    }
}
