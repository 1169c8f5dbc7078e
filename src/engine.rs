// src/engine.rs
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::scope::offset::marker_updates;
use crate::scope::render::{ChartPatch, Renderer, SeriesUpdate};
use crate::scope::source::{SeriesRequest, SignalSource};
use crate::scope::ScopeSession;
use crate::types::{ChartKind, ChartPair};

/// What one refresh pass did, summed over both charts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub installed: usize,
    pub skipped: usize, // 数据源本轮无新数据
    pub failed: usize,  // 数据被拒绝，保留旧缓冲区
}

/// Fixed-cadence driver. Runs on the UI thread and is polled from the frame callback,
/// so a tick always completes before the next interaction is handled.
pub struct RefreshLoop {
    interval: Duration,
    last_tick: Option<Instant>,
    ticks: u64,
}

impl RefreshLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
            ticks: 0,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        self.last_tick
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Ticks once if the interval has elapsed. Late polls do not queue extra ticks.
    pub fn poll<S, R>(
        &mut self,
        now: Instant,
        session: &mut ScopeSession,
        source: &mut S,
        renderers: &mut ChartPair<R>,
    ) -> Option<TickReport>
    where
        S: SignalSource + ?Sized,
        R: Renderer,
    {
        if !self.due(now) {
            return None;
        }
        self.last_tick = Some(now);
        Some(self.tick(session, source, renderers))
    }

    /// Replaces every channel's buffer of both charts and redraws them.
    pub fn tick<S, R>(
        &mut self,
        session: &mut ScopeSession,
        source: &mut S,
        renderers: &mut ChartPair<R>,
    ) -> TickReport
    where
        S: SignalSource + ?Sized,
        R: Renderer,
    {
        self.ticks += 1;
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };

        for kind in ChartKind::ALL {
            let chart = session.chart_mut(kind);

            // ============================================================
            // 1. 拉取新数据并整体替换缓冲区
            // ============================================================
            for index in 0..chart.channels().len() {
                let request = match chart.channel(index) {
                    Ok(channel) => SeriesRequest {
                        chart: kind,
                        channel: index,
                        center: channel.center(),
                        len: channel.buffer().expected_len(),
                    },
                    Err(err) => {
                        warn!("{kind} refresh: {err}");
                        report.failed += 1;
                        continue;
                    }
                };
                match source.next_series(request) {
                    Ok(Some(samples)) => match chart.replace(index, samples) {
                        Ok(()) => report.installed += 1,
                        Err(err) => {
                            warn!("{kind} channel {} refresh dropped: {err}", index + 1);
                            report.failed += 1;
                        }
                    },
                    Ok(None) => report.skipped += 1,
                    Err(err) => {
                        warn!("{kind} channel {} source error: {err}", index + 1);
                        report.failed += 1;
                    }
                }
            }

            // ============================================================
            // 2. 按名称推送所有序列，并刷新通道标记位置
            // ============================================================
            let renderer = renderers.get_mut(kind);
            let markers = marker_updates(&*renderer, chart);
            renderer.apply_update(ChartPatch {
                series: chart
                    .channels()
                    .iter()
                    .map(|channel| SeriesUpdate::for_channel(kind, channel))
                    .collect(),
                markers,
                ..ChartPatch::default()
            });
        }

        debug!(
            "tick {}: {} installed, {} skipped, {} failed",
            report.tick, report.installed, report.skipped, report.failed
        );
        report
    }
}
