use std::collections::VecDeque;

use serde::Serialize;

use crate::scope::buffer::SamplePoint;
use crate::scope::coords::AxisBounds;
use crate::scope::intersect::{intersect, Intersection};
use crate::scope::render::{GuideId, GuideLine, GuideOp};
use crate::types::ChartKind;

/// Active cursors kept per chart; inserting past this evicts the oldest.
pub const MAX_LINES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureState {
    Idle,
    OneLine,
    TwoLines,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeasurementLine {
    pub x: f64,
}

/// A cursor position and the live crossings of every channel with it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurement {
    pub cursor_x: f64,
    pub points: Vec<Intersection>,
}

/// FIFO-capped set of measurement cursors for one chart plus the guide ids currently drawn.
#[derive(Clone, Debug)]
pub struct MeasurementLines {
    kind: ChartKind,
    lines: VecDeque<MeasurementLine>,
    drawn: Vec<GuideId>,
    next_guide: u64,
}

impl MeasurementLines {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            lines: VecDeque::with_capacity(MAX_LINES),
            drawn: Vec::new(),
            next_guide: 0,
        }
    }

    pub fn state(&self) -> MeasureState {
        match self.lines.len() {
            0 => MeasureState::Idle,
            1 => MeasureState::OneLine,
            _ => MeasureState::TwoLines,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.lines.iter().map(|l| l.x).collect()
    }

    /// Adds a cursor; returns the evicted one when already saturated.
    pub fn insert(&mut self, x: f64) -> Option<MeasurementLine> {
        let evicted = if self.lines.len() >= MAX_LINES {
            self.lines.pop_front()
        } else {
            None
        };
        self.lines.push_back(MeasurementLine { x });
        evicted
    }

    pub fn clear(&mut self) -> Vec<GuideOp> {
        self.lines.clear();
        self.drawn.drain(..).map(GuideOp::Remove).collect()
    }

    /// Replaces the drawn guides with one per active cursor spanning `extent`.
    ///
    /// Old ids are removed before the new ones are added; ids are never reused.
    pub fn redraw(&mut self, extent: AxisBounds) -> Vec<GuideOp> {
        let mut ops: Vec<GuideOp> = self.drawn.drain(..).map(GuideOp::Remove).collect();
        for (slot, line) in self.lines.iter().enumerate() {
            let id = GuideId::new(self.kind, self.next_guide, slot);
            self.next_guide += 1;
            self.drawn.push(id.clone());
            ops.push(GuideOp::Add(GuideLine {
                id,
                x: line.x,
                y_min: extent.min,
                y_max: extent.max,
            }));
        }
        ops
    }

    pub fn measurements(&self, snapshot: &[&[SamplePoint]]) -> Vec<Measurement> {
        self.lines
            .iter()
            .map(|line| Measurement {
                cursor_x: line.x,
                points: intersect(snapshot, line.x),
            })
            .collect()
    }
}
