// src/types.rs
use std::fmt;
use std::str::FromStr;

use crate::scope::render::PixelPos;
use crate::scope::ScopeError;

/// Number of traces stacked in each chart.
pub const CHANNEL_COUNT: usize = 12;

// The two independent waveform views.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub enum ChartKind {
    HighFreq,
    LowFreq,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::HighFreq, ChartKind::LowFreq];

    /// Short tag used in channel ids, labels and series names.
    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::HighFreq => "HF",
            ChartKind::LowFreq => "LF",
        }
    }

    pub fn series_name(self, index: usize) -> String {
        format!("{} Channel {}", self.tag(), index + 1)
    }

    pub fn default_label(self, index: usize) -> String {
        format!("{}{}", self.tag(), index + 1)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Channel identity as shown in the channel selector: `HF_1` .. `LF_12`.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ChannelId {
    pub chart: ChartKind,
    pub index: usize,
}

impl ChannelId {
    pub fn new(chart: ChartKind, index: usize) -> Result<Self, ScopeError> {
        if index >= CHANNEL_COUNT {
            return Err(ScopeError::ChannelOutOfRange { index });
        }
        Ok(Self { chart, index })
    }

    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..CHANNEL_COUNT).flat_map(|index| {
            ChartKind::ALL
                .into_iter()
                .map(move |chart| ChannelId { chart, index })
        })
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chart.tag(), self.index + 1)
    }
}

impl FromStr for ChannelId {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ScopeError::Config(format!("unknown channel id `{s}`"));
        let (tag, number) = s.split_once('_').ok_or_else(bad)?;
        let chart = match tag {
            "HF" => ChartKind::HighFreq,
            "LF" => ChartKind::LowFreq,
            _ => return Err(bad()),
        };
        let number: usize = number.parse().map_err(|_| bad())?;
        if number == 0 {
            return Err(bad());
        }
        ChannelId::new(chart, number - 1)
    }
}

/// One value per chart, addressed by `ChartKind`. Charts never share mutable state.
#[derive(Clone, Debug, Default)]
pub struct ChartPair<T> {
    pub high: T,
    pub low: T,
}

impl<T> ChartPair<T> {
    pub fn from_fn(mut f: impl FnMut(ChartKind) -> T) -> Self {
        Self {
            high: f(ChartKind::HighFreq),
            low: f(ChartKind::LowFreq),
        }
    }

    pub fn get(&self, kind: ChartKind) -> &T {
        match kind {
            ChartKind::HighFreq => &self.high,
            ChartKind::LowFreq => &self.low,
        }
    }

    pub fn get_mut(&mut self, kind: ChartKind) -> &mut T {
        match kind {
            ChartKind::HighFreq => &mut self.high,
            ChartKind::LowFreq => &mut self.low,
        }
    }
}

// 界面一帧内收集的操作，帧末按顺序交给会话执行
#[derive(Clone, Debug, PartialEq)]
pub enum GuiCommand {
    PlaceMeasurement(ChartKind, PixelPos),
    ClearMeasurements,
    ToggleMeasurement,
    CopyMeasurements,
    SetVisible(ChartKind, usize, bool),
    SelectChannel(ChannelId),
    SetRange(String),
    // 滚轮缩放或拖动平移后的 Y 轴视图
    ViewChanged(ChartKind),
    // 通道标记拖动
    MarkerDown(ChartKind, usize),
    MarkerMove(ChartKind, usize, PixelPos),
    MarkerUp(ChartKind, usize),
    // 双击标记后编辑标签
    EditLabel(ChartKind, usize),
    CommitLabel(ChartKind, usize, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn channel_ids_round_trip_through_selector_text() {
        let id: ChannelId = "LF_12".parse().unwrap();
        assert_eq!(id, ChannelId { chart: ChartKind::LowFreq, index: 11 });
        assert_eq!(id.to_string(), "LF_12");
        assert_eq!(ChannelId::all().count(), 2 * CHANNEL_COUNT);
    }
    #[test]
    fn malformed_channel_ids_are_rejected() {
        for bad in ["HF_0", "HF_13", "XX_1", "HF1", "HF_x"] {
            assert!(bad.parse::<ChannelId>().is_err(), "{bad} should not parse");
        }
    }
}
