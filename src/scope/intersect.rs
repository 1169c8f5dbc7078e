use serde::Serialize;

use crate::scope::buffer::SamplePoint;

/// Tolerance for the endpoint fallback when no segment brackets the query.
const ENDPOINT_TOLERANCE: f64 = 1e-9;

/// Where one channel's polyline crosses a vertical cursor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Intersection {
    pub channel: usize,
    pub x: f64,
    pub y: f64,
}

/// Interpolated crossing of every channel with the vertical line at `x`.
///
/// Channels with no bracketing segment (and no endpoint within tolerance) are left out,
/// so the result may be shorter than `buffers`. Order follows channel index.
pub fn intersect(buffers: &[&[SamplePoint]], x: f64) -> Vec<Intersection> {
    buffers
        .iter()
        .enumerate()
        .filter_map(|(channel, points)| {
            crossing(points, x).map(|y| Intersection { channel, x, y })
        })
        .collect()
}

/// Linear interpolation against the first segment that brackets `x`.
pub fn crossing(points: &[SamplePoint], x: f64) -> Option<f64> {
    let bracket = points.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        let within = (a.x <= x && x <= b.x) || (b.x <= x && x <= a.x);
        within.then(|| {
            if a.x == b.x {
                // Vertical segment: take the earlier point.
                a.y
            } else {
                a.y + (b.y - a.y) * ((x - a.x) / (b.x - a.x))
            }
        })
    });
    bracket.or_else(|| {
        let first = points.first()?;
        let last = points.last()?;
        if (last.x - x).abs() < ENDPOINT_TOLERANCE {
            Some(last.y)
        } else if (first.x - x).abs() < ENDPOINT_TOLERANCE {
            Some(first.y)
        } else {
            None
        }
    })
}
