use serde::Serialize;

use crate::scope::ScopeError;

/// One sample of a rendered trace: `x` is the sample index, `y` already includes the channel centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Fixed-length sample sequence backing one channel's trace.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    points: Vec<SamplePoint>,
    len: usize,
}

impl SampleBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            points: Vec::new(),
            len,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.len
    }

    /// Swaps in a complete new sequence. Readers see either the old or the new one in full.
    pub fn replace(&mut self, samples: Vec<SamplePoint>) -> Result<(), ScopeError> {
        if samples.len() != self.len {
            return Err(ScopeError::BufferLengthMismatch {
                expected: self.len,
                actual: samples.len(),
            });
        }
        self.points = samples;
        Ok(())
    }

    pub fn shift_y(&mut self, delta: f64) {
        for point in &mut self.points {
            point.y += delta;
        }
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }
}

pub fn indexed(values: impl IntoIterator<Item = f64>) -> Vec<SamplePoint> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, y)| SamplePoint::new(i as f64, y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn replace_rejects_wrong_length_and_keeps_old_data() {
        let mut buffer = SampleBuffer::new(4);
        buffer.replace(indexed([0.0, 1.0, 2.0, 3.0])).unwrap();
        let err = buffer.replace(indexed([9.0, 9.0])).unwrap_err();
        assert!(matches!(
            err,
            ScopeError::BufferLengthMismatch {
                expected: 4,
                actual: 2
            }
        ));
        assert_eq!(buffer.points()[3], SamplePoint::new(3.0, 3.0));
    }
    #[test]
    fn shift_moves_only_y() {
        let mut buffer = SampleBuffer::new(3);
        buffer.replace(indexed([0.0, 0.5, -0.5])).unwrap();
        buffer.shift_y(1.0);
        let ys: Vec<f64> = buffer.points().iter().map(|p| p.y).collect();
        let xs: Vec<f64> = buffer.points().iter().map(|p| p.x).collect();
        assert_eq!(ys, vec![1.0, 1.5, 0.5]);
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }
}
