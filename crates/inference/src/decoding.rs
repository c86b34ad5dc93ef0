use crate::error::DetectionError;
use crate::tensor::{NUM_CANDIDATES, OUTPUT_CHANNELS, RawOutput};
use serde::Serialize;

/// All 8400 raw candidates, unfiltered and unsorted. Boxes are `[x, y, w, h]`
/// exactly as the model emits them; filtering and NMS are the caller's job.
#[derive(Debug, Serialize)]
pub struct DetectionSet {
    pub boxes: Vec<[f32; 4]>,
    pub scores: Vec<f32>,
    pub classes: Vec<u32>,
}

impl DetectionSet {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Reinterpret the raw `[1, 5, 8400]` output: channels 0..4 are the box
/// coordinates, channel 4 is the score. The class index is structurally 0
/// for every candidate; the model has a single-class head.
///
/// Pure single-pass transform; consumes the raw tensor.
pub fn decode_output(raw: RawOutput) -> Result<DetectionSet, DetectionError> {
    let expected = [1, OUTPUT_CHANNELS, NUM_CANDIDATES];
    if raw.shape() != expected {
        return Err(DetectionError::OutputShape {
            expected: expected.to_vec(),
            actual: raw.shape().to_vec(),
        });
    }

    let view = raw.view();
    let mut boxes = Vec::with_capacity(NUM_CANDIDATES);
    let mut scores = Vec::with_capacity(NUM_CANDIDATES);

    for i in 0..NUM_CANDIDATES {
        boxes.push([
            view[[0, 0, i]],
            view[[0, 1, i]],
            view[[0, 2, i]],
            view[[0, 3, i]],
        ]);
        scores.push(view[[0, 4, i]]);
    }

    Ok(DetectionSet {
        boxes,
        scores,
        classes: vec![0; NUM_CANDIDATES],
    })
}
