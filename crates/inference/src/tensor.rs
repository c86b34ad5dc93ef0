use crate::error::DetectionError;
use ndarray::{Array4, ArrayD, ArrayView4, ArrayViewD};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Model input size (width, height). The model was exported with a fixed
/// 640x640 input; feeding anything else is undefined behavior on its side.
pub const MODEL_INPUT_WIDTH: u32 = 640;
pub const MODEL_INPUT_HEIGHT: u32 = 640;

/// Raw output layout: [1, 5, 8400]. Four box-coordinate channels plus one
/// score channel, over 8400 candidate detections.
pub const OUTPUT_CHANNELS: usize = 5;
pub const NUM_CANDIDATES: usize = 8400;

static LIVE_TENSORS: AtomicUsize = AtomicUsize::new(0);

/// Number of tensor wrappers currently alive in the process. Requests own
/// their tensors exclusively, so a quiescent process reads zero here.
pub fn live_tensor_count() -> usize {
    LIVE_TENSORS.load(Ordering::SeqCst)
}

/// Increments the live count on creation, decrements on drop. Held by every
/// tensor newtype so leaks are observable in tests.
struct AllocationGuard;

impl AllocationGuard {
    fn new() -> Self {
        LIVE_TENSORS.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl Drop for AllocationGuard {
    fn drop(&mut self) {
        LIVE_TENSORS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A preprocessed model input: NCHW `[1, 3, 640, 640]`, values in `[0.0, 1.0]`.
/// Single-owner per request; dropping it releases the buffer.
pub struct ImageTensor {
    data: Array4<f32>,
    _guard: AllocationGuard,
}

impl ImageTensor {
    /// Build from a channel-planar pixel buffer (R plane, G plane, B plane).
    /// The buffer length must match the fixed input shape exactly.
    pub fn from_pixels(pixels: Vec<f32>) -> Result<Self, DetectionError> {
        let shape = (
            1,
            3,
            MODEL_INPUT_HEIGHT as usize,
            MODEL_INPUT_WIDTH as usize,
        );
        let data = Array4::from_shape_vec(shape, pixels).map_err(|e| {
            DetectionError::ImageDecode(format!("pixel buffer does not fit input shape: {}", e))
        })?;
        Ok(Self {
            data,
            _guard: AllocationGuard::new(),
        })
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// The model's raw output tensor, shape-unchecked until decoding. Ephemeral:
/// produced by execution, consumed by the decoder.
pub struct RawOutput {
    data: ArrayD<f32>,
    _guard: AllocationGuard,
}

impl RawOutput {
    pub fn new(data: ArrayD<f32>) -> Self {
        Self {
            data,
            _guard: AllocationGuard::new(),
        }
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }
}
