//! Burn inference backend for face embeddings.
//!
//! This module provides a `BurnEncoder` that implements `FeatureExtractor`
//! for running embedding models built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use occupancy_rs::integration::{BurnEncoder, BurnEmbeddingModel};
//! use burn::backend::NdArray;
//!
//! struct MyFaceNet { /* ... */ }
//!
//! impl BurnEmbeddingModel<NdArray> for MyFaceNet {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Option<Vec<f32>> {
//!         // Run inference
//!     }
//! }
//!
//! let encoder = BurnEncoder::new(MyFaceNet::load("facenet.bin"), Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;

use super::extractor::{FeatureExtractor, ImageRegion};
use crate::error::ExtractorError;

/// Trait for Burn-based embedding models.
pub trait BurnEmbeddingModel<B: Backend>: Send + Sync {
    /// Run forward pass on a `[1, channels, height, width]` tensor.
    ///
    /// Returns `None` if the model finds no face in the crop.
    fn forward(&self, input: Tensor<B, 4>) -> Option<Vec<f32>>;

    /// Expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 160, 160)
    }
}

/// Burn-based face encoder implementing `FeatureExtractor`.
pub struct BurnEncoder<B: Backend, M: BurnEmbeddingModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnEmbeddingModel<B>> BurnEncoder<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Convert an interleaved crop to a normalized `[1, C, H, W]` tensor,
    /// resizing it to the model's input size first.
    pub fn preprocess(&self, region: &ImageRegion) -> Result<Tensor<B, 4>, ExtractorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        if region.channels != channels {
            return Err(ExtractorError::Failed(format!(
                "crop has {} channels, model expects {}",
                region.channels, channels
            )));
        }
        let region = region.resized(target_w, target_h)?;

        let (c, h, w) = (channels as usize, target_h as usize, target_w as usize);
        // HWC -> CHW, scaled to [0, 1]
        let mut data = vec![0.0f32; c * h * w];
        for (i, &px) in region.data.iter().enumerate() {
            let channel = i % c;
            let pixel = i / c;
            data[channel * h * w + pixel] = px as f32 / 255.0;
        }

        Ok(Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([1, c, h, w]))
    }
}

impl<B: Backend, M: BurnEmbeddingModel<B>> FeatureExtractor for BurnEncoder<B, M> {
    fn extract(&mut self, region: &ImageRegion) -> Result<Option<Vec<f32>>, ExtractorError> {
        let tensor = self.preprocess(region)?;
        Ok(self.model.forward(tensor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    /// Reports the spatial size it was fed as a 2-d embedding.
    struct SizeReporter;

    impl BurnEmbeddingModel<NdArray> for SizeReporter {
        fn forward(&self, input: Tensor<NdArray, 4>) -> Option<Vec<f32>> {
            let [_, _, h, w] = input.dims();
            Some(vec![h as f32, w as f32])
        }

        fn input_size(&self) -> (u32, u32, u32) {
            (3, 16, 12)
        }
    }

    #[test]
    fn test_encoder_resizes_arbitrary_crops() {
        let mut encoder = BurnEncoder::<NdArray, SizeReporter>::new(SizeReporter, Default::default());
        let crop = ImageRegion::new(37, 53, 3, vec![128; 37 * 53 * 3]).unwrap();
        assert_eq!(encoder.extract(&crop).unwrap(), Some(vec![16.0, 12.0]));
    }

    #[test]
    fn test_encoder_rejects_wrong_channel_count() {
        let mut encoder = BurnEncoder::<NdArray, SizeReporter>::new(SizeReporter, Default::default());
        let crop = ImageRegion::new(4, 4, 1, vec![0; 16]).unwrap();
        assert!(matches!(encoder.extract(&crop), Err(ExtractorError::Failed(_))));
    }
}
