//! Trait for feature-extraction backends (face encoders and the like).

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};

use crate::error::ExtractorError;

/// A cropped, row-major, interleaved 8-bit image region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRegion {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Vec<u8>,
}

impl ImageRegion {
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Result<Self, ExtractorError> {
        let expected = (width * height * channels) as usize;
        if data.len() != expected {
            return Err(ExtractorError::InvalidRegion {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Scale the region to `width` x `height` with a triangle filter.
    ///
    /// Supports 1, 3 and 4 channel regions.
    pub fn resized(&self, width: u32, height: u32) -> Result<ImageRegion, ExtractorError> {
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }
        let data = match self.channels {
            1 => self.resize_as::<Luma<u8>>(width, height)?,
            3 => self.resize_as::<Rgb<u8>>(width, height)?,
            4 => self.resize_as::<Rgba<u8>>(width, height)?,
            n => {
                return Err(ExtractorError::Failed(format!(
                    "cannot resize a {n}-channel region"
                )));
            }
        };
        ImageRegion::new(width, height, self.channels, data)
    }

    fn resize_as<P>(&self, width: u32, height: u32) -> Result<Vec<u8>, ExtractorError>
    where
        P: Pixel<Subpixel = u8> + 'static,
    {
        let buffer: ImageBuffer<P, Vec<u8>> =
            ImageBuffer::from_raw(self.width, self.height, self.data.clone()).ok_or(
                ExtractorError::InvalidRegion {
                    expected: (self.width * self.height * self.channels) as usize,
                    got: self.data.len(),
                },
            )?;
        Ok(imageops::resize(&buffer, width, height, FilterType::Triangle).into_raw())
    }
}

/// Trait for feature-extraction backends.
///
/// Implement this trait to plug any face encoder into the pipeline.
///
/// # Example
///
/// ```ignore
/// use occupancy_rs::{FeatureExtractor, ImageRegion, ExtractorError};
///
/// struct MyEncoder {
///     // Your model here
/// }
///
/// impl FeatureExtractor for MyEncoder {
///     fn extract(&mut self, region: &ImageRegion) -> Result<Option<Vec<f32>>, ExtractorError> {
///         // Run the encoder; Ok(None) when no face was found in the crop
///         Ok(None)
///     }
/// }
/// ```
pub trait FeatureExtractor {
    /// Compute a feature vector for `region`.
    ///
    /// `Ok(None)` means the crop had no usable features; the caller skips
    /// identification for this occurrence.
    fn extract(&mut self, region: &ImageRegion) -> Result<Option<Vec<f32>>, ExtractorError>;
}

impl<F> FeatureExtractor for F
where
    F: FnMut(&ImageRegion) -> Result<Option<Vec<f32>>, ExtractorError>,
{
    fn extract(&mut self, region: &ImageRegion) -> Result<Option<Vec<f32>>, ExtractorError> {
        self(region)
    }
}

/// Extractor that never finds features. Used when no encoder is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtractor;

impl FeatureExtractor for NoopExtractor {
    fn extract(&mut self, _region: &ImageRegion) -> Result<Option<Vec<f32>>, ExtractorError> {
        Ok(None)
    }
}
