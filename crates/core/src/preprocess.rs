//! Turns uploaded image bytes into a model input tensor.
//!
//! Pixels are kept in the 0-255 range: the exported classifiers carry their own
//! rescaling layer, so no normalization happens here.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Colour channels fed to every classifier (RGB).
pub const CHANNELS: usize = 3;

/// Memory order of the input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`, the Keras default
    #[default]
    Nhwc,
    /// `[batch, channels, height, width]`
    Nchw,
}

/// Spatial size and layout a classifier expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub height: u32,
    pub width: u32,
    pub layout: TensorLayout,
}

impl InputSpec {
    pub fn square(size: u32, layout: TensorLayout) -> Self {
        Self {
            height: size,
            width: size,
            layout,
        }
    }

    /// Full tensor shape including the batch dimension of 1.
    pub fn shape(&self) -> [usize; 4] {
        let (h, w) = (self.height as usize, self.width as usize);
        match self.layout {
            TensorLayout::Nhwc => [1, h, w, CHANNELS],
            TensorLayout::Nchw => [1, CHANNELS, h, w],
        }
    }
}

/// A single-image batch ready for inference.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("image upload is empty")]
    Empty,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode, convert to RGB and resize `bytes` to the classifier's input size.
pub fn preprocess(bytes: &[u8], spec: &InputSpec) -> Result<ImageTensor, PreprocessError> {
    if bytes.is_empty() {
        return Err(PreprocessError::Empty);
    }

    let decoded = image::load_from_memory(bytes)?;
    tracing::debug!(
        "Decoded {}x{} image ({:?})",
        decoded.width(),
        decoded.height(),
        decoded.color()
    );

    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, spec.width, spec.height, FilterType::CatmullRom);

    let data: Vec<f32> = match spec.layout {
        TensorLayout::Nhwc => resized.as_raw().iter().map(|&v| v as f32).collect(),
        TensorLayout::Nchw => {
            let mut planar = Vec::with_capacity(resized.as_raw().len());
            for channel in 0..CHANNELS {
                planar.extend(resized.pixels().map(|p| p.0[channel] as f32));
            }
            planar
        }
    };

    Ok(ImageTensor {
        shape: spec.shape(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn solid_rgba(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        png_bytes(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba(pixel),
        )))
    }

    #[test]
    fn resizes_and_drops_alpha() {
        let bytes = solid_rgba(40, 10, [200, 100, 50, 128]);
        let tensor = preprocess(&bytes, &InputSpec::square(16, TensorLayout::Nhwc)).unwrap();

        assert_eq!(tensor.shape, [1, 16, 16, 3]);
        assert_eq!(tensor.data.len(), 16 * 16 * 3);
        assert_eq!(&tensor.data[..3], &[200.0, 100.0, 50.0]);
    }

    #[test]
    fn keeps_raw_intensity_range() {
        let bytes = solid_rgba(8, 8, [255, 255, 255, 255]);
        let tensor = preprocess(&bytes, &InputSpec::square(4, TensorLayout::Nhwc)).unwrap();
        assert!(tensor.data.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn planar_layout_groups_channels() {
        let bytes = solid_rgba(5, 5, [10, 20, 30, 255]);
        let spec = InputSpec {
            height: 2,
            width: 3,
            layout: TensorLayout::Nchw,
        };
        let tensor = preprocess(&bytes, &spec).unwrap();

        assert_eq!(tensor.shape, [1, 3, 2, 3]);
        assert!(tensor.data[..6].iter().all(|&v| v == 10.0));
        assert!(tensor.data[6..12].iter().all(|&v| v == 20.0));
        assert!(tensor.data[12..].iter().all(|&v| v == 30.0));
    }

    #[test]
    fn grayscale_is_expanded_to_rgb() {
        let gray =
            DynamicImage::ImageLuma8(image::GrayImage::from_pixel(6, 6, image::Luma([77])));
        let tensor =
            preprocess(&png_bytes(gray), &InputSpec::square(3, TensorLayout::Nhwc)).unwrap();
        assert_eq!(tensor.data.len(), 27);
        assert!(tensor.data.iter().all(|&v| v == 77.0));
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        let spec = InputSpec::square(8, TensorLayout::Nhwc);
        assert!(matches!(
            preprocess(b"definitely not an image", &spec),
            Err(PreprocessError::Decode(_))
        ));
        assert!(matches!(preprocess(&[], &spec), Err(PreprocessError::Empty)));
    }
}
