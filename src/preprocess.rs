//! Image normalization for the classifier input

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use ndarray::Array4;

use crate::error::{AnalysisError, Result};

/// Spatial size the classifier expects, as (width, height)
pub const INPUT_SIZE: (u32, u32) = (224, 224);

/// Default resampling filter (bicubic)
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// A decoded image tagged by whether it carries colour.
///
/// Grayscale sources keep their luminance untouched; colour sources are
/// reduced to luminance before the fixed pipeline runs.
pub enum SourceImage<'a> {
    Grayscale(GrayImage),
    Color(&'a DynamicImage),
}

impl<'a> SourceImage<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        match image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                Self::Grayscale(image.to_luma8())
            }
            _ => Self::Color(image),
        }
    }

    pub fn is_grayscale(&self) -> bool {
        matches!(self, Self::Grayscale(_))
    }

    /// Single-channel luminance of the source
    pub fn into_luma(self) -> GrayImage {
        match self {
            Self::Grayscale(luma) => luma,
            Self::Color(image) => luma_601(&image.to_rgb8()),
        }
    }
}

/// ITU-R 601-2 luma, `L = R * 299/1000 + G * 587/1000 + B * 114/1000`
fn luma_601(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([l as u8])
    })
}

/// Normalize an image into a `(1, height, width, 3)` tensor.
///
/// Steps:
/// 1. Reduce to single-channel luminance
/// 2. Replicate that channel into three
/// 3. Resize to `target_size` with [`RESAMPLE_FILTER`]
/// 4. Scale pixel values from [0, 255] to [0, 1]
/// 5. Add a leading batch dimension
pub fn normalize(image: &DynamicImage, target_size: (u32, u32)) -> Result<Array4<f32>> {
    let (target_w, target_h) = target_size;
    if target_w == 0 || target_h == 0 {
        return Err(AnalysisError::normalization(format!(
            "invalid target size {}x{}",
            target_w, target_h
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::normalization("image has no pixels"));
    }

    let source = SourceImage::new(image);
    tracing::trace!(
        width = image.width(),
        height = image.height(),
        grayscale = source.is_grayscale(),
        "Normalizing image"
    );

    let luma = source.into_luma();
    let rgb = replicate_channels(&luma);
    let resized = if rgb.dimensions() == target_size {
        rgb
    } else {
        imageops::resize(&rgb, target_w, target_h, RESAMPLE_FILTER)
    };

    Ok(to_tensor(&resized))
}

fn replicate_channels(luma: &GrayImage) -> RgbImage {
    RgbImage::from_fn(luma.width(), luma.height(), |x, y| {
        let v = luma.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

fn to_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    )
}
