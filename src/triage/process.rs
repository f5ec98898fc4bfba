//! Frame preprocessing applied before classification.
//!
//! The default transform keeps only the waveform panel of the diagnostic
//! screenshot and drops colour, since the models were trained on grayscale
//! crops replicated across three channels.

use crate::triage::config::{ProcessConfig, ProcessMode};
use image::{imageops, Rgb, RgbImage};
use tracing::debug;

/// Preprocessing capability injected into the sample loader.
pub trait Transform {
    fn name(&self) -> &str;
    fn apply(&self, frame: RgbImage) -> RgbImage;
}

/// Crop to a fixed region, convert to grayscale, replicate to RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGrayTransform {
    /// `[x0, y0, x1, y1]`, exclusive upper bounds.
    pub region: [u32; 4],
}

impl Default for CropGrayTransform {
    fn default() -> Self {
        Self {
            region: ProcessConfig::default().region,
        }
    }
}

impl CropGrayTransform {
    pub fn new(region: [u32; 4]) -> Self {
        Self { region }
    }

    /// Region clamped to the frame; `None` when nothing is left.
    fn clamped(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let [x0, y0, x1, y1] = self.region;
        let (x0, x1) = (x0.min(width), x1.min(width));
        let (y0, y1) = (y0.min(height), y1.min(height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

impl Transform for CropGrayTransform {
    fn name(&self) -> &str {
        "crop-gray"
    }

    fn apply(&self, frame: RgbImage) -> RgbImage {
        let cropped = match self.clamped(frame.width(), frame.height()) {
            Some((x, y, w, h)) => imageops::crop_imm(&frame, x, y, w, h).to_image(),
            None => {
                debug!(
                    "Crop region {:?} outside {}x{} frame, keeping full frame",
                    self.region,
                    frame.width(),
                    frame.height()
                );
                frame
            }
        };
        let mut gray = cropped;
        for pixel in gray.pixels_mut() {
            let l = luma(pixel);
            *pixel = Rgb([l, l, l]);
        }
        gray
    }
}

/// BT.601 luma, rounded to nearest.
fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

/// Leaves frames untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl Transform for IdentityTransform {
    fn name(&self) -> &str {
        "identity"
    }

    fn apply(&self, frame: RgbImage) -> RgbImage {
        frame
    }
}

/// Build the transform selected by configuration.
pub fn from_config(config: &ProcessConfig) -> Box<dyn Transform> {
    match config.mode {
        ProcessMode::Crop => Box::new(CropGrayTransform::new(config.region)),
        ProcessMode::Identity => Box::new(IdentityTransform),
    }
}
