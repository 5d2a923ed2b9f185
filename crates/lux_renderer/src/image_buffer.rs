//! Radiance accumulation buffer and tone mapping.
//!
//! Pixels hold the running *sum* of all samples added so far. Averaging,
//! tone mapping and gamma encoding happen only when the image is read out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lux_math::Vec3;
use thiserror::Error;

use crate::Color;

/// Identifies the encoder in PPM headers.
pub const PPM_GENERATOR_ID: &str = "lux_renderer";

/// Display luminance the tone mapper targets, in cd/m^2.
pub const DISPLAY_LUMINANCE_MAX: f64 = 200.0;

/// Rec. 709 luminance weights.
pub const RGB_LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Gamma encoding exponent.
pub const GAMMA_ENCODE: f64 = 0.45;

/// Floor on pixel luminance before taking its log.
const MIN_LUMINANCE: f64 = 1e-4;

/// Errors that can occur when writing an image out.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Image dimensions mismatch: image is {expected_width}x{expected_height}, target is {found_width}x{found_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },
}

/// Result type for image output.
pub type ImageResult<T> = Result<T, ImageError>;

/// Scaling from accumulated radiance to 8-bit display values, fixed for
/// one read-out of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapper {
    scale: f64,
}

impl ToneMapper {
    /// Overall factor applied to accumulated channel values.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map one accumulated channel value to a gamma-encoded byte.
    #[inline]
    pub fn map(&self, channel: f64) -> u8 {
        let gammaed = (channel * self.scale).max(0.0).powf(GAMMA_ENCODE);
        (gammaed * 255.0).round().min(255.0) as u8
    }

    #[inline]
    pub fn map_color(&self, color: Color) -> [u8; 3] {
        [self.map(color.x), self.map(color.y), self.map(color.z)]
    }
}

/// Accumulation buffer of radiance sums.
#[derive(Debug, Clone)]
pub struct Image {
    width: u32,
    height: u32,
    /// Stored top row first, the order images are written in
    pixels: Vec<Color>,
}

impl Image {
    /// Create a new image filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Storage index for (x, y), with y counting up from the bottom row.
    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| x as usize + (self.height - 1 - y) as usize * self.width as usize)
    }

    /// Add a radiance sample to pixel (x, y); y counts up from the bottom.
    /// Coordinates outside the image are ignored.
    pub fn add_to_pixel(&mut self, x: u32, y: u32, radiance: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] += radiance;
        }
    }

    /// Accumulated sum at (x, y); y counts up from the bottom.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.index(x, y).map_or(Color::ZERO, |i| self.pixels[i])
    }

    /// Accumulated sums, top row first.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Build the tone mapper for a read-out.
    ///
    /// `iteration` is the zero-based index of the last completed pass, so
    /// the accumulated sums are divided by `iteration + 1`.
    pub fn tone_mapper(&self, iteration: u32) -> ToneMapper {
        let divider = 1.0 / (1.0 + iteration as f64);
        ToneMapper {
            scale: self.tone_mapping_scale(divider) * divider,
        }
    }

    /// Ward's contrast-preserving scale factor for the averaged image.
    fn tone_mapping_scale(&self, divider: f64) -> f64 {
        let log_mean_luminance = if self.pixels.is_empty() {
            MIN_LUMINANCE
        } else {
            let sum_of_logs: f64 = self
                .pixels
                .iter()
                .map(|p| (divider * p.dot(RGB_LUMINANCE)).max(MIN_LUMINANCE).ln())
                .sum();
            (sum_of_logs / self.pixels.len() as f64).exp()
        };

        let a = 1.219 + (DISPLAY_LUMINANCE_MAX * 0.25).powf(0.4);
        let b = 1.219 + log_mean_luminance.powf(0.4);
        (a / b).powf(2.5) / DISPLAY_LUMINANCE_MAX
    }

    /// Tone-mapped RGB bytes, top row first.
    pub fn to_rgb(&self, iteration: u32) -> Vec<u8> {
        let mapper = self.tone_mapper(iteration);
        self.pixels.iter().flat_map(|&p| mapper.map_color(p)).collect()
    }

    /// Tone-mapped RGBA bytes (opaque), top row first.
    pub fn to_rgba(&self, iteration: u32) -> Vec<u8> {
        let mapper = self.tone_mapper(iteration);
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for &p in &self.pixels {
            let [r, g, b] = mapper.map_color(p);
            bytes.extend_from_slice(&[r, g, b, 255]);
        }
        bytes
    }

    /// Copy tone-mapped RGBA into a caller-owned buffer of the given size.
    pub fn blit_rgba(&self, target: &mut [u8], width: u32, height: u32, iteration: u32) -> ImageResult<()> {
        let expected_len = self.pixels.len() * 4;
        if width != self.width || height != self.height || target.len() != expected_len {
            return Err(ImageError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                found_width: width,
                found_height: height,
            });
        }

        let mapper = self.tone_mapper(iteration);
        for (dst, &p) in target.chunks_exact_mut(4).zip(&self.pixels) {
            let [r, g, b] = mapper.map_color(p);
            dst.copy_from_slice(&[r, g, b, 255]);
        }
        Ok(())
    }

    /// Tone-mapped copy as an `image` crate buffer.
    pub fn to_rgb_image(&self, iteration: u32) -> image::RgbImage {
        let mapper = self.tone_mapper(iteration);
        image::RgbImage::from_fn(self.width, self.height, |x, row| {
            let p = self.pixels[x as usize + row as usize * self.width as usize];
            image::Rgb(mapper.map_color(p))
        })
    }

    /// Write a binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, writer: &mut W, iteration: u32) -> ImageResult<()> {
        write!(
            writer,
            "P6\n# {}\n\n{} {}\n255\n",
            PPM_GENERATOR_ID, self.width, self.height
        )?;
        writer.write_all(&self.to_rgb(iteration))?;
        Ok(())
    }

    /// Write a binary PPM file, whatever the extension.
    pub fn save_ppm(&self, path: impl AsRef<Path>, iteration: u32) -> ImageResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut writer, iteration)?;
        writer.flush()?;
        Ok(())
    }

    /// Save to a file. `.ppm` is written directly; other extensions go
    /// through the `image` crate encoders.
    pub fn save(&self, path: impl AsRef<Path>, iteration: u32) -> ImageResult<()> {
        let path = path.as_ref();
        let is_ppm = path
            .extension()
            .map_or(true, |ext| ext.eq_ignore_ascii_case("ppm"));

        if is_ppm {
            self.save_ppm(path, iteration)?;
        } else {
            self.to_rgb_image(iteration).save(path)?;
        }

        log::info!("Saved {} (pass {})", path.display(), iteration + 1);
        Ok(())
    }
}
