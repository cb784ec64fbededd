//! Grayscale sample fields and bilinear lookup.

use image::DynamicImage;
use noise::{NoiseFn, Perlin};

use crate::config::NoiseSettings;

/// Row-major grid of samples in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleField {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl SampleField {
    /// Returns `None` when the dimensions are zero or disagree with the
    /// sample count.
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || samples.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            samples,
        })
    }

    /// Each pixel becomes the mean of its RGB channels scaled to `[0, 1]`.
    pub fn from_image(image: &DynamicImage) -> Option<Self> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let samples = rgb
            .pixels()
            .map(|pixel| {
                let [r, g, b] = pixel.0;
                (r as f32 + g as f32 + b as f32) / (3.0 * 255.0)
            })
            .collect();
        Self::new(width as usize, height as usize, samples)
    }

    /// Fractal Perlin noise normalized to `[0, 1]`.
    pub fn synthesize(width: usize, height: usize, seed: u64, settings: &NoiseSettings) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let perlin = Perlin::new(seed as u32);
        let octaves = settings.octaves.max(1);

        let mut max_amplitude = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..octaves {
            max_amplitude += amplitude;
            amplitude *= settings.persistence;
        }

        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let mut amplitude = 1.0;
                let mut frequency = 1.0;
                let mut value = 0.0;
                for _ in 0..octaves {
                    let sx = x as f64 / width as f64 * settings.scale * frequency;
                    let sy = y as f64 / height as f64 * settings.scale * frequency;
                    value += perlin.get([sx, sy]) * amplitude;
                    amplitude *= settings.persistence;
                    frequency *= settings.lacunarity;
                }
                let normalized = (value / max_amplitude + 1.0) / 2.0;
                samples.push(normalized.clamp(0.0, 1.0) as f32);
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.samples[y * self.width + x]
    }

    /// Bilinear interpolation at a source-space position. Positions outside
    /// the field are clamped to its edge.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let u = u.clamp(0.0, max_x);
        let v = v.clamp(0.0, max_y);

        let x0 = u.floor() as usize;
        let y0 = v.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = u - x0 as f32;
        let ty = v - y0 as f32;

        let top = self.at(x0, y0) * (1.0 - tx) + self.at(x1, y0) * tx;
        let bottom = self.at(x0, y1) * (1.0 - tx) + self.at(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Height for grid position `(x, y)` of a `grid_width x grid_height` map.
    pub fn sample_grid(&self, x: i32, y: i32, grid_width: i32, grid_height: i32) -> f32 {
        if grid_width <= 0 || grid_height <= 0 {
            return 0.0;
        }
        let u = x as f32 / grid_width as f32 * (self.width - 1) as f32;
        let v = y as f32 / grid_height as f32 * (self.height - 1) as f32;
        self.sample_bilinear(u, v).clamp(0.0, 1.0)
    }
}
