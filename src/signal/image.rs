//! Grayscale sampling of a raster image through an axis-pair projection.

use std::path::Path;

use image::DynamicImage;

use super::{Sampler, SignalError};
use crate::geom::{Axis, BoundingFrame, Point3};
use crate::params::Choice;

/// Rec. 709 weights in parts per ten thousand; they sum to exactly 10 000.
const LUMA_R: u32 = 2126;
const LUMA_G: u32 = 7152;
const LUMA_B: u32 = 722;
const LUMA_FULL: f64 = 10_000.0 * 255.0;

/// Relative luminance of an 8-bit RGB triple, in `[0, 1]`. Summed in integers
/// so white is exactly `1.0`.
#[must_use]
pub fn luminance([r, g, b]: [u8; 3]) -> f64 {
    let weighted = LUMA_R * u32::from(r) + LUMA_G * u32::from(g) + LUMA_B * u32::from(b);
    f64::from(weighted) / LUMA_FULL
}

/// Decoded RGB raster. Row 0 is the top row of the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl RasterImage {
    /// Wraps row-major pixels. Fails when the dimensions are zero or do not
    /// match the pixel count.
    pub fn new(width: usize, height: usize, pixels: Vec<[u8; 3]>) -> Result<Self, SignalError> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return Err(SignalError::ImageLoad {
                source_name: "raster".to_owned(),
                reason: format!(
                    "{width}x{height} image needs {} pixels, got {}",
                    width * height,
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour image.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Result<Self, SignalError> {
        Self::new(width, height, vec![rgb; width * height])
    }

    fn from_dynamic(image: &DynamicImage, source_name: &str) -> Result<Self, SignalError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb.pixels().map(|pixel| pixel.0).collect();
        Self::new(width as usize, height as usize, pixels).map_err(|_| SignalError::ImageLoad {
            source_name: source_name.to_owned(),
            reason: "image has no pixels".to_owned(),
        })
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8], source_name: &str) -> Result<Self, SignalError> {
        let image = image::load_from_memory(bytes).map_err(|err| SignalError::ImageLoad {
            source_name: source_name.to_owned(),
            reason: err.to_string(),
        })?;
        let raster = Self::from_dynamic(&image, source_name)?;
        log::debug!(
            "decoded {source_name}: {}x{} pixels",
            raster.width,
            raster.height
        );
        Ok(raster)
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self, SignalError> {
        let source_name = path.display().to_string();
        let image = image::open(path).map_err(|err| SignalError::ImageLoad {
            source_name: source_name.clone(),
            reason: err.to_string(),
        })?;
        let raster = Self::from_dynamic(&image, &source_name)?;
        log::info!(
            "loaded {source_name}: {}x{} pixels",
            raster.width,
            raster.height
        );
        Ok(raster)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Pixel at column `x`, row `y` (from the top).
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    fn luminance_at(&self, x: usize, y: usize) -> f64 {
        self.pixel(x, y).map_or(0.0, luminance)
    }

    /// Luminance at texture coordinates `(u, v)`. `u = 0` is the left
    /// column, `v = 0` the bottom row. Out-of-range coordinates clamp to the
    /// edge pixels.
    #[must_use]
    pub fn sample_uv(&self, u: f64, v: f64, interpolation: Interpolation) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        match interpolation {
            Interpolation::Nearest => {
                let x = ((u * self.width as f64).floor() as usize).min(self.width - 1);
                let from_bottom = ((v * self.height as f64).floor() as usize).min(self.height - 1);
                self.luminance_at(x, self.height - 1 - from_bottom)
            }
            Interpolation::Bilinear => {
                let x = u * (self.width - 1) as f64;
                let y = (1.0 - v) * (self.height - 1) as f64;

                let x0 = x.floor() as usize;
                let y0 = y.floor() as usize;
                let x1 = (x0 + 1).min(self.width - 1);
                let y1 = (y0 + 1).min(self.height - 1);

                let fx = x - x0 as f64;
                let fy = y - y0 as f64;

                self.luminance_at(x0, y0) * (1.0 - fx) * (1.0 - fy)
                    + self.luminance_at(x1, y0) * fx * (1.0 - fy)
                    + self.luminance_at(x0, y1) * (1.0 - fx) * fy
                    + self.luminance_at(x1, y1) * fx * fy
            }
        }
    }
}

/// Which pair of world axes maps onto the image's `(u, v)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    XY,
    XZ,
    YZ,
}

impl Projection {
    #[must_use]
    pub const fn axes(self) -> [Axis; 2] {
        match self {
            Self::XY => [Axis::X, Axis::Y],
            Self::XZ => [Axis::X, Axis::Z],
            Self::YZ => [Axis::Y, Axis::Z],
        }
    }
}

impl Choice for Projection {
    const ALL: &'static [Self] = &[Self::XY, Self::XZ, Self::YZ];

    fn label(self) -> &'static str {
        match self {
            Self::XY => "RED-GREEN (x-y)",
            Self::XZ => "RED-BLUE (x-z)",
            Self::YZ => "GREEN-BLUE (y-z)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

#[derive(Debug, Clone)]
pub struct ImageSampler {
    image: RasterImage,
    projection: Projection,
    interpolation: Interpolation,
}

impl ImageSampler {
    #[must_use]
    pub fn new(image: RasterImage, projection: Projection) -> Self {
        Self {
            image,
            projection,
            interpolation: Interpolation::default(),
        }
    }

    #[must_use]
    pub const fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }
}

impl Sampler for ImageSampler {
    fn prepare(&self, frame: &BoundingFrame) -> Result<(), SignalError> {
        frame.require_extent(&self.projection.axes())?;
        Ok(())
    }

    fn sample(&self, point: Point3, frame: &BoundingFrame) -> Result<f64, SignalError> {
        let [u_axis, v_axis] = self.projection.axes();
        let u = frame.require(point, u_axis)?;
        let v = frame.require(point, v_axis)?;
        Ok(self.image.sample_uv(u, v, self.interpolation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBox;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn red() -> f64 {
        luminance([255, 0, 0])
    }

    fn blue() -> f64 {
        luminance([0, 0, 255])
    }

    fn cube() -> BoundingFrame {
        BoundingFrame::from_bbox(BBox::new(Point3::ORIGIN, Point3::new(10.0, 10.0, 10.0))).unwrap()
    }

    /// 2x2: top row black/white, bottom row red/blue.
    fn quad() -> RasterImage {
        RasterImage::new(
            2,
            2,
            vec![[0, 0, 0], [255, 255, 255], [255, 0, 0], [0, 0, 255]],
        )
        .unwrap()
    }

    #[test]
    fn luminance_weights() {
        assert_eq!(luminance([255, 255, 255]), 1.0);
        assert_eq!(luminance([0, 0, 0]), 0.0);
        assert_eq!(LUMA_R + LUMA_G + LUMA_B, 10_000);
        assert_eq!(red(), 0.2126);
        assert!(close(luminance([128, 128, 128]), 128.0 / 255.0));
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        assert!(RasterImage::new(0, 4, Vec::new()).is_err());
        assert!(RasterImage::new(2, 2, vec![[0, 0, 0]; 3]).is_err());
    }

    #[test]
    fn v_zero_is_the_bottom_row() {
        let image = quad();
        assert!(close(image.sample_uv(0.0, 0.0, Interpolation::Nearest), red()));
        assert!(close(image.sample_uv(1.0, 0.0, Interpolation::Nearest), blue()));
        assert!(close(image.sample_uv(0.0, 1.0, Interpolation::Nearest), 0.0));
        assert!(close(image.sample_uv(1.0, 1.0, Interpolation::Nearest), 1.0));
        assert!(close(image.sample_uv(0.0, 0.0, Interpolation::Bilinear), red()));
        assert!(close(image.sample_uv(1.0, 1.0, Interpolation::Bilinear), 1.0));
    }

    #[test]
    fn out_of_range_clamps_to_edges() {
        let image = quad();
        assert!(close(image.sample_uv(-3.0, 7.0, Interpolation::Bilinear), 0.0));
        assert!(close(image.sample_uv(4.0, -1.0, Interpolation::Nearest), blue()));
    }

    #[test]
    fn bilinear_blends_neighbours() {
        let image = quad();
        let mean = (0.0 + 1.0 + red() + blue()) / 4.0;
        assert!(close(image.sample_uv(0.5, 0.5, Interpolation::Bilinear), mean));
    }

    #[test]
    fn sampler_projects_and_requires_extent() {
        let frame = BoundingFrame::from_bbox(BBox::new(
            Point3::ORIGIN,
            Point3::new(10.0, 10.0, 0.0),
        ))
        .unwrap();
        let sampler = ImageSampler::new(quad(), Projection::XY);
        assert!(sampler.prepare(&frame).is_ok());
        let top_right = sampler.sample(Point3::new(10.0, 10.0, 0.0), &frame).unwrap();
        assert!(close(top_right, 1.0));

        let flat = ImageSampler::new(quad(), Projection::XZ);
        assert!(matches!(
            flat.prepare(&frame),
            Err(SignalError::Frame(crate::geom::FrameError::DegenerateExtent { axis: Axis::Z }))
        ));
    }

    #[test]
    fn undecodable_bytes_fail_with_image_load() {
        let err = RasterImage::decode(b"not an image", "noise.png").unwrap_err();
        assert!(matches!(err, SignalError::ImageLoad { .. }));
        assert!(err.to_string().contains("noise.png"));
    }

    #[test]
    fn projection_labels() {
        assert_eq!(
            Projection::choice_list(),
            "RED-GREEN (x-y)|RED-BLUE (x-z)|GREEN-BLUE (y-z)"
        );
    }

    #[test]
    fn side_projections_map_their_axes() {
        let frame = cube();
        let xz = ImageSampler::new(quad(), Projection::XZ);
        assert!(xz.prepare(&frame).is_ok());
        // y plays no part: u follows x, v follows z.
        assert!(close(xz.sample(Point3::new(10.0, 3.0, 10.0), &frame).unwrap(), 1.0));
        assert!(close(xz.sample(Point3::new(0.0, 7.0, 0.0), &frame).unwrap(), red()));

        let yz = ImageSampler::new(quad(), Projection::YZ);
        assert!(close(yz.sample(Point3::new(2.0, 10.0, 0.0), &frame).unwrap(), blue()));
        assert!(close(yz.sample(Point3::new(9.0, 0.0, 10.0), &frame).unwrap(), 0.0));
    }

    #[test]
    fn nearest_sampler_picks_a_single_pixel() {
        let frame = cube();
        let point = Point3::new(4.0, 4.0, 0.0);
        let nearest = ImageSampler::new(quad(), Projection::XY).with_interpolation(Interpolation::Nearest);
        assert!(close(nearest.sample(point, &frame).unwrap(), red()));

        let bilinear = ImageSampler::new(quad(), Projection::XY);
        assert!(!close(bilinear.sample(point, &frame).unwrap(), red()));
    }
}
