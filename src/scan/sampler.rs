//! Image decoding and fractional region sampling.
//!
//! Detectors never see raw bytes: the orchestrator decodes once here
//! (applying EXIF orientation so phone photos are upright) and every detector
//! walks sub-rectangles of the shared `RgbImage`.

use std::io::Cursor;

use image::{DynamicImage, RgbImage};

use super::{AnalysisError, ImageBuffer};

/// One RGB sample, widened to `f64` so chromatic ratios compare exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Px {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Px {
    pub fn brightness(&self) -> f64 {
        (self.r + self.g + self.b) / 3.0
    }

    /// How far red rises above the mean of green and blue.
    pub fn red_dominance(&self) -> f64 {
        self.r - (self.g + self.b) / 2.0
    }
}

/// Sub-rectangle expressed as fractions of width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Absolute half-open bounds `(x_start, y_start, x_end, y_end)`.
    pub fn bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let scale = |extent: u32, frac: f64| (extent as f64 * frac.clamp(0.0, 1.0)).floor() as u32;
        (
            scale(width, self.x0),
            scale(height, self.y0),
            scale(width, self.x1),
            scale(height, self.y1),
        )
    }
}

/// Decode a photo into RGB, upright.
pub fn decode(buffer: &ImageBuffer) -> Result<RgbImage, AnalysisError> {
    buffer.validate()?;
    let image = image::load_from_memory(buffer.bytes())
        .map_err(|e| AnalysisError::Decode(e.to_string()))?;
    let orientation = read_exif_orientation(buffer.bytes());
    Ok(apply_orientation(image, orientation).to_rgb8())
}

/// Visit every pixel in `region`, row-major. Returns the number visited.
/// An empty or inverted region visits nothing.
pub fn sample<F>(image: &RgbImage, region: Region, mut visit: F) -> u64
where
    F: FnMut(u32, u32, Px),
{
    let (x_start, y_start, x_end, y_end) = region.bounds(image.width(), image.height());
    let mut visited = 0u64;
    for y in y_start..y_end {
        for x in x_start..x_end {
            let [r, g, b] = image.get_pixel(x, y).0;
            visit(
                x,
                y,
                Px {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                },
            );
            visited += 1;
        }
    }
    visited
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// EXIF orientation values:
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn bounds_floor_fractions() {
        let region = Region::new(0.25, 0.35, 0.75, 0.65);
        assert_eq!(region.bounds(10, 10), (2, 3, 7, 6));
        assert_eq!(region.bounds(100, 100), (25, 35, 75, 65));
    }

    #[test]
    fn sample_visits_half_open_rectangle() {
        let img = solid(100, 100, [10, 20, 30]);
        let mut seen = Vec::new();
        let count = sample(&img, Region::new(0.25, 0.25, 0.75, 0.75), |x, y, _| seen.push((x, y)));
        assert_eq!(count, 2500);
        assert_eq!(seen.first(), Some(&(25, 25)));
        assert_eq!(seen.last(), Some(&(74, 74)));
        // Row-major: second visit is the next column, same row.
        assert_eq!(seen[1], (26, 25));
    }

    #[test]
    fn sample_reports_channels_and_brightness() {
        let img = solid(4, 4, [30, 60, 90]);
        let mut px = None;
        sample(&img, Region::new(0.0, 0.0, 1.0, 1.0), |_, _, p| px = Some(p));
        let px = px.unwrap();
        assert_eq!((px.r, px.g, px.b), (30.0, 60.0, 90.0));
        assert!((px.brightness() - 60.0).abs() < f64::EPSILON);
        assert!((px.red_dominance() - (-45.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_region_visits_nothing() {
        let img = solid(50, 50, [0, 0, 0]);
        let count = sample(&img, Region::new(0.8, 0.8, 0.2, 0.2), |_, _, _| panic!("should not visit"));
        assert_eq!(count, 0);
    }

    #[test]
    fn tiny_image_region_can_be_empty() {
        let img = solid(1, 1, [255, 255, 255]);
        assert_eq!(sample(&img, Region::new(0.4, 0.4, 0.6, 0.6), |_, _, _| {}), 0);
    }

    #[test]
    fn decode_png_fixture() {
        let bytes = encode_png(&solid(8, 6, [200, 100, 50]));
        let img = decode(&ImageBuffer::new(bytes, "image/png")).unwrap();
        assert_eq!(img.dimensions(), (8, 6));
        assert_eq!(img.get_pixel(0, 0).0, [200, 100, 50]);
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let err = decode(&ImageBuffer::new(vec![7u8; 512], "image/png")).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn png_without_exif_is_normal_orientation() {
        let bytes = encode_png(&solid(4, 4, [0, 0, 0]));
        assert_eq!(read_exif_orientation(&bytes), 1);
    }

    #[test]
    fn orientation_six_rotates_dimensions() {
        let img = DynamicImage::ImageRgb8(solid(8, 4, [0, 0, 0]));
        let rotated = apply_orientation(img, 6).to_rgb8();
        assert_eq!(rotated.dimensions(), (4, 8));
    }

    #[test]
    fn population_variance() {
        assert!((variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 4.0).abs() < 1e-12);
        assert_eq!(variance(&[]), 0.0);
    }
}
