use crate::error::AnalysisError;
use image::{ColorType, DynamicImage, GrayImage, ImageFormat, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;

/// Decoded pixel buffer plus the metadata it was loaded with.
///
/// Never mutated in place; transforms build a new `RasterImage`.
#[derive(Clone)]
pub struct RasterImage {
    image: Arc<DynamicImage>,
    color_type: ColorType,
    format: Option<ImageFormat>,
}

impl RasterImage {
    pub fn new(image: DynamicImage) -> Self {
        let color_type = image.color();
        Self {
            image: Arc::new(image),
            color_type,
            format: None,
        }
    }

    pub fn from_gray(gray: GrayImage) -> Self {
        Self::new(DynamicImage::ImageLuma8(gray))
    }

    /// Decode raw bytes, guessing the container format from its magic number.
    pub fn decode(bytes: &[u8]) -> Result<Self, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::Decode("empty input".to_string()));
        }

        let format = image::guess_format(bytes).ok();
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;
        let image = reader
            .decode()
            .map_err(|e| AnalysisError::Decode(e.to_string()))?;

        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::Decode("image has no pixels".to_string()));
        }

        Ok(Self {
            color_type: image.color(),
            image: Arc::new(image),
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// True when the source carries chroma channels.
    pub fn is_color(&self) -> bool {
        self.color_type.has_color()
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn format_name(&self) -> Option<String> {
        self.format
            .and_then(|f| f.extensions_str().first().copied())
            .map(str::to_string)
    }

    pub fn to_gray(&self) -> GrayImage {
        self.image.to_luma8()
    }

    pub fn to_rgb(&self) -> RgbImage {
        self.image.to_rgb8()
    }

    /// Lossless PNG encoding, used to hand variants to external engines.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    /// Apply a transform, keeping the source metadata.
    pub fn map(&self, transform: impl FnOnce(&DynamicImage) -> DynamicImage) -> Self {
        Self {
            image: Arc::new(transform(&self.image)),
            color_type: self.color_type,
            format: self.format,
        }
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("color_type", &self.color_type)
            .field("format", &self.format)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_png_with_metadata() {
        let img = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
            40,
            20,
            Rgb([10, 200, 30]),
        ));
        let raster = RasterImage::decode(&png_bytes(img)).unwrap();

        assert_eq!(raster.dimensions(), Dimensions { width: 40, height: 20 });
        assert_eq!(raster.format(), Some(ImageFormat::Png));
        assert_eq!(raster.format_name().as_deref(), Some("png"));
        assert!(raster.is_color());
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = RasterImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
        assert!(matches!(RasterImage::decode(&[]), Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn cloning_shares_pixel_buffer() {
        let raster = RasterImage::from_gray(GrayImage::from_pixel(8, 8, image::Luma([3])));
        let copy = raster.clone();
        assert!(Arc::ptr_eq(&raster.image, &copy.image));
        assert!(!raster.is_color());
    }

    #[test]
    fn map_produces_new_buffer() {
        let raster = RasterImage::from_gray(GrayImage::from_pixel(8, 8, image::Luma([3])));
        let inverted = raster.map(|img| {
            let mut copy = img.clone();
            copy.invert();
            copy
        });
        assert_eq!(raster.to_gray().get_pixel(0, 0)[0], 3);
        assert_eq!(inverted.to_gray().get_pixel(0, 0)[0], 252);
    }
}
