use crate::error::AppError;
use crate::models::image_types::{ImageFile, ImagePreview, PreviewId};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::ImageReader;
use std::collections::HashSet;
use std::io::Cursor;
use std::time::Instant;

const PREVIEW_QUALITY: u8 = 85;

/// Build a data URL for displaying `file`.
/// Decodable images are re-encoded as an EXIF-oriented JPEG no larger than
/// `max_edge`; anything else is embedded as-is.
pub fn render_preview(file: &ImageFile, max_edge: u32) -> String {
    let start = Instant::now();
    match render_jpeg(&file.bytes, max_edge) {
        Ok(bytes) => {
            tracing::debug!(
                file = %file.file_name,
                ms = start.elapsed().as_secs_f64() * 1000.0,
                "rendered preview"
            );
            data_url("image/jpeg", &bytes)
        }
        Err(e) => {
            tracing::warn!(file = %file.file_name, "preview decode failed, embedding original: {}", e);
            original_data_url(file)
        }
    }
}

/// Data URL of the unmodified upload; cheap enough to show right away.
pub fn original_data_url(file: &ImageFile) -> String {
    data_url(&file.mime_type, &file.bytes)
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime_type, b64)
}

fn render_jpeg(bytes: &[u8], max_edge: u32) -> Result<Vec<u8>, AppError> {
    let mut img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    if img.width() > max_edge || img.height() > max_edge {
        img = img.thumbnail(max_edge, max_edge);
    }

    let orientation = read_orientation(bytes);
    if orientation != 1 {
        img = apply_orientation(img, orientation);
    }

    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, PREVIEW_QUALITY);
    rgb.write_with_encoder(encoder).map_err(|e| AppError {
        message: format!("Failed to encode preview: {}", e),
    })?;
    Ok(buffer.into_inner())
}

/// EXIF orientation of an in-memory image, defaulting to 1.
fn read_orientation(bytes: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    }
}

fn apply_orientation(img: image::DynamicImage, orientation: u32) -> image::DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Tracks which previews are still on screen.
#[derive(Debug, Default)]
pub struct PreviewStore {
    next_id: u64,
    live: HashSet<PreviewId>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, data_url: String) -> ImagePreview {
        self.next_id += 1;
        let id = PreviewId(self.next_id);
        self.live.insert(id);
        ImagePreview { id, data_url }
    }

    /// Releasing an unknown or already released id is a no-op.
    pub fn release(&mut self, preview: ImagePreview) {
        if self.live.remove(&preview.id) {
            tracing::debug!(id = preview.id.0, "released preview");
        }
    }

    pub fn is_live(&self, id: PreviewId) -> bool {
        self.live.contains(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_file(width: u32, height: u32) -> ImageFile {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        ImageFile {
            file_name: "cat.png".into(),
            mime_type: "image/png".into(),
            bytes: buffer.into_inner(),
        }
    }

    fn decode_data_url(url: &str) -> image::DynamicImage {
        let b64 = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn large_images_are_downsized() {
        let url = render_preview(&image_file(300, 150), 100);
        let img = decode_data_url(&url);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
    }

    #[test]
    fn small_images_keep_their_size() {
        let url = render_preview(&image_file(40, 30), 100);
        let img = decode_data_url(&url);
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[test]
    fn undecodable_bytes_are_embedded_verbatim() {
        let file = ImageFile {
            file_name: "cat.heic".into(),
            mime_type: "image/heic".into(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(render_preview(&file, 100), "data:image/heic;base64,AQID");
    }

    /// JPEG with an APP1 segment holding a single Orientation tag.
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Jpeg).unwrap();
        let jpeg = buffer.into_inner();

        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II\x2a\x00");
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn reads_orientation_from_exif() {
        assert_eq!(read_orientation(&jpeg_with_orientation(30, 10, 6)), 6);
        assert_eq!(read_orientation(&image_file(30, 10).bytes), 1);
    }

    #[test]
    fn rotated_jpeg_preview_swaps_dimensions() {
        let file = ImageFile {
            file_name: "dog.jpg".into(),
            mime_type: "image/jpeg".into(),
            bytes: jpeg_with_orientation(30, 10, 6),
        };
        let img = decode_data_url(&render_preview(&file, 100));
        assert_eq!((img.width(), img.height()), (10, 30));
    }

    #[test]
    fn apply_orientation_handles_mirrors_and_rotations() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(30, 10));
        for (orientation, dims) in [(1, (30, 10)), (2, (30, 10)), (3, (30, 10)), (5, (10, 30)), (8, (10, 30))] {
            let out = apply_orientation(img.clone(), orientation);
            assert_eq!((out.width(), out.height()), dims, "orientation {}", orientation);
        }
    }

    #[test]
    fn original_data_url_embeds_bytes() {
        let file = ImageFile {
            file_name: "cat.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(original_data_url(&file), "data:image/png;base64,AQID");
    }

    #[test]
    fn store_tracks_live_previews() {
        let mut store = PreviewStore::new();
        let a = store.register("data:a".into());
        let b = store.register("data:b".into());
        assert_ne!(a.id, b.id);
        assert_eq!(store.live_count(), 2);

        store.release(a.clone());
        store.release(a.clone());
        assert!(!store.is_live(a.id));
        assert!(store.is_live(b.id));
        assert_eq!(store.live_count(), 1);
    }
}
