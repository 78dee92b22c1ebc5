use crate::error::AppError;
use crate::models::image_types::ImageFile;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "heic", "heif",
];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read an image the user picked from disk.
pub fn load_image_file(path: &Path, max_bytes: u64) -> Result<ImageFile, AppError> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    if !is_image_file(path) {
        return Err(format!("Not a supported image file: {}", path.display()).into());
    }

    let size = std::fs::metadata(path)?.len();
    check_size(size, max_bytes)?;

    let bytes = std::fs::read(path).map_err(|e| AppError {
        message: format!("Failed to read file: {}", e),
    })?;

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    image_file_from_bytes(file_name, bytes, max_bytes)
}

/// Wrap bytes handed over by the front end (drag and drop).
pub fn image_file_from_bytes(
    file_name: String,
    bytes: Vec<u8>,
    max_bytes: u64,
) -> Result<ImageFile, AppError> {
    check_size(bytes.len() as u64, max_bytes)?;

    let mime_type = detect_mime_type(&file_name, &bytes)
        .ok_or_else(|| AppError::from(format!("Unrecognized image format: {}", file_name)))?;

    Ok(ImageFile {
        file_name,
        mime_type,
        bytes,
    })
}

fn check_size(size: u64, max_bytes: u64) -> Result<(), AppError> {
    if size == 0 {
        return Err("The selected file is empty".into());
    }
    if size > max_bytes {
        return Err(format!(
            "Image is too large ({} bytes, limit is {} bytes)",
            size, max_bytes
        )
        .into());
    }
    Ok(())
}

/// Sniff the byte signature first, the extension second.
pub fn detect_mime_type(file_name: &str, bytes: &[u8]) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    let mime = match ext.as_str() {
        "heic" => "image/heic",
        "heif" => "image/heif",
        other => image::ImageFormat::from_extension(other)?.to_mime_type(),
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn detects_png_from_signature_even_with_wrong_extension() {
        let mime = detect_mime_type("photo.jpg", &png_bytes());
        assert_eq!(mime.as_deref(), Some("image/png"));
    }

    #[test]
    fn falls_back_to_extension() {
        let mime = detect_mime_type("cat.heic", b"not really an image");
        assert_eq!(mime.as_deref(), Some("image/heic"));
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(image_file_from_bytes("a.png".into(), Vec::new(), 100).is_err());
        let err = image_file_from_bytes("a.png".into(), png_bytes(), 10).unwrap_err();
        assert!(err.message.contains("too large"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dog.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let file = load_image_file(&path, 1024 * 1024).unwrap();
        assert_eq!(file.file_name, "dog.png");
        assert_eq!(file.mime_type, "image/png");
    }

    #[test]
    fn rejects_non_image_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(load_image_file(&path, 1024).is_err());
    }
}
