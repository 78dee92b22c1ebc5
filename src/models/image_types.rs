/// An image picked by the user, held in memory until it has been classified.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewId(pub u64);

/// Displayable form of an uploaded image. Must be handed back to the
/// `PreviewStore` once it is no longer shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePreview {
    pub id: PreviewId,
    pub data_url: String,
}
