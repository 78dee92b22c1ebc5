pub mod gemini;
pub mod response;

use crate::error::ClassifyError;
use crate::models::classify_types::ClassificationResult;
use crate::models::image_types::ImageFile;
use async_trait::async_trait;

/// Remote service that decides whether an image shows a cat or a dog.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImageFile) -> Result<ClassificationResult, ClassifyError>;
}
