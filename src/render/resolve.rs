//! Turning image indices into decoded pixels.

use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;

/// Why one image could not be resolved.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The resolver has nothing at this index.
    #[error("no image at index {0}")]
    Missing(usize),
    /// The bytes were not a decodable image.
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// The resolver did not answer within the render's decode timeout.
    #[error("decode did not finish within {0:?}")]
    TimedOut(Duration),
    /// Any other loader failure (network, permissions, ...).
    #[error("{0}")]
    Other(String),
}

/// Loads the image for a position in the caller's image list.
///
/// Completion order is unconstrained: the renderer draws every result at the
/// frame computed before the request was issued.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, image_index: usize) -> Result<DynamicImage, DecodeError>;
}

#[async_trait]
impl<R: ImageResolver + ?Sized> ImageResolver for std::sync::Arc<R> {
    async fn resolve(&self, image_index: usize) -> Result<DynamicImage, DecodeError> {
        (**self).resolve(image_index).await
    }
}

/// Encoded images (PNG, JPEG, WebP) held in memory, decoded on request.
#[derive(Clone, Debug, Default)]
pub struct EncodedImages {
    images: Vec<Vec<u8>>,
}

impl EncodedImages {
    pub fn new(images: Vec<Vec<u8>>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl FromIterator<Vec<u8>> for EncodedImages {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl ImageResolver for EncodedImages {
    async fn resolve(&self, image_index: usize) -> Result<DynamicImage, DecodeError> {
        let bytes = self
            .images
            .get(image_index)
            .ok_or(DecodeError::Missing(image_index))?;
        Ok(image::load_from_memory(bytes)?)
    }
}
