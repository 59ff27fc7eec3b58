use crate::error::{DecodeError, SourceError};
use async_trait::async_trait;
use std::sync::Arc;

/// Lists candidate image URLs attached to a social-media reference.
#[async_trait]
pub trait PhotoSourcer: Send + Sync + 'static {
    async fn get_photos(&self, reference: &str) -> Result<Vec<String>, SourceError>;
}

/// Extracts the payload of a QR code from encoded image bytes.
///
/// Decoding is CPU bound; callers on an async runtime should run it on a
/// blocking thread.
pub trait QrDecoder: Send + Sync + 'static {
    fn decode(&self, image: &[u8]) -> Result<Vec<u8>, DecodeError>;
}

#[async_trait]
impl<T: PhotoSourcer + ?Sized> PhotoSourcer for Arc<T> {
    async fn get_photos(&self, reference: &str) -> Result<Vec<String>, SourceError> {
        (**self).get_photos(reference).await
    }
}

impl<T: QrDecoder + ?Sized> QrDecoder for Arc<T> {
    fn decode(&self, image: &[u8]) -> Result<Vec<u8>, DecodeError> {
        (**self).decode(image)
    }
}
