use crate::error::{ResolveError, Result};
use crate::fetch::ImageFetcher;
use async_trait::async_trait;
use griz_core::{PhotoSourcer, QrDecoder};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Produces the first QR payload found among the photos of a social post.
#[async_trait]
pub trait QrSource: Send + Sync + 'static {
    async fn first_qr(&self, reference: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: QrSource + ?Sized> QrSource for Arc<T> {
    async fn first_qr(&self, reference: &str) -> Result<Vec<u8>> {
        (**self).first_qr(reference).await
    }
}

/// Fans out one task per candidate image; the first decoded QR wins.
///
/// Every task gets a child of a per-call [`CancellationToken`]. The token is
/// cancelled as soon as a payload arrives, or when the call itself is
/// dropped, so siblings abandon their download at the next checkpoint.
/// Tasks already decoding finish on their blocking thread and their result
/// is discarded. Per-candidate failures are logged and never surfaced.
pub struct QrResolver<P, D, F> {
    photos: Arc<P>,
    decoder: Arc<D>,
    fetcher: Arc<F>,
}

impl<P, D, F> QrResolver<P, D, F>
where
    P: PhotoSourcer,
    D: QrDecoder,
    F: ImageFetcher,
{
    pub fn new(photos: P, decoder: D, fetcher: F) -> Self {
        Self {
            photos: Arc::new(photos),
            decoder: Arc::new(decoder),
            fetcher: Arc::new(fetcher),
        }
    }
}

impl<P, D, F> Clone for QrResolver<P, D, F> {
    fn clone(&self) -> Self {
        Self {
            photos: Arc::clone(&self.photos),
            decoder: Arc::clone(&self.decoder),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

/// Downloads and decodes a single candidate. `None` on any failure.
async fn scan_candidate<D, F>(fetcher: &F, decoder: Arc<D>, url: &str) -> Option<Vec<u8>>
where
    D: QrDecoder,
    F: ImageFetcher,
{
    let image = match fetcher.fetch(url).await {
        Ok(image) => image,
        Err(e) => {
            info!(url = %url, error = %e, "Unable to download image");
            return None;
        }
    };

    match tokio::task::spawn_blocking(move || decoder.decode(&image)).await {
        Ok(Ok(payload)) => Some(payload),
        Ok(Err(e)) => {
            info!(url = %url, error = %e, "Unable to decode image");
            None
        }
        Err(e) => {
            info!(url = %url, error = %e, "Decoder task failed");
            None
        }
    }
}

#[async_trait]
impl<P, D, F> QrSource for QrResolver<P, D, F>
where
    P: PhotoSourcer,
    D: QrDecoder,
    F: ImageFetcher,
{
    async fn first_qr(&self, reference: &str) -> Result<Vec<u8>> {
        trace!(reference = %reference, "Resolving QR from photos");

        let urls = self.photos.get_photos(reference).await?;
        if urls.is_empty() {
            return Err(ResolveError::NotFound("no QR found".to_string()));
        }
        debug!(reference = %reference, candidates = urls.len(), "Scanning candidates");

        let scope = CancellationToken::new();
        let _cancel_on_exit = scope.clone().drop_guard();
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(1);

        for url in urls {
            let token = scope.child_token();
            let tx = tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let decoder = Arc::clone(&self.decoder);

            tokio::spawn(async move {
                let payload = tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    payload = scan_candidate(&*fetcher, decoder, &url) => payload,
                };
                let Some(payload) = payload else {
                    return;
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {}
                    _ = tx.send(payload) => {}
                }
            });
        }
        drop(tx);

        match rx.recv().await {
            Some(payload) => {
                scope.cancel();
                debug!(reference = %reference, "QR found");
                Ok(payload)
            }
            None => Err(ResolveError::NotFound("unable to find QR".to_string())),
        }
    }
}
