//! Social-post QR resolution.
//!
//! [`QrResolver`] lists the photos attached to a post, downloads and decodes
//! all of them concurrently, and returns the payload of whichever image is
//! the first to yield a QR code.

mod decoder;
mod error;
mod fetch;
pub mod instagram;
mod resolver;

pub use decoder::RqrrDecoder;
pub use error::{ResolveError, Result};
pub use fetch::{HttpImageFetcher, ImageFetcher, DEFAULT_HTTP_TIMEOUT};
pub use instagram::InstagramPhotoSource;
pub use resolver::{QrResolver, QrSource};
