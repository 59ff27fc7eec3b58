//! Hash tokens for Griz codes.
//!
//! A code's numeric id is turned into a fixed-width, versioned, opaque token
//! by encrypting it with AES-128, and tokens travel inside QR codes as the
//! `d` parameter of a deep link.

pub mod codec;
pub mod error;
pub mod link;

pub use codec::{TokenCodec, KEY_LEN, TOKEN_LEN, TOKEN_VERSION};
pub use error::{Result, TokenError};
pub use link::{build_link, extract_hash, DEEP_LINK_PREFIX};
