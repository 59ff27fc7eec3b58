use crate::error::{Result, ServiceError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

pub const DEFAULT_MODULE_SIZE: u32 = 6;

/// Renders payloads as black-on-white QR PNGs.
#[derive(Debug, Clone, Copy)]
pub struct QrEncoder {
    module_size: u32,
}

impl QrEncoder {
    /// `module_size` is the edge length of one module in pixels.
    pub fn new(module_size: u32) -> Self {
        Self {
            module_size: module_size.max(1),
        }
    }

    pub fn png(&self, payload: &str) -> Result<Vec<u8>> {
        let code =
            QrCode::new(payload.as_bytes()).map_err(|e| ServiceError::QrEncode(e.to_string()))?;
        let img = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_size, self.module_size)
            .build();

        let mut png = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ServiceError::QrEncode(e.to_string()))?;
        Ok(png)
    }

    /// Standard base64 of [`QrEncoder::png`].
    pub fn png_base64(&self, payload: &str) -> Result<String> {
        Ok(STANDARD.encode(self.png(payload)?))
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE_SIZE)
    }
}
