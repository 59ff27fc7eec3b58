use griz_core::{DecodeError, QrDecoder};

/// [`QrDecoder`] built on `rqrr`. Accepts any PNG or JPEG.
///
/// The image is converted to greyscale and every detected grid is tried in
/// turn; the first one that decodes wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, image: &[u8]) -> Result<Vec<u8>, DecodeError> {
        let grey = image::load_from_memory(image)
            .map_err(|e| DecodeError::Image(e.to_string()))?
            .to_luma8();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            grey.width() as usize,
            grey.height() as usize,
            |x, y| grey.get_pixel(x as u32, y as u32).0[0],
        );

        let mut last_error = None;
        for grid in prepared.detect_grids() {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(_) => return Ok(payload),
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) => Err(DecodeError::Unreadable(e.to_string())),
            None => Err(DecodeError::NoCode),
        }
    }
}
