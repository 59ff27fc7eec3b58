use crate::error::{Result, TokenError};
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Block};

/// Version tag every token starts with.
pub const TOKEN_VERSION: &str = "v01";
/// Required secret length in bytes.
pub const KEY_LEN: usize = 16;
/// Length of an encoded token: version tag plus one hex-encoded block.
pub const TOKEN_LEN: usize = TOKEN_VERSION.len() + BLOCK_LEN * 2;

const BLOCK_LEN: usize = 16;

/// Reversible mapping between a code id and its hash token.
///
/// The id is written as lowercase hex, left-padded with spaces to a single
/// 16-byte block, and that block is encrypted directly with AES-128. The
/// token is `"v01"` followed by the hex ciphertext, 35 characters in total.
/// Id 0 is rejected in both directions.
#[derive(Clone)]
pub struct TokenCodec {
    cipher: Aes128,
}

impl TokenCodec {
    /// Creates a codec keyed with a 16-byte secret.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self> {
        let key = key.as_ref();
        if key.len() != KEY_LEN {
            return Err(TokenError::InvalidArgument(format!(
                "key must be {} bytes long, got {}",
                KEY_LEN,
                key.len()
            )));
        }

        let cipher = Aes128::new_from_slice(key)
            .map_err(|e| TokenError::InvalidArgument(format!("invalid key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encodes `id` into a token.
    pub fn encode(&self, id: u64) -> Result<String> {
        if id == 0 {
            return Err(TokenError::InvalidArgument(
                "minimal value for id is 1".to_string(),
            ));
        }

        let plain = format!("{id:>width$x}", width = BLOCK_LEN);
        if plain.len() != BLOCK_LEN {
            return Err(TokenError::Encoding(format!(
                "padded id must be {} bytes long, got {}",
                BLOCK_LEN,
                plain.len()
            )));
        }

        let mut block = Block::clone_from_slice(plain.as_bytes());
        self.cipher.encrypt_block(&mut block);
        Ok(format!("{}{}", TOKEN_VERSION, hex::encode(block)))
    }

    /// Decodes a token back into the id it was created from.
    pub fn decode(&self, token: &str) -> Result<u64> {
        let body = token.strip_prefix(TOKEN_VERSION).ok_or_else(|| {
            TokenError::Format(format!("token must start with '{TOKEN_VERSION}'"))
        })?;

        let raw = hex::decode(body)
            .map_err(|e| TokenError::Format(format!("token body is not hex: {e}")))?;
        if raw.len() != BLOCK_LEN {
            return Err(TokenError::Format(format!(
                "token body must decode to {} bytes, got {}",
                BLOCK_LEN,
                raw.len()
            )));
        }

        let mut block = Block::clone_from_slice(&raw);
        self.cipher.decrypt_block(&mut block);

        let text = std::str::from_utf8(block.as_slice())
            .map_err(|_| TokenError::Format("decrypted block is not text".to_string()))?;
        let id = u64::from_str_radix(text.trim_start_matches(' '), 16)
            .map_err(|e| TokenError::Format(format!("decrypted block is not an id: {e}")))?;
        if id == 0 {
            return Err(TokenError::Format("token encodes id 0".to_string()));
        }
        Ok(id)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
