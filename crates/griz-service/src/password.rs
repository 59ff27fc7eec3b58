use crate::error::{Result, ServiceError};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed password digest: lowercase hex of HMAC-SHA256 over the password.
#[derive(Clone)]
pub struct PasswordHasher {
    mac: HmacSha256,
}

impl PasswordHasher {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(key.as_ref())
            .map_err(|e| ServiceError::InvalidArgument(format!("invalid password key: {e}")))?;
        Ok(Self { mac })
    }

    pub fn digest(&self, password: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(password.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digests() {
        let hasher = PasswordHasher::new("abcdefghijklmnopqrstvuwxhz").unwrap();
        assert_eq!(
            hasher.digest("abc"),
            "d54891ec2b68e799a6f9c813b29217183fbb5cf088b80b3f9dd5edce7198dadd"
        );

        let hasher = PasswordHasher::new("").unwrap();
        assert_eq!(
            hasher.digest("abc"),
            "fd7adb152c05ef80dccf50a1fa4c05d5a3ec6da95575fc312ae7c5d091836351"
        );
    }

    #[test]
    fn hasher_is_reusable() {
        let hasher = PasswordHasher::new("secret").unwrap();
        assert_eq!(hasher.digest("pw"), hasher.digest("pw"));
        assert_ne!(hasher.digest("pw"), hasher.digest("pw2"));
    }
}
