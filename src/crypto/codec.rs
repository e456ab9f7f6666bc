//! Symmetric encryption of sensitive card fields (number, CVV).
//!
//! Values are encrypted with AES-256 in ECB mode with PKCS7 padding and
//! stored base64-encoded. ECB requires no IV management from callers and
//! is kept for compatibility with data encrypted by earlier deployments;
//! it is not an authenticated mode.
//!
//! # Legacy plaintext support
//!
//! The database may still contain values written before encryption was
//! introduced. `decrypt` first checks whether the stored value is shaped
//! like ciphertext (valid base64 of a whole number of AES blocks); if not,
//! the value is returned unchanged. A value that looks like ciphertext but
//! fails to decrypt also falls back to being returned as-is — see
//! [`CardCipher::legacy_passthrough`].

use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, block_padding::Pkcs7};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

use crate::error::AppError;

type Aes256EcbEnc = ecb::Encryptor<Aes256>;
type Aes256EcbDec = ecb::Decryptor<Aes256>;

/// AES-256 key length in bytes.
const KEY_LEN: usize = 32;

/// AES block length in bytes; ciphertext is always a multiple of this.
const BLOCK_LEN: usize = 16;

/// Cipher for card numbers and CVVs.
///
/// Built once at startup from [`CardCipher::from_secret`] and shared through
/// application state. Stateless after construction; safe to use from any
/// number of request handlers concurrently.
pub struct CardCipher {
    key: [u8; KEY_LEN],
}

impl CardCipher {
    /// Build a cipher from the configured secret.
    ///
    /// The secret's bytes are truncated or zero-padded to exactly 32 bytes.
    /// This adjustment is deterministic and must not change: existing
    /// encrypted data was written under keys normalized the same way.
    ///
    /// If no secret is configured, a random process-lifetime key is
    /// generated. Anything encrypted under it is unrecoverable after a
    /// restart, so this variant is logged loudly.
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret {
            Some(secret) => Self {
                key: normalize_key(secret),
            },
            None => {
                let mut key = [0u8; KEY_LEN];
                rand::rng().fill_bytes(&mut key);
                tracing::warn!(
                    "CARD_ENCRYPTION_KEY is not set; generated an ephemeral key. \
                     Card data encrypted under it will be UNRECOVERABLE after restart"
                );
                Self { key }
            }
        }
    }

    /// Encrypt a plaintext value for storage.
    ///
    /// Empty input passes through unchanged. Any cipher failure is fatal
    /// for the request (`AppError::Encryption`, a 500) — the encrypt path
    /// never silently degrades.
    pub fn encrypt(&self, plain: &str) -> Result<String, AppError> {
        if plain.is_empty() {
            return Ok(plain.to_string());
        }

        let encryptor = Aes256EcbEnc::new_from_slice(&self.key)
            .map_err(|e| AppError::Encryption(e.to_string()))?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plain.as_bytes());

        Ok(BASE64.encode(ciphertext))
    }

    /// Decrypt a stored value.
    ///
    /// Empty input passes through unchanged. Input that is not shaped like
    /// ciphertext is assumed to be legacy plaintext and returned unchanged.
    /// Ciphertext-shaped input that fails at the cryptographic layer also
    /// degrades to passthrough rather than erroring.
    pub fn decrypt(&self, stored: &str) -> String {
        if stored.is_empty() {
            return stored.to_string();
        }

        // Not base64, or not whole AES blocks: legacy plaintext.
        let Some(decoded) = ciphertext_bytes(stored) else {
            return stored.to_string();
        };

        let Ok(decryptor) = Aes256EcbDec::new_from_slice(&self.key) else {
            return self.legacy_passthrough(stored);
        };
        match decryptor.decrypt_padded_vec_mut::<Pkcs7>(&decoded) {
            Ok(plain) => match String::from_utf8(plain) {
                Ok(plain) => plain,
                Err(_) => self.legacy_passthrough(stored),
            },
            Err(_) => self.legacy_passthrough(stored),
        }
    }

    /// Decrypt a stored value and return only its last `n` characters.
    ///
    /// Used where only a suffix is needed (e.g. building a masked number)
    /// so the full decrypted value never travels further than this call.
    pub fn decrypt_last_chars(&self, stored: &str, n: usize) -> String {
        let plain = self.decrypt(stored);
        let chars: Vec<char> = plain.chars().collect();
        if chars.len() <= n {
            return plain;
        }
        chars[chars.len() - n..].iter().collect()
    }

    /// Fallback for values that look like ciphertext but do not decrypt.
    ///
    /// Returning the stored value unchanged preserves the migration path
    /// from the pre-encryption storage format at the cost of letting a
    /// genuinely corrupted ciphertext surface as "plaintext". A stricter
    /// deployment would replace this with an error.
    fn legacy_passthrough(&self, stored: &str) -> String {
        tracing::warn!(
            "value is shaped like ciphertext but failed to decrypt; \
             returning it unchanged (legacy plaintext path)"
        );
        stored.to_string()
    }
}

/// Truncate or zero-pad the secret's bytes to exactly [`KEY_LEN`].
fn normalize_key(secret: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    let bytes = secret.as_bytes();
    let len = bytes.len().min(KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    key
}

/// Decode `value` if it is shaped like stored ciphertext.
///
/// Stored ciphertext is standard base64 whose decoded length is a non-zero
/// multiple of the AES block size. Anything else is treated as legacy
/// plaintext by the caller.
fn ciphertext_bytes(value: &str) -> Option<Vec<u8>> {
    let decoded = BASE64.decode(value).ok()?;
    if decoded.is_empty() || decoded.len() % BLOCK_LEN != 0 {
        return None;
    }
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> CardCipher {
        CardCipher::from_secret(Some("unit-test-secret"))
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let c = cipher();
        for plain in ["4111111111111111", "123", "x", "a longer value with spaces"] {
            let stored = c.encrypt(plain).unwrap();
            assert_ne!(stored, plain);
            assert_eq!(c.decrypt(&stored), plain);
        }
    }

    #[test]
    fn empty_input_passes_through_both_ways() {
        let c = cipher();
        assert_eq!(c.encrypt("").unwrap(), "");
        assert_eq!(c.decrypt(""), "");
    }

    #[test]
    fn legacy_plaintext_passes_through_decrypt() {
        let c = cipher();
        // Not valid base64 at all.
        assert_eq!(c.decrypt("4111111111111111"), "4111111111111111");
        // Valid base64 but not whole AES blocks.
        assert_eq!(c.decrypt("YWJj"), "YWJj");
    }

    #[test]
    fn corrupted_ciphertext_degrades_to_passthrough() {
        let c = cipher();
        // 16 random-ish bytes: shaped like ciphertext, but padding will not
        // verify, so decrypt falls back to returning the input.
        let shaped = BASE64.encode([0xABu8; 16]);
        assert_eq!(c.decrypt(&shaped), shaped);
    }

    #[test]
    fn decrypt_under_wrong_key_returns_stored_value() {
        let stored = cipher().encrypt("4111111111111111").unwrap();
        let other = CardCipher::from_secret(Some("a different secret"));
        assert_eq!(other.decrypt(&stored), stored);
    }

    #[test]
    fn short_key_is_zero_padded_and_long_key_truncated() {
        let mut expected = [0u8; KEY_LEN];
        expected[..5].copy_from_slice(b"short");
        assert_eq!(normalize_key("short"), expected);

        let long = "k".repeat(40);
        assert_eq!(normalize_key(&long), [b'k'; KEY_LEN]);

        // A 40-byte key and its 32-byte prefix produce the same ciphertext.
        let a = CardCipher::from_secret(Some(&long));
        let b = CardCipher::from_secret(Some(&"k".repeat(32)));
        assert_eq!(a.encrypt("value").unwrap(), b.encrypt("value").unwrap());
    }

    #[test]
    fn ephemeral_key_round_trips_within_process() {
        let c = CardCipher::from_secret(None);
        let stored = c.encrypt("1234567890123456").unwrap();
        assert_eq!(c.decrypt(&stored), "1234567890123456");
    }

    #[test]
    fn decrypt_last_chars_returns_suffix_only() {
        let c = cipher();
        let stored = c.encrypt("4111111111111234").unwrap();
        assert_eq!(c.decrypt_last_chars(&stored, 4), "1234");
        // Shorter than requested: the whole value.
        let short = c.encrypt("12").unwrap();
        assert_eq!(c.decrypt_last_chars(&short, 4), "12");
    }
}
