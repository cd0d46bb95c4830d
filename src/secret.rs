// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stored-password obfuscation boundary.
//!
//! Passwords in the config artifact are kept in an obfuscated at-rest form
//! rather than plain text. Decryption failures are recoverable by design:
//! callers fall back to treating the stored value as a plain-text password,
//! which keeps legacy unencrypted entries working.

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;
use zeroize::Zeroizing;

// Fixed pad; this is obfuscation against shoulder-surfing a config file,
// not cryptographic protection.
const PAD: &[u8] = b"sshm.secret.pad.v1";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("stored secret is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("stored secret did not decode to valid UTF-8")]
    NotUtf8,
}

fn xor_pad(bytes: &mut [u8]) {
    for (i, b) in bytes.iter_mut().enumerate() {
        *b ^= PAD[i % PAD.len()];
    }
}

/// Produce the at-rest form of a password for the config file.
pub fn encrypt(plain: &str) -> String {
    let mut bytes = plain.as_bytes().to_vec();
    xor_pad(&mut bytes);
    STANDARD.encode(&bytes)
}

/// Recover a password from its at-rest form.
pub fn decrypt(stored: &str) -> Result<Zeroizing<String>, SecretError> {
    let mut bytes = STANDARD.decode(stored)?;
    xor_pad(&mut bytes);
    let plain = String::from_utf8(bytes).map_err(|_| SecretError::NotUtf8)?;
    Ok(Zeroizing::new(plain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_restores_password() {
        let stored = encrypt("hunter2");
        assert_ne!(stored, "hunter2");
        assert_eq!(decrypt(&stored).unwrap().as_str(), "hunter2");
    }

    #[test]
    fn decrypt_rejects_plain_text() {
        // A legacy plain-text password is unlikely to be valid base64 of
        // valid UTF-8 after unpadding; either error triggers the caller's
        // plain-text fallback.
        assert!(decrypt("not base64 at all!").is_err());
    }

    #[test]
    fn empty_password_round_trips() {
        assert_eq!(decrypt(&encrypt("")).unwrap().as_str(), "");
    }
}
