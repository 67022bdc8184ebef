// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing (PBKDF2-HMAC-SHA256).
//!
//! Stored form: `base64(salt)$base64(derived_key)` with a fresh random salt
//! per password. Verification re-derives with the stored salt and compares
//! in constant time via `ring::pbkdf2::verify`.

use std::num::NonZeroU32;

use base64ct::{Base64, Encoding};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const ITERATIONS: NonZeroU32 = NonZeroU32::new(100_000).unwrap();
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).expect("system RNG failure");

    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(ALGORITHM, ITERATIONS, &salt, password.as_bytes(), &mut key);

    format!(
        "{}${}",
        Base64::encode_string(&salt),
        Base64::encode_string(&key)
    )
}

/// Verify a password against a stored hash. Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, key)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(key)) = (Base64::decode_vec(salt), Base64::decode_vec(key)) else {
        return false;
    };

    pbkdf2::verify(ALGORITHM, ITERATIONS, &salt, password.as_bytes(), &key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn salts_are_unique_per_hash() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn corrupt_stored_hash_never_matches() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "!!$!!"));
    }
}
