// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque pagination cursor encoding.
//!
//! Two wire shapes are recognized:
//!
//! - a bare decimal integer — the offset of a single listing stream;
//! - `"<public>:<private>"` — an offset pair for the dual-stream mixed view.
//!
//! Cursors are forward-only resume positions. Decoding is fail-soft: an
//! unparseable cursor behaves as offset zero rather than erroring, so a
//! stale or mangled client cursor restarts the stream instead of breaking
//! the caller. That policy is deliberate and relied upon by the listing
//! engine; do not tighten it to a validation error.
//!
//! In the mixed view a bare decimal is a legacy form from the original
//! single-stream pagination and is applied to both streams.

/// Decode a single-stream cursor. Empty or malformed input is offset zero.
pub fn decode_single(token: &str) -> u64 {
    token.trim().parse().unwrap_or(0)
}

/// Encode a single-stream cursor.
pub fn encode_single(offset: u64) -> String {
    offset.to_string()
}

/// Decode a dual-stream cursor as `(public_offset, private_offset)`.
///
/// Accepts `"a:b"`, the legacy bare decimal (applied to both streams), and
/// degrades anything else to `(0, 0)`.
pub fn decode_dual(token: &str) -> (u64, u64) {
    let token = token.trim();
    match token.split_once(':') {
        Some((public, private)) => {
            match (public.trim().parse(), private.trim().parse()) {
                (Ok(public), Ok(private)) => (public, private),
                _ => (0, 0),
            }
        }
        None => {
            // Legacy single-integer form: both streams resume from the same
            // offset, matching the pre-dual-stream pagination.
            let offset = decode_single(token);
            (offset, offset)
        }
    }
}

/// Encode a dual-stream cursor.
pub fn encode_dual(public: u64, private: u64) -> String {
    format!("{public}:{private}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_decodes_decimal() {
        assert_eq!(decode_single("0"), 0);
        assert_eq!(decode_single("42"), 42);
        assert_eq!(decode_single(" 7 "), 7);
    }

    #[test]
    fn single_fails_soft_to_zero() {
        assert_eq!(decode_single(""), 0);
        assert_eq!(decode_single("not-a-number"), 0);
        assert_eq!(decode_single("-5"), 0);
        // A dual-shaped cursor handed to a single-stream view restarts it.
        assert_eq!(decode_single("3:7"), 0);
    }

    #[test]
    fn dual_decodes_pair() {
        assert_eq!(decode_dual("3:7"), (3, 7));
        assert_eq!(decode_dual("0:0"), (0, 0));
        assert_eq!(decode_dual(" 10 : 20 "), (10, 20));
    }

    #[test]
    fn dual_accepts_legacy_single_integer() {
        assert_eq!(decode_dual("12"), (12, 12));
    }

    #[test]
    fn dual_fails_soft_to_zero_pair() {
        assert_eq!(decode_dual(""), (0, 0));
        assert_eq!(decode_dual("a:b"), (0, 0));
        assert_eq!(decode_dual("3:b"), (0, 0));
        assert_eq!(decode_dual("1:2:3"), (0, 0));
    }

    #[test]
    fn round_trips() {
        assert_eq!(decode_single(&encode_single(15)), 15);
        assert_eq!(decode_dual(&encode_dual(4, 9)), (4, 9));
    }
}
