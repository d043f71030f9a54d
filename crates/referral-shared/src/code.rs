//! Referral code generation.
//!
//! Codes are [`CODE_LENGTH`] symbols drawn uniformly from [`CODE_ALPHABET`]
//! using the operating system CSPRNG.  36^8 ≈ 2^41 possible values, so
//! collisions are rare and the issuance retry loop is only a safety net.

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};

use crate::constants::{CODE_ALPHABET, CODE_LENGTH};

/// Source of candidate referral codes.
pub trait CodeGenerator {
    fn generate(&self) -> String;
}

/// Default generator backed by [`OsRng`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self) -> String {
        generate_code(&mut OsRng)
    }
}

/// Generate one code from the given cryptographically secure RNG.
pub fn generate_code<R: Rng + CryptoRng>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form used for lookups: trimmed and uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Whether `code` has the shape of a generated code.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}
