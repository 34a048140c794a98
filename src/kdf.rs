use crate::error::{Error, Result};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Config {
    pub iterations: u32,
}

impl Pbkdf2Config {
    pub const STANDARD: Self = Self {
        iterations: 200_000,
    };

    pub const PARANOID: Self = Self {
        iterations: 600_000,
    };
}

impl Default for Pbkdf2Config {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Seed of the salt shared by every installation. Changing it changes every
/// password ever generated, so it is versioned together with the scheme.
pub const SALT_SEED: &[u8] = b"ForgetYourpassword-v1-salt";

/// Joins the master key and each keyword.
pub const KEYWORD_SEPARATOR: char = '|';

pub fn salt() -> [u8; 32] {
    let mut salt = [0u8; 32];
    salt.copy_from_slice(&Sha256::digest(SALT_SEED));
    salt
}

pub fn derive<S: AsRef<str>>(
    master_key: &str,
    keywords: &[S],
    output_len: usize,
    config: Pbkdf2Config,
) -> Result<Zeroizing<Vec<u8>>> {
    if master_key.is_empty() {
        return Err(Error::Derivation("master key cannot be empty".into()));
    }
    if output_len == 0 {
        return Err(Error::Derivation("output length must be non-zero".into()));
    }
    if config.iterations == 0 {
        return Err(Error::Derivation("iteration count must be non-zero".into()));
    }

    let input = combine(master_key, keywords);
    let mut output = Zeroizing::new(vec![0u8; output_len]);
    pbkdf2_hmac::<Sha256>(input.as_bytes(), &salt(), config.iterations, &mut output);

    Ok(output)
}

fn combine<S: AsRef<str>>(master_key: &str, keywords: &[S]) -> Zeroizing<String> {
    let capacity = master_key.len()
        + keywords
            .iter()
            .map(|k| k.as_ref().len() + 1)
            .sum::<usize>();
    let mut input = Zeroizing::new(String::with_capacity(capacity));
    input.push_str(master_key);
    input.push(KEYWORD_SEPARATOR);
    for (i, keyword) in keywords.iter().enumerate() {
        if i > 0 {
            input.push(KEYWORD_SEPARATOR);
        }
        input.push_str(keyword.as_ref());
    }
    input
}
