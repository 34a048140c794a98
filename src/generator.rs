use crate::error::{Error, Result};
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

pub const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const DIGITS: &[u8] = b"0123456789";
pub const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Character classes in the order they are guaranteed a position.
pub const CLASSES: [&[u8]; 4] = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS];

pub const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Maps derived key bytes onto a password of `length` characters.
///
/// The first `min(4, length)` positions take one character from each class,
/// the rest come from the union alphabet, one key byte per position. When
/// `key_bytes` is shorter than `length` the bytes are reused cyclically. The
/// result is then shuffled with a ChaCha20 keystream keyed by
/// `SHA-256(key_bytes)`, so the layout is a pure function of the key.
pub fn map_to_password(key_bytes: &[u8], length: usize) -> Result<Zeroizing<String>> {
    if key_bytes.is_empty() {
        return Err(Error::Derivation("key material cannot be empty".into()));
    }

    let byte_at = |i: usize| key_bytes[i % key_bytes.len()] as usize;

    let mut password_bytes = Zeroizing::new(Vec::with_capacity(length));

    for (k, class) in CLASSES.iter().take(length).enumerate() {
        password_bytes.push(class[byte_at(k) % class.len()]);
    }

    for i in password_bytes.len()..length {
        password_bytes.push(ALPHABET[byte_at(i) % ALPHABET.len()]);
    }

    shuffle(&mut password_bytes, key_bytes);

    let result = String::from_utf8(password_bytes.to_vec())
        .map_err(|e| Error::Derivation(format!("non-ASCII password byte: {e}")))?;

    Ok(Zeroizing::new(result))
}

fn shuffle(items: &mut [u8], key_bytes: &[u8]) {
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&Sha256::digest(key_bytes));

    let mut stream = Keystream::new(&seed);
    for i in (1..items.len()).rev() {
        let j = stream.below(i as u32 + 1) as usize;
        items.swap(i, j);
    }
}

struct Keystream {
    cipher: ChaCha20,
    buffer: Zeroizing<[u8; 64]>,
    pos: usize,
}

impl Keystream {
    fn new(key: &[u8; 32]) -> Self {
        let cipher = ChaCha20::new(key.into(), &[0u8; 12].into());
        Self {
            cipher,
            buffer: Zeroizing::new([0u8; 64]),
            pos: 64,
        }
    }

    fn next_u32(&mut self) -> u32 {
        if self.pos + 4 > self.buffer.len() {
            self.buffer.fill(0);
            self.cipher.apply_keystream(&mut self.buffer[..]);
            self.pos = 0;
        }

        let word = [
            self.buffer[self.pos],
            self.buffer[self.pos + 1],
            self.buffer[self.pos + 2],
            self.buffer[self.pos + 3],
        ];
        self.pos += 4;
        u32::from_le_bytes(word)
    }

    /// Uniform value in `0..bound` by rejection sampling.
    fn below(&mut self, bound: u32) -> u32 {
        let zone = (u32::MAX / bound) * bound;
        loop {
            let value = self.next_u32();
            if value < zone {
                return value % bound;
            }
        }
    }
}
