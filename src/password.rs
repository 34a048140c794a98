use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, FingerprintSource, HardwareFingerprinter};
use crate::generator::map_to_password;
use crate::kdf::{self, Pbkdf2Config};
use crate::master::{resolve, MasterKeySource};
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_PASSWORD_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MIN_KEYWORDS: usize = 1;
pub const MAX_KEYWORDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Fingerprint,
    Manual,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fingerprint => "fingerprint",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub master_key: String,
    pub user_keys: Vec<String>,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default = "default_use_fingerprint")]
    pub use_default_fingerprint: bool,
}

fn default_length() -> usize {
    DEFAULT_PASSWORD_LENGTH
}

fn default_use_fingerprint() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub success: bool,
    pub password: Option<String>,
    pub length: usize,
    pub source: Source,
    pub keys_used: Vec<String>,
    pub error: Option<String>,
}

impl GenerationResult {
    fn failure(request: &GenerationRequest, source: Source, error: &Error) -> Self {
        let message = match error {
            Error::InvalidInput(msg) => msg.clone(),
            other => format!("internal error: {other}"),
        };

        Self {
            success: false,
            password: None,
            length: request.length,
            source,
            keys_used: request.user_keys.clone(),
            error: Some(message),
        }
    }
}

pub struct PasswordCore<F = HardwareFingerprinter> {
    fingerprinter: F,
    kdf_config: Pbkdf2Config,
}

impl PasswordCore<HardwareFingerprinter> {
    pub fn new() -> Self {
        Self::with_fingerprinter(HardwareFingerprinter::new())
    }
}

impl Default for PasswordCore<HardwareFingerprinter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FingerprintSource> PasswordCore<F> {
    pub fn with_fingerprinter(fingerprinter: F) -> Self {
        Self {
            fingerprinter,
            kdf_config: Pbkdf2Config::STANDARD,
        }
    }

    pub fn with_kdf_config(mut self, config: Pbkdf2Config) -> Self {
        self.kdf_config = config;
        self
    }

    pub fn kdf_config(&self) -> Pbkdf2Config {
        self.kdf_config
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprinter.fingerprint()
    }

    pub fn generate_password(
        &self,
        master_key: &str,
        user_keys: &[String],
        length: usize,
        use_default_fingerprint: bool,
    ) -> GenerationResult {
        self.generate(&GenerationRequest {
            master_key: master_key.to_string(),
            user_keys: user_keys.to_vec(),
            length,
            use_default_fingerprint,
        })
    }

    pub fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let source = if request.use_default_fingerprint {
            Source::Fingerprint
        } else {
            Source::Manual
        };

        match self.try_generate(request) {
            Ok(password) => GenerationResult {
                success: true,
                length: password.chars().count(),
                password: Some(password),
                source,
                keys_used: request.user_keys.clone(),
                error: None,
            },
            Err(e) => {
                log::debug!("generation rejected: {e}");
                GenerationResult::failure(request, source, &e)
            }
        }
    }

    fn try_generate(&self, request: &GenerationRequest) -> Result<String> {
        validate(request)?;

        let source =
            MasterKeySource::from_parts(&request.master_key, request.use_default_fingerprint);
        let master_key = resolve(&self.fingerprinter, &source);

        let start = Instant::now();
        let key_material = kdf::derive(
            &master_key,
            &request.user_keys,
            request.length,
            self.kdf_config,
        )?;
        log::debug!(
            "derived {} bytes with {} PBKDF2 iterations in {:.2?}",
            key_material.len(),
            self.kdf_config.iterations,
            start.elapsed()
        );

        let password = map_to_password(&key_material, request.length)?;
        Ok(password.as_str().to_string())
    }
}

pub fn validate(request: &GenerationRequest) -> Result<()> {
    let count = request.user_keys.len();
    if count < MIN_KEYWORDS {
        return Err(Error::invalid_input("At least one user key required"));
    }
    if count > MAX_KEYWORDS {
        return Err(Error::invalid_input(format!(
            "Too many user keys ({count}, maximum is {MAX_KEYWORDS})"
        )));
    }
    if let Some(index) = request.user_keys.iter().position(|k| k.trim().is_empty()) {
        return Err(Error::invalid_input(format!(
            "User key {} cannot be empty",
            index + 1
        )));
    }
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&request.length) {
        return Err(Error::invalid_input(format!(
            "Length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} (got {})",
            request.length
        )));
    }
    if !request.use_default_fingerprint && request.master_key.is_empty() {
        return Err(Error::invalid_input("Master key required"));
    }
    Ok(())
}
