pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod kdf;
pub mod master;
pub mod password;
pub mod probe;

pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, FingerprintSource, HardwareFingerprinter};
pub use generator::map_to_password;
pub use kdf::{derive, Pbkdf2Config};
pub use master::{resolve, MasterKeySource};
pub use password::{GenerationRequest, GenerationResult, PasswordCore, Source};
pub use probe::{platform_probe, Identifier, IdentifierKind, Probe};
