use crate::error::Error;
use crate::probe::{platform_probe, Probe};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

pub const FINGERPRINT_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// First 32 hex digits of SHA-256 over the `|`-joined identifiers.
    pub fn from_identifiers<S: AsRef<str>>(identifiers: &[S]) -> Self {
        let joined = identifiers
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<&str>>()
            .join("|");
        let digest = hex::encode(Sha256::digest(joined.as_bytes()));
        Self(digest[..FINGERPRINT_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != FINGERPRINT_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_input(format!(
                "Fingerprint must be {FINGERPRINT_LEN} hexadecimal characters"
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

pub trait FingerprintSource {
    fn fingerprint(&self) -> Fingerprint;
}

/// A known fingerprint, e.g. one recorded on another machine.
impl FingerprintSource for Fingerprint {
    fn fingerprint(&self) -> Fingerprint {
        self.clone()
    }
}

impl<T: FingerprintSource + ?Sized> FingerprintSource for Box<T> {
    fn fingerprint(&self) -> Fingerprint {
        (**self).fingerprint()
    }
}

/// Fingerprint of the local machine, recomputed on every call.
pub struct HardwareFingerprinter {
    probe: Box<dyn Probe>,
    host_info: fn() -> String,
}

impl HardwareFingerprinter {
    pub fn new() -> Self {
        Self::with_probe(platform_probe())
    }

    pub fn with_probe(probe: Box<dyn Probe>) -> Self {
        Self {
            probe,
            host_info,
        }
    }

    pub fn with_host_info(mut self, host_info: fn() -> String) -> Self {
        self.host_info = host_info;
        self
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }

    fn identifiers(&self) -> Vec<String> {
        let identifiers: Vec<String> = self.probe.probe().iter().map(|id| id.labelled()).collect();

        if identifiers.is_empty() {
            log::debug!(
                "no hardware identifiers from {} probe, using host info",
                self.probe.name()
            );
            return vec![format!("sys:{}", (self.host_info)())];
        }

        identifiers
    }
}

impl Default for HardwareFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintSource for HardwareFingerprinter {
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_identifiers(&self.identifiers())
    }
}

/// Generic description of the host: hostname plus OS and architecture.
pub fn host_info() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "unknown-host".to_string());

    format!(
        "{}|{}-{}",
        host,
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{Identifier, IdentifierKind, NullProbe};

    struct FixedProbe(Vec<Identifier>);

    impl Probe for FixedProbe {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn probe(&self) -> Vec<Identifier> {
            self.0.clone()
        }
    }

    fn is_fingerprint(s: &str) -> bool {
        s.len() == FINGERPRINT_LEN && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    #[test]
    fn test_known_identifiers() {
        let fp = Fingerprint::from_identifiers(&[
            "cpu:Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz",
            "mb:PM1234567890",
        ]);
        assert_eq!(fp.as_str(), "c3727c0a9c60ef85bb7c12f7837cc560");
    }

    #[test]
    fn test_probe_identifiers_are_hashed() {
        let probe = FixedProbe(vec![
            Identifier {
                kind: IdentifierKind::Cpu,
                value: "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz".into(),
            },
            Identifier {
                kind: IdentifierKind::Board,
                value: "PM1234567890".into(),
            },
        ]);
        let fingerprinter = HardwareFingerprinter::with_probe(Box::new(probe));
        assert_eq!(
            fingerprinter.fingerprint().as_str(),
            "c3727c0a9c60ef85bb7c12f7837cc560"
        );
    }

    #[test]
    fn test_all_probes_failing_falls_back_to_host_info() {
        let fingerprinter = HardwareFingerprinter::with_probe(Box::new(NullProbe));
        let fp = fingerprinter.fingerprint();

        assert!(is_fingerprint(fp.as_str()), "bad fingerprint {fp}");
        assert_eq!(fp, fingerprinter.fingerprint());
        assert_eq!(fp, Fingerprint::from_identifiers(&[format!("sys:{}", host_info())]));
    }

    #[test]
    fn test_fallback_uses_host_info() {
        let a = HardwareFingerprinter::with_probe(Box::new(NullProbe))
            .with_host_info(|| "alpha|linux-x86_64".to_string());
        let b = HardwareFingerprinter::with_probe(Box::new(NullProbe))
            .with_host_info(|| "beta|linux-x86_64".to_string());

        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(
            a.fingerprint(),
            Fingerprint::from_identifiers(&["sys:alpha|linux-x86_64"])
        );
    }

    #[test]
    fn test_parse_fingerprint() {
        let fp: Fingerprint = "0123456789ABCDEF0123456789abcdef".parse().unwrap();
        assert_eq!(fp.as_str(), "0123456789abcdef0123456789abcdef");
        assert_eq!(fp.fingerprint(), fp);

        assert!("0123".parse::<Fingerprint>().is_err());
        assert!("0123456789abcdef0123456789abcdeg".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_host_info_not_empty() {
        let info = host_info();
        assert!(info.contains(std::env::consts::OS));
        assert!(!info.starts_with('|'));
    }

    #[test]
    fn test_local_machine_fingerprint() {
        let fingerprinter = HardwareFingerprinter::new();
        let fp = fingerprinter.fingerprint();
        assert!(is_fingerprint(fp.as_str()));
        assert_eq!(fp, fingerprinter.fingerprint());
    }
}
