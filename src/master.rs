use crate::fingerprint::FingerprintSource;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterKeySource {
    DefaultFingerprint,
    Manual(String),
}

impl MasterKeySource {
    pub fn from_parts(master_key: &str, use_default_fingerprint: bool) -> Self {
        if use_default_fingerprint {
            Self::DefaultFingerprint
        } else {
            Self::Manual(master_key.to_string())
        }
    }
}

/// Effective master key for `source`. Manual keys are returned verbatim.
pub fn resolve<F: FingerprintSource + ?Sized>(
    fingerprinter: &F,
    source: &MasterKeySource,
) -> Zeroizing<String> {
    match source {
        MasterKeySource::DefaultFingerprint => {
            Zeroizing::new(fingerprinter.fingerprint().as_str().to_string())
        }
        MasterKeySource::Manual(key) => Zeroizing::new(key.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl FingerprintSource for CountingSource {
        fn fingerprint(&self) -> Fingerprint {
            self.calls.set(self.calls.get() + 1);
            Fingerprint::from_identifiers(&["cpu:test"])
        }
    }

    #[test]
    fn test_default_uses_fingerprint() {
        let source = CountingSource { calls: Cell::new(0) };
        let key = resolve(&source, &MasterKeySource::DefaultFingerprint);
        assert_eq!(&*key, Fingerprint::from_identifiers(&["cpu:test"]).as_str());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn test_fingerprint_not_cached() {
        let source = CountingSource { calls: Cell::new(0) };
        resolve(&source, &MasterKeySource::DefaultFingerprint);
        resolve(&source, &MasterKeySource::DefaultFingerprint);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn test_manual_is_verbatim() {
        let source = CountingSource { calls: Cell::new(0) };
        let key = resolve(&source, &MasterKeySource::Manual("  spaced key  ".into()));
        assert_eq!(&*key, "  spaced key  ");
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            MasterKeySource::from_parts("ignored", true),
            MasterKeySource::DefaultFingerprint
        );
        assert_eq!(
            MasterKeySource::from_parts("secret", false),
            MasterKeySource::Manual("secret".into())
        );
    }
}
