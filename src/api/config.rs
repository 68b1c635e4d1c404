//! Annotation configuration.

use crate::container::verify::{VerifyMode, DEFAULT_SAMPLE_RADIUS};

/// Configuration for a [`ContainerShadow`](crate::ContainerShadow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowConfig {
    /// How much of a region `verify` and `check` read (default: sampled, 32 bytes)
    pub verify_mode: VerifyMode,

    /// Verify the region after every annotation and report CS101 on mismatch
    pub check_after_annotate: bool,

    /// Validate ordering and alignment before annotating (CS001/CS002)
    pub contract_checks: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            verify_mode: VerifyMode::sampled(),
            check_after_annotate: cfg!(feature = "debug"),
            contract_checks: cfg!(feature = "contract-checks"),
        }
    }
}

impl ShadowConfig {
    /// No checks at all: annotate and nothing else.
    pub fn minimal() -> Self {
        Self {
            verify_mode: VerifyMode::sampled(),
            check_after_annotate: false,
            contract_checks: false,
        }
    }

    /// Full verification after every annotation, with contract checks.
    ///
    /// Costs one read per granule of the region on every size change.
    pub fn paranoid() -> Self {
        Self {
            verify_mode: VerifyMode::Full,
            check_after_annotate: true,
            contract_checks: true,
        }
    }

    /// Read overrides from the environment, starting from `Default`.
    ///
    /// - `CONTSHADOW_VERIFY`: `full`, or a sample radius in bytes
    /// - `CONTSHADOW_CHECK`: `1`/`true` to verify after every annotation
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = std::env::var("CONTSHADOW_VERIFY") {
            if let Some(mode) = parse_verify_mode(&val) {
                config.verify_mode = mode;
            }
        }
        if let Ok(val) = std::env::var("CONTSHADOW_CHECK") {
            if let Some(check) = parse_flag(&val) {
                config.check_after_annotate = check;
            }
        }
        config
    }

    /// Builder pattern: set the verification mode.
    pub fn with_verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify_mode = mode;
        self
    }

    /// Builder pattern: sampled verification with the given radius in bytes.
    pub fn with_sample_radius(mut self, radius: usize) -> Self {
        self.verify_mode = VerifyMode::Sampled { radius };
        self
    }

    /// Builder pattern: verify after every annotation.
    pub fn with_check_after_annotate(mut self, enable: bool) -> Self {
        self.check_after_annotate = enable;
        self
    }

    /// Builder pattern: validate annotation arguments.
    pub fn with_contract_checks(mut self, enable: bool) -> Self {
        self.contract_checks = enable;
        self
    }
}

fn parse_verify_mode(val: &str) -> Option<VerifyMode> {
    let val = val.trim().to_lowercase();
    match val.as_str() {
        "full" => Some(VerifyMode::Full),
        "sampled" => Some(VerifyMode::Sampled {
            radius: DEFAULT_SAMPLE_RADIUS,
        }),
        other => other.parse().ok().map(|radius| VerifyMode::Sampled { radius }),
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let minimal = ShadowConfig::minimal();
        assert!(!minimal.check_after_annotate);
        assert!(!minimal.contract_checks);

        let paranoid = ShadowConfig::paranoid();
        assert_eq!(paranoid.verify_mode, VerifyMode::Full);
        assert!(paranoid.check_after_annotate);
    }

    #[test]
    fn test_builder() {
        let config = ShadowConfig::minimal()
            .with_sample_radius(64)
            .with_check_after_annotate(true)
            .with_contract_checks(true);
        assert_eq!(config.verify_mode, VerifyMode::Sampled { radius: 64 });
        assert!(config.check_after_annotate);
        assert!(config.contract_checks);
    }

    #[test]
    fn test_parse_verify_mode() {
        assert_eq!(parse_verify_mode("FULL"), Some(VerifyMode::Full));
        assert_eq!(parse_verify_mode("sampled"), Some(VerifyMode::sampled()));
        assert_eq!(parse_verify_mode("128"), Some(VerifyMode::Sampled { radius: 128 }));
        assert_eq!(parse_verify_mode("wide"), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("Off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
