// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict validation.
//!
//! Every field is optional and defaults to the reference sweep, so an absent
//! file and an empty mapping describe the same run. Any invalid field results
//! in a HardValidationError before a single process is spawned.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HardValidationError, HarnessError, HarnessResult};
use crate::invoker::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::types::{BufferSize, MessageSize, Transport, TrialCount};

/// Message sizes of the reference sweep, 100 B up to 4 MiB.
pub const REFERENCE_MESSAGE_SIZES: [u64; 20] = [
    100, 200, 500, 1024, 2048, 3072, 4096, 5120, 6144, 7168, 8192, 9216, 20000, 40000, 80000,
    100000, 200000, 400000, 1048576, 4194304,
];

/// Raw configuration as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawConfig {
    trial_count: usize,
    max_attempts: u32,
    retry_on_malformed_output: bool,
    mach_receive_buffer_size: u64,
    message_sizes: Vec<u64>,
    binary_dir: Option<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            trial_count: TrialCount::REFERENCE.get(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_on_malformed_output: false,
            mach_receive_buffer_size: BufferSize::MACH_DEFAULT.bytes(),
            message_sizes: REFERENCE_MESSAGE_SIZES.to_vec(),
            binary_dir: None,
        }
    }
}

/// Validated harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub trials: TrialCount,
    pub retry_policy: RetryPolicy,
    pub mach_receive_buffer_size: BufferSize,
    /// Sweep order; also the row order of the report.
    pub message_sizes: Vec<MessageSize>,
    /// Directory holding the measurement executables. `None` means the
    /// directory of the running harness binary.
    pub binary_dir: Option<PathBuf>,
}

impl HarnessConfig {
    /// Transports in sweep order: POSIX pipe first, then Mach port.
    pub fn transports(&self) -> [Transport; 2] {
        [
            Transport::PosixPipe,
            Transport::MachPort {
                receive_buffer_size: self.mach_receive_buffer_size,
            },
        ]
    }

    /// Override the executable directory.
    pub fn with_binary_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.binary_dir = Some(dir.into());
        self
    }

    /// Directory the measurement executables are launched from.
    pub fn resolve_binary_dir(&self) -> HarnessResult<PathBuf> {
        if let Some(dir) = &self.binary_dir {
            return Ok(dir.clone());
        }

        let exe = std::env::current_exe().map_err(|e| HarnessError::Io {
            context: "locating harness executable",
            source: e,
        })?;

        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| HarnessError::ConfigParse {
                message: format!("harness executable {} has no parent directory", exe.display()),
            })
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// The reference sweep with no overrides.
    pub fn reference() -> HarnessResult<HarnessConfig> {
        Self::validate(RawConfig::default())
    }

    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> HarnessResult<HarnessConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HarnessError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> HarnessResult<HarnessConfig> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| HarnessError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> HarnessResult<HarnessConfig> {
        let trials = TrialCount::new(raw.trial_count)?;

        let retry_policy = RetryPolicy::new(raw.max_attempts)?
            .with_retry_on_malformed_output(raw.retry_on_malformed_output);

        let mach_receive_buffer_size = BufferSize::new(raw.mach_receive_buffer_size)?;

        if raw.message_sizes.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one message size must be defined".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        let mut message_sizes = Vec::with_capacity(raw.message_sizes.len());
        for (index, bytes) in raw.message_sizes.into_iter().enumerate() {
            let size = MessageSize::new(bytes).map_err(|_| HardValidationError::InvalidFieldValue {
                field: "message_sizes",
                value: bytes.to_string(),
                reason: format!("Entry at index {} must be at least one byte", index),
            })?;

            // A repeated size would produce two rows under one table key
            if !seen.insert(bytes) {
                return Err(HardValidationError::DuplicateMessageSize { size: bytes }.into());
            }

            message_sizes.push(size);
        }

        let binary_dir = match raw.binary_dir {
            Some(dir) if dir.trim().is_empty() => {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "binary_dir",
                    value: dir,
                    reason: "Binary directory cannot be empty".to_string(),
                }
                .into());
            }
            other => other.map(PathBuf::from),
        };

        Ok(HarnessConfig {
            trials,
            retry_policy,
            mach_receive_buffer_size,
            message_sizes,
            binary_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransportKind;

    const VALID_CONFIG: &str = r#"
trial_count: 11
max_attempts: 5
retry_on_malformed_output: true
mach_receive_buffer_size: 8192
binary_dir: /opt/ipc-bench/bin
message_sizes:
  - 100
  - 500
  - 100000
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.trials.get(), 11);
        assert_eq!(config.retry_policy.max_attempts(), 5);
        assert!(config.retry_policy.retries_malformed_output());
        assert_eq!(config.mach_receive_buffer_size.bytes(), 8192);
        assert_eq!(
            config
                .message_sizes
                .iter()
                .map(|s| s.bytes())
                .collect::<Vec<_>>(),
            vec![100, 500, 100000]
        );
        assert_eq!(
            config.binary_dir.as_deref(),
            Some(Path::new("/opt/ipc-bench/bin"))
        );
    }

    #[test]
    fn test_reference_defaults() {
        let config = ConfigLoader::reference().unwrap();
        assert_eq!(config.trials.get(), 201);
        assert_eq!(config.retry_policy.max_attempts(), 3);
        assert!(!config.retry_policy.retries_malformed_output());
        assert_eq!(config.mach_receive_buffer_size.bytes(), 4096);
        assert_eq!(config.message_sizes.len(), 20);
        assert_eq!(config.message_sizes[0].bytes(), 100);
        assert_eq!(config.message_sizes[19].bytes(), 4194304);
        assert!(config.binary_dir.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ConfigLoader::load_string("trial_count: 5\n").unwrap();
        assert_eq!(config.trials.get(), 5);
        assert_eq!(config.message_sizes.len(), REFERENCE_MESSAGE_SIZES.len());
        assert_eq!(config.retry_policy.max_attempts(), 3);
    }

    #[test]
    fn test_transport_order() {
        let config = ConfigLoader::reference().unwrap();
        let transports = config.transports();
        assert_eq!(transports[0].kind(), TransportKind::PosixPipe);
        assert_eq!(
            transports[1],
            Transport::MachPort {
                receive_buffer_size: BufferSize::MACH_DEFAULT
            }
        );
    }

    #[test]
    fn test_even_trial_count() {
        let result = ConfigLoader::load_string("trial_count: 200\n");
        assert!(matches!(
            result,
            Err(HarnessError::HardValidation(
                HardValidationError::InvalidTrialCount { count: 200 }
            ))
        ));
    }

    #[test]
    fn test_zero_attempts() {
        assert!(ConfigLoader::load_string("max_attempts: 0\n").is_err());
    }

    #[test]
    fn test_zero_buffer_size() {
        assert!(ConfigLoader::load_string("mach_receive_buffer_size: 0\n").is_err());
    }

    #[test]
    fn test_empty_message_sizes() {
        assert!(ConfigLoader::load_string("message_sizes: []\n").is_err());
    }

    #[test]
    fn test_zero_message_size() {
        let yaml = r#"
message_sizes:
  - 100
  - 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_duplicate_message_sizes() {
        let yaml = r#"
message_sizes:
  - 100
  - 200
  - 100
"#;
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(
            result,
            Err(HarnessError::HardValidation(
                HardValidationError::DuplicateMessageSize { size: 100 }
            ))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = ConfigLoader::load_string("message_sizes: [100, oops]\n");
        assert!(matches!(result, Err(HarnessError::ConfigParse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_file("/nonexistent/ipc-latency.yaml");
        assert!(matches!(result, Err(HarnessError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_explicit_binary_dir_wins() {
        let config = ConfigLoader::reference()
            .unwrap()
            .with_binary_dir("/usr/local/libexec/ipc");
        assert_eq!(
            config.resolve_binary_dir().unwrap(),
            PathBuf::from("/usr/local/libexec/ipc")
        );
    }

    #[test]
    fn test_default_binary_dir_is_executable_parent() {
        let config = ConfigLoader::reference().unwrap();
        let dir = config.resolve_binary_dir().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(Some(dir.as_path()), exe.parent());
    }
}
