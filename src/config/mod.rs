use std::path::PathBuf;

use crate::cli::Cli;
use crate::ConfigError;

/// Immutable per-run configuration, built once from the CLI and held for the
/// duration of the batch.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory that receives downloaded audio and transcript files
    pub output_dir: PathBuf,

    /// Lower bound of the pacing delay in seconds
    pub min_delay_secs: u64,

    /// Upper bound of the pacing delay in seconds
    pub max_delay_secs: u64,

    /// When set, the transcription step is never invoked
    pub skip_transcription: bool,

    /// Credential for the transcription service. The explicit --api-key flag
    /// takes precedence over OPENAI_API_KEY (clap resolves that ordering).
    pub api_key: Option<String>,
}

impl RunConfig {
    /// Build and validate the run configuration.
    ///
    /// Validation failures here are fatal: they abort the run before any item
    /// is processed.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let config = Self {
            output_dir: cli.output_dir,
            min_delay_secs: cli.min_delay,
            max_delay_secs: cli.max_delay,
            skip_transcription: cli.skip_transcription,
            api_key: cli.api_key,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay_secs > self.max_delay_secs {
            return Err(ConfigError::InvalidDelayRange {
                min: self.min_delay_secs,
                max: self.max_delay_secs,
            });
        }

        if !self.skip_transcription && self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(())
    }
}
