//! Options for building a [`Utf8Reader`](super::Utf8Reader)

use super::error::{CharsetReaderError, Result};
use serde::Deserialize;

/// Bytes examined up front to resolve the encoding.
pub const DEFAULT_LOOKAHEAD_SIZE: usize = 10240;

const ENV_PREFIX: &str = "CHARSET_READER_";

/// What to do with byte sequences that are invalid for the resolved encoding
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the read with `io::ErrorKind::InvalidData`
    #[default]
    Strict,
    /// Emit U+FFFD and keep going
    Replace,
}

/// Reader configuration
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReaderOptions {
    /// Size of the lookahead buffer used for detection
    pub lookahead_size: usize,
    /// Declared content type, e.g. from an HTTP header
    pub content_type: Option<String>,
    pub malformed: MalformedPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            lookahead_size: DEFAULT_LOOKAHEAD_SIZE,
            content_type: None,
            malformed: MalformedPolicy::default(),
        }
    }
}

impl ReaderOptions {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }

    /// Load options from `CHARSET_READER_*` environment variables.
    /// Variables that are not set keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let options = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, ReaderOptions>(vars)
            .map_err(|e| {
                CharsetReaderError::configuration(format!("cannot read reader options: {e}"))
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.lookahead_size == 0 {
            return Err(CharsetReaderError::configuration(
                "lookahead_size must be greater than 0",
            ));
        }
        Ok(())
    }
}
