//! Import tokens and their extraction from launch links.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameter carrying the token in an import link.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Opaque identifier of one pending batch on the remote service.
///
/// Never blank. The token is also the bearer credential for the batch, so its
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImportToken(String);

impl ImportToken {
    /// Wrap a token, trimming surrounding whitespace. `None` when blank.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Pull the `token` query parameter out of a launch link such as
    /// `glucosebridge://import?token=abc` or `https://host/import?token=abc`.
    ///
    /// Returns `None` for unparsable links and for absent or blank tokens.
    pub fn from_launch_uri(uri: &str) -> Option<Self> {
        let parsed = Url::parse(uri.trim()).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == TOKEN_QUERY_PARAM)
            .and_then(|(_, value)| Self::new(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ImportToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "ImportToken({prefix}…)")
    }
}

impl TryFrom<String> for ImportToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| "import token must not be blank".to_string())
    }
}

impl From<ImportToken> for String {
    fn from(token: ImportToken) -> Self {
        token.0
    }
}
