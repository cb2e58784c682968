//! HTTP basic credentials (RFC 7617), transport-agnostic.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("authorization scheme is not Basic")]
    WrongScheme,

    #[error("credentials are not valid base64")]
    Encoding,

    #[error("credentials are missing the ':' separator")]
    Malformed,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization` header value such as `Basic YWRtaW46MTIzNA==`.
    pub fn parse_header(value: &str) -> Result<Self, CredentialsError> {
        let encoded = value
            .strip_prefix("Basic ")
            .or_else(|| value.strip_prefix("basic "))
            .ok_or(CredentialsError::WrongScheme)?
            .trim();

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| CredentialsError::Encoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialsError::Encoding)?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or(CredentialsError::Malformed)?;

        Ok(Self::new(username, password))
    }

    /// Render as an `Authorization` header value.
    pub fn to_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl core::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip_keeps_colons_in_password() {
        let creds = BasicCredentials::new("nurse", "p:a:ss");
        let parsed = BasicCredentials::parse_header(&creds.to_header()).unwrap();
        assert_eq!(parsed.username, "nurse");
        assert_eq!(parsed.password, "p:a:ss");
    }

    #[test]
    fn rejects_bearer_and_garbage() {
        assert_eq!(
            BasicCredentials::parse_header("Bearer abc"),
            Err(CredentialsError::WrongScheme)
        );
        assert_eq!(
            BasicCredentials::parse_header("Basic !!!"),
            Err(CredentialsError::Encoding)
        );
        let no_colon = format!("Basic {}", STANDARD.encode("admin"));
        assert_eq!(
            BasicCredentials::parse_header(&no_colon),
            Err(CredentialsError::Malformed)
        );
    }
}
