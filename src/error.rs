//! Module containing various error types.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use http::StatusCode;
use serde::Deserialize;

pub use crate::client::SendError;

/// Error returned by the token endpoint of the authorization server.
///
/// cf. <https://tools.ietf.org/html/rfc6749#section-5.2>
#[derive(Deserialize, Debug, PartialEq, Eq)]
pub struct AuthError {
    /// Error code from the server.
    pub error: AuthErrorCode,
    /// Human-readable text providing additional information.
    pub error_description: Option<String>,
    /// A URI identifying a human-readable web page with information about the error.
    pub error_uri: Option<String>,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.error.as_str())?;
        if let Some(desc) = &self.error_description {
            write!(f, ": {}", desc)?;
        }
        if let Some(uri) = &self.error_uri {
            write!(f, "; See {} for more info", uri)?;
        }
        Ok(())
    }
}

impl StdError for AuthError {}

/// The error code returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// invalid_request
    InvalidRequest,
    /// invalid_client
    InvalidClient,
    /// invalid_grant
    InvalidGrant,
    /// unauthorized_client
    UnauthorizedClient,
    /// unsupported_grant_type
    UnsupportedGrantType,
    /// invalid_scope
    InvalidScope,
    /// access_denied
    AccessDenied,
    /// expired_token
    ExpiredToken,
    /// other error
    Other(String),
}

impl AuthErrorCode {
    /// The error code as a &str
    pub fn as_str(&self) -> &str {
        match self {
            AuthErrorCode::InvalidRequest => "invalid_request",
            AuthErrorCode::InvalidClient => "invalid_client",
            AuthErrorCode::InvalidGrant => "invalid_grant",
            AuthErrorCode::UnauthorizedClient => "unauthorized_client",
            AuthErrorCode::UnsupportedGrantType => "unsupported_grant_type",
            AuthErrorCode::InvalidScope => "invalid_scope",
            AuthErrorCode::AccessDenied => "access_denied",
            AuthErrorCode::ExpiredToken => "expired_token",
            AuthErrorCode::Other(s) => s.as_str(),
        }
    }

    fn from_string<'a>(s: impl Into<Cow<'a, str>>) -> AuthErrorCode {
        let s = s.into();
        match s.as_ref() {
            "invalid_request" => AuthErrorCode::InvalidRequest,
            "invalid_client" => AuthErrorCode::InvalidClient,
            "invalid_grant" => AuthErrorCode::InvalidGrant,
            "unauthorized_client" => AuthErrorCode::UnauthorizedClient,
            "unsupported_grant_type" => AuthErrorCode::UnsupportedGrantType,
            "invalid_scope" => AuthErrorCode::InvalidScope,
            "access_denied" => AuthErrorCode::AccessDenied,
            "expired_token" => AuthErrorCode::ExpiredToken,
            _ => AuthErrorCode::Other(s.into_owned()),
        }
    }
}

impl From<String> for AuthErrorCode {
    fn from(s: String) -> Self {
        AuthErrorCode::from_string(s)
    }
}

impl<'a> From<&'a str> for AuthErrorCode {
    fn from(s: &str) -> Self {
        AuthErrorCode::from_string(s)
    }
}

impl<'de> Deserialize<'de> for AuthErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = AuthErrorCode;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("any string")
            }
            fn visit_string<E: serde::de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(value.into())
            }
            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(value.into())
            }
        }
        deserializer.deserialize_string(V)
    }
}

/// A helper type to deserialize either an AuthError or another piece of data.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum AuthErrorOr<T> {
    AuthError(AuthError),
    Data(T),
}

impl<T> AuthErrorOr<T> {
    pub(crate) fn into_result(self) -> Result<T, AuthError> {
        match self {
            AuthErrorOr::AuthError(err) => Result::Err(err),
            AuthErrorOr::Data(value) => Result::Ok(value),
        }
    }
}

/// A failed request against the storage API.
#[derive(Debug, PartialEq, Eq)]
pub struct RemoteError {
    /// HTTP status the API answered with.
    pub status: StatusCode,
    /// The message reported by the API, or the raw response body.
    pub message: String,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

impl StdError for RemoteError {}

// The storage API wraps failures in `{"error": {"code": 404, "message": "..."}}`.
#[derive(Deserialize)]
struct RemoteErrorEnvelope {
    error: RemoteErrorBody,
}

#[derive(Deserialize)]
struct RemoteErrorBody {
    message: String,
}

impl RemoteError {
    pub(crate) fn from_response(status: StatusCode, body: &[u8]) -> RemoteError {
        let message = match serde_json::from_slice::<RemoteErrorEnvelope>(body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
        };
        RemoteError { status, message }
    }
}

/// Encapsulates all possible results of the `token(...)` operation and of the file operations.
#[derive(Debug)]
pub enum Error {
    /// The client registration could not be read or parsed.
    ConfigError(io::Error),
    /// Indicates connection failure
    HttpError(hyper::Error),
    /// Indicates a failure sending a request, including timeouts
    HttpClientError(SendError),
    /// A request could not be assembled.
    RequestError(http::Error),
    /// The server returned an error.
    AuthError(AuthError),
    /// The storage API answered with a non-success status.
    RemoteRequest(RemoteError),
    /// Error while decoding a JSON response.
    JSONError(serde_json::Error),
    /// A response had an unexpected shape.
    BadServerResponse(String),
    /// Error within user input.
    UserError(String),
    /// A lower level IO error.
    LowLevelError(io::Error),
}

impl From<hyper::Error> for Error {
    fn from(error: hyper::Error) -> Error {
        Error::HttpError(error)
    }
}

impl From<SendError> for Error {
    fn from(error: SendError) -> Error {
        Error::HttpClientError(error)
    }
}

impl From<http::Error> for Error {
    fn from(error: http::Error) -> Error {
        Error::RequestError(error)
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Error {
        Error::AuthError(value)
    }
}

impl From<RemoteError> for Error {
    fn from(value: RemoteError) -> Error {
        Error::RemoteRequest(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::JSONError(value)
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Error {
        Error::LowLevelError(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::ConfigError(ref e) => write!(f, "Error loading client secret file: {}", e),
            Error::HttpError(ref err) => err.fmt(f),
            Error::HttpClientError(ref err) => err.fmt(f),
            Error::RequestError(ref err) => err.fmt(f),
            Error::AuthError(ref err) => err.fmt(f),
            Error::RemoteRequest(ref err) => err.fmt(f),
            Error::JSONError(ref e) => write!(
                f,
                "JSON Error; this might be a bug with unexpected server responses! {}",
                e
            ),
            Error::BadServerResponse(ref s) => s.fmt(f),
            Error::UserError(ref s) => s.fmt(f),
            Error::LowLevelError(ref e) => e.fmt(f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::ConfigError(ref err) => Some(err),
            Error::HttpError(ref err) => Some(err),
            Error::HttpClientError(ref err) => Some(err),
            Error::RequestError(ref err) => Some(err),
            Error::AuthError(ref err) => Some(err),
            Error::RemoteRequest(ref err) => Some(err),
            Error::JSONError(ref err) => Some(err),
            Error::LowLevelError(ref err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_code_roundtrip() {
        let err: AuthError = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Bad Request"}"#,
        )
        .unwrap();
        assert_eq!(err.error, AuthErrorCode::InvalidGrant);
        assert_eq!(err.to_string(), "invalid_grant: Bad Request");

        let err: AuthError = serde_json::from_str(r#"{"error": "invalid_code"}"#).unwrap();
        assert_eq!(err.error, AuthErrorCode::Other("invalid_code".to_owned()));
    }

    #[test]
    fn test_remote_error_envelope() {
        let body = br#"{"error": {"code": 404, "message": "File not found: abc."}}"#;
        let err = RemoteError::from_response(StatusCode::NOT_FOUND, body);
        assert_eq!(err.message, "File not found: abc.");
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = RemoteError::from_response(StatusCode::BAD_GATEWAY, b"upstream gone\n");
        assert_eq!(err.message, "upstream gone");
    }
}
