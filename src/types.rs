use crate::error::{AuthErrorOr, Error};

use http::header::HeaderValue;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Represents a token as returned by OAuth2 servers.
///
/// It is produced by the installed flow or read back from the token cache, and
/// authenticates calls against the storage API. No expiry handling is done: a
/// cached token is handed out as-is, and only fails once the API rejects it.
///
/// The type is tuned to be suitable for direct serialization to the token cache,
/// and for comparison of a cached token with the one that was stored.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct TokenInfo {
    /// used when authenticating calls to oauth2 enabled services.
    pub access_token: String,
    /// used to refresh an expired access_token.
    pub refresh_token: Option<String>,
    /// The token type as string - usually 'Bearer'.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// The time when the token expires, as reported at exchange time.
    pub expires_at: Option<OffsetDateTime>,
    /// Optionally included by the OAuth2 server and may contain information to verify the identity
    /// used to obtain the access token.
    pub id_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

impl TokenInfo {
    pub(crate) fn from_json(json_data: &[u8]) -> Result<TokenInfo, Error> {
        #[derive(Deserialize)]
        struct RawToken {
            access_token: Option<String>,
            refresh_token: Option<String>,
            token_type: Option<String>,
            expires_in: Option<i64>,
            id_token: Option<String>,
        }

        let RawToken {
            access_token,
            refresh_token,
            token_type,
            expires_in,
            id_token,
        } = serde_json::from_slice::<AuthErrorOr<RawToken>>(json_data)?.into_result()?;

        let access_token = access_token.ok_or_else(|| {
            Error::BadServerResponse("token response carries no access_token".to_owned())
        })?;
        let token_type = token_type.unwrap_or_else(default_token_type);
        if !token_type.eq_ignore_ascii_case("bearer") {
            return Err(Error::BadServerResponse(format!(
                r#"unknown token type returned; expected "bearer" found {}"#,
                token_type
            )));
        }

        let expires_at = match expires_in {
            Some(seconds_from_now) => Some(
                OffsetDateTime::now_utc()
                    .checked_add(time::Duration::seconds(seconds_from_now))
                    .ok_or_else(|| {
                        Error::BadServerResponse(format!(
                            "expires_in out of range: {}",
                            seconds_from_now
                        ))
                    })?,
            ),
            None => None,
        };

        Ok(TokenInfo {
            access_token,
            refresh_token,
            token_type,
            expires_at,
            id_token,
        })
    }

    /// Get the access token.
    pub fn token(&self) -> &str {
        &self.access_token
    }

    /// Value for the `Authorization` header of requests made with this token.
    pub fn authorization_header(&self) -> Result<HeaderValue, Error> {
        HeaderValue::from_str(&format!("Bearer {}", self.access_token)).map_err(|_| {
            Error::BadServerResponse("access token is not a valid header value".to_owned())
        })
    }
}

/// Represents either 'installed' or 'web' applications in a json secrets file.
/// See `ConsoleApplicationSecret` for more information
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct ApplicationSecret {
    /// The client ID.
    pub client_id: String,
    /// The client secret.
    pub client_secret: String,
    /// The token server endpoint URI.
    pub token_uri: String,
    /// The authorization server endpoint URI.
    pub auth_uri: String,
    /// The redirect uris.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    /// Name of the google project the credentials are associated with
    pub project_id: Option<String>,
    /// The service account email associated with the client.
    pub client_email: Option<String>,
    /// The URL of the public x509 certificate, used to verify the signature on JWTs, such
    /// as ID tokens, signed by the authentication provider.
    pub auth_provider_x509_cert_url: Option<String>,
    ///  The URL of the public x509 certificate, used to verify JWTs signed by the client.
    pub client_x509_cert_url: Option<String>,
}

impl ApplicationSecret {
    /// The redirect target registered first with the provider, if any.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }
}

/// A type to facilitate reading and writing the json secret file
/// as returned by the [google developer console](https://code.google.com/apis/console)
#[derive(Deserialize, Serialize, Default, Debug)]
pub struct ConsoleApplicationSecret {
    /// web app secret
    pub web: Option<ApplicationSecret>,
    /// installed app secret
    pub installed: Option<ApplicationSecret>,
}
