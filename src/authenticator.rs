//! Module containing the core functionality for OAuth2 Authentication.
use crate::authenticator_delegate::InstalledFlowDelegate;
use crate::client::{HttpClient, HyperClientBuilder};
use crate::error::Error;
use crate::installed::InstalledFlow;
use crate::storage::{self, Storage, TokenStorage};
use crate::types::{ApplicationSecret, TokenInfo};

#[cfg(feature = "hyper-rustls")]
use crate::client::DefaultHyperClientBuilder;

use hyper_util::client::legacy::connect::Connect;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The scope granting full read/write access to the user's Drive.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Where the token cache lives unless configured otherwise.
pub const DEFAULT_TOKEN_PATH: &str = ".credentials/drive-token.json";

/// Immutable settings of an [`Authenticator`].
///
/// The scopes are requested as given, and never narrowed at runtime. The token path is the
/// location of the token cache when disk storage is used, which is the default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    /// Scopes to request during authorization.
    pub scopes: Vec<String>,
    /// File the token is cached in.
    pub token_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            scopes: vec![DRIVE_SCOPE.to_owned()],
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
        }
    }
}

impl AuthConfig {
    /// The default configuration, caching the token at `token_path`.
    pub fn with_token_path<P: Into<PathBuf>>(token_path: P) -> Self {
        AuthConfig {
            token_path: token_path.into(),
            ..Default::default()
        }
    }
}

/// Authenticator obtains a token, either from its token storage or by running the installed
/// flow, and persists any newly obtained token.
///
/// A token from storage is returned as-is: it is neither checked for expiry nor refreshed, and
/// a revoked token only shows once the API rejects it.
pub struct Authenticator<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    hyper_client: HttpClient<C>,
    config: AuthConfig,
    storage: Storage,
    flow: InstalledFlow,
}

impl<C> Authenticator<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    /// Return the current token.
    ///
    /// Runs the installed flow on a cache miss: the delegate is shown the authorization URL
    /// and asked for the code, which is exchanged for a token. The new token is stored before
    /// it is returned. Any failure ends the attempt; nothing is retried and nothing is stored.
    pub async fn token(&self) -> Result<TokenInfo, Error> {
        if let Some(token) = self.storage.get().await {
            log::info!("Using cached token");
            return Ok(token);
        }

        log::debug!("No cached token, starting installed flow");
        let token = self
            .flow
            .token(&self.hyper_client, &self.config.scopes)
            .await?;
        self.storage.set(token.clone()).await?;
        Ok(token)
    }

    /// The token held by the storage, if any. Never starts the installed flow.
    pub async fn cached_token(&self) -> Option<TokenInfo> {
        self.storage.get().await
    }

    /// The configuration this authenticator was built with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The HTTP client used for the token exchange. It can be shared with the API calls.
    pub fn http_client(&self) -> &HttpClient<C> {
        &self.hyper_client
    }
}

impl<C> fmt::Debug for Authenticator<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .field("client_id", &self.flow.app_secret.client_id)
            .finish()
    }
}

/// Create an authenticator that uses the installed flow.
/// ```
/// # async fn foo() {
/// # use yup_drive::authenticator::AuthConfig;
/// # let app_secret = yup_drive::read_application_secret("/tmp/foo").await.unwrap();
///     let authenticator = yup_drive::InstalledFlowAuthenticator::builder(app_secret)
///         .config(AuthConfig::default())
///         .build()
///         .await
///         .expect("failed to create authenticator");
/// # }
/// ```
pub struct InstalledFlowAuthenticator;
impl InstalledFlowAuthenticator {
    /// Use the builder pattern to create an Authenticator that uses the installed flow.
    #[cfg(feature = "hyper-rustls")]
    pub fn builder(
        app_secret: ApplicationSecret,
    ) -> AuthenticatorBuilder<DefaultHyperClientBuilder> {
        Self::with_client(app_secret, DefaultHyperClientBuilder::default())
    }

    /// Construct a new Authenticator that uses the installed flow and the provided http client.
    pub fn with_client<C>(app_secret: ApplicationSecret, client: C) -> AuthenticatorBuilder<C> {
        AuthenticatorBuilder {
            hyper_client_builder: client,
            config: AuthConfig::default(),
            storage_type: None,
            flow: InstalledFlow::new(app_secret),
            timeout: None,
        }
    }
}

/// How the token is to be stored.
pub enum StorageType {
    /// Store the token in memory, so it is lost with the authenticator.
    Memory,
    /// Store the token in the given file.
    Disk(PathBuf),
    /// Implement your own storage provider
    Custom(Box<dyn TokenStorage>),
}

/// Configure an Authenticator using the builder pattern.
pub struct AuthenticatorBuilder<C> {
    hyper_client_builder: C,
    config: AuthConfig,
    storage_type: Option<StorageType>,
    flow: InstalledFlow,
    timeout: Option<Duration>,
}

impl<C> AuthenticatorBuilder<C> {
    /// Use the provided configuration instead of `AuthConfig::default()`.
    pub fn config(self, config: AuthConfig) -> Self {
        AuthenticatorBuilder { config, ..self }
    }

    /// Use the provided token storage instead of a file at the configured token path.
    pub fn with_storage(self, storage_type: StorageType) -> Self {
        AuthenticatorBuilder {
            storage_type: Some(storage_type),
            ..self
        }
    }

    /// Use the provided InstalledFlowDelegate to present the URL and read the code.
    pub fn flow_delegate(self, flow_delegate: Box<dyn InstalledFlowDelegate>) -> Self {
        AuthenticatorBuilder {
            flow: InstalledFlow {
                flow_delegate,
                ..self.flow
            },
            ..self
        }
    }

    /// Abort requests to the token endpoint after `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        AuthenticatorBuilder {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Create the authenticator. This reads the token cache, if disk storage is used.
    pub async fn build(self) -> Result<Authenticator<C::Connector>, Error>
    where
        C: HyperClientBuilder,
    {
        let hyper_client_builder = match self.timeout {
            Some(timeout) => self.hyper_client_builder.with_timeout(timeout),
            None => self.hyper_client_builder,
        };
        let hyper_client = hyper_client_builder.build_hyper_client()?;

        let storage_type = self
            .storage_type
            .unwrap_or_else(|| StorageType::Disk(self.config.token_path.clone()));
        let storage = match storage_type {
            StorageType::Memory => Storage::Memory {
                token: Default::default(),
            },
            StorageType::Disk(path) => Storage::Disk(storage::DiskStorage::new(path).await),
            StorageType::Custom(custom_store) => Storage::Custom(custom_store),
        };

        Ok(Authenticator {
            hyper_client,
            config: self.config,
            storage,
            flow: self.flow,
        })
    }
}

/// Load the client registration from `secret_path` and obtain a token with the default
/// HTTP client and delegate.
///
/// Fails with [`Error::ConfigError`] if the registration cannot be read, and with the flow's
/// error if a new token had to be obtained and that failed.
#[cfg(feature = "hyper-rustls")]
pub async fn obtain_credential<P: AsRef<Path>>(
    secret_path: P,
    config: AuthConfig,
) -> Result<TokenInfo, Error> {
    let secret = crate::helper::read_application_secret(secret_path)
        .await
        .map_err(Error::ConfigError)?;
    InstalledFlowAuthenticator::builder(secret)
        .config(config)
        .build()
        .await?
        .token()
        .await
}

/// The authenticator type built by [`InstalledFlowAuthenticator::builder`].
#[cfg(feature = "hyper-rustls")]
pub type DefaultAuthenticator =
    Authenticator<<DefaultHyperClientBuilder as HyperClientBuilder>::Connector>;
