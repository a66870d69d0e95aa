//! Module containing the HTTP client used for sending requests
use std::io;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper_util::client::legacy::{connect::Connect, Error as LegacyHyperError};
#[cfg(feature = "hyper-rustls")]
use rustls::crypto::ring::default_provider as default_crypto_provider;
use thiserror::Error as ThisError;

use crate::Error;

pub(crate) type HyperResponse = http::Response<hyper::body::Incoming>;

/// Body type of every request sent by this crate.
pub type RequestBody = UnsyncBoxBody<Bytes, io::Error>;

pub(crate) type LegacyClient<C> = hyper_util::client::legacy::Client<C, RequestBody>;

#[derive(Debug, ThisError)]
/// Errors that can happen when a request is sent
pub enum SendError {
    /// Request could not complete before timeout elapsed
    #[error("Request timed out")]
    Timeout,
    /// Wrapper for hyper errors
    #[error("Hyper error: {0}")]
    Hyper(#[source] LegacyHyperError),
}

/// A request body holding nothing.
pub(crate) fn empty_body() -> RequestBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A request body holding a buffer that is already in memory.
pub(crate) fn full_body<B: Into<Bytes>>(data: B) -> RequestBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A trait implemented for any hyper_util::client::legacy::Client as well as the DefaultHyperClientBuilder.
pub trait HyperClientBuilder {
    /// The hyper connector that the resulting hyper client will use.
    type Connector: Connect + Clone + Send + Sync + 'static;

    /// Sets duration after which a request times out
    fn with_timeout(self, timeout: Duration) -> Self;

    /// Create a hyper::Client
    fn build_hyper_client(self) -> Result<HttpClient<Self::Connector>, Error>;
}

/// Client that can be configured that a request will timeout after a specified
/// duration.
#[derive(Clone)]
pub struct HttpClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    client: LegacyClient<C>,
    timeout: Option<Duration>,
}

impl<C> HttpClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(hyper_client: LegacyClient<C>, timeout: Option<Duration>) -> Self {
        Self {
            client: hyper_client,
            timeout,
        }
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub(crate) async fn request(
        &self,
        payload: http::Request<RequestBody>,
    ) -> Result<HyperResponse, SendError> {
        let future = self.client.request(payload);
        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, future)
                .await
                .map_err(|_| SendError::Timeout)?,
            None => future.await,
        }
        .map_err(SendError::Hyper)
    }
}

impl<C> HyperClientBuilder for HttpClient<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    type Connector = C;

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.set_timeout(timeout);
        self
    }

    fn build_hyper_client(self) -> Result<HttpClient<Self::Connector>, Error> {
        Ok(self)
    }
}

/// The builder value used when the default hyper client should be used.
#[cfg(feature = "hyper-rustls")]
#[derive(Default)]
pub struct DefaultHyperClientBuilder {
    timeout: Option<Duration>,
}

#[cfg(feature = "hyper-rustls")]
impl HyperClientBuilder for DefaultHyperClientBuilder {
    type Connector =
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_hyper_client(self) -> Result<HttpClient<Self::Connector>, Error> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_native_roots(default_crypto_provider())?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        Ok(HttpClient::new(
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .pool_max_idle_per_host(0)
                .build::<_, RequestBody>(connector),
            self.timeout,
        ))
    }
}

/// Intended for using an existing hyper client with `yup-drive`. Instantiate
/// with [`CustomHyperClientBuilder::from`]
pub struct CustomHyperClientBuilder<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    client: HttpClient<C>,
    timeout: Option<Duration>,
}

impl<C> From<LegacyClient<C>> for CustomHyperClientBuilder<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    fn from(client: LegacyClient<C>) -> Self {
        Self {
            client: HttpClient::new(client, None),
            timeout: None,
        }
    }
}

impl<C> HyperClientBuilder for CustomHyperClientBuilder<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    type Connector = C;

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_hyper_client(self) -> Result<HttpClient<Self::Connector>, Error> {
        let mut client = self.client;
        if let Some(timeout) = self.timeout {
            client.set_timeout(timeout);
        }
        Ok(client)
    }
}
