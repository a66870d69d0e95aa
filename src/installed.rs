// Copyright (c) 2016 Google Inc (lewinb@google.com).
//
// Refer to the project root for licensing information.
//
use crate::authenticator_delegate::{DefaultInstalledFlowDelegate, InstalledFlowDelegate};
use crate::client::{full_body, HttpClient, RequestBody};
use crate::error::Error;
use crate::types::{ApplicationSecret, TokenInfo};

use std::convert::AsRef;

use http::header;
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::Connect;
use percent_encoding::{percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;

const QUERY_SET: AsciiSet = CONTROLS.add(b' ').add(b'"').add(b'#').add(b'<').add(b'>');

const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Assembles a URL to request an authorization token (with user interaction).
/// Offline access is always requested, so the provider also hands out a refresh token.
fn build_authentication_request_url<T>(
    auth_uri: &str,
    client_id: &str,
    scopes: &[T],
    redirect_uri: &str,
) -> String
where
    T: AsRef<str>,
{
    let mut url = String::new();
    let scopes_string = crate::helper::join(scopes, " ");

    url.push_str(auth_uri);

    if !url.contains('?') {
        url.push('?');
    } else {
        match url.chars().last() {
            Some('?') | None => {}
            Some(_) => url.push('&'),
        }
    }

    let params = vec![
        format!("scope={}", scopes_string),
        "&access_type=offline".to_string(),
        format!("&redirect_uri={}", redirect_uri),
        "&response_type=code".to_string(),
        format!("&client_id={}", client_id),
    ];
    params.into_iter().fold(url, |mut u, param| {
        u.push_str(&percent_encode(param.as_ref(), &QUERY_SET).to_string());
        u
    })
}

/// InstalledFlow provides tokens for services that follow the "Installed" OAuth flow. (See
/// <https://www.oauth.com/oauth2-servers/authorization/>,
/// <https://developers.google.com/identity/protocols/OAuth2InstalledApp>).
///
/// The code is always obtained interactively: the user visits the presented URL, consents,
/// and pastes the displayed code back through the `InstalledFlowDelegate`.
pub struct InstalledFlow {
    pub(crate) app_secret: ApplicationSecret,
    pub(crate) flow_delegate: Box<dyn InstalledFlowDelegate>,
}

impl InstalledFlow {
    /// Create a new InstalledFlow with the provided secret, presenting the URL on stdout.
    ///
    /// In order to customize how the URL is presented or how the code is read, implement
    /// the `InstalledFlowDelegate` trait and assign it to the `flow_delegate` field.
    pub(crate) fn new(app_secret: ApplicationSecret) -> InstalledFlow {
        InstalledFlow {
            app_secret,
            flow_delegate: Box::new(DefaultInstalledFlowDelegate),
        }
    }

    /// The redirect target sent with both the authorization URL and the code exchange.
    fn redirect_uri(&self) -> &str {
        self.flow_delegate
            .redirect_uri()
            .or_else(|| self.app_secret.redirect_uri())
            .unwrap_or(OOB_REDIRECT_URI)
    }

    /// Handles the token request flow; it consists of the following steps:
    /// . Obtain a authorization code with user cooperation.
    /// . Obtain a token and refresh token using that code.
    /// . Return that token
    ///
    /// A failure in either step ends the flow; the user is not asked again.
    pub(crate) async fn token<C, T>(
        &self,
        hyper_client: &HttpClient<C>,
        scopes: &[T],
    ) -> Result<TokenInfo, Error>
    where
        T: AsRef<str>,
        C: Connect + Clone + Send + Sync + 'static,
    {
        let url = build_authentication_request_url(
            &self.app_secret.auth_uri,
            &self.app_secret.client_id,
            scopes,
            self.redirect_uri(),
        );
        log::debug!("Presenting auth url to user: {}", url);
        let auth_code = self
            .flow_delegate
            .present_user_url(&url)
            .await
            .map_err(Error::UserError)?;
        let auth_code = auth_code.trim();
        if auth_code.is_empty() {
            return Err(Error::UserError("No authorization code entered".to_owned()));
        }
        log::debug!("Received auth code: {}", auth_code);
        self.exchange_auth_code(auth_code, hyper_client).await
    }

    async fn exchange_auth_code<C>(
        &self,
        authcode: &str,
        hyper_client: &HttpClient<C>,
    ) -> Result<TokenInfo, Error>
    where
        C: Connect + Clone + Send + Sync + 'static,
    {
        let request = Self::request_token(&self.app_secret, authcode, self.redirect_uri())?;
        log::debug!("Sending request: {:?}", request);
        let (head, body) = hyper_client.request(request).await?.into_parts();
        let body = body.collect().await?.to_bytes();
        log::debug!("Received response; head: {:?} body: {:?}", head, body);
        TokenInfo::from_json(&body)
    }

    /// Sends the authorization code to the provider in order to obtain access and refresh tokens.
    fn request_token(
        app_secret: &ApplicationSecret,
        authcode: &str,
        redirect_uri: &str,
    ) -> Result<http::Request<RequestBody>, Error> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(vec![
                ("code", authcode),
                ("client_id", app_secret.client_id.as_str()),
                ("client_secret", app_secret.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .finish();

        Ok(http::Request::post(&app_secret.token_uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(full_body(body))?)
    }
}
