//! Module containing types related to delegates.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{self as tio, AsyncBufRead, AsyncBufReadExt};

/// InstalledFlowDelegate methods are called when the installed flow needs to ask the
/// operator for something. It is the only place the flow touches the terminal, so a
/// custom implementation is all it takes to drive the flow without one.
pub trait InstalledFlowDelegate: Send + Sync {
    /// Configure a custom redirect uri if needed. If `None`, the first redirect uri of
    /// the client registration is used.
    fn redirect_uri(&self) -> Option<&str> {
        None
    }

    /// We need the user to navigate to a URL using their browser and paste back the code
    /// the provider shows after consent.
    ///
    /// The returned future resolves to the code, or to an error message if no code could
    /// be obtained. It is awaited exactly once per authorization attempt.
    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(present_user_url(url))
    }
}

/// Print `url` on stdout and block on one line of stdin holding the authorization code.
pub async fn present_user_url(url: &str) -> Result<String, String> {
    println!("Authorize this app by visiting this url: {}", url);
    println!("Enter the code from that page here: ");
    read_auth_code(tio::BufReader::new(tio::stdin())).await
}

/// Read a single line holding the authorization code from `input`.
pub(crate) async fn read_auth_code<R>(mut input: R) -> Result<String, String>
where
    R: AsyncBufRead + Unpin,
{
    let mut user_input = String::new();
    match input.read_line(&mut user_input).await {
        Err(err) => Err(format!("Failed to read authorization code: {}", err)),
        Ok(0) => Err("Input closed before an authorization code was entered".to_owned()),
        Ok(_) => Ok(user_input.trim().to_owned()),
    }
}

/// Uses all default implementations in the InstalledFlowDelegate trait.
#[derive(Copy, Clone)]
pub struct DefaultInstalledFlowDelegate;
impl InstalledFlowDelegate for DefaultInstalledFlowDelegate {}

/// The default installed-flow delegate, but with a fixed redirect uri.
#[derive(Clone)]
pub struct DefaultInstalledFlowDelegateWithRedirectURI(pub String);
impl InstalledFlowDelegate for DefaultInstalledFlowDelegateWithRedirectURI {
    fn redirect_uri(&self) -> Option<&str> {
        Some(self.0.as_str())
    }
}
