//! This library authorizes a local user against Google Drive and performs basic file
//! operations with the obtained token.
//!
//! For your application to use this library, you will have to obtain an application
//! id and secret by
//! [following this guide](https://developers.google.com/identity/protocols/OAuth2InstalledApp)
//! and save the client registration JSON (`{"installed": {"client_id": ...}}`) next to it.
//!
//! # Installed Flow Usage
//! The installed flow involves showing a URL to the user and prompting the user to enter
//! the code displayed after consent. You can implement your own `InstalledFlowDelegate`
//! in order to customize how the URL is presented and how the code is read.
//!
//! The returned `TokenInfo` is persisted to disk, by default at
//! `.credentials/drive-token.json`. On later runs it is read back and used as-is; it is
//! not refreshed, so a revoked token has to be deleted from the cache by hand.
//!
//! # Files
//! A `DriveHub` wraps one token and issues exactly one request per operation: listing the
//! first page of files, downloading, uploading or deleting a file.
//!
//! ```test_harness,no_run
//! use yup_drive::{obtain_credential, AuthConfig, DriveHub, HyperClientBuilder};
//! use yup_drive::client::DefaultHyperClientBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let token = match obtain_credential("client_secret.json", AuthConfig::default()).await {
//!         Ok(token) => token,
//!         Err(e) => return println!("error: {}", e),
//!     };
//!     let client = DefaultHyperClientBuilder::default()
//!         .build_hyper_client()
//!         .expect("hyper client");
//!     match DriveHub::new(client, token).list_files().await {
//!         Ok(files) => println!("{}", files),
//!         Err(e) => println!("The API returned an error: {}", e),
//!     }
//! }
//! ```
//!
#![deny(missing_docs)]

pub mod authenticator;
pub mod authenticator_delegate;
pub mod client;
pub mod drive;
pub mod error;
mod helper;
mod installed;

/// Interface for storing tokens so that they can be re-used. There are built-in memory and
/// file-based storage providers. You can implement your own by implementing the TokenStorage trait.
pub mod storage;

mod types;

#[cfg(feature = "hyper-rustls")]
#[doc(inline)]
pub use crate::authenticator::{obtain_credential, DefaultAuthenticator};
#[doc(inline)]
pub use crate::authenticator::{AuthConfig, Authenticator, InstalledFlowAuthenticator};

pub use crate::client::{CustomHyperClientBuilder, HttpClient, HyperClientBuilder};
pub use crate::drive::{DriveHub, FileList};
pub use crate::helper::*;

#[doc(inline)]
pub use crate::error::Error;
pub use crate::types::{ApplicationSecret, ConsoleApplicationSecret, TokenInfo};
