//! Files API of Google Drive v3, reduced to listing, downloading, uploading and deleting.
//!
//! Every operation issues exactly one request with the token it was given, and reports its
//! outcome as a `Result`. Nothing is retried and nothing is paginated.

use std::fmt;
use std::io;
use std::path::Path;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use http::{header, Method};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper_util::client::legacy::connect::Connect;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use url::form_urlencoded;

use crate::client::{empty_body, HttpClient, HyperResponse, RequestBody};
use crate::error::{Error, RemoteError};
use crate::types::TokenInfo;

/// Where the API is reached unless configured otherwise.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

/// Number of entries requested by [`DriveHub::list_files`].
pub const LIST_PAGE_SIZE: usize = 10;

/// Display name given to every uploaded file.
pub const UPLOAD_FILE_NAME: &str = "Upload from code";

const MULTIPART_BOUNDARY: &str = "yup_drive_multipart_boundary";

/// One entry of a file listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveFile {
    /// Identifier assigned by Drive.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
struct FilesListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// The first page of a file listing.
///
/// Its `Display` output is what the command line prints: "No files found." for an empty
/// page, otherwise a header followed by one `name (id)` line per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    /// The files on the page, at most [`LIST_PAGE_SIZE`].
    pub files: Vec<DriveFile>,
}

impl fmt::Display for FileList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.files.is_empty() {
            return write!(f, "No files found.");
        }
        write!(f, "Files:")?;
        for file in &self.files {
            write!(f, "\n{} ({})", file.name, file.id)?;
        }
        Ok(())
    }
}

/// The result of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    /// Identifier assigned to the new file.
    pub id: String,
}

/// Central instance to access the Drive files API with one token.
pub struct DriveHub<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    client: HttpClient<C>,
    token: TokenInfo,
    base_url: String,
}

impl<C> DriveHub<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    /// Create a hub sending requests through `client`, authorized by `token`.
    pub fn new(client: HttpClient<C>, token: TokenInfo) -> Self {
        DriveHub {
            client,
            token,
            base_url: DEFAULT_API_BASE.to_owned(),
        }
    }

    /// Send requests to `base_url` instead of [`DEFAULT_API_BASE`].
    pub fn with_base_url<S: Into<String>>(self, base_url: S) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        DriveHub { base_url, ..self }
    }

    fn files_url(&self, file_id: Option<&str>) -> String {
        match file_id {
            Some(id) => format!(
                "{}/drive/v3/files/{}",
                self.base_url,
                utf8_percent_encode(id, NON_ALPHANUMERIC)
            ),
            None => format!("{}/drive/v3/files", self.base_url),
        }
    }

    fn request_builder(&self, method: Method, url: &str) -> Result<http::request::Builder, Error> {
        Ok(http::Request::builder()
            .method(method)
            .uri(url)
            .header(header::AUTHORIZATION, self.token.authorization_header()?))
    }

    async fn send(&self, request: http::Request<RequestBody>) -> Result<HyperResponse, Error> {
        log::debug!("Sending request: {} {}", request.method(), request.uri());
        let response = self.client.request(request).await?;
        log::debug!("Received response; status: {}", response.status());
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        Err(RemoteError::from_response(status, &body).into())
    }

    /// List the names and IDs of up to [`LIST_PAGE_SIZE`] files.
    pub async fn list_files(&self) -> Result<FileList, Error> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("pageSize", &LIST_PAGE_SIZE.to_string())
            .append_pair("fields", "files(id,name)")
            .finish();
        let url = format!("{}?{}", self.files_url(None), query);
        let request = self.request_builder(Method::GET, &url)?.body(empty_body())?;
        let response = self.send(request).await?;

        let body = response.into_body().collect().await?.to_bytes();
        let FilesListResponse { mut files } = serde_json::from_slice(&body)?;
        files.truncate(LIST_PAGE_SIZE);
        Ok(FileList { files })
    }

    /// Stream the content of the file `file_id` into a new local file at `dest`.
    ///
    /// Returns the number of bytes written. The destination is only created once the API
    /// accepted the request.
    pub async fn download_file<P: AsRef<Path>>(&self, file_id: &str, dest: P) -> Result<u64, Error> {
        let url = format!("{}?alt=media", self.files_url(Some(file_id)));
        let request = self.request_builder(Method::GET, &url)?.body(empty_body())?;
        let response = self.send(request).await?;

        let mut out = tokio::fs::File::create(dest.as_ref()).await?;
        let mut body = response.into_body();
        let mut written = 0u64;
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame?.into_data() {
                out.write_all(&data).await?;
                written += data.len() as u64;
            }
        }
        out.flush().await?;
        log::debug!("Downloaded {} bytes to {}", written, dest.as_ref().display());
        Ok(written)
    }

    /// Upload the content of `src` as a new file named [`UPLOAD_FILE_NAME`].
    pub async fn upload_file<P: AsRef<Path>>(&self, src: P) -> Result<UploadedFile, Error> {
        let source = tokio::fs::File::open(src.as_ref()).await?;

        let metadata = serde_json::json!({ "name": UPLOAD_FILE_NAME }).to_string();
        let head = format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n\
             --{b}\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = MULTIPART_BOUNDARY,
            m = metadata
        );
        let tail = format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY);
        let parts = stream::once(async move { Ok::<_, io::Error>(Bytes::from(head)) })
            .chain(ReaderStream::new(source))
            .chain(stream::once(async move { Ok(Bytes::from(tail)) }))
            .map(|chunk| chunk.map(Frame::data));
        let body = StreamBody::new(parts).boxed_unsync();

        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id",
            self.base_url
        );
        let request = self
            .request_builder(Method::POST, &url)?
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(body)?;
        let response = self.send(request).await?;

        let body = response.into_body().collect().await?.to_bytes();
        Ok(serde_json::from_slice(&body)?)
    }

    /// Delete the file `file_id`.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), Error> {
        let url = self.files_url(Some(file_id));
        let request = self.request_builder(Method::DELETE, &url)?.body(empty_body())?;
        self.send(request).await?;
        Ok(())
    }
}
