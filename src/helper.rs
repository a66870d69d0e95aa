//! Helper functions allowing you to avoid writing boilerplate code for common operations, such as
//! parsing the client registration file.
use crate::types::{ApplicationSecret, ConsoleApplicationSecret};

use std::io;
use std::path::Path;

/// Read an application secret from a file.
pub async fn read_application_secret<P: AsRef<Path>>(path: P) -> io::Result<ApplicationSecret> {
    parse_application_secret(tokio::fs::read(path).await?)
}

/// Read an application secret from a JSON string.
///
/// Secrets of type `installed` are preferred over `web` secrets when the file carries both.
pub fn parse_application_secret<S: AsRef<[u8]>>(secret: S) -> io::Result<ApplicationSecret> {
    let decoded: ConsoleApplicationSecret =
        serde_json::from_slice(secret.as_ref()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Bad application secret: {}", e),
            )
        })?;

    if let Some(installed) = decoded.installed {
        Ok(installed)
    } else if let Some(web) = decoded.web {
        Ok(web)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Unknown application secret format",
        ))
    }
}

pub(crate) fn join<T>(pieces: &[T], separator: &str) -> String
where
    T: AsRef<str>,
{
    let mut iter = pieces.iter();
    let first = match iter.next() {
        Some(p) => p,
        None => return String::new(),
    };
    let num_separators = pieces.len() - 1;
    let pieces_size: usize = pieces.iter().map(|p| p.as_ref().len()).sum();
    let size = pieces_size + separator.len() * num_separators;
    let mut result = String::with_capacity(size);
    result.push_str(first.as_ref());
    for p in iter {
        result.push_str(separator);
        result.push_str(p.as_ref());
    }
    debug_assert_eq!(size, result.len());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::SECRET;

    #[test]
    fn test_parse_installed_secret() {
        let secret = parse_application_secret(SECRET).unwrap();
        assert_eq!(
            secret.client_id,
            "14070749909-vgip2f1okm7bkvajhi9jugan6126io9v.apps.googleusercontent.com"
        );
        assert_eq!(secret.redirect_uris.len(), 2);
    }

    #[test]
    fn test_parse_web_secret() {
        let secret = parse_application_secret(
            r#"{"web":{"client_id":"web-id","client_secret":"s","token_uri":"t","auth_uri":"a"}}"#,
        )
        .unwrap();
        assert_eq!(secret.client_id, "web-id");
        assert!(secret.redirect_uris.is_empty());
    }

    #[test]
    fn test_parse_unknown_secret() {
        let err = parse_application_secret(r#"{"service":{}}"#).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = parse_application_secret("not json").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_read_missing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_application_secret(dir.path().join("client_secret.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&["a", "b", "c"], " "), "a b c");
        assert_eq!(join::<&str>(&[], " "), "");
        assert_eq!(
            join(&["https://www.googleapis.com/auth/drive"], " "),
            "https://www.googleapis.com/auth/drive"
        );
    }
}
