use getopts::{Fail, Matches, Options};
use yup_drive::authenticator::DEFAULT_TOKEN_PATH;
use hyper_util::client::legacy::connect::Connect;
use yup_drive::{read_application_secret, AuthConfig, DriveHub, Error, InstalledFlowAuthenticator};

use std::env;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SECRET_PATH: &str = "client_secret.json";

fn usage(program: &str, opts: &Options, err: Option<Fail>) {
    if let Some(err) = err {
        println!("{}", err);
    }
    println!("{}", opts.short_usage(program) + " [COMMAND [ARGS]]");
    println!(
        "{}",
        opts.usage(
            "Authorize against Google Drive and work with its files.\n\n\
             Commands:\n    \
             list                  list up to 10 files (default)\n    \
             download ID DEST      save the content of file ID to DEST\n    \
             upload SRC            upload SRC as a new file\n    \
             delete ID             delete file ID"
        )
    );
}

enum Command {
    List,
    Download { id: String, dest: String },
    Upload { src: String },
    Delete { id: String },
}

fn parse_command(free: &[String]) -> Result<Command, Fail> {
    let args: Vec<&str> = free.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] | ["list"] => Ok(Command::List),
        ["download", id, dest] => Ok(Command::Download {
            id: id.to_string(),
            dest: dest.to_string(),
        }),
        ["upload", src] => Ok(Command::Upload {
            src: src.to_string(),
        }),
        ["delete", id] => Ok(Command::Delete { id: id.to_string() }),
        [cmd, ..] => Err(Fail::UnrecognizedOption(format!(
            "unknown command or wrong arguments: {}",
            cmd
        ))),
    }
}

fn parse_timeout(m: &Matches) -> Result<Option<Duration>, Fail> {
    match m.opt_str("timeout") {
        None => Ok(None),
        Some(secs) => secs
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| Fail::UnrecognizedOption(format!("invalid timeout: {}", secs))),
    }
}

/// Confirmation lines printed once a token is available. `stored_to` is set when the token
/// was just obtained and written to the cache.
fn authorized_lines(stored_to: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(path) = stored_to {
        lines.push(format!("Token stored to {}", path.display()));
    }
    lines.push("You have been authorized".to_owned());
    lines
}

async fn run_command<C>(hub: &DriveHub<C>, command: Command) -> Result<String, Error>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    match command {
        Command::List => hub.list_files().await.map(|files| files.to_string()),
        Command::Download { id, dest } => hub
            .download_file(&id, &dest)
            .await
            .map(|_| "Done".to_owned()),
        Command::Upload { src } => hub
            .upload_file(&src)
            .await
            .map(|file| format!("File Id: {}", file.id)),
        Command::Delete { id } => hub.delete_file(&id).await.map(|_| "Done".to_owned()),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt(
        "s",
        "secret",
        &format!("client registration file (default {})", DEFAULT_SECRET_PATH),
        "SECRET_FILE",
    )
    .optopt(
        "t",
        "token",
        &format!("token cache file (default {})", DEFAULT_TOKEN_PATH),
        "TOKEN_FILE",
    )
    .optopt("", "timeout", "abort requests after SECS seconds", "SECS")
    .optflag("h", "help", "print this help");

    let m = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => return usage(&program, &opts, Some(e)),
    };
    if m.opt_present("h") {
        return usage(&program, &opts, None);
    }
    let (command, timeout) = match (parse_command(&m.free), parse_timeout(&m)) {
        (Ok(command), Ok(timeout)) => (command, timeout),
        (Err(e), _) | (_, Err(e)) => return usage(&program, &opts, Some(e)),
    };

    let secret_path = m
        .opt_str("s")
        .unwrap_or_else(|| DEFAULT_SECRET_PATH.to_owned());
    let config = AuthConfig::with_token_path(
        m.opt_str("t")
            .unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_owned()),
    );

    let secret = match read_application_secret(&secret_path).await {
        Ok(secret) => secret,
        Err(e) => return println!("{}", Error::ConfigError(e)),
    };
    let mut builder = InstalledFlowAuthenticator::builder(secret).config(config);
    if let Some(timeout) = timeout {
        builder = builder.with_timeout(timeout);
    }
    let auth = match builder.build().await {
        Ok(auth) => auth,
        Err(e) => return println!("Could not set up HTTP client: {}", e),
    };

    let had_cached_token = auth.cached_token().await.is_some();
    let token = match auth.token().await {
        Ok(token) => token,
        Err(e) => return println!("Error while trying to retrieve access token: {}", e),
    };
    let stored_to = (!had_cached_token).then(|| auth.config().token_path.as_path());
    for line in authorized_lines(stored_to) {
        println!("{}", line);
    }

    let hub = DriveHub::new(auth.http_client().clone(), token);
    match run_command(&hub, command).await {
        Ok(output) => println!("{}", output),
        Err(e) => println!("The API returned an error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::status_code, Expectation, Server};
    use hyper_util::client::legacy::connect::HttpConnector;
    use yup_drive::client::RequestBody;
    use yup_drive::{CustomHyperClientBuilder, HyperClientBuilder, TokenInfo};

    fn hub(server: &Server) -> DriveHub<HttpConnector> {
        let client = CustomHyperClientBuilder::from(
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build::<_, RequestBody>(HttpConnector::new()),
        )
        .build_hyper_client()
        .unwrap();
        let token = TokenInfo {
            access_token: "accesstoken".to_owned(),
            refresh_token: None,
            token_type: "Bearer".to_owned(),
            expires_at: None,
            id_token: None,
        };
        DriveHub::new(client, token).with_base_url(format!("http://{}", server.addr()))
    }

    #[test]
    fn test_parse_command() {
        let args = |a: &[&str]| a.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(matches!(parse_command(&[]), Ok(Command::List)));
        assert!(matches!(
            parse_command(&args(&["delete", "abc"])),
            Ok(Command::Delete { ref id }) if id == "abc"
        ));
        assert!(parse_command(&args(&["download", "abc"])).is_err());
        assert!(parse_command(&args(&["rename", "abc"])).is_err());
    }

    #[test]
    fn test_authorized_lines() {
        assert_eq!(
            authorized_lines(Some(Path::new(".credentials/drive-token.json"))),
            vec![
                "Token stored to .credentials/drive-token.json",
                "You have been authorized"
            ]
        );
        assert_eq!(authorized_lines(None), vec!["You have been authorized"]);
    }

    #[tokio::test]
    async fn test_delete_confirmation() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("DELETE", "/drive/v3/files/abc"))
                .respond_with(status_code(204)),
        );
        let output = run_command(&hub(&server), Command::Delete { id: "abc".to_owned() })
            .await
            .unwrap();
        assert_eq!(output, "Done");
    }
}
