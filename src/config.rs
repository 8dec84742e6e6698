use serde::Deserialize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Credential file consulted when `--credentials` is not given.
pub const DEFAULT_CREDENTIALS_PATH: &str = "config/github.toml";

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub caps `per_page` at 100.
pub const MAX_PER_PAGE: u8 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No GitHub token supplied")]
    EmptyToken,
}

/// Settings loaded from the credential file.
///
/// All fields are optional: a missing file, or a file without a token,
/// falls back to `GITHUB_TOKEN` and then to an interactive prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub login, only used for logging who the run is authenticated as
    pub login: Option<String>,
    /// Personal access / OAuth token
    pub oauth_token: Option<String>,
    /// Base URL of the REST API (GitHub Enterprise or a test server)
    pub api_url: Option<String>,
    /// Page size for listing calls
    pub per_page: Option<u8>,
}

/// A resolved login/token pair, held for every API call of the run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: Option<String>,
    pub oauth_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("oauth_token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load the credential file at `path`, or the default location.
    ///
    /// A missing default file yields the default config; a missing file the
    /// caller named is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = path {
            debug!(path = %path.display(), "reading credential file");
            return Self::load_from(path);
        }
        let path = Path::new(DEFAULT_CREDENTIALS_PATH);
        if path.exists() {
            debug!(path = %path.display(), "reading credential file");
            Self::load_from(path)
        } else {
            debug!(path = %path.display(), "credential file not found");
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
    }

    pub fn per_page(&self) -> u8 {
        self.per_page
            .filter(|&n| n > 0)
            .map_or(MAX_PER_PAGE, |n| n.min(MAX_PER_PAGE))
    }

    /// Credentials from the file, falling back to `GITHUB_TOKEN`.
    pub fn credentials(&self) -> Option<Credentials> {
        self.oauth_token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
            .map(|oauth_token| Credentials {
                login: self.login.clone(),
                oauth_token,
            })
    }

    /// Resolve credentials once for the run, prompting on the terminal when
    /// neither the file nor the environment supplies a token.
    pub fn resolve_credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(credentials) = self.credentials() {
            return Ok(credentials);
        }
        info!("no stored credentials, prompting");
        prompt_credentials()
    }
}

fn prompt_credentials() -> Result<Credentials, ConfigError> {
    let stdin = io::stdin();
    let login = read_login(&mut stdin.lock(), &mut io::stderr())?;
    let oauth_token = rpassword::prompt_password("GitHub Token     ")?;
    credentials_from_input(login, oauth_token)
}

fn read_login(input: &mut impl BufRead, prompt: &mut impl Write) -> io::Result<String> {
    write!(prompt, "GitHub Username  ")?;
    prompt.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn credentials_from_input(login: String, oauth_token: String) -> Result<Credentials, ConfigError> {
    let oauth_token = oauth_token.trim().to_string();
    if oauth_token.is_empty() {
        return Err(ConfigError::EmptyToken);
    }
    Ok(Credentials {
        login: Some(login).filter(|l| !l.is_empty()),
        oauth_token,
    })
}
