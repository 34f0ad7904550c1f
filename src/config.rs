//! Configuration management for RAX Upload Server
//!
//! Values are layered, lowest precedence first: built-in defaults, an optional
//! `config.toml`, `RAX_UPLOAD_*` environment variables, then command-line flags.
//! Everything is loaded once at startup and is immutable afterwards.

use clap::Parser;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::storage::{HiddenFilter, StoragePolicy};

const DEFAULT_CONFIG_NAME: &str = "config";
const ENV_PREFIX: &str = "RAX_UPLOAD";
const ENV_LIST_SEPARATOR: &str = ",";

/// Command-line flags
#[derive(Debug, Default, Parser)]
#[command(name = "rax-upload-server", about = "File upload & directory browser server")]
pub struct Cli {
    /// Port to listen on (default: 5000)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (default: 0.0.0.0)
    #[arg(short, long = "bind")]
    pub bind: Option<String>,

    /// Root directory to serve (default: current directory)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: ./config.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the HTTP listener
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// Directory tree exposed by the server
    pub server_root: String,

    /// Maximum upload size in MB
    pub max_upload_size_mb: u64,

    /// Buffer size for file transfers
    pub buffer_size: usize,

    /// Maximum length in bytes of a stored file name
    pub max_filename_length: usize,

    /// Entry names starting with any of these are hidden
    pub hidden_prefixes: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from defaults, file, environment and `cli`
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load_with_env(cli, None)
    }

    /// Same as [`ServerConfig::load`], reading variables from `env` instead of
    /// the process environment when given
    pub fn load_with_env(cli: &Cli, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(ENV_LIST_SEPARATOR)
            .with_list_parse_key("hidden_prefixes")
            .source(env);

        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = Config::builder()
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 5000_i64)?
            .set_default("server_root", ".")?
            .set_default("max_upload_size_mb", 1024_i64)?
            .set_default("buffer_size", 64 * 1024_i64)?
            .set_default("max_filename_length", 255_i64)?
            .set_default("hidden_prefixes", vec!["."])?
            .add_source(file)
            .add_source(environment)
            .set_override_option("port", cli.port.map(i64::from))?
            .set_override_option("bind_address", cli.bind.clone())?
            .set_override_option(
                "server_root",
                cli.directory
                    .as_ref()
                    .map(|d| d.to_string_lossy().into_owned()),
            )?
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address cannot be empty".into()));
        }

        if self.server_root.is_empty() {
            return Err(ConfigError::Invalid("server_root cannot be empty".into()));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.max_filename_length == 0 {
            return Err(ConfigError::Invalid(
                "max_filename_length must be greater than 0".into(),
            ));
        }

        if self.hidden_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Invalid(
                "hidden_prefixes cannot contain an empty prefix".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    /// Storage rules derived from this configuration
    pub fn storage_policy(&self) -> StoragePolicy {
        StoragePolicy {
            hidden: HiddenFilter::new(self.hidden_prefixes.iter().cloned()),
            max_upload_bytes: self.max_upload_bytes(),
            max_filename_length: self.max_filename_length,
            buffer_size: self.buffer_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cli_with_file(dir: &TempDir, contents: &str) -> Cli {
        let path = dir.path().join("server.toml");
        fs::write(&path, contents).unwrap();
        Cli {
            config: Some(path),
            ..Cli::default()
        }
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&cli_with_file(&dir, "")).unwrap();

        assert_eq!(config.listen_socket(), "0.0.0.0:5000");
        assert_eq!(config.server_root, ".");
        assert_eq!(config.max_upload_bytes(), 1024 * 1024 * 1024);
        assert_eq!(config.hidden_prefixes, vec!["."]);
    }

    #[test]
    fn test_file_values_and_cli_overrides() {
        let dir = TempDir::new().unwrap();
        let mut cli = cli_with_file(
            &dir,
            "port = 8080\nserver_root = \"/srv/files\"\nmax_upload_size_mb = 5\n",
        );
        cli.port = Some(9090);
        cli.bind = Some("127.0.0.1".into());

        let config = ServerConfig::load(&cli).unwrap();

        assert_eq!(config.listen_socket(), "127.0.0.1:9090");
        assert_eq!(config.server_root, "/srv/files");
        assert_eq!(config.storage_policy().max_upload_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_cli_directory_override() {
        let dir = TempDir::new().unwrap();
        let mut cli = cli_with_file(&dir, "server_root = \"/from/file\"\n");
        cli.directory = Some(PathBuf::from("/from/cli"));

        let config = ServerConfig::load(&cli).unwrap();
        assert_eq!(config.server_root_path(), PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        for contents in [
            "port = 0\n",
            "max_upload_size_mb = 0\n",
            "server_root = \"\"\n",
            "hidden_prefixes = [\"\"]\n",
        ] {
            assert!(
                matches!(
                    ServerConfig::load(&cli_with_file(&dir, contents)),
                    Err(ConfigError::Invalid(_))
                ),
                "{}",
                contents
            );
        }
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let cli = cli_with_file(&dir, "port = 8080\nhidden_prefixes = [\".\"]\n");
        let env = Map::from([
            ("RAX_UPLOAD_PORT".to_string(), "7000".to_string()),
            ("RAX_UPLOAD_HIDDEN_PREFIXES".to_string(), ".,~".to_string()),
            ("RAX_UPLOAD_MAX_UPLOAD_SIZE_MB".to_string(), "2".to_string()),
        ]);

        let config = ServerConfig::load_with_env(&cli, Some(env)).unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.hidden_prefixes, vec![".", "~"]);
        assert_eq!(config.max_upload_size_mb, 2);
        assert!(config.storage_policy().hidden.is_hidden("~backup"));
    }

    #[test]
    fn test_single_hidden_prefix_from_environment() {
        let dir = TempDir::new().unwrap();
        let env = Map::from([("RAX_UPLOAD_HIDDEN_PREFIXES".to_string(), "_".to_string())]);

        let config = ServerConfig::load_with_env(&cli_with_file(&dir, ""), Some(env)).unwrap();
        assert_eq!(config.hidden_prefixes, vec!["_"]);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Cli::default()
        };
        assert!(matches!(ServerConfig::load(&cli), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["rax-upload-server", "-p", "8000", "-b", "::1", "-d", "/tmp"]);
        assert_eq!(cli.port, Some(8000));
        assert_eq!(cli.bind.as_deref(), Some("::1"));
        assert_eq!(cli.directory, Some(PathBuf::from("/tmp")));
    }
}
