//! Deployment configuration for the contract toolchain
//!
//! This module builds the typed, validated configuration handed to the
//! external build/deploy tool: the compiler version and the set of named
//! networks, each with an RPC endpoint and its signing accounts.
//!
//! Every value is resolved from an [`EnvSource`] and checked before a
//! [`Config`] exists, so a missing key or a malformed URL is reported at
//! startup rather than at the first signed transaction.
//!
//! # Examples
//!
//! ```rust,no_run
//! use deploy_tools::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_process_env(None)?;
//! println!("Compiler: {}", config.compiler_version());
//! for (name, network) in config.networks() {
//!     println!("{name}: {}", network.url());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::env::{EnvFile, EnvSource, Layered, ProcessEnv, DEFAULT_ENV_FILE};

/// Solidity compiler version used for every build
pub const COMPILER_VERSION: &str = "0.8.26";

/// Name of the Base Sepolia testnet entry
pub const BASE_SEPOLIA: &str = "baseSepolia";

/// RPC endpoint for Base Sepolia
pub const BASE_SEPOLIA_URL_VAR: &str = "QUICK_NODE_BASE_SEPOLIA_URL";

/// Deployer private key
pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    Missing { var: String },

    #[error("Invalid {setting}: {reason}")]
    Invalid { setting: String, reason: String },

    #[error("Env file error: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn missing(var: &str) -> Self {
        ConfigError::Missing {
            var: var.to_string(),
        }
    }

    pub(crate) fn invalid(setting: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            setting: setting.to_string(),
            reason: reason.into(),
        }
    }
}

/// Where a network's settings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSource {
    /// Key in [`Config::networks`]
    pub name: &'static str,
    /// Variable holding the RPC endpoint
    pub url_var: &'static str,
    /// Variable holding the signing key
    pub account_var: &'static str,
}

/// Networks the deploy tool can target
pub const NETWORK_SOURCES: &[NetworkSource] = &[NetworkSource {
    name: BASE_SEPOLIA,
    url_var: BASE_SEPOLIA_URL_VAR,
    account_var: PRIVATE_KEY_VAR,
}];

/// A signing credential
///
/// Held in a [`SecretString`] so it never shows up in `Debug` output or
/// logs. Use [`Credential::expose`] when the raw key has to leave the
/// process.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Credential(SecretString::from(value.into()))
    }

    /// The raw credential
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Short form safe to print, e.g. `0xde…beef`
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.expose().chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(8);
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// RPC endpoint and signing accounts for one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
    url: String,
    accounts: Vec<Credential>,
}

impl NetworkEndpoint {
    /// Build an endpoint, checking the URL and accounts
    ///
    /// `setting` names the source of the URL in error messages.
    pub fn new(
        setting: &str,
        url: impl Into<String>,
        accounts: Vec<Credential>,
    ) -> Result<Self, ConfigError> {
        let url = url.into();
        validate_url(setting, &url)?;

        if accounts.is_empty() {
            return Err(ConfigError::invalid(setting, "network has no accounts"));
        }
        if accounts.iter().any(|a| a.expose().trim().is_empty()) {
            return Err(ConfigError::invalid(setting, "account credential is empty"));
        }

        Ok(Self { url, accounts })
    }

    /// RPC endpoint, exactly as configured
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn accounts(&self) -> &[Credential] {
        &self.accounts
    }
}

/// Resolved deployment configuration
///
/// Built once per process by [`Config::load`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    compiler_version: String,
    networks: BTreeMap<String, NetworkEndpoint>,
}

impl Config {
    /// Load configuration from an environment source
    ///
    /// For every entry in [`NETWORK_SOURCES`] the signing key is read first,
    /// then the endpoint URL. Empty or whitespace-only values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - a required variable is unset ([`ConfigError::Missing`])
    /// - a value is not unicode or has surrounding whitespace
    ///   ([`ConfigError::Invalid`])
    /// - a URL is malformed or not http(s) ([`ConfigError::Invalid`])
    pub fn load<E: EnvSource + ?Sized>(env: &E) -> Result<Self, ConfigError> {
        validate_compiler_version(COMPILER_VERSION)?;

        let mut networks = BTreeMap::new();
        for source in NETWORK_SOURCES {
            let account = required(env, source.account_var)?;
            let url = required(env, source.url_var)?;

            let endpoint =
                NetworkEndpoint::new(source.url_var, url, vec![Credential::new(account)])?;

            tracing::debug!(network = source.name, url = endpoint.url(), "resolved network");
            networks.insert(source.name.to_string(), endpoint);
        }

        let names: Vec<&str> = networks.keys().map(String::as_str).collect();
        tracing::info!(compiler = COMPILER_VERSION, networks = ?names, "configuration loaded");

        Ok(Config {
            compiler_version: COMPILER_VERSION.to_string(),
            networks,
        })
    }

    /// Load configuration from the process environment and a `.env` file
    ///
    /// `env_file` defaults to `./.env`. A missing file is skipped. Variables
    /// already set in the process take precedence over the file.
    pub fn from_process_env(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = env_file.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
        let file = EnvFile::read(path)?;
        Self::load(&Layered::new(ProcessEnv, file))
    }

    pub fn compiler_version(&self) -> &str {
        &self.compiler_version
    }

    pub fn networks(&self) -> &BTreeMap<String, NetworkEndpoint> {
        &self.networks
    }

    /// Look up a network by name
    pub fn network(&self, name: &str) -> Option<&NetworkEndpoint> {
        self.networks.get(name)
    }

    /// Print the resolved configuration with credentials masked
    pub fn print_summary(&self) {
        print!("{}", self.summary());
    }

    /// Summary printed by [`Config::print_summary`]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("╔════════════════════════════════════════════════════════════════╗\n");
        out.push_str("║            DEPLOYMENT CONFIGURATION RESOLVED                   ║\n");
        out.push_str("╚════════════════════════════════════════════════════════════════╝\n");
        out.push_str(&format!("  Compiler:            solc {}\n", self.compiler_version));

        for (name, network) in &self.networks {
            out.push_str(&format!("  Network:             {}\n", name));
            out.push_str(&format!("    RPC URL:           {}\n", network.url));
            for account in &network.accounts {
                out.push_str(&format!("    Account:           {}\n", account.masked()));
            }
        }

        out.push_str("──────────────────────────────────────────────────────────────────\n");
        out
    }

    /// Render the configuration as JSON
    ///
    /// Credentials are masked unless `reveal` is set.
    pub fn to_json(&self, reveal: bool) -> Result<String, ConfigError> {
        let doc = ConfigDoc {
            compiler_version: &self.compiler_version,
            networks: self
                .networks
                .iter()
                .map(|(name, network)| {
                    let accounts = network
                        .accounts
                        .iter()
                        .map(|a| {
                            if reveal {
                                a.expose().to_string()
                            } else {
                                a.masked()
                            }
                        })
                        .collect();
                    (
                        name.as_str(),
                        NetworkDoc {
                            url: &network.url,
                            accounts,
                        },
                    )
                })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

/// Shape consumed by the external deploy tool
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDoc<'a> {
    compiler_version: &'a str,
    networks: BTreeMap<&'a str, NetworkDoc<'a>>,
}

#[derive(Serialize)]
struct NetworkDoc<'a> {
    url: &'a str,
    accounts: Vec<String>,
}

fn required<E: EnvSource + ?Sized>(env: &E, var: &str) -> Result<String, ConfigError> {
    let value = match env.var(var)? {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(ConfigError::missing(var)),
    };

    if value.trim() != value {
        return Err(ConfigError::invalid(
            var,
            "value has leading or trailing whitespace",
        ));
    }

    Ok(value)
}

fn validate_url(setting: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid(setting, e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::invalid(
            setting,
            format!("RPC URL must start with http:// or https://: {}", value),
        ));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::invalid(setting, "RPC URL has no host"));
    }

    Ok(())
}

fn validate_compiler_version(version: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if !well_formed {
        return Err(ConfigError::invalid(
            "compiler version",
            format!("expected major.minor.patch, got {:?}", version),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const URL: &str = "https://rpc.example/abc";
    const KEY: &str = "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[(BASE_SEPOLIA_URL_VAR, URL), (PRIVATE_KEY_VAR, KEY)])
    }

    #[test]
    fn test_load_base_sepolia() {
        let config = Config::load(&full_env()).unwrap();

        assert_eq!(config.compiler_version(), "0.8.26");
        assert_eq!(config.networks().len(), 1);

        let network = config.network(BASE_SEPOLIA).unwrap();
        assert_eq!(network.url(), URL);
        assert_eq!(network.accounts(), &[Credential::new(KEY)]);
        assert_eq!(network.accounts()[0].expose(), KEY);
    }

    #[test]
    fn test_load_missing_private_key() {
        let err = Config::load(&env(&[(BASE_SEPOLIA_URL_VAR, URL)])).unwrap_err();
        match err {
            ConfigError::Missing { var } => assert_eq!(var, "PRIVATE_KEY"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_url() {
        let err = Config::load(&env(&[(PRIVATE_KEY_VAR, KEY)])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref var } if var == BASE_SEPOLIA_URL_VAR));
        assert!(err.to_string().contains(BASE_SEPOLIA_URL_VAR));
    }

    #[test]
    fn test_load_empty_env_reports_private_key_first() {
        let err = Config::load(&env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref var } if var == PRIVATE_KEY_VAR));
    }

    #[test]
    fn test_load_blank_value_counts_as_missing() {
        let err = Config::load(&env(&[(BASE_SEPOLIA_URL_VAR, URL), (PRIVATE_KEY_VAR, "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref var } if var == PRIVATE_KEY_VAR));
    }

    #[test]
    fn test_load_invalid_url() {
        for bad in ["not a url", "ftp://rpc.example", "wss://rpc.example"] {
            let err = Config::load(&env(&[(BASE_SEPOLIA_URL_VAR, bad), (PRIVATE_KEY_VAR, KEY)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { ref setting, .. } if setting == BASE_SEPOLIA_URL_VAR),
                "{bad} should be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_compiler_version_ignores_env() {
        let mut vars = full_env();
        vars.insert("COMPILER_VERSION".to_string(), "0.4.0".to_string());
        let config = Config::load(&vars).unwrap();
        assert_eq!(config.compiler_version(), COMPILER_VERSION);
    }

    #[test]
    fn test_load_is_idempotent() {
        let vars = full_env();
        assert_eq!(Config::load(&vars).unwrap(), Config::load(&vars).unwrap());
    }

    #[test]
    fn test_to_json_shape() {
        let config = Config::load(&env(&[
            (BASE_SEPOLIA_URL_VAR, URL),
            (PRIVATE_KEY_VAR, "0xdead...beef"),
        ]))
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&config.to_json(true).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "compilerVersion": "0.8.26",
                "networks": {
                    "baseSepolia": {
                        "url": "https://rpc.example/abc",
                        "accounts": ["0xdead...beef"]
                    }
                }
            })
        );
    }

    #[test]
    fn test_to_json_masks_by_default() {
        let config = Config::load(&full_env()).unwrap();
        let json = config.to_json(false).unwrap();
        assert!(!json.contains(KEY));
        assert!(json.contains("0xde…beef"));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new(KEY);
        let debug = format!("{:?}", credential);
        assert!(!debug.contains(KEY));

        let config = Config::load(&full_env()).unwrap();
        assert!(!format!("{:?}", config).contains(KEY));
    }

    #[test]
    fn test_credential_masked_short_value() {
        assert_eq!(Credential::new("0xabc").masked(), "********");
    }

    #[test]
    fn test_validate_compiler_version() {
        assert!(validate_compiler_version("0.8.26").is_ok());
        assert!(validate_compiler_version("").is_err());
        assert!(validate_compiler_version("0.8").is_err());
        assert!(validate_compiler_version("0.8.x").is_err());
    }

    #[test]
    fn test_endpoint_requires_accounts() {
        let result = NetworkEndpoint::new(BASE_SEPOLIA_URL_VAR, URL, Vec::new());
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Config>();
    }

    #[test]
    fn test_from_process_env_prefers_process_over_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}=https://file.example/rpc", BASE_SEPOLIA_URL_VAR).unwrap();
        writeln!(file, "{}=0xfromfile", PRIVATE_KEY_VAR).unwrap();
        drop(file);

        temp_env::with_vars(
            [
                (BASE_SEPOLIA_URL_VAR, Some(URL)),
                (PRIVATE_KEY_VAR, None::<&str>),
            ],
            || {
                let config = Config::from_process_env(Some(path.as_path())).unwrap();
                let network = config.network(BASE_SEPOLIA).unwrap();
                assert_eq!(network.url(), URL);
                assert_eq!(network.accounts()[0].expose(), "0xfromfile");
            },
        );
    }

    #[test]
    fn test_from_process_env_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.env");

        temp_env::with_vars(
            [
                (BASE_SEPOLIA_URL_VAR, Some(URL)),
                (PRIVATE_KEY_VAR, None::<&str>),
            ],
            || {
                let err = Config::from_process_env(Some(path.as_path())).unwrap_err();
                assert!(matches!(err, ConfigError::Missing { ref var } if var == PRIVATE_KEY_VAR));
            },
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_from_process_env_non_unicode_key_is_invalid() {
        use std::ffi::OsString;
        use std::io::Write;
        use std::os::unix::ffi::OsStringExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}=0xfromfile", PRIVATE_KEY_VAR).unwrap();
        drop(file);

        temp_env::with_vars(
            [
                (BASE_SEPOLIA_URL_VAR, Some(OsString::from(URL))),
                (PRIVATE_KEY_VAR, Some(OsString::from_vec(vec![0x30, 0x78, 0xff, 0xfe]))),
            ],
            || {
                let err = Config::from_process_env(Some(path.as_path())).unwrap_err();
                assert!(
                    matches!(err, ConfigError::Invalid { ref setting, .. } if setting == PRIVATE_KEY_VAR),
                    "got {err}"
                );
            },
        );
    }

    #[test]
    fn test_load_rejects_padded_values() {
        let err = Config::load(&env(&[
            (BASE_SEPOLIA_URL_VAR, " https://rpc.example/abc \n"),
            (PRIVATE_KEY_VAR, KEY),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref setting, .. } if setting == BASE_SEPOLIA_URL_VAR));

        let padded_key = format!("{KEY}\n");
        let err = Config::load(&env(&[
            (BASE_SEPOLIA_URL_VAR, URL),
            (PRIVATE_KEY_VAR, padded_key.as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref setting, .. } if setting == PRIVATE_KEY_VAR));
    }

    #[test]
    fn test_summary_masks_credentials() {
        let config = Config::load(&full_env()).unwrap();
        let summary = config.summary();

        assert!(summary.contains("solc 0.8.26"));
        assert!(summary.contains(URL));
        assert!(summary.contains("0xde…beef"));
        assert!(!summary.contains(KEY));

        let lines: Vec<&str> = summary.lines().collect();
        assert!(lines[0].starts_with('╔'));
        assert!(lines[2].starts_with('╚'));
        assert_eq!(lines.iter().filter(|l| l.starts_with('╚')).count(), 1);
        assert!(lines.last().unwrap().starts_with('─'));
    }
}
