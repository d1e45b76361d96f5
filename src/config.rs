//! Environment-driven configuration, loaded once at startup.
//!
//! Every key is read eagerly so a missing or unparseable value fails the
//! process before any browser or API work begins.

use std::time::Duration;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub content: ContentConfig,
    pub spreadsheet: SpreadsheetConfig,
    pub login_email: String,
    /// Consumed by the external portal driver, not read here
    #[allow(dead_code)]
    pub login_password: String,
    /// Pacing between processed product rows
    pub step_interval: Duration,
}

/// Credentials for the identity endpoint exchange
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub api_key: String,
    pub params: GenerationParams,
}

/// Generation parameters passed through to the generative API unchanged
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub n: u32,
    pub store: bool,
}

#[derive(Debug, Clone)]
pub struct SpreadsheetConfig {
    pub dir: String,
    pub file: String,
    pub sheet: String,
    /// Expected header row, in column order
    pub expected_headers: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthConfig {
            grant_type: require(&lookup, "GRANT_TYPE")?,
            client_id: require(&lookup, "CLIENT_ID")?,
            client_secret: require(&lookup, "CLIENT_SECRET")?,
            refresh_token: require(&lookup, "REFRESH_TOKEN")?,
        };

        let params = GenerationParams {
            model: require(&lookup, "MODEL")?,
            temperature: parse_f32(&lookup, "TEMPERATURE")?,
            max_completion_tokens: parse_u32(&lookup, "MAX_COMPLETION_TOKENS")?,
            top_p: parse_f32(&lookup, "TOP_P")?,
            frequency_penalty: parse_f32(&lookup, "FREQUENCY_PENALTY")?,
            presence_penalty: parse_f32(&lookup, "PRESENCE_PENALTY")?,
            n: parse_u32(&lookup, "SAMPLE_COUNT")?,
            store: require(&lookup, "STORE")? == "true",
        };

        let content = ContentConfig {
            api_key: require(&lookup, "OPENAI_API_KEY")?,
            params,
        };

        let spreadsheet = SpreadsheetConfig {
            dir: require(&lookup, "SPREADSHEET_DIR")?,
            file: require(&lookup, "SPREADSHEET_FILE")?,
            sheet: require(&lookup, "SPREADSHEET_SHEET")?,
            expected_headers: require(&lookup, "SPREADSHEET_HEADERS")?
                .split(';')
                .map(|h| h.trim().to_string())
                .collect(),
        };

        Ok(Self {
            auth,
            content,
            spreadsheet,
            login_email: require(&lookup, "LOGIN_EMAIL")?,
            login_password: require(&lookup, "LOGIN_PASSWORD")?,
            step_interval: Duration::from_millis(parse_u64(&lookup, "STEP_INTERVAL_MS")?),
        })
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String, Error>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{key} is not set")))
}

fn parse_f32<F>(lookup: &F, key: &str) -> Result<f32, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = require(lookup, key)?;
    raw.parse()
        .map_err(|_| Error::Config(format!("{key} is not a number: {raw}")))
}

fn parse_u32<F>(lookup: &F, key: &str) -> Result<u32, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = require(lookup, key)?;
    raw.parse()
        .map_err(|_| Error::Config(format!("{key} is not an integer: {raw}")))
}

fn parse_u64<F>(lookup: &F, key: &str) -> Result<u64, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = require(lookup, key)?;
    raw.parse()
        .map_err(|_| Error::Config(format!("{key} is not an integer: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("GRANT_TYPE", "refresh_token"),
            ("CLIENT_ID", "client-123"),
            ("CLIENT_SECRET", "secret-456"),
            ("REFRESH_TOKEN", "refresh-789"),
            ("MODEL", "gpt-4o-mini"),
            ("TEMPERATURE", "0.7"),
            ("MAX_COMPLETION_TOKENS", "800"),
            ("TOP_P", "1.0"),
            ("FREQUENCY_PENALTY", "0.0"),
            ("PRESENCE_PENALTY", "0.0"),
            ("SAMPLE_COUNT", "1"),
            ("STORE", "true"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SPREADSHEET_DIR", "./sheets"),
            ("SPREADSHEET_FILE", "products.xlsx"),
            ("SPREADSHEET_SHEET", "Sheet1"),
            ("SPREADSHEET_HEADERS", "Name; Image; Quantity; Price"),
            ("LOGIN_EMAIL", "seller@example.com"),
            ("LOGIN_PASSWORD", "hunter2"),
            ("STEP_INTERVAL_MS", "5000"),
        ])
    }

    fn lookup_in<'a>(env: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn test_full_environment_parses() {
        let env = full_env();
        let config = Config::from_lookup(lookup_in(&env)).unwrap();

        assert_eq!(config.auth.grant_type, "refresh_token");
        assert_eq!(config.content.params.max_completion_tokens, 800);
        assert!(config.content.params.store);
        assert_eq!(config.step_interval, Duration::from_millis(5000));
        assert_eq!(
            config.spreadsheet.expected_headers,
            vec!["Name", "Image", "Quantity", "Price"]
        );
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let mut env = full_env();
        env.remove("CLIENT_ID");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(err.to_string().contains("CLIENT_ID"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("OPENAI_API_KEY", "   ");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_unparseable_number_is_fatal() {
        let mut env = full_env();
        env.insert("TEMPERATURE", "warm");
        let err = Config::from_lookup(lookup_in(&env)).unwrap_err();
        assert!(err.to_string().contains("TEMPERATURE"));
    }

    #[test]
    fn test_store_flag_only_true_enables() {
        let mut env = full_env();
        env.insert("STORE", "yes");
        let config = Config::from_lookup(lookup_in(&env)).unwrap();
        assert!(!config.content.params.store);
    }
}
