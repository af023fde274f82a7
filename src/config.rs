use clap::Parser;
use std::env;

use crate::error::{GenError, Result};
use crate::prompt::DEFAULT_QUESTION;

pub const DEFAULT_API: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ORGANIZATION_VAR: &str = "OPENAI_ORGANIZATION";

#[derive(Debug, Parser)]
#[clap(
    name = "risorgen",
    version = "0.1.0",
    about = "Asks a chat-completion API to answer a question with Risor code, then prints the prompt, token usage and reply."
)]
pub struct Config {
    #[clap(
        long("api"),
        value_name = "URL",
        help = "The API endpoint base URL to use.",
        default_value = DEFAULT_API
    )]
    pub api: String,

    #[clap(
        long("key"),
        value_name = "API_KEY",
        help = "Sets the API key for remote endpoint; if absent, the envvar 'OPENAI_API_KEY' is checked"
    )]
    pub api_key: Option<String>,

    #[clap(
        long("org"),
        value_name = "ORG_ID",
        help = "Sets the organization id sent with the request; if absent, the envvar 'OPENAI_ORGANIZATION' is checked"
    )]
    pub organization: Option<String>,

    #[clap(
        long,
        value_name = "MODEL_ID",
        help = "Sets the model to use for generating completions with the API",
        default_value = DEFAULT_MODEL
    )]
    pub model_id: String,

    #[clap(
        long,
        value_name = "TEXT",
        help = "The question to ask about the scripting language",
        default_value = DEFAULT_QUESTION
    )]
    pub question: String,

    #[clap(
        short('n'),
        long,
        value_name = "INT",
        help = "Sets the maximum number of tokens to generate in the completion",
        default_value_t = DEFAULT_MAX_TOKENS
    )]
    pub max_tokens: u32,

    #[clap(
        long,
        value_name = "F32",
        help = "Sets the temperature for sampling",
        default_value_t = 0.0
    )]
    pub temp: f32,

    #[clap(
        long,
        value_name = "SECS",
        help = "Gives up on the request after this many seconds; waits indefinitely if absent"
    )]
    pub timeout: Option<u64>,

    #[clap(
        long,
        help = "Print the assembled prompt and exit without calling the API",
        default_value_t = false
    )]
    pub dry_run: bool,
}

/// Everything about a run except the credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api: String,
    pub model_id: String,
    pub question: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: Option<u64>,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: DEFAULT_API.to_string(),
            model_id: DEFAULT_MODEL.to_string(),
            question: DEFAULT_QUESTION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            timeout_secs: None,
            dry_run: false,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub api_key: String,
    pub organization: Option<String>,
}

// Keeps the key out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .finish()
    }
}

impl Credentials {
    /// Merges command-line values with lookups from `lookup`; flags win.
    ///
    /// Empty values count as absent. A missing key is an error, a missing
    /// organization is not.
    pub fn resolve<F>(api_key: Option<&str>, organization: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |flag: Option<&str>, var: &str| {
            flag.map(str::to_string)
                .or_else(|| lookup(var))
                .filter(|v| !v.trim().is_empty())
        };

        let api_key = pick(api_key, API_KEY_VAR).ok_or_else(|| {
            GenError::Config(format!(
                "API key must be provided via --key or {} environment variable",
                API_KEY_VAR
            ))
        })?;

        Ok(Credentials {
            api_key,
            organization: pick(organization, ORGANIZATION_VAR),
        })
    }

    pub fn from_env(api_key: Option<&str>, organization: Option<&str>) -> Result<Self> {
        Self::resolve(api_key, organization, |var| env::var(var).ok())
    }
}

impl Config {
    pub fn from_cli() -> Self {
        Config::parse()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            api: self.api.clone(),
            model_id: self.model_id.clone(),
            question: self.question.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temp,
            timeout_secs: self.timeout,
            dry_run: self.dry_run,
        }
    }

    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::from_env(self.api_key.as_deref(), self.organization.as_deref())
    }
}
