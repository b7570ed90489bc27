//! Cli things
//!

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ExtractorKind, RendererKind};

pub fn db_path_default() -> String {
    shellexpand::tilde("~/.cache/dazzign.sqlite3").to_string()
}

#[derive(Parser, Debug)]
pub struct CliOpts {
    #[clap(long, help = "Path to the database file", env = "DAZZIGN_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[clap(long, help = "Enable debug logging")]
    pub debug: bool,

    #[clap(
        long,
        help = "Per-request timeout in seconds",
        env = "DAZZIGN_REQUEST_TIMEOUT",
        default_value_t = 300
    )]
    pub request_timeout: u64,

    #[clap(
        long,
        value_enum,
        help = "Preferred image renderer",
        env = "DAZZIGN_RENDERER",
        default_value = "stability"
    )]
    pub renderer: RendererKind,

    #[clap(
        long,
        value_enum,
        value_delimiter = ',',
        help = "Renderers to try, in order, after the preferred one",
        env = "DAZZIGN_FALLBACK_CHAIN"
    )]
    pub fallback_chain: Vec<RendererKind>,

    #[clap(
        long,
        value_enum,
        help = "Preferred attribute extractor",
        env = "DAZZIGN_EXTRACTOR",
        default_value = "openai"
    )]
    pub extractor: ExtractorKind,

    #[clap(
        long,
        help = "Never call external providers, use keyword extraction and placeholder images",
        env = "DAZZIGN_PLACEHOLDER_ONLY"
    )]
    pub placeholder_only: bool,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[clap(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub openai_model: String,

    #[clap(long, env = "STABILITY_API_KEY", hide_env_values = true)]
    pub stability_api_key: Option<String>,

    #[clap(
        long,
        help = "core, ultra or an sd3.5 model name",
        env = "STABILITY_MODEL",
        default_value = "core"
    )]
    pub stability_model: String,

    #[clap(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    #[clap(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    #[clap(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    pub aws_session_token: Option<String>,

    #[clap(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    #[clap(
        long,
        help = "Bedrock model id for the Nova renderer",
        env = "NOVA_MODEL_ID",
        default_value = "amazon.nova-canvas-v1:0"
    )]
    pub nova_model: String,
}
