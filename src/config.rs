use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "batchqc";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "batchqc=info"
}

/// Runtime settings, read once from the environment at startup.
///
/// API keys and mail credentials are optional here: a missing key fails the
/// operation that needs it, not startup, so the pipeline can still run the
/// local stages.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,

    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub groq_model: String,

    pub email_from: Option<String>,
    pub email_password: Option<String>,
    pub email_to: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,

    pub scan_dir: PathBuf,
    pub history_dir: PathBuf,
    pub llm_timeout_secs: u64,
}

impl Settings {
    /// Read settings from the environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Self {
        let email_from = env_opt("EMAIL");
        Self {
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-flash-latest"),

            groq_api_key: env_opt("GROQ_API_KEY"),
            groq_base_url: env_or("GROQ_BASE_URL", "https://api.groq.com/openai/v1"),
            groq_model: env_or("GROQ_MODEL", "llama-3.3-70b-versatile"),

            email_to: env_opt("EMAIL_TO").or_else(|| email_from.clone()),
            email_from,
            email_password: env_opt("EMAIL_PASSWORD"),
            smtp_host: env_or("SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env_parsed("SMTP_PORT", 587),

            scan_dir: PathBuf::from(env_or("BATCHQC_SCAN_DIR", "./data/batch_scans")),
            history_dir: PathBuf::from(env_or("BATCHQC_HISTORY_DIR", "./data/processed_csv")),
            llm_timeout_secs: env_parsed("BATCHQC_LLM_TIMEOUT_SECS", 120),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
