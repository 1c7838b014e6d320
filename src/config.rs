use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        suggest_base_url: get_env_or_default(
            "SUGGEST_BASE_URL",
            "https://suggestqueries.google.com/complete/search",
        ),
        suggest_locale: get_env_or_default("SUGGEST_LOCALE", "sg"),
        gemini_api_key: env::var("GEMINI_API_KEY").ok(),
        gemini_model: get_env_or_default("GEMINI_MODEL", "gemini-1.5-flash"),
        gemini_base_url: get_env_or_default(
            "GEMINI_BASE_URL",
            "https://generativelanguage.googleapis.com",
        ),
        bind_addr: get_env_or_default("BIND_ADDR", "0.0.0.0:8080"),
    }
});

pub struct Config {
    pub suggest_base_url: String,
    pub suggest_locale: String,
    /// Missing key means the enrichment orchestrator runs fallback-only.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub bind_addr: String,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
