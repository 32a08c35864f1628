mod command;

pub use command::{ Command, HELP_TEXT };

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Storage Args ---
    /// Where conversations and preferences are kept (file, redis, memory)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Path of the JSON file used by the file storage type.
    #[arg(long, env = "STORAGE_PATH", default_value = "chat-relay.json")]
    pub storage_path: String,

    /// Redis endpoint used by the redis storage type (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORAGE_HOST", default_value = "redis://127.0.0.1:6379")]
    pub storage_host: String,

    /// Prefix for Redis keys.
    #[arg(long, env = "STORAGE_PREFIX", default_value = "chat-relay:")]
    pub storage_prefix: String,

    // --- Chat LLM Provider Args ---
    /// Base URL of the completion API; the model path is appended to it.
    #[arg(long, env = "CHAT_BASE_URL", default_value = crate::llm::DEFAULT_BASE_URL)]
    pub chat_base_url: String,

    /// API Key for the completion API.
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gemini-1.5-flash)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter default if None
    pub chat_model: Option<String>,

    // --- General App Args ---
    /// Signed-in user id supplied by the identity provider.
    #[arg(long, env = "CHAT_USER")]
    pub user: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["chat-relay"]);
        assert_eq!(args.storage_type, "file");
        assert_eq!(args.storage_path, "chat-relay.json");
        assert_eq!(args.chat_base_url, crate::llm::DEFAULT_BASE_URL);
        assert_eq!(args.chat_model, None);
        assert!(!args.debug);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "chat-relay",
            "--storage-type",
            "redis",
            "--chat-model",
            "gemini-2.0-flash",
            "--user",
            "alice",
            "--debug",
        ]);
        assert_eq!(args.storage_type, "redis");
        assert_eq!(args.chat_model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(args.user.as_deref(), Some("alice"));
        assert!(args.debug);
    }
}
