pub mod auth;
pub mod cli;
pub mod console;
pub mod llm;
pub mod models;
pub mod preferences;
pub mod storage;
pub mod store;

use cli::{ Args, Command };
use console::{ Console, Flow };
use auth::LocalAuth;
use llm::LlmConfig;
use llm::chat::new_client as new_chat_client;
use log::info;
use preferences::load_theme;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use storage::initialize_key_value_store;
use store::ConversationStore;
use tokio::io::{ AsyncBufReadExt, BufReader };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Storage Type: {}", args.storage_type);
    info!("Storage Path: {}", args.storage_path);
    info!("Storage Host: {}", args.storage_host);
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat API Key Set: {}", !args.chat_api_key.is_empty());
    info!("User: {}", args.user.as_deref().unwrap_or("anonymous"));
    info!("-------------------------");

    let kv = initialize_key_value_store(&args)?;
    let chat_config = LlmConfig {
        api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
        completion_model: args.chat_model.clone(),
        base_url: Some(args.chat_base_url.clone()),
    };
    let chat_client = new_chat_client(&chat_config)?;
    info!("Chat client configured: Model={}", chat_client.get_model());

    let store = Arc::new(ConversationStore::load(kv.clone(), chat_client).await);
    let auth = Arc::new(LocalAuth::new(args.user.clone()));
    let theme = load_theme(kv.as_ref()).await;
    let console = Console::new(store.clone(), kv, auth);

    println!(
        "chat-relay ready: {} saved conversation(s), {} theme. Type /help for commands.",
        store.conversations().await.len(),
        theme
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match console.execute(Command::parse(&line)).await {
            Flow::Continue(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Flow::Quit => {
                break;
            }
        }
    }

    info!("Shutting down");
    Ok(())
}
