use crate::models::chat::ConversationId;

pub const HELP_TEXT: &str = "\
Commands:
  /new                  start a new conversation
  /list                 list conversations
  /select <id>          make <id> the active conversation
  /delete <id>          delete a conversation
  /rename <id> <title>  rename a conversation
  /clear                delete every conversation
  /theme                toggle dark/light theme
  /whoami               show the signed-in user
  /logout               sign out and clear history
  /help                 show this help
  /quit                 exit
Anything else is sent as a message.";

/// One line of terminal input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Select(ConversationId),
    Delete(ConversationId),
    Rename(ConversationId, String),
    Clear,
    Theme,
    WhoAmI,
    Logout,
    Help,
    Quit,
    Send(String),
    Empty,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name.to_lowercase().as_str() {
            "new" => Command::New,
            "list" | "ls" => Command::List,
            "select" => Self::with_id(arg, "select", Command::Select),
            "delete" | "rm" => Self::with_id(arg, "delete", Command::Delete),
            "rename" => {
                let (id, title) = match arg.split_once(char::is_whitespace) {
                    Some((id, title)) => (id, title.trim()),
                    None => (arg, ""),
                };
                if title.is_empty() {
                    return Command::Invalid("usage: /rename <id> <title>".to_string());
                }
                match id.parse() {
                    Ok(id) => Command::Rename(id, title.to_string()),
                    Err(_) => Command::Invalid(format!("not a conversation id: '{}'", id)),
                }
            }
            "clear" => Command::Clear,
            "theme" => Command::Theme,
            "whoami" => Command::WhoAmI,
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Invalid(format!("unknown command '/{}', try /help", other)),
        }
    }

    fn with_id(arg: &str, name: &str, build: fn(ConversationId) -> Command) -> Command {
        if arg.is_empty() {
            return Command::Invalid(format!("usage: /{} <id>", name));
        }
        match arg.parse() {
            Ok(id) => build(id),
            Err(_) => Command::Invalid(format!("not a conversation id: '{}'", arg)),
        }
    }
}
