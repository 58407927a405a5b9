use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use taxchat_api::ChatApi;
use taxchat_logging::{get_logs_dir, ConversationLogger};
use taxchat_types::short_id;

use crate::app::setup::AppContext;
use crate::chat::ChatSession;
use crate::render;
use crate::topics;

/// What the REPL should do with one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    New,
    Recent,
    Open(usize),
    ClearRecent,
    History,
    Topics,
    Topic(usize),
    Whoami,
    Help,
    Unknown(String),
    Send(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line == "exit" || line == "quit" {
            return Some(Self::Exit);
        }
        if !line.starts_with('/') {
            return Some(Self::Send(line.to_string()));
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        let number = || arg.parse::<usize>().ok();

        let command = match name {
            "/new" => Self::New,
            "/recent" => Self::Recent,
            "/open" => match number() {
                Some(n) => Self::Open(n),
                None => Self::Unknown(line.to_string()),
            },
            "/clear-recent" => Self::ClearRecent,
            "/history" => Self::History,
            "/topics" => Self::Topics,
            "/topic" => match number() {
                Some(n) => Self::Topic(n),
                None => Self::Unknown(line.to_string()),
            },
            "/whoami" => Self::Whoami,
            "/help" => Self::Help,
            _ => Self::Unknown(line.to_string()),
        };
        Some(command)
    }
}

/// Run interactive REPL mode
pub async fn run_repl_mode(ctx: &AppContext) -> Result<()> {
    print!("{}", render::format_welcome());
    println!("{}", "Type a question, '/help' for commands, or 'exit' to quit\n".bright_black());

    // Initialize logger (async) – transcripts go into the data directory
    let mut logger = match get_logs_dir(&ctx.config.data_dir) {
        Ok(logs_dir) => match ConversationLogger::new(&logs_dir).await {
            Ok(l) => Some(l),
            Err(e) => {
                eprintln!("Logging disabled: {}", e);
                None
            }
        },
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    // Account first, so the session is created with the bearer token attached
    let mut auth = ctx.auth_session().ok();
    if let Some(auth) = auth.as_mut() {
        match auth.restore().await {
            Ok(Some(user)) => println!("{}", render::format_user(user)),
            Ok(None) => {}
            Err(e) => eprintln!("{} Could not restore login: {}", "⚠️".yellow(), e),
        }
    }

    let mut chat = ctx.chat_session();
    chat.initialize().await?;
    if let Some(logger) = logger.as_mut() {
        logger.log("system", "session started", Some(chat.session_id())).await;
    }

    if !chat.messages().is_empty() {
        println!("{}", render::format_conversation(chat.messages()));
    }

    let mut rl = DefaultEditor::new()?;

    loop {
        if let Some(error) = chat.error() {
            println!("{}", render::format_error_banner(error));
        }

        let session_indicator = format!("[{}]", short_id(chat.session_id())).bright_magenta();
        let readline = rl.readline(&format!("{} {} ", session_indicator, "You:".bright_green().bold()));

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red(), err);
                break;
            }
        };

        let Some(command) = ReplCommand::parse(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.trim());

        match command {
            ReplCommand::Exit => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            ReplCommand::New => {
                let session_id = chat.start_new_chat().await;
                println!("{} New conversation {}", "🆕".bright_green(), short_id(&session_id));
                if let Some(logger) = logger.as_mut() {
                    logger.log("system", "new chat", Some(&session_id)).await;
                }
            }
            ReplCommand::Recent => {
                println!("{}", render::format_recent_chats(chat.recent_chats()));
            }
            ReplCommand::Open(index) => {
                match chat.load_recent(index).await {
                    Ok(()) => {
                        if chat.messages().is_empty() {
                            println!("{}", "This chat has no messages yet.".bright_black());
                        } else {
                            println!("{}", render::format_conversation(chat.messages()));
                        }
                    }
                    Err(e) => eprintln!("{} {}", "❌".bright_red(), e),
                }
            }
            ReplCommand::ClearRecent => match chat.clear_recent_chats().await {
                Ok(()) => println!("{} Recent chats cleared", "🧹".bright_green()),
                Err(e) => eprintln!("{} Failed to clear recent chats: {}", "❌".bright_red(), e),
            },
            ReplCommand::History => {
                if chat.messages().is_empty() {
                    println!("{}", "No messages in this session yet.".bright_black());
                } else {
                    println!("{}", render::format_conversation(chat.messages()));
                }
            }
            ReplCommand::Topics => print!("{}", render::format_topics()),
            ReplCommand::Topic(number) => match topics::topic(number) {
                Some(topic) => {
                    println!("{} {}", "You:".bright_green().bold(), topic.question);
                    ask(&mut chat, &mut logger, topic.question).await?;
                }
                None => eprintln!(
                    "{} No topic #{} (1-{})",
                    "❌".bright_red(),
                    number,
                    topics::QUICK_TOPICS.len()
                ),
            },
            ReplCommand::Whoami => match auth.as_ref().and_then(|a| a.user()) {
                Some(user) => println!("{}", render::format_user(user)),
                None => println!("{}", "Not signed in".bright_black()),
            },
            ReplCommand::Help => print!("{}", render::format_help()),
            ReplCommand::Unknown(input) => {
                eprintln!("{} Unknown command: {} (try /help)", "❌".bright_red(), input);
            }
            ReplCommand::Send(text) => ask(&mut chat, &mut logger, &text).await?,
        }
    }

    if let Some(logger) = logger.as_mut() {
        logger.shutdown().await;
    }
    Ok(())
}

async fn ask(
    chat: &mut ChatSession<dyn ChatApi>,
    logger: &mut Option<ConversationLogger>,
    text: &str,
) -> Result<()> {
    println!("{}", "⏳ Thinking...".bright_black());
    if !chat.send_message(text).await? {
        return Ok(());
    }

    let session_id = chat.session_id().to_string();
    let messages = chat.messages();
    let turn = &messages[messages.len().saturating_sub(2)..];

    if let Some(logger) = logger.as_mut() {
        for message in turn {
            logger.log_message(message, &session_id).await;
        }
    }
    if let Some(reply) = turn.last() {
        println!("{}", render::format_message(reply));
    }
    Ok(())
}
