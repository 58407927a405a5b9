use anyhow::{bail, Result};
use colored::Colorize;

use taxchat_types::Registration;

use crate::app::setup::AppContext;
use crate::cli::{Cli, Commands};
use crate::render;

/// Run a one-shot subcommand and return what should be printed
pub async fn execute_command(cli: &Cli, command: &Commands, ctx: &AppContext) -> Result<String> {
    match command {
        Commands::Ask { message } => ask(ctx, &message.join(" ")).await,
        Commands::New => {
            ctx.apply_stored_token().await;
            let mut chat = ctx.chat_session();
            chat.load_local_state().await;
            let session_id = chat.start_new_chat().await;
            if let Some(error) = chat.error() {
                eprintln!("{}", render::format_error_banner(error));
            }
            Ok(format!("{} Started new conversation {}", "🆕".bright_green(), session_id))
        }
        Commands::History => {
            ctx.apply_stored_token().await;
            let mut chat = ctx.chat_session();
            chat.initialize().await?;
            if chat.messages().is_empty() {
                return Ok(format!("{}", "No messages in this session yet.".bright_black()));
            }
            Ok(render::format_conversation(chat.messages()))
        }
        Commands::Recent => {
            let mut chat = ctx.chat_session();
            chat.load_local_state().await;
            Ok(render::format_recent_chats(chat.recent_chats()))
        }
        Commands::Open { index } => {
            ctx.apply_stored_token().await;
            let mut chat = ctx.chat_session();
            chat.load_local_state().await;
            if let Err(e) = chat.load_recent(*index).await {
                if let Some(error) = chat.error() {
                    eprintln!("{}", render::format_error_banner(error));
                }
                return Err(e);
            }
            if chat.messages().is_empty() {
                return Ok(format!("{}", "This chat has no messages yet.".bright_black()));
            }
            Ok(render::format_conversation(chat.messages()))
        }
        Commands::ClearRecent => {
            let mut chat = ctx.chat_session();
            chat.clear_recent_chats().await?;
            Ok(format!("{} Recent chats cleared", "🧹".bright_green()))
        }
        Commands::Login { email } => {
            let mut auth = ctx.auth_session()?;
            let user = auth.login(email, cli.require_password()?).await?;
            Ok(format!("Signed in: {}", render::format_user(user)))
        }
        Commands::Register { email, username, full_name } => {
            let mut auth = ctx.auth_session()?;
            let registration = Registration {
                email: email.clone(),
                username: username.clone(),
                password: cli.require_password()?.to_string(),
                full_name: full_name.clone(),
            };
            let user = auth.register(&registration).await?;
            Ok(format!("Account created: {}", render::format_user(user)))
        }
        Commands::Logout => {
            let mut auth = ctx.auth_session()?;
            auth.restore().await?;
            auth.logout().await?;
            Ok(format!("{} Signed out", "👋".bright_green()))
        }
        Commands::Whoami => {
            let mut auth = ctx.auth_session()?;
            match auth.restore().await? {
                Some(user) => Ok(render::format_user(user)),
                None => Ok(format!("{}", "Not signed in".bright_black())),
            }
        }
        Commands::Profile { full_name } => {
            let mut auth = ctx.auth_session()?;
            auth.restore().await?;
            let user = auth.update_profile(Some(full_name.clone())).await?;
            Ok(format!("Profile updated: {}", render::format_user(user)))
        }
        Commands::ChangePassword { new_password } => {
            let mut auth = ctx.auth_session()?;
            auth.restore().await?;
            let message = auth.change_password(cli.require_password()?, new_password).await?;
            Ok(message.unwrap_or_else(|| "Password changed".to_string()))
        }
        Commands::ForgotPassword { email } => {
            let auth = ctx.auth_session()?;
            let demo_token = auth.forgot_password(email).await?;
            let mut out = "If the address is registered, a reset link has been sent.".to_string();
            if let Some(token) = demo_token {
                out.push_str(&format!("\n{} {}", "Reset token:".bright_yellow(), token));
            }
            Ok(out)
        }
        Commands::ResetPassword { token } => {
            let auth = ctx.auth_session()?;
            let message = auth.reset_password(token, cli.require_password()?).await?;
            Ok(message.unwrap_or_else(|| "Password has been reset".to_string()))
        }
        Commands::Conversations => {
            ctx.apply_stored_token().await;
            let conversations = ctx.backend.chat.list_conversations().await?;
            Ok(render::format_conversations(&conversations))
        }
        Commands::DeleteConversation { session_id } => {
            ctx.apply_stored_token().await;
            let ack = ctx.backend.chat.delete_conversation(session_id).await?;
            Ok(ack.message.unwrap_or_else(|| format!("Deleted {}", session_id)))
        }
        Commands::Ingest { force } => {
            ctx.apply_stored_token().await;
            let report = ctx.backend.chat.ingest_documents(*force).await?;
            Ok(format!(
                "Indexed {} chunks ({} added, {} updated, {} skipped)",
                report.indexed_chunks, report.added, report.updated, report.skipped
            ))
        }
        Commands::IngestStatus => {
            ctx.apply_stored_token().await;
            let status = ctx.backend.chat.ingest_status().await?;
            Ok(serde_json::to_string_pretty(&status)?)
        }
    }
}

async fn ask(ctx: &AppContext, message: &str) -> Result<String> {
    if message.trim().is_empty() {
        bail!("Nothing to ask");
    }

    ctx.apply_stored_token().await;
    let mut chat = ctx.chat_session();
    chat.initialize().await?;
    chat.send_message(message).await?;

    if let Some(error) = chat.error() {
        bail!("{}", error);
    }
    let reply = chat.messages().last().map(render::format_message).unwrap_or_default();
    Ok(reply)
}
