//! CLI parser and command runners.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flow_client::UserContext;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::ChatConfig;
use crate::conversation::Conversation;
use crate::service::TravelChat;

#[derive(Parser)]
#[command(name = "travel-chat")]
#[command(about = "Travel assistant chat over a flow runtime", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Identity forwarded as user context; any field makes the user authenticated.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
}

impl IdentityArgs {
    pub fn user_context(&self) -> Option<UserContext> {
        if self.email.is_none() && self.name.is_none() && self.username.is_none() {
            return None;
        }
        let mut ctx = UserContext::authenticated();
        ctx.email = self.email.clone();
        ctx.full_name = self.name.clone();
        ctx.username = self.username.clone();
        Some(ctx)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat; type /status for the flow id, /exit to quit.
    Chat {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Send one message and print the reply.
    Send {
        text: String,
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Inspect or change the flow id.
    FlowId {
        #[command(subcommand)]
        action: FlowIdAction,
    },
    /// Probe the flow runtime.
    Health,
}

#[derive(Subcommand)]
pub enum FlowIdAction {
    /// Discover the flow id and print its status.
    Show,
    /// Fetch the flow id once; fails if the backend does.
    Refresh,
    /// Override the flow id for this process and print the result.
    Set { id: String },
}

/// Load ChatConfig from environment.
pub fn load_config() -> Result<ChatConfig> {
    ChatConfig::from_env()
}

pub async fn run(cli: Cli, config: ChatConfig) -> Result<()> {
    let chat = TravelChat::from_config(&config)?;
    let result = match cli.command {
        Commands::Chat { identity } => run_chat(&chat, identity.user_context()).await,
        Commands::Send { text, identity } => {
            run_send(&chat, &text, identity.user_context()).await
        }
        Commands::FlowId { action } => run_flow_id(&chat, action).await,
        Commands::Health => run_health(&chat).await,
    };
    chat.stop().await;
    result
}

fn print_status(chat: &TravelChat) {
    let status = chat.endpoint_status();
    println!("flow id:      {}", status.flow_id);
    println!("status:       {:?}", status.indicator());
    match status.last_updated {
        Some(at) => println!("last updated: {}", at.to_rfc3339()),
        None => println!("last updated: never"),
    }
    if let Some(err) = status.last_error {
        println!("last error:   {}", err);
    }
}

async fn run_chat(chat: &TravelChat, user_context: Option<UserContext>) -> Result<()> {
    chat.start();
    let mut conversation = chat.open_conversation(user_context);
    if let Some(welcome) = conversation.last_message() {
        println!("{}\n", welcome.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/status" => {
                print_status(chat);
                continue;
            }
            _ => {}
        }
        match conversation.send(chat.transport(), &line).await {
            Ok(reply) => println!("\n{}\n", reply.content),
            Err(e) => println!("({})", e),
        }
    }
    Ok(())
}

async fn run_send(chat: &TravelChat, text: &str, user_context: Option<UserContext>) -> Result<()> {
    Conversation::validate_input(text)?;
    chat.start_and_wait().await;
    let reply = chat
        .send_message(text, chat.session_id(), user_context.as_ref())
        .await?;
    println!("{}", reply);
    Ok(())
}

async fn run_flow_id(chat: &TravelChat, action: FlowIdAction) -> Result<()> {
    match action {
        FlowIdAction::Show => {
            chat.resolver().initialize().await;
        }
        FlowIdAction::Refresh => {
            chat.refresh_endpoint_id().await?;
        }
        FlowIdAction::Set { id } => {
            chat.set_endpoint_id(&id)?;
        }
    }
    print_status(chat);
    Ok(())
}

async fn run_health(chat: &TravelChat) -> Result<()> {
    if chat.check_health().await {
        println!("flow runtime reachable");
        Ok(())
    } else {
        anyhow::bail!("flow runtime unreachable")
    }
}
