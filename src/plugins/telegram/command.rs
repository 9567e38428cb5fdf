use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use super::{ReplyBot, SOMETHING_WENT_WRONG, callback, payment};
use crate::{prelude::*, state::AppState};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Start,
  Help,
  /// Refund a Stars payment by its charge id
  Refund(String),
  // Admin commands below
  Servers,
}

const HELP: &str = "\
<b>🛡 VPN</b>

/start - Get your connection link and open the menu
/help - Show this message

Open the link in any VLESS client (v2rayNG, Hiddify, Streisand).";

const ADMIN_HELP: &str = "

<b>📋 Admin Commands</b>
/servers - Show VPN servers load";

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
) -> ResponseResult<()> {
  let is_admin = app.admins.contains(&bot.user_id);

  match cmd {
    Command::Start => handle_start(&app, &bot).await?,
    Command::Help if is_admin => {
      bot.reply_html(format!("{HELP}{ADMIN_HELP}")).await?;
    }
    Command::Help => {
      bot.reply_html(HELP).await?;
    }
    Command::Refund(charge_id) => payment::refund(app, bot, charge_id).await?,
    Command::Servers if is_admin => handle_servers(&app, &bot).await?,
    Command::Servers => {}
  }

  Ok(())
}

async fn handle_start(app: &AppState, bot: &ReplyBot) -> ResponseResult<()> {
  if let Err(err) = app.sv().user.get_or_create(bot.user_id).await {
    error!("Register user {} failed: {err}", bot.user_id);
    bot.reply_html(SOMETHING_WENT_WRONG).await?;
    return Ok(());
  }

  let text = match app.vpn().get_or_create_link(bot.user_id).await {
    Ok(link) => {
      format!("{}\n\n{}", callback::WELCOME, callback::link_text(&link))
    }
    Err(err) => {
      error!("Trial link for user {} failed: {err}", bot.user_id);
      format!("{}\n\n{SOMETHING_WENT_WRONG}", callback::WELCOME)
    }
  };

  bot.reply_with_keyboard(text, callback::main_menu()).await?;
  Ok(())
}

async fn handle_servers(app: &AppState, bot: &ReplyBot) -> ResponseResult<()> {
  let servers = match app.sv().server.all().await {
    Ok(servers) => servers,
    Err(err) => {
      bot.reply_html(format!("❌ DB Error: {err}")).await?;
      return Ok(());
    }
  };

  if servers.is_empty() {
    bot.reply_html("📭 No VPN servers configured.").await?;
    return Ok(());
  }

  let load: HashMap<_, _> = app.load.snapshot().into_iter().collect();
  let free = app.load.free_server().map(|(id, _)| id);

  let mut text =
    format!("🖥 <b>VPN Servers (Total: {})</b>\n\n", servers.len());
  for (i, server) in servers.iter().enumerate() {
    let members = match load.get(&server.id) {
      Some(count) => count.to_string(),
      None => format!("{} (not synced)", server.members_count),
    };
    let marker = if free == Some(server.id) { " ⭐" } else { "" };

    text.push_str(&format!(
      "<b>{}.</b> <code>{}</code>{marker}\n    {}\n    Members: {members}\n",
      i + 1,
      server.id,
      server.url
    ));
  }

  bot.reply_html_chunked(text).await
}
