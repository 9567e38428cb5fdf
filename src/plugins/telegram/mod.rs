mod callback;
mod command;
mod payment;

use std::sync::Arc;

use command::Command;
use teloxide::{
  Bot,
  dispatching::{Dispatcher, HandlerExt, UpdateFilterExt},
  prelude::*,
  types::{
    CallbackQuery, ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode,
    PreCheckoutQuery, SuccessfulPayment, Update,
  },
};

use crate::{prelude::*, state::AppState};

pub const SOMETHING_WENT_WRONG: &str =
  "😔 Something went wrong. Please try again later.";

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  fn name(&self) -> &'static str {
    "telegram"
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    run_bot(app).await;
    Ok(())
  }
}

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = app.bot.clone();

  let handler = teloxide::dptree::entry()
    .branch(
      Update::filter_message()
        .filter_map(|msg: Message| msg.successful_payment().cloned())
        .endpoint({
          let app = app.clone();
          move |bot: Bot, msg: Message, payment: SuccessfulPayment| {
            let app = app.clone();
            let bot = ReplyBot::new(bot, sender(&msg), msg.chat.id, msg.id);
            payment::successful(app, bot, payment)
          }
        }),
    )
    .branch(Update::filter_message().filter_command::<Command>().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message, cmd: Command| {
        let app = app.clone();
        let bot = ReplyBot::new(bot, sender(&msg), msg.chat.id, msg.id);
        command::handle(app, bot, cmd)
      }
    }))
    .branch(Update::filter_pre_checkout_query().endpoint(pre_checkout))
    .branch(Update::filter_callback_query().endpoint({
      let app = app.clone();
      move |bot: Bot, query: CallbackQuery| {
        let app = app.clone();
        callback_handle(app, bot, query)
      }
    }));

  let mut dispatcher = Dispatcher::builder(bot, handler).build();

  let token = dispatcher.shutdown_token();
  let shutdown = app.shutdown.clone();
  tokio::spawn(async move {
    shutdown.cancelled().await;
    if let Ok(stopped) = token.shutdown() {
      stopped.await;
    }
  });

  dispatcher.dispatch().await;
}

/// Telegram id of the message author, falling back to the chat.
fn sender(msg: &Message) -> i64 {
  msg.from.as_ref().map_or(msg.chat.id.0, |user| user.id.0 as i64)
}

async fn pre_checkout(bot: Bot, query: PreCheckoutQuery) -> ResponseResult<()> {
  debug!(
    "Pre-checkout from {}: {} {} ({})",
    query.from.id, query.total_amount, query.currency, query.invoice_payload
  );
  bot.answer_pre_checkout_query(query.id, true).await?;
  Ok(())
}

async fn callback_handle(
  app: Arc<AppState>,
  bot: Bot,
  query: CallbackQuery,
) -> ResponseResult<()> {
  if let Some(data) = query.data
    && let Some(msg) = query.message.as_ref()
  {
    let bot =
      ReplyBot::new(bot, query.from.id.0 as i64, msg.chat().id, msg.id());

    // answer callback to remove loading state
    bot.inner.answer_callback_query(query.id.clone()).await?;

    callback::handle(app, bot, &data).await
  } else {
    Ok(())
  }
}

#[derive(Debug, Clone)]
struct ReplyBot {
  inner: Bot,
  pub user_id: i64,
  pub chat_id: ChatId,
  pub message_id: MessageId,
}

impl ReplyBot {
  pub fn new(
    inner: Bot,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
  ) -> Self {
    Self { inner, user_id, chat_id, message_id }
  }

  async fn reply_html(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .await
  }

  /// Send a potentially long message by splitting it into chunks if needed.
  async fn reply_html_chunked(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<()> {
    for chunk in utils::chunk_message(&text.into(), 0) {
      self.reply_html(chunk).await?;
    }
    Ok(())
  }

  async fn reply_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard)
      .await
  }

  pub async fn edit_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
  ) -> ResponseResult<()> {
    self
      .inner
      .edit_message_text(self.chat_id, self.message_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard)
      .await?;
    Ok(())
  }
}

/// Sends `text` to the payments chat, if one is configured. Failures are
/// only logged.
async fn notify_payments(app: &AppState, text: impl Into<String>) {
  let Some(chat_id) = app.config.payments_chat_id else {
    return;
  };

  if let Err(err) = app
    .bot
    .send_message(ChatId(chat_id), text.into())
    .parse_mode(ParseMode::Html)
    .await
  {
    warn!("Notify payments chat {chat_id} failed: {err}");
  }
}
