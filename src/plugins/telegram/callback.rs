use std::sync::Arc;

use teloxide::{
  prelude::*,
  types::{InlineKeyboardButton, InlineKeyboardMarkup, LabeledPrice},
};

use super::{ReplyBot, SOMETHING_WENT_WRONG, payment};
use crate::{
  entity::{tariff, user_link},
  prelude::*,
  state::{AppState, Services},
};

pub const WELCOME: &str = "<b>🛡 VPN</b>\n\n\
  Fast VLESS connection for all your devices.\n\
  Use the buttons below to navigate.";

/// Callback data enum - provides type-safe callback handling
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
  Link,
  Buy,
  Tariff(i32),
  Back,
}

impl Callback {
  /// Serialize callback to string for Telegram API
  pub fn to_data(&self) -> String {
    match self {
      Callback::Link => "link".to_string(),
      Callback::Buy => "buy".to_string(),
      Callback::Tariff(id) => format!("tariff:{id}"),
      Callback::Back => "back".to_string(),
    }
  }

  /// Parse callback from string received from Telegram API
  pub fn from_data(data: &str) -> Option<Self> {
    match data {
      "link" => Some(Callback::Link),
      "buy" => Some(Callback::Buy),
      "back" => Some(Callback::Back),
      _ => data
        .strip_prefix("tariff:")
        .and_then(|id| id.parse().ok())
        .map(Callback::Tariff),
    }
  }
}

pub fn main_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![InlineKeyboardButton::callback(
      "🔑 My Link",
      Callback::Link.to_data(),
    )],
    vec![InlineKeyboardButton::callback(
      "💳 Buy Subscription",
      Callback::Buy.to_data(),
    )],
  ])
}

fn back_keyboard() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
    "« Back to Menu",
    Callback::Back.to_data(),
  )]])
}

fn tariffs_keyboard(tariffs: &[tariff::Model]) -> InlineKeyboardMarkup {
  let mut rows: Vec<_> = tariffs
    .iter()
    .map(|tariff| {
      vec![InlineKeyboardButton::callback(
        format!("{} days - {} ⭐", tariff.days, tariff.price),
        Callback::Tariff(tariff.id).to_data(),
      )]
    })
    .collect();
  rows.push(vec![InlineKeyboardButton::callback(
    "« Back to Menu",
    Callback::Back.to_data(),
  )]);
  InlineKeyboardMarkup::new(rows)
}

pub fn link_text(link: &user_link::Model) -> String {
  let now = Utc::now().naive_utc();
  let left = if link.expires_at > now {
    format!("⏳ {} left", utils::format_duration(link.expires_at - now))
  } else {
    "❌ Expired".into()
  };

  format!(
    "🔑 <b>Your connection link:</b>\n\n\
    <code>{}</code>\n\n\
    Valid until: {} ({left})",
    link.link,
    utils::format_date(link.expires_at)
  )
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  data: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  let Some(callback) = Callback::from_data(data) else {
    return Ok(());
  };

  match callback {
    Callback::Link => handle_link_view(&sv, &bot).await?,
    Callback::Buy => match sv.tariff.active().await {
      Ok(tariffs) if tariffs.iter().any(|t| t.price > 0) => {
        let paid: Vec<_> =
          tariffs.into_iter().filter(|t| t.price > 0).collect();
        let text = "💳 <b>Buy Subscription</b>\n\n\
          Choose a plan. Remaining days are kept when you renew.";
        bot.edit_with_keyboard(text, tariffs_keyboard(&paid)).await?;
      }
      Ok(_) => {
        bot
          .edit_with_keyboard("No plans available right now.", back_keyboard())
          .await?;
      }
      Err(err) => {
        error!("Load tariffs failed: {err}");
        bot.edit_with_keyboard(SOMETHING_WENT_WRONG, back_keyboard()).await?;
      }
    },
    Callback::Tariff(id) => handle_invoice(&app, &sv, &bot, id).await?,
    Callback::Back => {
      bot.edit_with_keyboard(WELCOME, main_menu()).await?;
    }
  }

  Ok(())
}

async fn handle_link_view(
  sv: &Services<'_>,
  bot: &ReplyBot,
) -> ResponseResult<()> {
  match sv.link.by_user(bot.user_id).await {
    Ok(Some(link)) => {
      bot.edit_with_keyboard(link_text(&link), back_keyboard()).await?;
    }
    Ok(None) => {
      bot
        .edit_with_keyboard(
          "You have no VPN link yet. Send /start to get a trial!",
          back_keyboard(),
        )
        .await?;
    }
    Err(err) => {
      error!("Load link of user {} failed: {err}", bot.user_id);
      bot.edit_with_keyboard(SOMETHING_WENT_WRONG, back_keyboard()).await?;
    }
  }
  Ok(())
}

async fn handle_invoice(
  app: &AppState,
  sv: &Services<'_>,
  bot: &ReplyBot,
  tariff_id: i32,
) -> ResponseResult<()> {
  let tariff = match sv.tariff.by_id(tariff_id).await {
    Ok(tariff) if tariff.is_active && tariff.price > 0 => tariff,
    Ok(_) | Err(Error::TariffNotFound(_)) => {
      bot
        .edit_with_keyboard(
          "This plan is no longer available.",
          back_keyboard(),
        )
        .await?;
      return Ok(());
    }
    Err(err) => {
      error!("Load tariff {tariff_id} failed: {err}");
      bot.edit_with_keyboard(SOMETHING_WENT_WRONG, back_keyboard()).await?;
      return Ok(());
    }
  };

  let prices = vec![LabeledPrice {
    label: format!("{} days", tariff.days),
    amount: tariff.price as u32,
  }];

  bot
    .inner
    .send_invoice(
      bot.chat_id,
      "VPN subscription",
      format!("VPN access for {} days", tariff.days),
      payment::payload(tariff.id),
      app.config.currency.clone(),
      prices,
    )
    .await?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn callback_data_parses_back() {
    for callback in [
      Callback::Link,
      Callback::Buy,
      Callback::Tariff(12),
      Callback::Back,
    ] {
      assert_eq!(Callback::from_data(&callback.to_data()), Some(callback));
    }
  }

  #[test]
  fn unknown_callback_data_is_ignored() {
    assert_eq!(Callback::from_data("tariff:abc"), None);
    assert_eq!(Callback::from_data("profile"), None);
  }
}
