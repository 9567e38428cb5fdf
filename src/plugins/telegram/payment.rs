//! Telegram Stars payments: invoice payloads, completed payments and refunds.

use std::sync::Arc;

use teloxide::{
  prelude::*,
  types::{SuccessfulPayment, TelegramTransactionId, UserId},
};

use super::{ReplyBot, SOMETHING_WENT_WRONG, callback, notify_payments};
use crate::{
  entity::user_link,
  prelude::*,
  state::AppState,
  sv::transaction::Payment,
};

const PAYLOAD_PREFIX: &str = "tariff_";

pub fn payload(tariff_id: i32) -> String {
  format!("{PAYLOAD_PREFIX}{tariff_id}")
}

pub fn parse_payload(payload: &str) -> Option<i32> {
  payload.strip_prefix(PAYLOAD_PREFIX)?.parse().ok()
}

pub async fn successful(
  app: Arc<AppState>,
  bot: ReplyBot,
  payment: SuccessfulPayment,
) -> ResponseResult<()> {
  let charge_id = payment.telegram_payment_charge_id.0.clone();
  info!(
    "Payment from {}: {} {} ({}, charge: {charge_id})",
    bot.user_id, payment.total_amount, payment.currency, payment.invoice_payload
  );

  let Some(tariff_id) = parse_payload(&payment.invoice_payload) else {
    error!(
      "Payment {charge_id} of user {} has unknown payload {}",
      bot.user_id, payment.invoice_payload
    );
    bot.reply_html(SOMETHING_WENT_WRONG).await?;
    return Ok(());
  };

  let payment = Payment {
    user_id: bot.user_id,
    tariff_id,
    total_amount: i32::try_from(payment.total_amount).unwrap_or(i32::MAX),
    currency: payment.currency,
    charge_id,
  };

  match apply(&app, payment).await {
    Ok(Some(link)) => {
      let text = format!(
        "✅ <b>Payment received!</b>\n\n{}",
        callback::link_text(&link)
      );
      bot.reply_with_keyboard(text, callback::main_menu()).await?;
    }
    Ok(None) => {}
    Err(err) => {
      error!("Process payment of user {} failed: {err}", bot.user_id);
      bot.reply_html(SOMETHING_WENT_WRONG).await?;
    }
  }

  Ok(())
}

/// Records the payment, announces it in the payments chat and applies its
/// tariff. A charge id that was already recorded yields `Ok(None)` without
/// a second notice or any panel call.
pub async fn apply(
  app: &AppState,
  payment: Payment,
) -> Result<Option<user_link::Model>> {
  let sv = app.sv();
  sv.user.get_or_create(payment.user_id).await?;

  let transaction = match sv.transaction.create(payment).await {
    Ok(transaction) => transaction,
    Err(Error::Conflict(reason)) => {
      warn!("Payment was already processed: {reason}");
      return Ok(None);
    }
    Err(err) => return Err(err),
  };

  notify_payments(
    app,
    format!(
      "💰 <b>Payment</b>\n\
      User: <code>{}</code>\n\
      Tariff: {}\n\
      Amount: {} {}\n\
      Charge: <code>{}</code>",
      transaction.user_id,
      transaction.tariff_id,
      transaction.total_amount,
      transaction.currency,
      transaction.payment_charge_id
    ),
  )
  .await;

  app
    .vpn()
    .purchase(transaction.user_id, transaction.tariff_id)
    .await
    .map(Some)
}

pub async fn refund(
  app: Arc<AppState>,
  bot: ReplyBot,
  charge_id: String,
) -> ResponseResult<()> {
  let charge_id = charge_id.trim();
  if !app.config.payment_debug {
    bot.reply_html("Refunds are not available.").await?;
    return Ok(());
  }
  if charge_id.is_empty() {
    bot.reply_html("Usage: /refund &lt;charge_id&gt;").await?;
    return Ok(());
  }

  let sv = app.sv();
  let transaction = match sv.transaction.by_charge_id(charge_id).await {
    Ok(Some(transaction)) if transaction.user_id == bot.user_id => transaction,
    Ok(_) => {
      bot.reply_html("Payment not found.").await?;
      return Ok(());
    }
    Err(err) => {
      error!("Load transaction {charge_id} failed: {err}");
      bot.reply_html(SOMETHING_WENT_WRONG).await?;
      return Ok(());
    }
  };

  if let Err(err) = bot
    .inner
    .refund_star_payment(
      UserId(transaction.user_id as u64),
      TelegramTransactionId(charge_id.to_string()),
    )
    .await
  {
    error!("Refund {charge_id} of user {} failed: {err}", bot.user_id);
    bot.reply_html(SOMETHING_WENT_WRONG).await?;
    return Ok(());
  }

  if let Err(err) = sv.transaction.mark_refund(charge_id).await {
    error!("Mark transaction {charge_id} refunded failed: {err}");
  }

  notify_payments(
    &app,
    format!(
      "↩️ <b>Refund</b>\n\
      User: <code>{}</code>\n\
      Amount: {} {}\n\
      Charge: <code>{charge_id}</code>",
      transaction.user_id, transaction.total_amount, transaction.currency
    ),
  )
  .await;

  bot.reply_html("✅ Payment refunded.").await?;
  Ok(())
}
