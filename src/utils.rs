use crate::prelude::*;

pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}

pub fn format_duration(duration: TimeDelta) -> String {
  format!(
    "{}d {}h {}m",
    duration.num_days(),
    duration.num_hours() % 24,
    duration.num_minutes() % 60
  )
}

/// Telegram caps messages at 4096 characters; leave room for html entities.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4000;

/// Splits `text` into chunks that fit a Telegram message, preferring line
/// boundaries. `max_len == 0` means the Telegram limit.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
  let max_len =
    if max_len == 0 { TELEGRAM_MAX_MESSAGE_LENGTH } else { max_len };

  if text.len() <= max_len {
    return vec![text.to_string()];
  }

  let mut chunks = Vec::new();
  let mut current = String::new();

  for line in text.lines() {
    if !current.is_empty() && current.len() + line.len() + 1 > max_len {
      chunks.push(std::mem::take(&mut current));
    }

    if line.len() > max_len {
      if !current.is_empty() {
        chunks.push(std::mem::take(&mut current));
      }
      let mut rest = line;
      while rest.len() > max_len {
        let mut at = max_len;
        while !rest.is_char_boundary(at) {
          at -= 1;
        }
        chunks.push(rest[..at].to_string());
        rest = &rest[at..];
      }
      current = rest.to_string();
    } else {
      if !current.is_empty() {
        current.push('\n');
      }
      current.push_str(line);
    }
  }

  if !current.is_empty() {
    chunks.push(current);
  }

  chunks
}
