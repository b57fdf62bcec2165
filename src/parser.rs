//! Post-processing of agent replies.
//!
//! Model output is free-form text. These helpers normalise it and pull
//! structured pieces out of it on a best-effort basis: a miss is `None`,
//! never an error.

use std::sync::LazyLock;
use log::{debug, trace};
use regex::Regex;

static NEXT_STEPS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?s)\*\*Next Steps:\*\*\s*(.*?)(?:\n\n|\z)")
    .expect("next steps pattern is valid")
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[-*•]\s+")
    .expect("bullet pattern is valid")
});

/// Trim, strip one layer of matching surrounding quotes, then turn
/// literal `\n` and `\t` escapes into real newlines and tabs.
///
/// Single pass: text that is still quoted after unwrapping keeps
/// its inner quotes.
pub fn clean_text(raw: &str) -> String
{   let trimmed = raw.trim();
    let unquoted = ['"', '\'']
      .iter()
      .find_map(|&q| {
        trimmed.strip_prefix(q)
          .and_then(|rest| rest.strip_suffix(q))
      })
      .unwrap_or(trimmed);

    unquoted
      .replace("\\n", "\n")
      .replace("\\t", "\t")
}

/// Slice from the first `open` to the last `close` after it
fn outermost(text: &str, open: char, close: char) -> Option<&str>
{   let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// First `[ ... ]` span (leftmost `[` to rightmost `]`) parsed as a
/// JSON array
pub fn extract_json_array(text: &str) -> Option<Vec<serde_json::Value>>
{   let candidate = outermost(text, '[', ']')?;
    match serde_json::from_str::<serde_json::Value>(candidate)
    {   Ok(serde_json::Value::Array(items)) => Some(items)
      , Ok(_) => None
      , Err(e) => {
          debug!("Failed to parse JSON array: {}", e);
          None
        }
    }
}

/// First `{ ... }` span (leftmost `{` to rightmost `}`) parsed as a
/// JSON object
pub fn extract_json_object(
  text: &str
) -> Option<serde_json::Map<String, serde_json::Value>>
{   let candidate = outermost(text, '{', '}')?;
    match serde_json::from_str::<serde_json::Value>(candidate)
    {   Ok(serde_json::Value::Object(map)) => Some(map)
      , Ok(_) => None
      , Err(e) => {
          debug!("Failed to parse JSON object: {}", e);
          None
        }
    }
}

/// Bullet points listed under a `**Next Steps:**` header, up to the
/// next blank line
pub fn extract_next_steps(text: &str) -> Option<Vec<String>>
{   let section = NEXT_STEPS.captures(text)?.get(1)?.as_str();
    trace!("Next steps section: {:?}", section);

    let steps: Vec<String> = section
      .split('\n')
      .map(str::trim)
      .filter(|line| BULLET.is_match(line))
      .map(|line| BULLET.replace(line, "").trim().to_string())
      .filter(|line| !line.is_empty())
      .collect();

    (!steps.is_empty()).then_some(steps)
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn outermost_needs_close_after_open()
    {   assert_eq!(outermost("] then [", '[', ']'), None);
        assert_eq!(outermost("x [1] y [2] z", '[', ']'), Some("[1] y [2]"));
    }

    #[test]
    fn lone_quote_is_not_a_wrapper()
    {   assert_eq!(clean_text("\""), "\"");
        assert_eq!(clean_text("'abc\""), "'abc\"");
    }
}
