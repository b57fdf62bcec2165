//! Follow-up prompt suggestions.
//!
//! The agent is asked for a JSON array of short prompts, and the array is
//! scraped out of whatever text comes back. A reply that does not contain
//! one yields no suggestions rather than an error.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::LazyLock;
use log::{debug, warn};
use regex::Regex;

use crate::client::AgentClient;
use crate::parser::{clean_text, extract_json_array};
use crate::{ConversationMessage, InvokeRequest, PromptSuggestion};

pub const MAX_SUGGESTIONS: usize = 4;

/// Conversation turns sent as context for follow-ups
pub const FOLLOW_UP_CONTEXT_TURNS: usize = 6;

pub const INITIAL_SUGGESTION_PROMPT: &str = "\
You are helping a user get started with Bank X Financial Assistant. \
Suggest 4 brief, actionable prompts they might want to try first.

Available capabilities:
- list_available_bonds: Show all 4 bond products
- get_customer_profile: View customer details
- get_product_details: Get detailed bond information
- search_market_data: Research market trends
- send_email: Email qualified customers about bonds
- get_recent_emails: View sent email history

IMPORTANT: Do NOT include customer IDs (like CUST-001) or any internal \
identifiers in suggestions. Use customer names or generic references only.

Respond ONLY with a JSON array of 4 short prompts (each 3-8 words), like:
[\"Show all available bonds\", \"View customer portfolios\", \
\"Email about Government Bond Y\", \"Check recent emails\"]";

pub const FOLLOW_UP_SUGGESTION_PROMPT: &str = "\
You are the Bank X Suggestion Agent. Analyze the recent conversation and \
suggest the most natural and helpful next actions.

AVAILABLE CAPABILITIES:
- list_available_bonds: Show all bond products
- get_customer_profile(customer_id): View detailed customer profile
- get_product_details(product_name): Get bond information
- search_market_data(product_type): Research market trends
- send_email: Email customers about bonds (requires approval)
- get_recent_emails: View sent email history
- get_bond_recommendations(customer_id): Get personalized bond recommendations

INSTRUCTIONS:
1. Consider what the user just learned or accomplished
2. Suggest logical next steps that build on the conversation
3. If customers were mentioned, use their FULL NAMES \
(e.g., \"Get recommendations for Sarah Chen\") - NEVER use customer IDs
4. For generic suggestions about customers, use phrases like \
\"Find suitable customers\" or \"View customer profiles\"
5. Mix different types of actions (view data, take action, research)
6. Keep suggestions concise (3-10 words each)

CRITICAL: NEVER include customer IDs (CUST-001, CUST-002, etc.), preview \
IDs, or internal identifiers. Always use customer names when referring to \
specific people.

Respond ONLY with a JSON array of 3-4 contextual prompts:
[\"Specific actionable prompt 1\", \"Related prompt 2\", \"Next logical step 3\"]";

static ID_IN_PARENS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\s*\(\s*[A-Z]{2,}-\d+\s*\)")
    .expect("parenthesised id pattern is valid")
});

static INTERNAL_ID: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\b[A-Z]{2,}-\d+\b")
    .expect("internal id pattern is valid")
});

static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"[ \t]{2,}")
    .expect("space run pattern is valid")
});

static SPACE_BEFORE_PUNCT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\s+([,.;:!?])")
    .expect("punctuation pattern is valid")
});

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Remove internal identifiers such as `CUST-001` from display text
pub fn sanitize_ids(text: &str) -> String
{   let text = ID_IN_PARENS.replace_all(text, "");
    let text = INTERNAL_ID.replace_all(&text, "");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Which batch a set of suggestions belongs to; decides the ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionBatch
{   /// Greeting batch, ids `initial-<n>`
    Initial
  , /// Batch after an assistant turn, ids `dynamic-<n>-<stamp>`
    FollowUp { stamp: i64 }
}

impl SuggestionBatch
{   /// A follow-up batch whose stamp is later than every earlier one
    pub fn follow_up() -> Self
    {   SuggestionBatch::FollowUp { stamp: next_stamp() }
    }

    fn id(&self, index: usize) -> String
    {   match self
        {   SuggestionBatch::Initial => format!("initial-{}", index)
          , SuggestionBatch::FollowUp { stamp } => {
              format!("dynamic-{}-{}", index, stamp)
            }
        }
    }
}

// Millisecond clock, bumped when two batches land in the same tick
fn next_stamp() -> i64
{   let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop
    {   let stamp = now.max(last + 1);
        match LAST_STAMP.compare_exchange(
          last, stamp, Ordering::Relaxed, Ordering::Relaxed
        )
        {   Ok(_) => return stamp
          , Err(actual) => last = actual
        }
    }
}

/// Turn a raw agent reply into at most `MAX_SUGGESTIONS` sanitised
/// suggestions. Anything unusable yields an empty list.
pub fn suggestions_from_reply(
  raw: &str
, batch: &SuggestionBatch
) -> Vec<PromptSuggestion>
{   let cleaned = clean_text(raw);
    let Some(items) = extract_json_array(&cleaned)
    else
    {   warn!("No JSON array in suggestion reply");
        return vec![];
    };

    let suggestions: Vec<PromptSuggestion> = items.iter()
      .filter_map(|item| item.as_str())
      .map(sanitize_ids)
      .filter(|text| !text.is_empty())
      .take(MAX_SUGGESTIONS)
      .enumerate()
      .map(|(index, text)| PromptSuggestion
      {   id: batch.id(index)
        , text
      })
      .collect();

    debug!("Parsed {} suggestions", suggestions.len());
    suggestions
}

/// Asks the agent for suggestion batches
pub struct SuggestionGenerator<'a>
{   client: &'a AgentClient
}

impl<'a> SuggestionGenerator<'a>
{   pub fn new(client: &'a AgentClient) -> Self
    {   SuggestionGenerator { client }
    }

    /// Greeting suggestions, no conversation context
    pub async fn initial(&self) -> Vec<PromptSuggestion>
    {   debug!("Generating initial suggestions");
        let request = InvokeRequest::new(INITIAL_SUGGESTION_PROMPT);
        self.generate(request, SuggestionBatch::Initial).await
    }

    /// Suggestions that follow on from the last few turns
    pub async fn follow_ups(
      &self
    , conversation: &[ConversationMessage]
    ) -> Vec<PromptSuggestion>
    {   let skip = conversation.len()
          .saturating_sub(FOLLOW_UP_CONTEXT_TURNS);
        let recent = conversation[skip..].to_vec();
        debug!(
          "Generating follow-up suggestions from {} turns"
        , recent.len()
        );
        let request = InvokeRequest::new(FOLLOW_UP_SUGGESTION_PROMPT)
          .with_history(recent);
        self.generate(request, SuggestionBatch::follow_up()).await
    }

    async fn generate(
      &self
    , request: InvokeRequest
    , batch: SuggestionBatch
    ) -> Vec<PromptSuggestion>
    {   let mut streamed = String::new();
        let mut collect = |chunk: &str| streamed.push_str(chunk);
        let reply = self.client
          .invoke_streaming(&request, &mut collect)
          .await;

        match reply
        {   Ok(reply) => {
              let raw = if reply.response.is_empty()
              {   streamed.as_str()
              } else
              {   reply.response.as_str()
              };
              suggestions_from_reply(raw, &batch)
            }
          , Err(e) => {
              warn!("Error generating suggestions: {}", e);
              vec![]
            }
        }
    }
}
