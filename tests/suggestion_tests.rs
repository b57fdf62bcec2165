use std::collections::HashSet;

use agentcore_chat::suggestions::{
  sanitize_ids, suggestions_from_reply, SuggestionBatch, MAX_SUGGESTIONS
};

#[test]
fn batch_is_capped_with_distinct_ids()
{   let raw = r#"["One", "Two", "Three", "Four", "Five", "Six"]"#;
    let batch = SuggestionBatch::follow_up();
    let suggestions = suggestions_from_reply(raw, &batch);

    assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
    let ids: HashSet<&str> = suggestions.iter()
      .map(|s| s.id.as_str())
      .collect();
    assert_eq!(ids.len(), MAX_SUGGESTIONS);
    assert_eq!(suggestions[3].text, "Four");
}

#[test]
fn entries_emptied_by_sanitizing_do_not_count_toward_the_cap()
{   let raw = r#"["CUST-001", "One", 7, "Two", "Three", "Four", "Five"]"#;
    let suggestions = suggestions_from_reply(raw, &SuggestionBatch::Initial);

    let texts: Vec<&str> = suggestions.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["One", "Two", "Three", "Four"]);
    assert_eq!(suggestions[0].id, "initial-0");
    assert_eq!(suggestions[3].id, "initial-3");
}

#[test]
fn initial_batch_ids_are_stable()
{   let suggestions = suggestions_from_reply(
      "  [\"Show all available bonds\",\\n \"Check recent emails\"]  "
    , &SuggestionBatch::Initial
    );
    let ids: Vec<&str> = suggestions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["initial-0", "initial-1"]);
}

#[test]
fn follow_up_batches_never_share_ids()
{   let raw = r#"["a", "b"]"#;
    let first = suggestions_from_reply(raw, &SuggestionBatch::follow_up());
    let second = suggestions_from_reply(raw, &SuggestionBatch::follow_up());
    assert_ne!(first[0].id, second[0].id);
    assert!(first[0].id.starts_with("dynamic-0-"));
}

#[test]
fn internal_ids_are_removed()
{   assert_eq!(
      sanitize_ids("Get recommendations for CUST-001 today"),
      "Get recommendations for today"
    );
    assert_eq!(
      sanitize_ids("View Sarah Chen (CUST-002) profile"),
      "View Sarah Chen profile"
    );
    assert_eq!(sanitize_ids("Email CUST-003."), "Email.");
    assert_eq!(sanitize_ids("Show Government Bond Y"), "Show Government Bond Y");
}

#[test]
fn unusable_replies_degrade_to_nothing()
{   let batch = SuggestionBatch::Initial;
    assert!(suggestions_from_reply("I cannot help with that.", &batch).is_empty());
    assert!(suggestions_from_reply("[]", &batch).is_empty());
    assert!(suggestions_from_reply(r#"{"a": 1}"#, &batch).is_empty());

    let mixed = suggestions_from_reply(r#"[1, "CUST-004", "Real one"]"#, &batch);
    assert_eq!(mixed.len(), 1);
    assert_eq!(mixed[0].text, "Real one");
    assert_eq!(mixed[0].id, "initial-0");
}
