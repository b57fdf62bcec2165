//! Terminal chat against a local agent runtime or the API gateway.
//!
//! Usage: `agent-chat [config.json]`. Without a config file the
//! `AGENT_*` environment variables are used; gateway mode reads its
//! bearer token from `AGENT_ACCESS_TOKEN`.

use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use log::info;

use agentcore_chat::auth::EnvToken;
use agentcore_chat::session::ChatSession;
use agentcore_chat::suggestions::{SuggestionGenerator, FOLLOW_UP_CONTEXT_TURNS};
use agentcore_chat::{AgentClient, AgentConfig, PromptSuggestion};

fn print_suggestions(suggestions: &[PromptSuggestion])
{   if suggestions.is_empty()
    {   return;
    }
    println!("\nTry:");
    for s in suggestions
    {   println!("  - {}", s.text);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>>
{   env_logger::init();

    let config = match std::env::args().nth(1)
    {   Some(path) => AgentConfig::from_json_file(path)?
      , None => AgentConfig::from_env()
    };
    info!(
      "Starting agent-chat ({} mode, region {})"
    , if config.local_dev { "local" } else { "gateway" }
    , config.region
    );

    let client = AgentClient::new(config, Arc::new(EnvToken))?;
    let mut session = ChatSession::new();

    print_suggestions(&SuggestionGenerator::new(&client).initial().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop
    {   print!("\n> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await?
        else { break };

        match line.trim()
        {   "" => continue
          , "/quit" => break
          , "/reset" => {
              session.reset();
              println!("(conversation cleared)");
              continue;
            }
          , _ => {}
        }

        let mut print_chunk = |chunk: &str| {
          print!("{}", chunk);
          let _ = std::io::stdout().flush();
        };
        match session.send(&client, &line, &mut print_chunk).await
        {   Ok(_) => {
              println!();
              if let Some(steps) = session.next_steps()
              {   println!("\nNext steps:");
                  for step in steps
                  {   println!("  * {}", step);
                  }
              }
              let history = session.history_window(FOLLOW_UP_CONTEXT_TURNS);
              print_suggestions(
                &SuggestionGenerator::new(&client).follow_ups(&history).await
              );
            }
          , Err(_) => {
              if let Some(err) = session.last_error()
              {   eprintln!("\nError: {}", err);
                  if let Some(details) = err.details_pretty()
                  {   eprintln!("{}", details);
                  }
              }
            }
        }
    }
    Ok(())
}
