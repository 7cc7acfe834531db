use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use tracing::{info, warn};

use crate::commands::write_content_filter;
use crate::console::Console;
use crate::gateway::{LocalGateway, RemoteGateway};
use crate::model::CompletionRequest;

const QUESTION_PROMPT: &str = "Enter your question: ";
const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.0;

fn read_question<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<String> {
    let question = console.ask(QUESTION_PROMPT)?;
    if question.trim().is_empty() {
        bail!("No question entered");
    }
    writeln!(console.out(), "You entered: {question}")?;
    Ok(question)
}

/// Sends the question as a text completion and prints one `Result:` line
/// per returned choice, in response order.
pub async fn ask_remote<R, W, G>(console: &mut Console<R, W>, gateway: &G) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: RemoteGateway,
{
    let question = read_question(console)?;
    let response = gateway
        .completions(CompletionRequest {
            deployment: gateway.deployment().to_string(),
            prompt: question,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        })
        .await?;

    if response.choices.is_empty() {
        warn!("completion response contained no choices");
    }
    let out = console.out();
    for choice in &response.choices {
        if let Some(filters) = &choice.content_filter_results {
            write_content_filter(out, filters)?;
        }
        writeln!(out, "Result: {}", choice.text.trim())?;
    }
    Ok(())
}

pub async fn ask_local<R, W, G>(console: &mut Console<R, W>, gateway: &G) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: LocalGateway,
{
    info!(model = gateway.model_name(), "using local model");
    let question = read_question(console)?;
    let completion = gateway.generate(question).await?;
    writeln!(console.out(), "Response:\n{}", completion.trim())?;
    Ok(())
}
