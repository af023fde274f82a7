use anyhow::Result;
use std::io::Write;
use tracing::info;

use crate::api::{ChatCompletion, ChatRequest};
use crate::config::Settings;
use crate::prompt::{build_messages, build_system_prompt, RISOR_DESCRIPTIONS};

pub const SEPARATOR: &str = "--------------------";

/// Prints the prompt, asks the backend built by `connect` the configured
/// question, then prints the token usage and the first reply.
///
/// `connect` runs only after the prompt is out, so a missing key fails the
/// same way a failed call does. Nothing after the first separator is written
/// unless the call succeeds. With `dry_run` set, `connect` is never invoked.
pub async fn run<W, B, F>(connect: F, settings: &Settings, out: &mut W) -> Result<()>
where
    W: Write,
    B: ChatCompletion,
    F: FnOnce() -> crate::error::Result<B>,
{
    let prompt = build_system_prompt(RISOR_DESCRIPTIONS);
    writeln!(out, "{}", prompt)?;
    writeln!(out, "{}", SEPARATOR)?;
    out.flush()?;

    if settings.dry_run {
        info!("dry run, skipping the API call");
        return Ok(());
    }
    let backend = connect()?;

    let request = ChatRequest {
        model_id: settings.model_id.clone(),
        messages: build_messages(&prompt, &settings.question),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    };
    let response = backend.complete(&request).await?;
    info!(total_tokens = response.total_tokens, "completion received");

    writeln!(out, "usage total_tokens: {}", response.total_tokens)?;
    writeln!(out, "{}", SEPARATOR)?;

    // parse_response guarantees at least one choice
    let reply = response.choices.first().map(String::as_str).unwrap_or_default();
    writeln!(out, "{}", reply)?;
    out.flush()?;

    Ok(())
}
