use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

/// Terminal prompts block, so they run on the blocking pool.
pub async fn text(prompt: &'static str) -> Result<String> {
    let value = tokio::task::spawn_blocking(move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await??;
    Ok(value)
}

pub async fn confirm(prompt: String) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(true)
            .interact()
    })
    .await??;
    Ok(answer)
}
