//! sprintsync suggest command implementation.

use std::io::Write;

use serde::Serialize;

use crate::cli::Context;
use crate::error::Result;
use crate::output::emit_success;
use crate::stream;

pub async fn run(context: &Context, title: String) -> Result<()> {
    let api = context.client();
    let mut suggestion = stream::request_suggestion(&api, &title).await?;

    let live = !context.options.json && !context.options.quiet;
    let mut printed = 0usize;
    let mut description = String::new();

    while let Some(item) = suggestion.next().await {
        let chunk = item?;
        if live {
            // Chunks carry the full content so far; print only the new tail.
            let tail = chunk.content.get(printed..).unwrap_or(&chunk.content);
            print!("{tail}");
            let _ = std::io::stdout().flush();
        }
        printed = chunk.content.len();
        description = chunk.content;
    }
    if live && !description.is_empty() {
        println!();
    }

    #[derive(Serialize)]
    struct SuggestView<'a> {
        title: &'a str,
        description: &'a str,
    }
    emit_success(
        context.options,
        "suggest",
        &SuggestView {
            title: &title,
            description: &description,
        },
        None,
    )
}
