/// The AI writing assistant loop.
///
/// Runs as a spawned task: one streamed model call, then each returned tool
/// call is shipped to the event loop for execution (a `ToolRequest` with a
/// oneshot reply) and confirmed back to the model in its own follow-up
/// round-trip, so the model can word a reply about what it did. The task
/// never touches the document itself — every mutation happens on the event
/// loop thread.
use anyhow::Result;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::client::{Client, Message};
use crate::tools;
use crate::tui::UiEvent;

pub const SYSTEM_PROMPT: &str = "You are a helpful writing assistant for the marky note pad. \
You have tools to read and write to the note. When asked to change text, use the appropriate tool. \
Always keep your responses concise and helpful.";

/// The first user message: document snapshot plus the request.
pub fn context_prompt(document: &str, user_message: &str) -> String {
    format!(
        "CONTEXT: The user is writing a note. The current content of the note is:\n\n\
         {document}\n\n\
         USER REQUEST: {user_message}"
    )
}

/// Run one chat turn. Emits `ChatChunk` events while streaming, a
/// `ToolRequest` per tool call, and `ChatDone` at the end. Errors propagate
/// to the caller, which surfaces them as a single `ChatError`.
pub async fn run_chat(
    user_message: String,
    document: String,
    client: Client,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
) -> Result<()> {
    let tools = tools::all_definitions();
    let messages = vec![Message::user(context_prompt(&document, &user_message))];

    let tx = ui_tx.clone();
    let response = client
        .chat(SYSTEM_PROMPT, &messages, &tools, move |chunk| {
            let _ = tx.send(UiEvent::ChatChunk(chunk.to_string()));
        })
        .await?;

    if response.tool_calls.is_empty() {
        if response.text.trim().is_empty() {
            let _ = ui_tx.send(UiEvent::ChatChunk("I processed your request.".to_string()));
        }
        let _ = ui_tx.send(UiEvent::ChatDone);
        return Ok(());
    }

    // Tool calls run sequentially, each with its own confirmation round-trip
    for call in &response.tool_calls {
        let result = match serde_json::from_str::<Value>(&call.arguments) {
            Ok(args) => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if ui_tx
                    .send(UiEvent::ToolRequest {
                        name: call.name.clone(),
                        args,
                        reply: reply_tx,
                    })
                    .is_err()
                {
                    // Event loop is gone — nothing left to talk to
                    return Ok(());
                }
                reply_rx
                    .await
                    .unwrap_or_else(|_| "[tool dispatch unavailable]".to_string())
            }
            Err(e) => format!("[Error parsing tool arguments: {e}]"),
        };

        let follow_messages = vec![
            Message::user(user_message.clone()),
            Message::assistant(response.text.clone()),
            Message::tool_result(call.id.clone(), result),
        ];
        let tx = ui_tx.clone();
        let follow = client
            .chat(SYSTEM_PROMPT, &follow_messages, &tools, move |chunk| {
                let _ = tx.send(UiEvent::ChatChunk(chunk.to_string()));
            })
            .await?;
        if follow.text.trim().is_empty() {
            let _ = ui_tx.send(UiEvent::ChatChunk("Process completed.".to_string()));
        }
    }

    let _ = ui_tx.send(UiEvent::ChatDone);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prompt_embeds_document_and_request() {
        let prompt = context_prompt("# My note", "make it longer");
        assert!(prompt.starts_with("CONTEXT:"));
        assert!(prompt.contains("# My note"));
        assert!(prompt.ends_with("USER REQUEST: make it longer"));
    }
}
