//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use tracing::debug;

use crate::core::chat_stream::{StreamDispatcher, StreamEvent};
use crate::core::conversation::ChatController;
use crate::core::message::GroundingSource;
use crate::core::reducer::StreamOutcome;

/// Stream the reply to `prompt` into `out` as it arrives, followed by any
/// sources. Unless `ephemeral`, the exchange is saved in a fresh
/// conversation: the active one when it is still empty, otherwise a new one.
pub async fn say_to<W: Write>(
    controller: &mut ChatController,
    prompt: &str,
    ephemeral: bool,
    out: &mut W,
) -> Result<StreamOutcome, Box<dyn Error>> {
    let active_has_messages = controller
        .active_session()
        .is_some_and(|session| !session.messages.is_empty());
    if !ephemeral && active_has_messages {
        controller.new_chat()?;
    }

    let Some(pending) = controller.submit(prompt)? else {
        return Ok(StreamOutcome::Completed);
    };
    let session_id = pending.session_id.clone();

    let (dispatcher, mut rx) = StreamDispatcher::new(controller.generator());
    dispatcher.spawn(pending.session_id, pending.request);

    let mut outcome = StreamOutcome::Completed;
    while let Some((id, event)) = rx.recv().await {
        if let StreamEvent::Chunk(chunk) = &event {
            write!(out, "{}", chunk.text)?;
            out.flush()?;
        }
        if let Some(done) = controller.apply_event(&id, event)? {
            outcome = done;
            break;
        }
    }
    writeln!(out)?;

    let sources = controller
        .store()
        .get(&session_id)
        .and_then(|session| session.last_message())
        .filter(|message| message.is_assistant())
        .and_then(|message| message.grounding_sources.clone())
        .unwrap_or_default();
    write_sources(out, &sources)?;

    debug!(%session_id, ?outcome, "say finished");
    Ok(outcome)
}

fn write_sources<W: Write>(out: &mut W, sources: &[GroundingSource]) -> io::Result<()> {
    if sources.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nSources:")?;
    for (index, source) in sources.iter().enumerate() {
        writeln!(out, "  [{}] {} - {}", index + 1, source.title, source.uri)?;
    }
    Ok(())
}

pub async fn run_say(
    mut controller: ChatController,
    prompt: &str,
    ephemeral: bool,
) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout();
    match say_to(&mut controller, prompt, ephemeral, &mut stdout).await? {
        StreamOutcome::Completed => Ok(()),
        StreamOutcome::Failed { message } => {
            eprintln!("\n❌ Error: {message}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_stream::StreamChunk;
    use crate::utils::test_utils::{create_test_controller, ScriptedGenerator};

    #[tokio::test]
    async fn prints_reply_then_sources() {
        let generator = ScriptedGenerator::new(vec![
            StreamChunk::text("The sky "),
            StreamChunk::text("is blue.")
                .with_sources(vec![GroundingSource::new("Optics", "https://optics.example")]),
        ]);
        let (mut controller, _storage) = create_test_controller(generator);
        let mut out = Vec::new();

        let outcome = say_to(&mut controller, "why blue?", false, &mut out)
            .await
            .expect("say");

        assert_eq!(outcome, StreamOutcome::Completed);
        let printed = String::from_utf8(out).expect("utf8");
        assert_eq!(
            printed,
            "The sky is blue.\n\nSources:\n  [1] Optics - https://optics.example\n"
        );
    }

    #[tokio::test]
    async fn persistent_mode_fills_an_empty_active_session() {
        let generator = ScriptedGenerator::new(vec![StreamChunk::text("ok")]);
        let (mut controller, storage) = create_test_controller(generator);
        let mut out = Vec::new();

        say_to(&mut controller, "remember me", false, &mut out)
            .await
            .expect("say");

        assert_eq!(controller.sessions().len(), 1);
        let saved = &controller.sessions()[0];
        assert_eq!(saved.title, "remember me");
        assert_eq!(saved.messages.len(), 2);
        let blob = storage.blob().expect("saved");
        assert!(blob.contains("remember me"));
        assert!(!blob.contains("New Conversation"));
    }

    #[tokio::test]
    async fn persistent_mode_starts_a_new_session_after_a_used_one() {
        let generator = ScriptedGenerator::new(vec![StreamChunk::text("ok")]);
        let (mut controller, _storage) = create_test_controller(generator);
        let mut out = Vec::new();

        say_to(&mut controller, "first question", false, &mut out)
            .await
            .expect("say");
        say_to(&mut controller, "second question", false, &mut out)
            .await
            .expect("say");

        let sessions = controller.sessions();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].title, "second question");
        assert_eq!(sessions[1].title, "first question");
        assert!(sessions.iter().all(|s| s.messages.len() == 2));
    }

    #[tokio::test]
    async fn ephemeral_mode_uses_the_existing_session() {
        let generator = ScriptedGenerator::new(vec![StreamChunk::text("ok")]);
        let (mut controller, _storage) = create_test_controller(generator);
        let mut out = Vec::new();

        say_to(&mut controller, "hello", true, &mut out)
            .await
            .expect("say");
        assert_eq!(controller.sessions().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_reported_as_outcome() {
        let generator = ScriptedGenerator::failing_on_open("API returned 403: denied");
        let (mut controller, _storage) = create_test_controller(generator);
        let mut out = Vec::new();

        let outcome = say_to(&mut controller, "hello", true, &mut out)
            .await
            .expect("say");
        assert!(matches!(outcome, StreamOutcome::Failed { message } if message.contains("403")));
    }
}
