//! Main chat event loop
//!
//! The loop owns the [`ChatController`] and therefore the session store.
//! Generation streams run on background tasks and report back through the
//! dispatcher's channel; their events are applied here between redraws.

mod keybindings;
mod lifecycle;
mod state;

pub use keybindings::{map_key, KeyAction, KeyLoopAction};
pub use lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
pub use state::UiState;

use std::error::Error;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyEventKind, MouseEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::commands::{process_input, CommandResult};
use crate::core::chat_stream::{StreamDispatcher, StreamEvent};
use crate::core::conversation::ChatController;
use crate::core::reducer::ReducerError;
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const MOUSE_SCROLL_LINES: u16 = 3;

pub async fn run_chat(mut controller: ChatController) -> Result<(), Box<dyn Error>> {
    let (dispatcher, mut events) = StreamDispatcher::new(controller.generator());
    let mut terminal = setup_terminal()?;
    info!(sessions = controller.sessions().len(), "Chat UI started");

    let result = event_loop(&mut terminal, &mut controller, &dispatcher, &mut events).await;

    dispatcher.shutdown();
    restore_terminal(&mut terminal)?;
    info!("Chat UI stopped");
    result
}

async fn event_loop(
    terminal: &mut ChatTerminal,
    controller: &mut ChatController,
    dispatcher: &StreamDispatcher,
    events: &mut mpsc::UnboundedReceiver<(String, StreamEvent)>,
) -> Result<(), Box<dyn Error>> {
    let theme = Theme::default();
    let mut state = UiState::new();

    loop {
        terminal.draw(|f| ui(f, controller, &mut state, &theme))?;

        if event::poll(POLL_INTERVAL)? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
                Event::Paste(text) => {
                    state.insert_str(&text);
                    KeyAction::Ignore
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => {
                        state.scroll_up(MOUSE_SCROLL_LINES);
                        KeyAction::Ignore
                    }
                    MouseEventKind::ScrollDown => {
                        state.scroll_down(MOUSE_SCROLL_LINES);
                        KeyAction::Ignore
                    }
                    _ => KeyAction::Ignore,
                },
                _ => KeyAction::Ignore,
            };

            if handle_action(controller, &mut state, dispatcher, action) == KeyLoopAction::Break {
                return Ok(());
            }
        }

        drain_stream_events(controller, events);
        tokio::task::yield_now().await;
    }
}

/// Apply every stream event that has arrived since the last frame.
pub fn drain_stream_events(
    controller: &mut ChatController,
    events: &mut mpsc::UnboundedReceiver<(String, StreamEvent)>,
) {
    while let Ok((session_id, event)) = events.try_recv() {
        if let Err(err) = controller.apply_event(&session_id, event) {
            warn!(%session_id, error = %err, "Failed to persist streamed reply");
            controller.set_status(format!("Storage error: {err}"));
        }
    }
}

pub fn handle_action(
    controller: &mut ChatController,
    state: &mut UiState,
    dispatcher: &StreamDispatcher,
    action: KeyAction,
) -> KeyLoopAction {
    let result = match action {
        KeyAction::Quit => return KeyLoopAction::Break,
        KeyAction::Submit => {
            submit(controller, state, dispatcher);
            Ok(())
        }
        KeyAction::NewChat => controller.new_chat().map(|_| state.scroll_to_bottom()),
        KeyAction::DeleteSession => controller.delete_active().map(|()| state.scroll_to_bottom()),
        KeyAction::NextSession => controller.select_next().map(|()| state.scroll_to_bottom()),
        KeyAction::PreviousSession => {
            controller.select_previous().map(|()| state.scroll_to_bottom())
        }
        KeyAction::CyclePersona => controller.cycle_persona().map(|persona| {
            controller.save_config();
            controller.set_status(format!("Persona set: {persona}"));
        }),
        KeyAction::ToggleSearch => {
            let enabled = controller.toggle_search();
            controller.save_config();
            controller.set_status(format!(
                "Web search {}",
                if enabled { "on" } else { "off" }
            ));
            Ok(())
        }
        KeyAction::ClearAttachment => {
            if controller.pending_image().is_some() {
                controller.clear_attachment();
                controller.set_status("Attachment removed");
            } else {
                controller.clear_status();
            }
            Ok(())
        }
        KeyAction::Insert(ch) => {
            state.insert_char(ch);
            Ok(())
        }
        KeyAction::InsertNewline => {
            state.insert_newline();
            Ok(())
        }
        KeyAction::UseSuggestion => {
            if controller
                .active_session()
                .is_some_and(|session| session.messages.is_empty())
            {
                state.cycle_suggestion();
            }
            Ok(())
        }
        KeyAction::Backspace => {
            state.backspace();
            Ok(())
        }
        KeyAction::Delete => {
            state.delete();
            Ok(())
        }
        KeyAction::CursorLeft => {
            state.move_left();
            Ok(())
        }
        KeyAction::CursorRight => {
            state.move_right();
            Ok(())
        }
        KeyAction::CursorHome => {
            state.move_home();
            Ok(())
        }
        KeyAction::CursorEnd => {
            state.move_end();
            Ok(())
        }
        KeyAction::ScrollUp => {
            state.scroll_up(1);
            Ok(())
        }
        KeyAction::ScrollDown => {
            state.scroll_down(1);
            Ok(())
        }
        KeyAction::PageUp => {
            state.scroll_up(state.viewport_height.max(1));
            Ok(())
        }
        KeyAction::PageDown => {
            state.scroll_down(state.viewport_height.max(1));
            Ok(())
        }
        KeyAction::Ignore => Ok(()),
    };

    if let Err(err) = result {
        warn!(error = %err, ?action, "Session update failed");
        controller.set_status(format!("Storage error: {err}"));
    }
    KeyLoopAction::Continue
}

fn submit(controller: &mut ChatController, state: &mut UiState, dispatcher: &StreamDispatcher) {
    if controller.active_is_generating() {
        controller.set_status("Still generating a reply in this conversation");
        return;
    }

    let input = state.take_input();
    let text = match process_input(controller, &input) {
        CommandResult::Continue => return,
        CommandResult::ProcessAsMessage(text) => text,
    };

    match controller.submit(&text) {
        Ok(Some(pending)) => {
            debug!(session_id = %pending.session_id, "Dispatching generation");
            state.scroll_to_bottom();
            dispatcher.spawn(pending.session_id, pending.request);
        }
        Ok(None) => {}
        Err(ReducerError::AlreadyGenerating(_)) => {
            state.set_input(input);
            controller.set_status("Still generating a reply in this conversation");
        }
        Err(err) => {
            state.set_input(input);
            controller.set_status(format!("Storage error: {err}"));
        }
    }
}
