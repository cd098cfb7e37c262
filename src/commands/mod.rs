mod registry;

pub use registry::{all_commands, CommandInvocation};

use std::path::Path;

use crate::core::conversation::ChatController;
use crate::core::persona::Persona;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
}

pub fn process_input(controller: &mut ChatController, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(stripped) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = stripped.splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(controller, CommandInvocation { args })
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

/// One-line summary of every command and the main keys.
pub fn help_text() -> String {
    let commands: Vec<&str> = all_commands().iter().map(|c| c.usage).collect();
    format!(
        "{} | Ctrl+N new, Alt+Up/Down switch, Ctrl+D delete, Ctrl+P persona, Ctrl+G search, Ctrl+C quit",
        commands.join("  ")
    )
}

pub(super) fn handle_help(
    controller: &mut ChatController,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let name = invocation.args.trim_start_matches('/');
    if name.is_empty() {
        controller.set_status(help_text());
    } else if let Some(command) = registry::find_command(name) {
        controller.set_status(format!("{}: {}", command.usage, command.help));
    } else {
        controller.set_status(format!("Unknown command: /{name}"));
    }
    CommandResult::Continue
}

pub(super) fn handle_new(
    controller: &mut ChatController,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    match controller.new_chat() {
        Ok(_) => controller.set_status("New conversation"),
        Err(e) => controller.set_status(format!("Storage error: {e}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_delete(
    controller: &mut ChatController,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    match controller.delete_active() {
        Ok(()) => controller.set_status("Conversation deleted"),
        Err(e) => controller.set_status(format!("Storage error: {e}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_persona(
    controller: &mut ChatController,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        let names: Vec<&str> = Persona::ALL.iter().map(|p| p.display_name()).collect();
        controller.set_status(format!("Usage: /persona <name> ({})", names.join(", ")));
        return CommandResult::Continue;
    }

    match Persona::parse(invocation.args) {
        Some(persona) => match controller.set_persona(persona) {
            Ok(()) => {
                controller.save_config();
                controller.set_status(format!("Persona set: {persona}"));
            }
            Err(e) => controller.set_status(format!("Storage error: {e}")),
        },
        None => controller.set_status(format!("Unknown persona: {}", invocation.args)),
    }
    CommandResult::Continue
}

pub(super) fn handle_search(
    controller: &mut ChatController,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let action = invocation.args.split_whitespace().next().unwrap_or("");
    let enabled = match action.to_ascii_lowercase().as_str() {
        "" | "toggle" => !controller.agent().use_search,
        "on" | "true" | "yes" => true,
        "off" | "false" | "no" => false,
        _ => {
            controller.set_status("Usage: /search on|off");
            return CommandResult::Continue;
        }
    };

    controller.set_search(enabled);
    controller.save_config();
    let model = controller.policy().model_for(enabled).to_string();
    controller.set_status(format!(
        "Web search {} ({model})",
        if enabled { "on" } else { "off" }
    ));
    CommandResult::Continue
}

pub(super) fn handle_image(
    controller: &mut ChatController,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        controller.set_status("Usage: /image <path>");
        return CommandResult::Continue;
    }

    let path = Path::new(invocation.args);
    match controller.attach_image(path) {
        Ok(()) => controller.set_status(format!(
            "Image attached: {} (Esc to remove)",
            path.display()
        )),
        Err(e) => controller.set_status(format!("Attachment error: {e}")),
    }
    CommandResult::Continue
}

#[cfg(test)]
mod tests;
