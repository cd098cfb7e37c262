use super::CommandResult;
use crate::core::conversation::ChatController;

pub type CommandHandler = fn(&mut ChatController, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help [command]",
        help: "List commands and keys, or describe one command",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new conversation",
        handler: super::handle_new,
    },
    Command {
        name: "delete",
        usage: "/delete",
        help: "Delete the current conversation",
        handler: super::handle_delete,
    },
    Command {
        name: "persona",
        usage: "/persona <name>",
        help: "Switch persona (general, coder, writer, analyst)",
        handler: super::handle_persona,
    },
    Command {
        name: "search",
        usage: "/search on|off",
        help: "Toggle web search grounding",
        handler: super::handle_search,
    },
    Command {
        name: "image",
        usage: "/image <path>",
        help: "Attach an image to the next message",
        handler: super::handle_image,
    },
];
