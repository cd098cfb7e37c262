use super::*;
use crate::core::config::Config;
use crate::core::persona::DEFAULT_PRO_MODEL;
use crate::utils::test_utils::{create_test_controller, ScriptedGenerator};
use std::io::Write;
use tempfile::tempdir;

fn controller() -> ChatController {
    create_test_controller(ScriptedGenerator::default()).0
}

#[test]
fn plain_text_is_processed_as_message() {
    let mut controller = controller();
    let result = process_input(&mut controller, "hello there");
    assert!(matches!(result, CommandResult::ProcessAsMessage(text) if text == "hello there"));
}

#[test]
fn unknown_command_is_processed_as_message() {
    let mut controller = controller();
    let result = process_input(&mut controller, "/usr/bin is a path");
    assert!(matches!(result, CommandResult::ProcessAsMessage(_)));
}

#[test]
fn new_command_creates_and_activates_a_session() {
    let mut controller = controller();
    let before = controller.store().active_id().to_string();

    let result = process_input(&mut controller, "/new");
    assert!(matches!(result, CommandResult::Continue));
    assert_eq!(controller.sessions().len(), 2);
    assert_ne!(controller.store().active_id(), before);
    assert_eq!(controller.status(), Some("New conversation"));
}

#[test]
fn delete_command_removes_active_session() {
    let mut controller = controller();
    process_input(&mut controller, "/new");
    let doomed = controller.store().active_id().to_string();

    process_input(&mut controller, "/DELETE");
    assert_eq!(controller.sessions().len(), 1);
    assert!(controller.store().get(&doomed).is_none());
}

#[test]
fn persona_command_accepts_aliases_and_saves_config() {
    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("config.toml");
    let mut controller = controller().with_config_path(config_path.clone());

    process_input(&mut controller, "/persona coder");
    assert_eq!(controller.agent().persona, Persona::CodingSpecialist);
    assert_eq!(controller.status(), Some("Persona set: Coding Specialist"));

    let saved = Config::load_from_path(&config_path).expect("saved config");
    assert_eq!(saved.default_persona, Some(Persona::CodingSpecialist));
}

#[test]
fn persona_command_reports_unknown_names() {
    let mut controller = controller();
    process_input(&mut controller, "/persona pirate");
    assert_eq!(controller.agent().persona, Persona::GeneralAssistant);
    assert_eq!(controller.status(), Some("Unknown persona: pirate"));

    process_input(&mut controller, "/persona");
    assert!(controller
        .status()
        .is_some_and(|s| s.starts_with("Usage: /persona")));
}

#[test]
fn search_command_switches_mode() {
    let mut controller = controller();

    process_input(&mut controller, "/search on");
    assert!(controller.agent().use_search);
    assert_eq!(
        controller.status(),
        Some(format!("Web search on ({DEFAULT_PRO_MODEL})").as_str())
    );

    process_input(&mut controller, "/search off");
    assert!(!controller.agent().use_search);

    process_input(&mut controller, "/search");
    assert!(controller.agent().use_search);

    process_input(&mut controller, "/search maybe");
    assert_eq!(controller.status(), Some("Usage: /search on|off"));
    assert!(controller.agent().use_search);
}

#[test]
fn image_command_attaches_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".jpg")
        .tempfile()
        .expect("tempfile");
    file.write_all(b"jpeg bytes").expect("write");

    let mut controller = controller();
    let input = format!("/image {}", file.path().display());
    process_input(&mut controller, &input);

    assert!(controller
        .pending_image()
        .is_some_and(|uri| uri.starts_with("data:image/jpeg;base64,")));
}

#[test]
fn image_command_reports_missing_file() {
    let mut controller = controller();
    process_input(&mut controller, "/image /definitely/not/here.png");
    assert!(controller.pending_image().is_none());
    assert!(controller
        .status()
        .is_some_and(|s| s.starts_with("Attachment error")));
}

#[test]
fn help_lists_every_command() {
    let mut controller = controller();
    process_input(&mut controller, "/help");
    let status = controller.status().expect("help status");
    for command in all_commands() {
        assert!(status.contains(command.usage), "missing {}", command.usage);
    }
}

#[test]
fn help_with_a_name_describes_that_command() {
    let mut controller = controller();
    process_input(&mut controller, "/help persona");
    assert_eq!(
        controller.status(),
        Some("/persona <name>: Switch persona (general, coder, writer, analyst)")
    );

    process_input(&mut controller, "/help /image");
    assert_eq!(
        controller.status(),
        Some("/image <path>: Attach an image to the next message")
    );

    process_input(&mut controller, "/help nope");
    assert_eq!(controller.status(), Some("Unknown command: /nope"));
}
