use std::error::Error;
use std::io::{self, Write};

use crate::core::config::path_display;
use crate::core::session::Session;
use crate::core::store::{read_sessions, FileStorage, SessionStorage};

pub fn write_session_list<W: Write>(out: &mut W, sessions: &[Session]) -> io::Result<()> {
    if sessions.is_empty() {
        writeln!(out, "  No saved conversations.")?;
        return Ok(());
    }

    for session in sessions {
        writeln!(
            out,
            "  • {} ({}, {} messages, updated {})",
            session.title,
            session.persona,
            session.messages.len(),
            session.updated_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}

pub fn list_sessions(ephemeral: bool) -> Result<(), Box<dyn Error>> {
    if ephemeral {
        println!("Ephemeral mode keeps no saved conversations.");
        return Ok(());
    }

    let storage = FileStorage::default_location()?;
    let sessions = read_sessions(&storage)?;
    println!("Saved conversations (from {}):\n", path_display(storage.path()));
    write_session_list(&mut io::stdout(), &sessions)?;
    println!("\n💡 Location key: {}", storage.location());
    Ok(())
}
