use crate::cli::Commands;
use texpand_core::{storage, AbbreviationTable, Result};
use texpand_daemon::{daemon_status, daemon_worker_entry, start_daemon, stop_daemon};

pub fn handle_command(command: Option<Commands>) -> Result<()> {
    // Default: show the table when no command is provided
    match command.unwrap_or(Commands::List) {
        Commands::Add { abbr, replacement } => {
            edit_store(|table| table.upsert(&abbr, &replacement))
                .map(|_| println!("Abbreviation saved"))
        }
        Commands::Delete { abbr } => {
            edit_store(|table| table.delete(&abbr)).map(|_| println!("Abbreviation deleted"))
        }
        Commands::Rename {
            from,
            to,
            replacement,
        } => edit_store(|table| table.rename(&from, &to, &replacement))
            .map(|_| println!("Abbreviation renamed")),
        Commands::Ignore { abbr } => edit_store(|table| table.set_ignored(&abbr, true))
            .map(|_| println!("Abbreviation ignored; it stays in the table")),
        Commands::Unignore { abbr } => edit_store(|table| table.set_ignored(&abbr, false))
            .map(|_| println!("Abbreviation re-enabled")),
        Commands::List => list_abbreviations(),
        Commands::Start { port } => start_daemon(port),
        Commands::Stop => stop_daemon(),
        Commands::Status => daemon_status(),
        Commands::DaemonWorker { port } => daemon_worker_entry(port),
    }
}

/// Apply one table operation against the store file. A running daemon
/// watches the store and re-derives its listeners when this write lands;
/// edits made through the HTTP API skip the file round-trip entirely.
fn edit_store<F>(apply: F) -> Result<()>
where
    F: FnOnce(&mut AbbreviationTable) -> Result<()>,
{
    let mut table = storage::load_table()?;
    apply(&mut table)?;
    storage::save_table(&table)
}

fn list_abbreviations() -> Result<()> {
    let table = storage::load_table()?;

    if table.is_empty() {
        println!("No abbreviations yet. Add one with: texpand add -a brb -r \"be right back\"");
        return Ok(());
    }

    println!(
        "{:<4} {:<16} {:<40} {:<10} {}",
        "#", "ABBREVIATION", "REPLACEMENT", "STATE", "UPDATED"
    );

    for (idx, entry) in table.entries().iter().enumerate() {
        let state = if entry.ignored { "ignored" } else { "active" };
        println!(
            "{:<4} {:<16} {:<40} {:<10} {}",
            idx + 1,
            entry.source,
            preview(&entry.replacement),
            state,
            entry.formatted_time()
        );
    }

    Ok(())
}

/// First line of the replacement, shortened to fit the list column.
fn preview(replacement: &str) -> String {
    let first_line = replacement.lines().next().unwrap_or("");
    let mut preview: String = first_line.chars().take(37).collect();
    if first_line.chars().count() > 37 || replacement.lines().count() > 1 {
        preview.push_str("...");
    }
    preview
}
