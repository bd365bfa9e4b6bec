use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "texpand",
    version = env!("CARGO_PKG_VERSION"),
    about = "texpand - background text expansion",
    long_about = "texpand watches your typing and replaces registered abbreviations \
                  with their expansion text the moment you finish the word."
)]
pub struct Texpand {
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new abbreviation or update an existing one
    Add {
        #[clap(long, short = 'a', help = "Abbreviation to expand")]
        abbr: String,

        #[clap(long, short = 'r', help = "Replacement text")]
        replacement: String,
    },
    /// Delete an abbreviation
    Delete {
        #[clap(long, short, help = "Abbreviation to delete")]
        abbr: String,
    },
    /// Rename an abbreviation, setting its replacement text
    Rename {
        #[clap(long, help = "Current abbreviation")]
        from: String,

        #[clap(long, help = "New abbreviation")]
        to: String,

        #[clap(long, short, help = "Replacement text")]
        replacement: String,
    },
    /// Keep an abbreviation in the table but stop expanding it
    Ignore {
        #[clap(long, short, help = "Abbreviation to ignore")]
        abbr: String,
    },
    /// Resume expanding a previously ignored abbreviation
    Unignore {
        #[clap(long, short, help = "Abbreviation to re-enable")]
        abbr: String,
    },
    /// List all abbreviations
    List,
    /// Start the daemon and its editor API
    Start {
        #[clap(long, short, default_value = "3000", help = "Port for the editor API")]
        port: u16,
    },
    /// Stop the texpand daemon
    Stop,
    /// Check the status of the texpand daemon
    Status,
    // Hidden command used internally to run the daemon worker
    #[clap(hide = true)]
    DaemonWorker {
        #[clap(long, default_value = "3000")]
        port: u16,
    },
}
