use std::net::SocketAddr;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Serve the web interface.
    Serve {
        /// Address to listen on. Defaults to 0.0.0.0 on $PORT (or 8080).
        #[structopt(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Add a new task.
    Add {
        /// The task title.
        #[structopt()]
        title: String,

        /// Due date, as YYYY-MM-DD.
        #[structopt(short, long)]
        due: Option<String>,

        /// Priority. Lower is more urgent.
        #[structopt(short, long)]
        priority: Option<String>,
    },
    /// List all tasks, with the current score.
    List,
    /// Show the current score and rank.
    Score,
    /// Overwrite the due date, priority and progress of a task.
    /// Anything left out goes back to its default.
    Edit {
        #[structopt()]
        id: i64,

        #[structopt(short, long)]
        due: Option<String>,

        #[structopt(short, long)]
        priority: Option<String>,

        /// Progress percentage.
        #[structopt(long)]
        progress: Option<String>,
    },
    /// Remove a task.
    Rm {
        #[structopt()]
        id: i64,
    },
    /// Show today's report and the previous logs.
    Report,
    /// Record today's score and rank, with an optional memo.
    Log {
        #[structopt()]
        memo: Option<String>,
    },
    /// Create the database if it does not exist.
    Init,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "tally",
    about = "A minimalistic task tracker that ranks your day."
)]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different database file. Overrides $DATABASE_URL.
    #[structopt(parse(from_os_str), short = "f", long)]
    pub database: Option<PathBuf>,
}
