// Command-line argument definitions shared by the `compass` and
// `compass-news` binaries. Connection flags fall back to COMPASS_*
// environment variables.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::endpoints::{DEFAULT_EVENTS_LIMIT, DEFAULT_EVENTS_PAGE};

/// Fetch data from the Compass API, printed to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "compass", version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings every command needs.
#[derive(Args, Debug, Clone)]
pub struct PortalArgs {
    /// Compass username
    #[arg(long, env = "COMPASS_USERNAME")]
    pub username: String,

    /// Compass password (prompted for when not given)
    #[arg(long, env = "COMPASS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The compass school hostname (eg. coburg-north-ps-vic.compass.education)
    #[arg(long, env = "COMPASS_HOSTNAME")]
    pub hostname: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Return JSON news feed
    NewsFeed(PortalArgs),

    /// Return JSON messages
    GetMessages(PortalArgs),

    /// Return JSON data on the current user
    GetPersonalDetails(PortalArgs),

    /// Return JSON data on the parent's linked details
    CheckParentDetails(PortalArgs),

    /// Return JSON parent/teacher interview cycles
    GetPstCycles(PortalArgs),

    /// JSON data with events that a parent can see
    GetEventsForParent {
        #[command(flatten)]
        portal: PortalArgs,

        /// The id of a user
        #[arg(long)]
        user_id: String,

        /// Number of events per page
        #[arg(long, default_value_t = DEFAULT_EVENTS_LIMIT)]
        limit: u32,

        /// Page to fetch, starting at 1
        #[arg(long, default_value_t = DEFAULT_EVENTS_PAGE)]
        page: u32,
    },

    /// Download a single file
    DownloadFile {
        #[command(flatten)]
        portal: PortalArgs,

        /// The id of a file
        #[arg(long)]
        file_id: String,

        /// Write the file here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    pub fn portal(&self) -> &PortalArgs {
        match self {
            Command::NewsFeed(p)
            | Command::GetMessages(p)
            | Command::GetPersonalDetails(p)
            | Command::CheckParentDetails(p)
            | Command::GetPstCycles(p) => p,
            Command::GetEventsForParent { portal, .. } | Command::DownloadFile { portal, .. } => {
                portal
            }
        }
    }
}

/// Print the school news feed as JSON.
#[derive(Parser, Debug)]
#[command(name = "compass-news", version, about, long_about = None)]
pub struct NewsCli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub portal: PortalArgs,
}
