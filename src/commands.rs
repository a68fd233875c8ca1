// Command layer: turns parsed arguments into a logged-in `PortalClient`,
// runs one endpoint and writes the body to stdout (or a file). The login
// retry policy lives here, not in the client.

use crate::api::{Credentials, PortalClient};
use crate::cli::{Command, PortalArgs};
use crate::endpoints::EventsQuery;
use crate::error::PortalError;
use crate::transport::Transport;
use anyhow::{Context, Result};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Login attempts before giving up. The portal's bot protection may swallow
/// the first attempt, so one retry; never more.
pub const LOGIN_ATTEMPTS: u32 = 2;

/// Try `client.login()` up to `attempts` times, stopping at the first
/// success. An error on the last attempt is returned as is; attempts that
/// all complete without a session cookie give `PortalError::Authentication`.
pub fn login_with_retry<T: Transport>(
    client: &PortalClient<T>,
    attempts: u32,
) -> std::result::Result<(), PortalError> {
    for attempt in 1..=attempts {
        match client.login() {
            Ok(true) => return Ok(()),
            Ok(false) if attempt < attempts => {
                warn!("login attempt {} gave no session, retrying", attempt);
            }
            Ok(false) => {}
            Err(e) if attempt < attempts => {
                warn!("login attempt {} failed: {}, retrying", attempt, e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(PortalError::Authentication { attempts })
}

/// Build a client from the connection flags, prompting for the password
/// when it was neither passed nor set in the environment.
pub fn connect(args: &PortalArgs) -> Result<PortalClient> {
    let password = match &args.password {
        Some(p) => p.clone(),
        None => Password::new()
            .with_prompt("Compass password")
            .interact()
            .context("Failed to read password")?,
    };
    let credentials = Credentials::new(args.username.clone(), password);
    let client = PortalClient::new(credentials, &args.hostname)
        .context("Failed to create portal client")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Logging in to {}...", args.hostname));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let res = login_with_retry(&client, LOGIN_ATTEMPTS);
    spinner.finish_and_clear();
    res.context("Login failed")?;

    Ok(client)
}

/// Run one command against an already logged-in client.
pub fn execute<T: Transport>(
    client: &PortalClient<T>,
    command: &Command,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::NewsFeed(_) => {
            let body = client.news_feed().context("Fetching news feed")?;
            write_json(out, &body)
        }
        Command::GetMessages(_) => {
            let body = client.messages().context("Fetching messages")?;
            write_json(out, &body)
        }
        Command::GetPersonalDetails(_) => {
            let body = client.personal_details().context("Fetching personal details")?;
            write_json(out, &body)
        }
        Command::CheckParentDetails(_) => {
            let body = client
                .check_parent_details()
                .context("Fetching parent details")?;
            write_json(out, &body)
        }
        Command::GetPstCycles(_) => {
            let body = client.pst_cycles().context("Fetching PST cycles")?;
            write_json(out, &body)
        }
        Command::GetEventsForParent {
            user_id,
            limit,
            page,
            ..
        } => {
            let query = EventsQuery {
                user_id: user_id.clone(),
                limit: *limit,
                page: *page,
            };
            let body = client
                .events_for_parent(&query)
                .context("Fetching events for parent")?;
            write_json(out, &body)
        }
        Command::DownloadFile {
            file_id, output, ..
        } => {
            let data = client
                .download_file(file_id)
                .with_context(|| format!("Downloading file {}", file_id))?;
            match output {
                Some(path) => write_file(path, &data),
                None => {
                    out.write_all(&data).context("Writing file to stdout")?;
                    out.flush()?;
                    Ok(())
                }
            }
        }
    }
}

/// Entry point shared by both binaries: login, then one command.
pub fn run(command: &Command) -> Result<()> {
    let client = connect(command.portal())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&client, command, &mut out)
}

fn write_json(out: &mut dyn Write, body: &[u8]) -> Result<()> {
    out.write_all(body).context("Writing response to stdout")?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).with_context(|| format!("Writing {}", path.display()))
}
