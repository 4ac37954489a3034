//! Terminal stand-in for the dashboard window.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::app::{Dashboard, FetchedData};
use crate::form::{Field, FormSnapshot};

const HELP: &str = "\
Commands:
  show                    print the form
  set <field> [value]     edit a field (fields: city, category, sender, password,
                          receiver, smtp-host, smtp-port); no value clears it
  fetch                   fetch weather and news
  send                    email the digest now
  help                    this text
  quit                    exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Show,
    Set(Field, String),
    Fetch,
    Send,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut parts = line.splitn(3, char::is_whitespace);
    let verb = parts.next().unwrap_or_default().to_lowercase();

    let command = match verb.as_str() {
        "show" => ShellCommand::Show,
        "fetch" => ShellCommand::Fetch,
        "send" => ShellCommand::Send,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "set" => {
            let name = parts
                .next()
                .ok_or_else(|| "Usage: set <field> [value]".to_string())?;
            let field = Field::try_from(name)?;
            let value = parts.next().unwrap_or_default().trim().to_string();
            ShellCommand::Set(field, value)
        }
        other => return Err(format!("Unknown command '{other}'. Type `help` for a list.")),
    };

    Ok(Some(command))
}

pub fn render_form(form: &FormSnapshot) -> String {
    let mut output = String::new();
    for field in Field::all() {
        let value = form.get(*field);
        let shown = if *field == Field::Password && !value.is_empty() {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        output.push_str(&format!("  {:<10} {}\n", field.as_str(), shown));
    }
    output
}

pub fn render_panes(data: &FetchedData) -> String {
    format!("Weather:\n{}\n\nNews:\n{}", data.weather, data.news)
}

pub async fn run<R, W>(dashboard: &Dashboard, input: R, mut out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    out.write_all(b"Welcome to Glance - your daily weather & news update\n\n").await?;
    out.write_all(render_form(&dashboard.form().current_form_snapshot()).as_bytes())
        .await?;
    out.write_all(b"\nType `help` for commands.\n").await?;

    let mut lines = input.lines();
    loop {
        out.write_all(b"> ").await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let reply = match parse_command(&line) {
            Ok(None) => continue,
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(ShellCommand::Help)) => HELP.to_string(),
            Ok(Some(ShellCommand::Show)) => render_form(&dashboard.form().current_form_snapshot()),
            Ok(Some(ShellCommand::Set(field, value))) => {
                dashboard.form().set(field, value);
                format!("{field} updated\n")
            }
            Ok(Some(ShellCommand::Fetch)) => match dashboard.fetch_data().await {
                Ok(data) => format!("{}\n", render_panes(&data)),
                Err(e) => format!("Error: {e}\n"),
            },
            Ok(Some(ShellCommand::Send)) => match dashboard.send_update().await {
                Ok(_) => "Success: Email sent successfully!\n".to_string(),
                Err(e) => format!("Error: {e}\n"),
            },
            Err(msg) => format!("{msg}\n"),
        };
        out.write_all(reply.as_bytes()).await?;
    }

    out.flush().await?;
    Ok(())
}
