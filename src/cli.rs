use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::form::FormSnapshot;

#[derive(Debug, Parser)]
#[command(name = "glance", version)]
#[command(about = "Daily weather and news headlines, on screen or by email")]
pub struct Cli {
    /// Profile with form defaults (default: $XDG_CONFIG_HOME/glance/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also print debug logs to the console
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub form: FormArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive form with the daily 08:00 (UTC+5:30) email running in the background (default).
    Shell,
    /// Fetch weather and news once and print them.
    Fetch,
    /// Fetch weather and news once and email the digest.
    Send,
}

/// Startup values for the form; anything left out comes from the profile.
#[derive(Debug, Args)]
pub struct FormArgs {
    #[arg(long, global = true)]
    pub city: Option<String>,

    /// News category, e.g. general, sports, technology
    #[arg(long, global = true)]
    pub category: Option<String>,

    #[arg(long, global = true)]
    pub sender: Option<String>,

    #[arg(long, global = true, env = "GLANCE_EMAIL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, global = true)]
    pub receiver: Option<String>,

    #[arg(long, global = true)]
    pub smtp_host: Option<String>,

    /// Kept as text so a bad port is reported like any other form error
    #[arg(long, global = true)]
    pub smtp_port: Option<String>,
}

impl FormArgs {
    pub fn apply(&self, form: &mut FormSnapshot) {
        let overrides = [
            (&self.city, &mut form.city),
            (&self.category, &mut form.category),
            (&self.sender, &mut form.sender),
            (&self.password, &mut form.password),
            (&self.receiver, &mut form.receiver),
            (&self.smtp_host, &mut form.smtp_host),
            (&self.smtp_port, &mut form.smtp_port),
        ];
        for (arg, field) in overrides {
            if let Some(value) = arg {
                *field = value.clone();
            }
        }
    }
}
