use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::digest::format_digest_today;
use crate::email::{Mailer, OutgoingEmail, SmtpMailer};
use crate::error::GlanceError;
use crate::form::{FetchQuery, LiveForm};
use crate::logger::init_logger;
use crate::news::NewsClient;
use crate::provider::build_http_client;
use crate::scheduler::{DailyScheduler, ScheduledJob};
use crate::shell;
use crate::weather::WeatherClient;

/// Contents of the two read-only panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedData {
    pub weather: String,
    pub news: String,
}

/// The two user actions, "Fetch Data" and "Send Email Update Now", over the live form.
pub struct Dashboard {
    form: Arc<LiveForm>,
    weather: WeatherClient,
    news: NewsClient,
    mailer: Arc<dyn Mailer>,
}

impl Dashboard {
    pub fn new(
        form: Arc<LiveForm>,
        weather: WeatherClient,
        news: NewsClient,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            form,
            weather,
            news,
            mailer,
        }
    }

    pub fn form(&self) -> &LiveForm {
        &self.form
    }

    pub async fn fetch_data(&self) -> Result<FetchedData, GlanceError> {
        let query = self.form.current_form_snapshot().fetch_query()?;
        self.fetch_for(&query).await
    }

    async fn fetch_for(&self, query: &FetchQuery) -> Result<FetchedData, GlanceError> {
        let weather = self.weather.fetch_weather(&query.city).await?.render();
        let news = self.news.fetch_news(&query.category).await?;
        Ok(FetchedData { weather, news })
    }

    /// Re-fetches and mails the digest using whatever the form holds right now.
    pub async fn send_update(&self) -> Result<OutgoingEmail, GlanceError> {
        let request = self.form.current_form_snapshot().send_request()?;
        let data = self.fetch_for(&request.query).await?;
        let digest = format_digest_today(&data.weather, &data.news);
        let email = OutgoingEmail::new(&request.credentials, digest);

        self.mailer.send(&request.credentials, &email).await?;
        Ok(email)
    }
}

/// The scheduled send. Reads the form at fire time, not at spawn time.
pub struct DigestJob {
    dashboard: Arc<Dashboard>,
}

impl DigestJob {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

#[async_trait]
impl ScheduledJob for DigestJob {
    async fn fire(&self) -> Result<(), GlanceError> {
        let email = self.dashboard.send_update().await?;
        info!("Scheduled digest sent to {}", email.to);
        Ok(())
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    init_logger(cli.verbose)?;

    let cfg = Config::load(cli.config.as_deref())?;
    debug!("Config loaded: {:?}", cfg.keys);

    let mut initial = cfg.profile.form_defaults();
    cli.form.apply(&mut initial);

    let http = build_http_client()?;
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(LiveForm::new(initial)),
        WeatherClient::new(http.clone(), cfg.keys.weather.clone(), cfg.weather_url.clone()),
        NewsClient::new(http, cfg.keys.news.clone(), cfg.news_url.clone()),
        Arc::new(SmtpMailer),
    ));

    match cli.command.unwrap_or(Command::Shell) {
        Command::Fetch => {
            let data = dashboard.fetch_data().await?;
            println!("{}", shell::render_panes(&data));
        }
        Command::Send => {
            dashboard.send_update().await?;
            println!("Email sent successfully!");
        }
        Command::Shell => {
            let job = Arc::new(DigestJob::new(Arc::clone(&dashboard)));
            let schedule = DailyScheduler::with_system_time(job).spawn();
            info!("Daily digest scheduled");

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let result = shell::run(&dashboard, stdin, tokio::io::stdout()).await;

            schedule.cancel().await;
            result?;
        }
    }

    Ok(())
}
