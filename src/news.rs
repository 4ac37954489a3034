use log::debug;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::GlanceError;
use crate::models::{NewsArticle, render_articles};
use crate::provider::{self, Reply};

pub const API_KEY_VAR: &str = "NEWS_API_KEY";
pub const MAX_ARTICLES: usize = 5;
const COUNTRY: &str = "us";

#[derive(Debug, Deserialize)]
struct NaSource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NaArticle {
    title: String,
    source: NaSource,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NaTopHeadlines {
    articles: Vec<NaArticle>,
}

impl From<NaArticle> for NewsArticle {
    fn from(raw: NaArticle) -> Self {
        NewsArticle {
            title: raw.title,
            source_name: raw.source.name,
            description: raw.description,
        }
    }
}

/// Top-headline lookups against NewsAPI.
#[derive(Debug, Clone)]
pub struct NewsClient {
    http: Client,
    api_key: Option<String>,
    endpoint: Url,
}

impl NewsClient {
    pub fn new(http: Client, api_key: Option<String>, endpoint: Url) -> Self {
        Self { http, api_key, endpoint }
    }

    /// Up to five headlines for `category`, in provider order.
    pub async fn fetch_articles(&self, category: &str) -> Result<Vec<NewsArticle>, GlanceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GlanceError::Configuration { key: API_KEY_VAR });
        };

        debug!("Fetching {category} headlines");
        let reply = provider::get(
            &self.http,
            &self.endpoint,
            &[("country", COUNTRY), ("category", category), ("apiKey", api_key)],
            "news",
        )
        .await?;

        let body = match reply {
            Reply::Body(body) => body,
            Reply::NotFound => {
                return Err(GlanceError::NotFound(format!(
                    "Category '{category}' not found or invalid. Please check the spelling or try \
                     another category (e.g., general, sports, technology)."
                )));
            }
        };

        let parsed: NaTopHeadlines = provider::parse_json(&body, "news")?;
        debug!("NewsAPI returned {} articles", parsed.articles.len());

        Ok(parsed
            .articles
            .into_iter()
            .take(MAX_ARTICLES)
            .map(NewsArticle::from)
            .collect())
    }

    /// The rendered digest text shown in the news pane and mailed out.
    pub async fn fetch_news(&self, category: &str) -> Result<String, GlanceError> {
        let articles = self.fetch_articles(category).await?;
        Ok(render_articles(&articles))
    }
}
