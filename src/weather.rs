use log::debug;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::GlanceError;
use crate::models::WeatherResult;
use crate::provider::{self, Reply};

pub const API_KEY_VAR: &str = "OPENWEATHER_API_KEY";

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
}

/// Current-weather lookups against OpenWeather.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    api_key: Option<String>,
    endpoint: Url,
}

impl WeatherClient {
    pub fn new(http: Client, api_key: Option<String>, endpoint: Url) -> Self {
        Self { http, api_key, endpoint }
    }

    pub async fn fetch_weather(&self, city: &str) -> Result<WeatherResult, GlanceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GlanceError::Configuration { key: API_KEY_VAR });
        };

        debug!("Fetching weather for {city}");
        let reply = provider::get(
            &self.http,
            &self.endpoint,
            &[("q", city), ("appid", api_key), ("units", "metric")],
            "weather",
        )
        .await?;

        let body = match reply {
            Reply::Body(body) => body,
            Reply::NotFound => {
                return Err(GlanceError::NotFound(format!(
                    "City '{city}' not found. Please check the spelling or try another city."
                )));
            }
        };

        let parsed: OwCurrentResponse = provider::parse_json(&body, "weather")?;
        let Some(first) = parsed.weather.into_iter().next() else {
            return Err(GlanceError::Parse {
                what: "weather",
                detail: "empty `weather` array".to_string(),
            });
        };

        Ok(WeatherResult {
            city: city.to_string(),
            description: first.description,
            temperature_celsius: parsed.main.temp,
            humidity_percent: parsed.main.humidity,
        })
    }
}
