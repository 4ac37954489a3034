pub const NO_DESCRIPTION: &str = "No description available.";
pub const NO_ARTICLES: &str = "No news articles found.";

/// Current conditions for one city. Only built when all three fields came back.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherResult {
    pub city: String,
    pub description: String,
    pub temperature_celsius: f64,
    pub humidity_percent: u8,
}

impl WeatherResult {
    pub fn render(&self) -> String {
        format!(
            "Weather in {}: {}, Temperature: {}°C, Humidity: {}%",
            self.city,
            self.description,
            format_celsius(self.temperature_celsius),
            self.humidity_percent
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub source_name: String,
    pub description: Option<String>,
}

impl NewsArticle {
    fn render(&self) -> String {
        let desc = self
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(NO_DESCRIPTION);
        format!("{} - {}\n{}\n\n", self.title, self.source_name, desc)
    }
}

pub fn render_articles(articles: &[NewsArticle]) -> String {
    let mut output = String::new();
    for article in articles {
        output.push_str(&article.render());
    }

    let output = output.trim_end();
    if output.is_empty() {
        NO_ARTICLES.to_string()
    } else {
        output.to_string()
    }
}

// Whole degrees keep one decimal place ("15.0", not "15").
fn format_celsius(temp: f64) -> String {
    if temp.is_finite() && temp.fract() == 0.0 {
        format!("{temp:.1}")
    } else {
        format!("{temp}")
    }
}
