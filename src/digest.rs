use chrono::{Local, NaiveDate};

const SUBJECT_PREFIX: &str = "Daily Weather & News Update";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub body: String,
}

/// Combine the weather line and news text into the mail subject and body.
///
/// Pure: the date is passed in, so identical inputs always give an identical digest.
pub fn format_digest(weather: &str, news: &str, today: NaiveDate) -> Digest {
    Digest {
        subject: format!("{SUBJECT_PREFIX} - {}", today.format("%Y-%m-%d")),
        body: format!("{weather}\n\nNews:\n{news}"),
    }
}

pub fn format_digest_today(weather: &str, news: &str) -> Digest {
    format_digest(weather, news, Local::now().date_naive())
}
