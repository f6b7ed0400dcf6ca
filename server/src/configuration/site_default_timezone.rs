use super::Configuration;

pub struct SiteDefaultTimezone;

impl Configuration for SiteDefaultTimezone {
    type Type = String;

    fn default() -> Option<Self::Type> {
        Some(String::from("Europe/Paris"))
    }

    fn key() -> &'static str {
        "site-default-timezone"
    }
}

impl SiteDefaultTimezone {
    /// Falls back to UTC when the configured identifier is unknown.
    pub fn get_for_chrono() -> chrono_tz::Tz {
        Self::get()
            .and_then(|name| name.parse().ok())
            .unwrap_or(chrono_tz::UTC)
    }
}
