mod recent_article_count;
mod site_default_timezone;
mod site_name;

pub use self::{
    recent_article_count::RecentArticleCount, site_default_timezone::SiteDefaultTimezone,
    site_name::SiteName,
};

use once_cell::sync::OnceCell;
use rocket::fairing::AdHoc;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

pub trait Configuration {
    type Type: Serialize + DeserializeOwned;

    fn default() -> Option<Self::Type>;
    fn key() -> &'static str;

    fn get() -> Option<Self::Type>
    where
        Self: Sized,
    {
        ConfigurationManager::shared().get::<Self>()
    }
}

static SHARED_MANAGER: OnceCell<ConfigurationManager> = OnceCell::new();

#[derive(Clone, Debug, Default)]
pub struct ConfigurationManager {
    active_configuration: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl ConfigurationManager {
    pub fn shared() -> Self {
        SHARED_MANAGER.get_or_init(Self::default).clone()
    }

    pub fn get<T: Configuration>(&self) -> Option<T::Type> {
        let configuration = self.active_configuration.read().ok()?;
        configuration
            .get(T::key())
            .and_then(|v| serde_json::value::from_value(v.clone()).ok())
            .or_else(T::default)
    }

    /// Replaces the values of every key present in `values`.
    pub fn apply(&self, values: HashMap<String, serde_json::Value>) {
        match self.active_configuration.write() {
            Ok(mut configuration) => configuration.extend(values),
            Err(_) => error!("site configuration lock poisoned, overrides ignored"),
        }
    }
}

/// Loads the `site` table of the Rocket configuration into the shared manager.
pub fn fairing() -> AdHoc {
    AdHoc::on_ignite("Site Configuration", |rocket| async move {
        match rocket
            .figment()
            .extract_inner::<HashMap<String, serde_json::Value>>("site")
        {
            Ok(values) => {
                info!("applying {} site configuration override(s)", values.len());
                ConfigurationManager::shared().apply(values);
            }
            Err(error) if error.missing() => {}
            Err(error) => warn!("ignoring invalid site configuration: {}", error),
        }

        rocket
    })
}
