use std::{collections::HashMap, fmt::Write, marker::PhantomData};

use chrono::DateTime;
use comrak::Options;
use rocket::{
    data::{Limits, ToByteUnit},
    fs::FileServer,
    http::Status,
    request::{FromRequest, Outcome},
    Build, Request, Rocket,
};
use rocket_dyn_templates::{
    tera::{self, Value},
    Template,
};
use serde::{Deserialize, Serialize};

use database::DatabaseError;

use crate::{
    configuration::{self, Configuration, ConfigurationManager, SiteDefaultTimezone, SiteName},
    store::SharedStore,
};

mod articles;

const TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");
const ARTICLE_FORM_LIMIT_MIB: u64 = 1;

pub fn rocket_server(store: SharedStore) -> Rocket<Build> {
    // Values from Rocket.toml or ROCKET_* take precedence over the checkout paths.
    let mut figment = rocket::Config::figment()
        .join(("template_dir", TEMPLATE_DIR))
        .join(("static_dir", STATIC_DIR));
    // Article bodies routinely outgrow Rocket's 32 KiB form default.
    let limits = figment.extract_inner::<Limits>("limits").unwrap_or_default();
    if limits
        .get("form")
        .map_or(true, |form| form < ARTICLE_FORM_LIMIT_MIB.mebibytes())
    {
        figment = figment.merge((
            "limits",
            limits.limit("form", ARTICLE_FORM_LIMIT_MIB.mebibytes()),
        ));
    }
    let static_dir = figment
        .extract_inner::<String>("static_dir")
        .unwrap_or_else(|_| String::from(STATIC_DIR));

    rocket::custom(figment)
        .manage(store)
        .attach(configuration::fairing())
        .attach(Template::custom(|engines| {
            engines
                .tera
                .register_filter("render_markdown", MarkdownFilter);
            engines.tera.register_filter("local_date", LocalDateFilter);
            engines
                .tera
                .register_function("site_name", TeraConfiguration::<SiteName>::default());
        }))
        .mount(
            "/",
            routes![
                articles::home,
                articles::list_articles,
                articles::new_article,
                articles::create_article,
                articles::show_article,
                articles::edit_article,
                articles::update_article,
                articles::confirm_delete_article,
                articles::delete_article,
            ],
        )
        .mount("/static", FileServer::from(static_dir))
}

pub async fn main(store: SharedStore) -> Result<(), rocket::Error> {
    rocket_server(store).launch().await?;

    Ok(())
}

pub struct TeraConfiguration<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for TeraConfiguration<T> {
    fn default() -> Self {
        Self {
            _phantom: Default::default(),
        }
    }
}

impl<T> tera::Function for TeraConfiguration<T>
where
    T: Configuration + Send + Sync,
    T::Type: ToString,
{
    fn call(&self, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let manager = ConfigurationManager::shared();
        let value = manager
            .get::<T>()
            .ok_or_else(|| tera::Error::msg("no value found"))?;
        Ok(tera::Value::String(value.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestData {
    pub current_path: String,
    pub current_query: Option<String>,
    pub current_path_and_query: String,
}

#[derive(Debug)]
pub struct FullPathAndQuery {
    pub path: String,
    pub query: Option<String>,
}

impl RequestData {
    pub fn new(path: FullPathAndQuery) -> Self {
        let mut current_path_and_query = path.path.clone();
        if let Some(query) = &path.query {
            current_path_and_query += "?";
            current_path_and_query += query;
        }

        Self {
            current_path: path.path,
            current_query: path.query,
            current_path_and_query,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for FullPathAndQuery {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let path = request.uri().path().as_str().to_owned();
        let query = request.uri().query().map(|q| q.as_str().to_owned());

        Outcome::Success(FullPathAndQuery { path, query })
    }
}

struct MarkdownFilter;

impl tera::Filter for MarkdownFilter {
    fn filter(&self, markdown_source: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
        let markdown = markdown_source.as_str().ok_or_else(|| {
            tera::Error::msg("Value passed to markdown filter needs to be a string")
        })?;
        Ok(Value::String(comrak::markdown_to_html(
            markdown,
            &Options::default(),
        )))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Formats an RFC 3339 timestamp in the site's time zone.
struct LocalDateFilter;

impl tera::Filter for LocalDateFilter {
    fn filter(&self, timestamp: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let timestamp = timestamp
            .as_str()
            .ok_or_else(|| tera::Error::msg("Value passed to local_date needs to be a string"))?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|err| tera::Error::msg(format!("invalid timestamp {}: {}", timestamp, err)))?;
        let format = args
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("%d/%m/%Y %H:%M");

        let mut formatted = String::new();
        write!(
            formatted,
            "{}",
            timestamp
                .with_timezone(&SiteDefaultTimezone::get_for_chrono())
                .format(format)
        )
        .map_err(|_| tera::Error::msg(format!("invalid date format {}", format)))?;

        Ok(Value::String(formatted))
    }
}

trait ResultExt<T> {
    fn map_store_to_http(self) -> Result<T, Status>;

    fn map_to_failure(self) -> Result<T, Failure>
    where
        Self: Sized,
    {
        self.map_store_to_http().map_err(Failure::Status)
    }
}

impl<T> ResultExt<T> for Result<T, DatabaseError> {
    fn map_store_to_http(self) -> Result<T, Status> {
        self.map_err(|err| match err {
            DatabaseError::RowNotFound => Status::NotFound,
            other_error => {
                error!("unexpected store error: {:?}", other_error);
                Status::InternalServerError
            }
        })
    }
}

#[derive(Responder)]
#[allow(clippy::large_enum_variant)]
pub enum Failure {
    Status(Status),
    #[response(status = 400)]
    Invalid(Template),
}

impl<E> From<E> for Failure
where
    E: std::error::Error,
{
    fn from(error: E) -> Self {
        error!("error processing request: {:?}", error);

        Failure::Status(Status::InternalServerError)
    }
}

impl Failure {
    pub fn not_found() -> Self {
        Self::Status(Status::NotFound)
    }
}
