use rocket::{form::Form, response::Redirect, State};
use rocket_dyn_templates::Template;
use serde::{Deserialize, Serialize};

use database::{
    schema::cms::{Article, ArticleError, ArticleView, Author, DEFAULT_RECENT_LIMIT},
    DatabaseError,
};

use crate::{
    configuration::{Configuration, RecentArticleCount},
    store::{find_or_create_author, SharedStore, Store},
    webserver::{Failure, FullPathAndQuery, RequestData, ResultExt},
};

const LIST_PATH: &str = "/article/list";

#[derive(Serialize, Deserialize)]
struct ListArticlesContext {
    request: RequestData,
    articles: Vec<ArticleView>,
}

#[get("/")]
pub async fn home(
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Template, Failure> {
    let limit = RecentArticleCount::get().unwrap_or(DEFAULT_RECENT_LIMIT);
    let articles = store.find_recent_articles(limit).await.map_to_failure()?;

    Ok(Template::render(
        "home",
        ListArticlesContext {
            request: RequestData::new(path),
            articles,
        },
    ))
}

#[get("/article/list")]
pub async fn list_articles(
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Template, Failure> {
    let articles = store.find_all_articles().await.map_to_failure()?;

    Ok(Template::render(
        "article/list",
        ListArticlesContext {
            request: RequestData::new(path),
            articles,
        },
    ))
}

#[derive(Serialize, Deserialize)]
struct ViewArticleContext {
    request: RequestData,
    article: ArticleView,
}

/// Ids that do not fit an `i64` cannot name an article.
fn parse_article_id(article_id: Result<i64, &str>) -> Result<i64, Failure> {
    article_id.map_err(|_| Failure::not_found())
}

async fn load_article(store: &dyn Store, article_id: i64) -> Result<ArticleView, Failure> {
    store
        .find_article_by_id(article_id)
        .await
        .map_to_failure()?
        .ok_or_else(Failure::not_found)
}

#[get("/article/<article_id>")]
pub async fn show_article(
    article_id: Result<i64, &str>,
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Template, Failure> {
    let article_id = parse_article_id(article_id)?;
    let article = load_article(store.inner().as_ref(), article_id).await?;

    Ok(Template::render(
        "article/show",
        ViewArticleContext {
            request: RequestData::new(path),
            article,
        },
    ))
}

#[derive(Debug, Serialize, Deserialize)]
struct EditArticleContext {
    request: RequestData,
    error_message: Option<String>,
    article_id: Option<i64>,
    title: Option<String>,
    content: Option<String>,
    author: Option<String>,

    authors: Vec<Author>,
}

#[get("/article/new")]
pub async fn new_article(
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Template, Failure> {
    let authors = store.find_all_authors().await.map_to_failure()?;

    Ok(Template::render(
        "article/edit",
        EditArticleContext {
            request: RequestData::new(path),
            error_message: None,
            article_id: None,
            title: None,
            content: None,
            author: None,
            authors,
        },
    ))
}

#[derive(FromForm, Clone, Debug)]
pub struct NewArticleForm {
    title: Option<String>,
    content: Option<String>,
    author: Option<String>,
}

async fn save_new_article(
    store: &dyn Store,
    article_form: &NewArticleForm,
) -> Result<Article, ArticleError> {
    let (title, content) = Article::cleanup_and_validate(
        article_form.title.as_deref(),
        article_form.content.as_deref(),
    )?;
    let author_name = article_form
        .author
        .as_deref()
        .and_then(Author::cleanup_name)
        .ok_or(ArticleError::MissingAuthor)?;

    let mut session = store.begin().await?;
    let author = find_or_create_author(session.as_mut(), &author_name).await?;

    let mut article = Article::new(title, content, author.id);
    session.save_article(&mut article).await?;
    session.commit().await?;

    Ok(article)
}

#[post("/article/new", data = "<article_form>")]
pub async fn create_article(
    article_form: Form<NewArticleForm>,
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Redirect, Failure> {
    match save_new_article(store.inner().as_ref(), &article_form).await {
        Ok(article) => {
            info!("created article {} ({})", article.id, article.title);
            Ok(Redirect::found(LIST_PATH))
        }
        Err(ArticleError::Database(error)) => Err(Failure::from(error)),
        Err(error) => {
            let authors = store.find_all_authors().await.map_to_failure()?;
            Err(Failure::Invalid(Template::render(
                "article/edit",
                EditArticleContext {
                    request: RequestData::new(path),
                    error_message: Some(error.to_string()),
                    article_id: None,
                    title: article_form.title.clone(),
                    content: article_form.content.clone(),
                    author: article_form.author.clone(),
                    authors,
                },
            )))
        }
    }
}

#[get("/article/<article_id>/edit")]
pub async fn edit_article(
    article_id: Result<i64, &str>,
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Template, Failure> {
    let article_id = parse_article_id(article_id)?;
    let article = load_article(store.inner().as_ref(), article_id).await?;

    Ok(Template::render(
        "article/edit",
        EditArticleContext {
            request: RequestData::new(path),
            error_message: None,
            article_id: Some(article.id),
            title: Some(article.title),
            content: Some(article.content),
            author: Some(article.author.name),
            authors: Vec::new(),
        },
    ))
}

#[derive(FromForm, Clone, Debug)]
pub struct EditArticleForm {
    title: Option<String>,
    content: Option<String>,
}

async fn update_article_content(
    store: &dyn Store,
    article_id: i64,
    article_form: &EditArticleForm,
) -> Result<Article, ArticleError> {
    let mut session = store.begin().await?;
    let mut article = session
        .load_article_for_update(article_id)
        .await?
        .ok_or(ArticleError::ArticleNotFound)?;

    let (title, content) = Article::cleanup_and_validate(
        article_form.title.as_deref(),
        article_form.content.as_deref(),
    )?;
    article.title = title;
    article.content = content;
    session.save_article(&mut article).await?;
    session.commit().await?;

    Ok(article)
}

#[post("/article/<article_id>/edit", data = "<article_form>")]
pub async fn update_article(
    article_id: Result<i64, &str>,
    article_form: Form<EditArticleForm>,
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Redirect, Failure> {
    let article_id = parse_article_id(article_id)?;
    match update_article_content(store.inner().as_ref(), article_id, &article_form).await {
        Ok(article) => {
            info!("updated article {}", article.id);
            Ok(Redirect::found(LIST_PATH))
        }
        Err(ArticleError::ArticleNotFound)
        | Err(ArticleError::Database(DatabaseError::RowNotFound)) => Err(Failure::not_found()),
        Err(ArticleError::Database(error)) => Err(Failure::from(error)),
        Err(error) => {
            let article = load_article(store.inner().as_ref(), article_id).await?;
            Err(Failure::Invalid(Template::render(
                "article/edit",
                EditArticleContext {
                    request: RequestData::new(path),
                    error_message: Some(error.to_string()),
                    article_id: Some(article.id),
                    title: article_form.title.clone(),
                    content: article_form.content.clone(),
                    author: Some(article.author.name),
                    authors: Vec::new(),
                },
            )))
        }
    }
}

#[get("/article/<article_id>/delete")]
pub async fn confirm_delete_article(
    article_id: Result<i64, &str>,
    store: &State<SharedStore>,
    path: FullPathAndQuery,
) -> Result<Template, Failure> {
    let article_id = parse_article_id(article_id)?;
    let article = load_article(store.inner().as_ref(), article_id).await?;

    Ok(Template::render(
        "article/delete",
        ViewArticleContext {
            request: RequestData::new(path),
            article,
        },
    ))
}

#[post("/article/<article_id>/delete")]
pub async fn delete_article(
    article_id: Result<i64, &str>,
    store: &State<SharedStore>,
) -> Result<Redirect, Failure> {
    let article_id = parse_article_id(article_id)?;
    let mut session = store.begin().await.map_to_failure()?;
    if !session.delete_article(article_id).await.map_to_failure()? {
        return Err(Failure::not_found());
    }
    session.commit().await.map_to_failure()?;

    info!("deleted article {}", article_id);
    Ok(Redirect::found(LIST_PATH))
}
