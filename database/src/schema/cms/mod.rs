mod article;
mod author;

pub use self::{
    article::{Article, ArticleError, ArticleView, DEFAULT_RECENT_LIMIT},
    author::Author,
};
