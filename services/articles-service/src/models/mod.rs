pub mod article;

pub use article::{Article, ArticleFilter, ArticleHooks, STATUSES};
