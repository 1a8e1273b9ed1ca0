use reqwest::Client;
use scraper::{Html, Selector};
use once_cell::sync::Lazy;
use tracing::{debug, instrument};
use crate::error::{AppError, Result};

/// Selector for the article body on CNBC Indonesia pages.
pub const ARTICLE_BODY_SELECTOR: &str = ".detail_text";

// Create static selectors to avoid recompiling them each time
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(ARTICLE_BODY_SELECTOR).expect("Failed to parse article body selector")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub text: String,
}

#[instrument(level = "info", skip(client))]
pub async fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    let html = response.text().await?;
    debug!(bytes = html.len(), "fetched article html");
    Ok(html)
}

/// Pulls the article body text out of a page, flattened onto a single line.
pub fn extract_article(html: &str) -> Result<ExtractedArticle> {
    let document = Html::parse_document(html);

    let body = document
        .select(&BODY_SELECTOR)
        .next()
        .ok_or_else(|| AppError::ParseError(format!("No {} element found in the HTML", ARTICLE_BODY_SELECTOR)))?;

    let text: String = body
        .text()
        .flat_map(str::chars)
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect();

    if text.trim().is_empty() {
        return Err(AppError::ParseError(format!("{} element has no text", ARTICLE_BODY_SELECTOR)));
    }

    Ok(ExtractedArticle { text })
}

pub fn build_prompt(article: &str) -> String {
    format!(
        "I want you to act like a news article summarizer. I will input text from a news article \
         and your job is to convert it into a useful summary of a few sentences. The target audience \
         for this is readers above 40 years old. Do not repeat sentences, 3 bullets points max, and \
         make sure all sentences are clear and complete: \"{}\"",
        article
    )
}
