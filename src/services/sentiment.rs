//! Headline sentiment.
//!
//! Scores come from the VADER analyzer: a compound valence in [-1, 1]
//! plus the positive, negative and neutral proportions of the text.

use crate::types::{NewsArticle, SentimentScore};
use std::collections::HashMap;
use vader_sentiment::SentimentIntensityAnalyzer;

fn score_with(analyzer: &SentimentIntensityAnalyzer, text: &str) -> SentimentScore {
    if !text.chars().any(char::is_alphanumeric) {
        return SentimentScore::neutral();
    }
    let scores: HashMap<&str, f64> = analyzer.polarity_scores(text);
    let field = |name: &str| scores.get(name).copied().unwrap_or(0.0);

    SentimentScore {
        compound: field("compound").clamp(-1.0, 1.0),
        positive: field("pos"),
        negative: field("neg"),
        neutral: field("neu"),
    }
}

fn article_text(article: &NewsArticle) -> String {
    match &article.description {
        Some(description) => format!("{}. {}", article.title, description),
        None => article.title.clone(),
    }
}

/// Score free text.
pub fn score_text(text: &str) -> SentimentScore {
    score_with(&SentimentIntensityAnalyzer::new(), text)
}

/// Score an article from its title and description.
pub fn score_article(article: &NewsArticle) -> SentimentScore {
    score_text(&article_text(article))
}

/// Attach a score to every article that does not already carry one.
pub fn annotate(articles: &mut [NewsArticle]) {
    let analyzer = SentimentIntensityAnalyzer::new();
    for article in articles.iter_mut().filter(|a| a.sentiment.is_none()) {
        article.sentiment = Some(score_with(&analyzer, &article_text(article)));
    }
}
