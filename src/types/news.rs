use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compound score at or above which text reads as positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Compound score at or below which text reads as negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Sentiment classification derived from a compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Polarity scores for a piece of text.
///
/// `positive`, `negative` and `neutral` are proportions summing to 1;
/// `compound` is normalized to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentScore {
    pub fn neutral() -> Self {
        Self {
            compound: 0.0,
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }

    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

/// A news article about a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentScore>,
}

/// Aggregate sentiment over a set of articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSentiment {
    pub article_count: usize,
    pub average_compound: f64,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub label: SentimentLabel,
}

impl MarketSentiment {
    /// Aggregate the scored articles. Unscored articles are ignored.
    pub fn from_articles(articles: &[NewsArticle]) -> Option<Self> {
        let scores: Vec<SentimentScore> = articles.iter().filter_map(|a| a.sentiment).collect();
        if scores.is_empty() {
            return None;
        }

        let mut positive_count = 0;
        let mut negative_count = 0;
        let mut neutral_count = 0;
        for score in &scores {
            match score.label() {
                SentimentLabel::Positive => positive_count += 1,
                SentimentLabel::Negative => negative_count += 1,
                SentimentLabel::Neutral => neutral_count += 1,
            }
        }

        let average_compound =
            scores.iter().map(|s| s.compound).sum::<f64>() / scores.len() as f64;

        Some(Self {
            article_count: scores.len(),
            average_compound,
            positive_count,
            negative_count,
            neutral_count,
            label: SentimentLabel::from_compound(average_compound),
        })
    }
}
