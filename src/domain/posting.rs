use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One scraped job listing. Created only once all five source fields were
/// extracted successfully; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub company_name: String,
    pub company_url: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub scraped_at: DateTime<Utc>,
}

impl Posting {
    pub fn new(
        company_name: String,
        company_url: String,
        title: String,
        url: String,
        description: String,
    ) -> Self {
        Posting {
            company_name,
            company_url,
            title,
            url,
            description,
            scraped_at: Utc::now(),
        }
    }

    /// Content-addressable identity: SHA-256 over the five source fields.
    ///
    /// The URL alone is not a reliable key because the same canonical
    /// posting shows up under multiple short-lived tracking URLs. Binding
    /// the identity to the full content collapses identical reposts into
    /// one id, while an edited repost becomes a new entity.
    pub fn identity(&self) -> String {
        let combined = format!(
            "{}|{}|{}|{}|{}",
            self.company_name, self.company_url, self.title, self.url, self.description
        );

        let mut hasher = Sha256::new();
        hasher.update(combined.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A [`Posting`] that has been through the matching oracle at least once.
/// Re-scoring the same identity overwrites the previous entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPosting {
    #[serde(flatten)]
    pub posting: Posting,
    pub match_score: u8,
    pub scored_at: DateTime<Utc>,
}

impl ScoredPosting {
    pub fn new(posting: Posting, match_score: u8) -> Self {
        ScoredPosting {
            posting,
            match_score,
            scored_at: Utc::now(),
        }
    }
}
