//! Change tokens for schedule snapshots.
//!
//! Two strategies with different sensitivity:
//! - `ContentHash`: SHA-256 over the records, so any text edit counts as a change.
//! - `ArticleId`: the source article's identifier, so only a new post counts.

use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{ChangeToken, OutageRecord, ScheduleSnapshot, TokenStrategy};

/// Compute the change token for `snapshot`.
pub fn fingerprint(snapshot: &ScheduleSnapshot, strategy: TokenStrategy) -> Result<ChangeToken> {
    match strategy {
        TokenStrategy::ContentHash => Ok(content_hash(snapshot)),
        TokenStrategy::ArticleId => snapshot
            .article_id
            .as_deref()
            .map(ChangeToken::new)
            .ok_or_else(|| AppError::not_found("article has no identifier attribute")),
    }
}

/// Hex SHA-256 of the records in extraction order, one canonical line each.
pub fn content_hash(snapshot: &ScheduleSnapshot) -> ChangeToken {
    let canonical = snapshot
        .records
        .iter()
        .map(OutageRecord::canonical)
        .collect::<Vec<_>>()
        .join("\n");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    ChangeToken::new(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(records: &[(&str, &str)]) -> ScheduleSnapshot {
        ScheduleSnapshot::new(
            records
                .iter()
                .map(|(id, desc)| OutageRecord::new(*id, *desc))
                .collect(),
        )
    }

    #[test]
    fn test_known_digest() {
        let s = snapshot(&[("1.1", "19:00-20:30"), ("5.2", "не вимикається")]);
        assert_eq!(
            content_hash(&s).as_str(),
            "85c5365e711dbd37147bc94c62ecc1537c3c5175380a0dc1a9f07e1bcaf00dba"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = snapshot(&[("1.1", "19:00-20:30"), ("1.2", "20:30-22:00")]);
        let b = a.clone();
        assert_eq!(
            fingerprint(&a, TokenStrategy::ContentHash).unwrap(),
            fingerprint(&b, TokenStrategy::ContentHash).unwrap()
        );
    }

    #[test]
    fn test_single_character_changes_token() {
        let base = snapshot(&[("1.1", "19:00-20:30"), ("1.2", "20:30-22:00")]);
        let variants = [
            snapshot(&[("1.1", "19:00-20:31"), ("1.2", "20:30-22:00")]),
            snapshot(&[("1.1", "19:00 -20:30"), ("1.2", "20:30-22:00")]),
            snapshot(&[("1.3", "19:00-20:30"), ("1.2", "20:30-22:00")]),
            snapshot(&[("1.2", "20:30-22:00"), ("1.1", "19:00-20:30")]),
            snapshot(&[("1.1", "19:00-20:30")]),
        ];

        let base_token = content_hash(&base);
        for variant in &variants {
            assert_ne!(content_hash(variant), base_token, "{variant:?}");
        }
    }

    #[test]
    fn test_hash_is_hex_256() {
        let token = content_hash(&ScheduleSnapshot::default());
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_article_id_strategy() {
        let mut s = snapshot(&[("1.1", "19:00-20:30")]);
        s.article_id = Some("post-4521".to_string());

        let token = fingerprint(&s, TokenStrategy::ArticleId).unwrap();
        assert_eq!(token.as_str(), "post-4521");

        // Content edits under the same article do not change the token.
        s.records[0].description = "19:00-21:00".to_string();
        assert_eq!(fingerprint(&s, TokenStrategy::ArticleId).unwrap(), token);
    }

    #[test]
    fn test_article_id_missing_is_not_found() {
        let s = snapshot(&[("1.1", "19:00-20:30")]);
        assert!(matches!(
            fingerprint(&s, TokenStrategy::ArticleId),
            Err(AppError::NotFound(_))
        ));
    }
}
