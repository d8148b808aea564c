use crate::common::clock::compact_utc;
use crate::common::error::{DeepSeaError, Result};
use crate::config::settings::TagConfig;
use time::{Duration, OffsetDateTime};
use tracing::debug;

// Letters, digits and these are the only characters accepted across services.
const ALLOWED_SPECIAL: &[char] = &[' ', '+', '-', '=', '.', '_', ':', '/', '@'];

/// Days until a tagged resource is flagged for deletion.
const DELETION_DAYS: i64 = 90;

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_SPECIAL.contains(&c)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Ordered cost-accounting tags. Only constructible through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut tags = Vec::new();
        for (key, value) in pairs {
            let tag = Tag {
                key: key.into(),
                value: value.into(),
            };
            debug!("Checking tag {}={}", tag.key, tag.value);
            if !tag.key.chars().all(is_allowed) || !tag.value.chars().all(is_allowed) {
                return Err(DeepSeaError::InvalidTag {
                    key: tag.key,
                    value: tag.value,
                });
            }
            tags.push(tag);
        }
        Ok(Self(tags))
    }

    /// Standard tag set for a user action, stamped with a deletion date 90 days out.
    pub fn for_user(
        config: &TagConfig,
        user_name: &str,
        description: &str,
        now: OffsetDateTime,
    ) -> Result<Self> {
        let org = &config.organization;
        let deletion_date = compact_utc(now + Duration::days(DELETION_DAYS));
        Self::new([
            (format!("{org}:project-number"), config.project_number.clone()),
            (format!("{org}:owner"), user_name.to_string()),
            (format!("{org}:description"), description.to_string()),
            (format!("{org}:stage"), config.stage.clone()),
            (format!("{org}:application"), config.application.clone()),
            (format!("{org}:deletion-date"), deletion_date),
            (format!("{org}:created-by"), user_name.to_string()),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
