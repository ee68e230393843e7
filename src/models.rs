use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A single harvested comment. Immutable once loaded; the only permitted
/// mutation is backfilling a missing `parent_id` exactly once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub author_flair_text: Option<String>,
    pub score: i64,
    pub id: String,
    pub permalink: String,
    pub body: String,
    /// Epoch seconds on the wire.
    #[serde(with = "epoch_seconds")]
    pub created_utc: OffsetDateTime,
    /// `t1_`-prefixed: parent is another comment. `t3_`-prefixed: parent is
    /// the day's root submission, i.e. this is a top-level comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
}

impl Comment {
    /// True when the parent reference says "root submission".
    pub fn is_top_level(&self) -> bool {
        self.parent_id.as_deref().map_or(false, |p| p.starts_with("t3_"))
    }

    pub fn to_prompt_string(&self) -> String {
        let ts = self.created_utc.format(&Rfc3339).unwrap_or_default();
        let flair = self.author_flair_text.as_deref().unwrap_or("");
        format!("At {ts}, {} ({flair}) wrote:\n{}", self.author, self.body)
    }
}

/// Serialize `OffsetDateTime` as plain epoch seconds; accept integer or
/// float seconds on the wire (platform dumps use both).
pub(crate) mod epoch_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(dt: &OffsetDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_i64(dt.unix_timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<OffsetDateTime, D::Error> {
        let secs = f64::deserialize(de)?;
        OffsetDateTime::from_unix_timestamp(secs as i64).map_err(serde::de::Error::custom)
    }
}
