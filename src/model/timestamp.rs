use std::ops::Deref;

use derive_new::new;
use serde::{Deserialize, Serialize};

pub fn now() -> Timestamp {
    Timestamp(chrono::Utc::now())
}

/// A point in time, stored and served as an RFC 3339 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, new)]
pub struct Timestamp(chrono::DateTime<chrono::Utc>);

impl Deref for Timestamp {
    type Target = chrono::DateTime<chrono::Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // fixed width so stored timestamps sort as strings
        self.0
            .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| Self(dt.into()))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_json() {
        let timestamp = now();
        let json = serde_json::to_string(&timestamp).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, timestamp);
    }

    #[test]
    fn rejects_other_formats() {
        let parsed = serde_json::from_str::<Timestamp>("\"yesterday\"");
        assert!(parsed.is_err());
    }
}
