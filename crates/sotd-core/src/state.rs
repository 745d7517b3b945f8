//! Shapes of the persisted tables.
//!
//! Every table is a plain ordered collection so that documents serialise
//! deterministically and "unchanged" means byte-for-byte unchanged.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::track::TrackId;

/// Identifier of a chat community (a Discord guild).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CommunityId(String);

/// Identifier of an announcement target inside a community (a channel).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DestinationId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Text(String),
  Number(u64),
}

macro_rules! string_id {
  ($ty:ident) => {
    impl $ty {
      pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $ty {
      fn from(s: &str) -> Self { Self(s.to_owned()) }
    }

    // Discord snowflakes also appear as bare JSON integers.
    impl<'de> Deserialize<'de> for $ty {
      fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
      ) -> std::result::Result<Self, D::Error> {
        match RawId::deserialize(deserializer)? {
          RawId::Text(id) => Ok(Self(id)),
          RawId::Number(id) => Ok(Self(id.to_string())),
        }
      }
    }
  };
}

string_id!(CommunityId);
string_id!(DestinationId);

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Ids chosen since the last wrap-around reset.
pub type UsedSet = BTreeSet<TrackId>;

/// Manually scheduled picks, keyed by calendar date.
pub type OverrideMap = BTreeMap<NaiveDate, TrackId>;

/// One announcement destination per community.
pub type DestinationRegistry = BTreeMap<CommunityId, DestinationId>;

/// Role names allowed to run administrative commands, per community.
pub type RoleAllowList = BTreeMap<CommunityId, BTreeSet<String>>;
