//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + Phantom type
//! Plan は engine 内で生成されるので ULID を使う（時刻でソート可能・調整不要）。
//! Action は LLM が命名する（"action_1" など）ので文字列の newtype にしている。
//! `depends_on` はこの文字列を参照する。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use ulid::Ulid;

/// Marker trait for each ULID-backed id type.
pub trait IdMarker: Send + Sync + 'static {
    /// Prefix used by `Display` (e.g. "plan-").
    fn prefix() -> &'static str;
}

/// ULID-backed identifier. `T` only exists at compile time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when an id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id '{0}'")]
pub struct ParseIdError(pub String);

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    /// Accepts both the prefixed form (`plan-01H...`) and a bare ULID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(T::prefix()).unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self::from_ulid)
            .map_err(|_| ParseIdError(s.to_string()))
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Plan のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Plan {}

impl IdMarker for Plan {
    fn prefix() -> &'static str {
        "plan-"
    }
}

/// Identifier of a DecisionPlan (approval / lookup unit).
pub type PlanId = Id<Plan>;

/// Identifier of an action inside one plan, as named by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ActionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_id_displays_with_prefix() {
        let ulid = Ulid::new();
        let id = PlanId::from_ulid(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert!(id.to_string().starts_with("plan-"));
    }

    #[test]
    fn plan_id_parses_prefixed_and_bare_forms() {
        let id = PlanId::from_ulid(Ulid::new());

        let prefixed: PlanId = id.to_string().parse().unwrap();
        let bare: PlanId = id.as_ulid().to_string().parse().unwrap();

        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn plan_id_rejects_garbage() {
        let err = "plan-not-a-ulid".parse::<PlanId>().unwrap_err();
        assert_eq!(err, ParseIdError("plan-not-a-ulid".to_string()));
    }

    #[test]
    fn plan_id_serializes_as_prefixed_string() {
        let id = PlanId::from_ulid(Ulid::new());
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let back: PlanId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn plan_id_is_ulid_sized() {
        assert_eq!(std::mem::size_of::<PlanId>(), std::mem::size_of::<Ulid>());
    }

    #[test]
    fn action_id_serializes_as_plain_string() {
        let id = ActionId::new("action_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"action_1\"");

        let back: ActionId = serde_json::from_str("\"action_2\"").unwrap();
        assert_eq!(back.as_str(), "action_2");
    }
}
