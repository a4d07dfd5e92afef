//! Classification enums shared by all knowledge records.
//!
//! Every record carries a [`Domain`]; lifecycle-bearing records carry a
//! [`LifecycleStatus`]. The remaining enums type the per-kind `*_type`
//! fields that the store keeps as filterable text.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Coarse classification tag used for filtering across all collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Personal,
    Work,
    Both,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Personal => write!(f, "personal"),
            Domain::Work => write!(f, "work"),
            Domain::Both => write!(f, "both"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Domain::Personal),
            "work" => Ok(Domain::Work),
            "both" => Ok(Domain::Both),
            other => Err(format!("invalid domain: '{other}'")),
        }
    }
}

/// Lifecycle status for Strategy, Insight, and Process records.
///
/// A record marked `Superseded` must point at its replacement via
/// `superseded_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Active,
    Superseded,
    Archived,
}

impl Default for LifecycleStatus {
    fn default() -> Self {
        LifecycleStatus::Active
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::Active => write!(f, "active"),
            LifecycleStatus::Superseded => write!(f, "superseded"),
            LifecycleStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(LifecycleStatus::Active),
            "superseded" => Ok(LifecycleStatus::Superseded),
            "archived" => Ok(LifecycleStatus::Archived),
            other => Err(format!("invalid lifecycle status: '{other}'")),
        }
    }
}

/// Lifecycle status for Entity records (entities are never superseded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Inactive,
    Archived,
}

impl Default for EntityStatus {
    fn default() -> Self {
        EntityStatus::Active
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Active => write!(f, "active"),
            EntityStatus::Inactive => write!(f, "inactive"),
            EntityStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for EntityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EntityStatus::Active),
            "inactive" => Ok(EntityStatus::Inactive),
            "archived" => Ok(EntityStatus::Archived),
            other => Err(format!("invalid entity status: '{other}'")),
        }
    }
}

/// What kind of thing an Entity record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Company,
    Team,
    Product,
    Project,
    Conference,
    Community,
    Person,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Company => write!(f, "company"),
            EntityType::Team => write!(f, "team"),
            EntityType::Product => write!(f, "product"),
            EntityType::Project => write!(f, "project"),
            EntityType::Conference => write!(f, "conference"),
            EntityType::Community => write!(f, "community"),
            EntityType::Person => write!(f, "person"),
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(EntityType::Company),
            "team" => Ok(EntityType::Team),
            "product" => Ok(EntityType::Product),
            "project" => Ok(EntityType::Project),
            "conference" => Ok(EntityType::Conference),
            "community" => Ok(EntityType::Community),
            "person" => Ok(EntityType::Person),
            other => Err(format!("invalid entity type: '{other}'")),
        }
    }
}

/// What kind of decision-making knowledge a Strategy record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Goal,
    Framework,
    Principle,
    Priority,
    MentalModel,
    Methodology,
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyType::Goal => write!(f, "goal"),
            StrategyType::Framework => write!(f, "framework"),
            StrategyType::Principle => write!(f, "principle"),
            StrategyType::Priority => write!(f, "priority"),
            StrategyType::MentalModel => write!(f, "mental_model"),
            StrategyType::Methodology => write!(f, "methodology"),
        }
    }
}

impl FromStr for StrategyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "goal" => Ok(StrategyType::Goal),
            "framework" => Ok(StrategyType::Framework),
            "principle" => Ok(StrategyType::Principle),
            "priority" => Ok(StrategyType::Priority),
            "mental_model" => Ok(StrategyType::MentalModel),
            "methodology" => Ok(StrategyType::Methodology),
            other => Err(format!("invalid strategy type: '{other}'")),
        }
    }
}

/// Where an Insight came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Article,
    Video,
    Book,
    Podcast,
    Conversation,
    Reflection,
    Research,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Article => write!(f, "article"),
            SourceType::Video => write!(f, "video"),
            SourceType::Book => write!(f, "book"),
            SourceType::Podcast => write!(f, "podcast"),
            SourceType::Conversation => write!(f, "conversation"),
            SourceType::Reflection => write!(f, "reflection"),
            SourceType::Research => write!(f, "research"),
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article" => Ok(SourceType::Article),
            "video" => Ok(SourceType::Video),
            "book" => Ok(SourceType::Book),
            "podcast" => Ok(SourceType::Podcast),
            "conversation" => Ok(SourceType::Conversation),
            "reflection" => Ok(SourceType::Reflection),
            "research" => Ok(SourceType::Research),
            other => Err(format!("invalid source type: '{other}'")),
        }
    }
}

/// What kind of occurrence an Event record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Meeting,
    Decision,
    Milestone,
    Announcement,
    Workshop,
    Review,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Meeting => write!(f, "meeting"),
            EventType::Decision => write!(f, "decision"),
            EventType::Milestone => write!(f, "milestone"),
            EventType::Announcement => write!(f, "announcement"),
            EventType::Workshop => write!(f, "workshop"),
            EventType::Review => write!(f, "review"),
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meeting" => Ok(EventType::Meeting),
            "decision" => Ok(EventType::Decision),
            "milestone" => Ok(EventType::Milestone),
            "announcement" => Ok(EventType::Announcement),
            "workshop" => Ok(EventType::Workshop),
            "review" => Ok(EventType::Review),
            other => Err(format!("invalid event type: '{other}'")),
        }
    }
}

/// How much weight an Insight should be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Hypothesis,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
            Confidence::Hypothesis => write!(f, "hypothesis"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            "hypothesis" => Ok(Confidence::Hypothesis),
            other => Err(format!("invalid confidence: '{other}'")),
        }
    }
}

/// How long a Strategy is expected to stay relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeHorizon {
    Evergreen,
    Quarterly,
    Yearly,
    ProjectBound,
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeHorizon::Evergreen => write!(f, "evergreen"),
            TimeHorizon::Quarterly => write!(f, "quarterly"),
            TimeHorizon::Yearly => write!(f, "yearly"),
            TimeHorizon::ProjectBound => write!(f, "project-bound"),
        }
    }
}

impl FromStr for TimeHorizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "evergreen" => Ok(TimeHorizon::Evergreen),
            "quarterly" => Ok(TimeHorizon::Quarterly),
            "yearly" => Ok(TimeHorizon::Yearly),
            "project-bound" => Ok(TimeHorizon::ProjectBound),
            other => Err(format!("invalid time horizon: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_roundtrip() {
        for d in [Domain::Personal, Domain::Work, Domain::Both] {
            let s = d.to_string();
            let parsed: Domain = s.parse().unwrap();
            assert_eq!(d, parsed);
        }
    }

    #[test]
    fn test_domain_serde() {
        let d = Domain::Both;
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"both\"");
        let parsed: Domain = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Domain::Both);
    }

    #[test]
    fn test_lifecycle_status_roundtrip() {
        for s in [
            LifecycleStatus::Active,
            LifecycleStatus::Superseded,
            LifecycleStatus::Archived,
        ] {
            let parsed: LifecycleStatus = s.to_string().parse().unwrap();
            assert_eq!(s, parsed);
        }
    }

    #[test]
    fn test_lifecycle_status_default_is_active() {
        assert_eq!(LifecycleStatus::default(), LifecycleStatus::Active);
    }

    #[test]
    fn test_entity_status_rejects_superseded() {
        assert!("superseded".parse::<EntityStatus>().is_err());
    }

    #[test]
    fn test_strategy_type_snake_case() {
        let t = StrategyType::MentalModel;
        assert_eq!(t.to_string(), "mental_model");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"mental_model\"");
        let parsed: StrategyType = "mental_model".parse().unwrap();
        assert_eq!(parsed, StrategyType::MentalModel);
    }

    #[test]
    fn test_time_horizon_kebab_case() {
        let t = TimeHorizon::ProjectBound;
        assert_eq!(t.to_string(), "project-bound");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"project-bound\"");
        let parsed: TimeHorizon = "project-bound".parse().unwrap();
        assert_eq!(parsed, TimeHorizon::ProjectBound);
    }

    #[test]
    fn test_entity_type_roundtrip() {
        for t in [
            EntityType::Company,
            EntityType::Team,
            EntityType::Product,
            EntityType::Project,
            EntityType::Conference,
            EntityType::Community,
            EntityType::Person,
        ] {
            let parsed: EntityType = t.to_string().parse().unwrap();
            assert_eq!(t, parsed);
        }
    }

    #[test]
    fn test_source_type_roundtrip() {
        for t in [
            SourceType::Article,
            SourceType::Video,
            SourceType::Book,
            SourceType::Podcast,
            SourceType::Conversation,
            SourceType::Reflection,
            SourceType::Research,
        ] {
            let parsed: SourceType = t.to_string().parse().unwrap();
            assert_eq!(t, parsed);
        }
    }

    #[test]
    fn test_event_type_roundtrip() {
        for t in [
            EventType::Meeting,
            EventType::Decision,
            EventType::Milestone,
            EventType::Announcement,
            EventType::Workshop,
            EventType::Review,
        ] {
            let parsed: EventType = t.to_string().parse().unwrap();
            assert_eq!(t, parsed);
        }
    }

    #[test]
    fn test_confidence_roundtrip() {
        for c in [
            Confidence::High,
            Confidence::Medium,
            Confidence::Low,
            Confidence::Hypothesis,
        ] {
            let parsed: Confidence = c.to_string().parse().unwrap();
            assert_eq!(c, parsed);
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!("office".parse::<Domain>().is_err());
        assert!("done".parse::<LifecycleStatus>().is_err());
        assert!("tweet".parse::<SourceType>().is_err());
    }
}
