//! Knowledge record types for Nebula.
//!
//! One explicit struct per record kind instead of untyped property maps,
//! so required vs optional fields are checked at compile time. The
//! [`KnowledgeRecord`] tagged union is what flows through the store and
//! service layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::taxonomy::{
    Confidence, Domain, EntityStatus, EntityType, EventType, LifecycleStatus, SourceType,
    StrategyType, TimeHorizon,
};

/// The five record kinds, one per store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Entity,
    Strategy,
    Insight,
    Event,
    Process,
}

impl RecordKind {
    /// Collection creation order. Forward references only ever point at
    /// collections earlier in this sequence (plus self-references), so
    /// creating in this order is always valid.
    pub const CREATION_ORDER: [RecordKind; 5] = [
        RecordKind::Entity,
        RecordKind::Strategy,
        RecordKind::Insight,
        RecordKind::Event,
        RecordKind::Process,
    ];

    /// The collection name in the store.
    pub fn collection_name(&self) -> &'static str {
        match self {
            RecordKind::Entity => "Entity",
            RecordKind::Strategy => "Strategy",
            RecordKind::Insight => "Insight",
            RecordKind::Event => "Event",
            RecordKind::Process => "Process",
        }
    }

    /// Reference property names declared on this kind, with their targets.
    pub fn reference_targets(&self) -> &'static [(&'static str, RecordKind)] {
        match self {
            RecordKind::Entity => &[],
            RecordKind::Strategy => &[
                ("appliesToEntities", RecordKind::Entity),
                ("relatedStrategies", RecordKind::Strategy),
            ],
            RecordKind::Insight => &[
                ("relatedStrategies", RecordKind::Strategy),
                ("relatedEntities", RecordKind::Entity),
                ("relatedInsights", RecordKind::Insight),
            ],
            RecordKind::Event => &[
                ("involvesEntities", RecordKind::Entity),
                ("relatesToStrategies", RecordKind::Strategy),
                ("generatedInsights", RecordKind::Insight),
            ],
            RecordKind::Process => &[
                ("appliesToEntities", RecordKind::Entity),
                ("relatedStrategies", RecordKind::Strategy),
            ],
        }
    }

    /// Look up the target kind of a reference property, if declared.
    pub fn reference_target(&self, ref_name: &str) -> Option<RecordKind> {
        self.reference_targets()
            .iter()
            .find(|(name, _)| *name == ref_name)
            .map(|(_, target)| *target)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection_name())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entity" => Ok(RecordKind::Entity),
            "strategy" => Ok(RecordKind::Strategy),
            "insight" => Ok(RecordKind::Insight),
            "event" => Ok(RecordKind::Event),
            "process" => Ok(RecordKind::Process),
            other => Err(format!("invalid record kind: '{other}'")),
        }
    }
}

/// An organization, team, product, project, or person in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub entity_type: EntityType,
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Running notes: what works with them, preferences, history, quirks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A goal, framework, principle, or priority used for decision-making.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub title: String,
    pub content: String,
    pub strategy_type: StrategyType,
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_horizon: Option<TimeHorizon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// None means no expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub status: LifecycleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An atomic knowledge unit: a learning, observation, idea, or pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// The insight itself, written to be self-contained.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub status: LifecycleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A point-in-time occurrence: meeting, decision, milestone, announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Names with optional context, e.g. "Marie (Product)".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcomes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_questions: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recurring procedure: steps, principles, checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub title: String,
    pub content: String,
    pub domain: Domain,
    /// When to use this process: conditions, cues, schedules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggers: Option<String>,
    pub status: LifecycleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tagged union over the five record kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum KnowledgeRecord {
    Entity(Entity),
    Strategy(Strategy),
    Insight(Insight),
    Event(Event),
    Process(Process),
}

impl KnowledgeRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            KnowledgeRecord::Entity(_) => RecordKind::Entity,
            KnowledgeRecord::Strategy(_) => RecordKind::Strategy,
            KnowledgeRecord::Insight(_) => RecordKind::Insight,
            KnowledgeRecord::Event(_) => RecordKind::Event,
            KnowledgeRecord::Process(_) => RecordKind::Process,
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            KnowledgeRecord::Entity(e) => e.domain,
            KnowledgeRecord::Strategy(s) => s.domain,
            KnowledgeRecord::Insight(i) => i.domain,
            KnowledgeRecord::Event(e) => e.domain,
            KnowledgeRecord::Process(p) => p.domain,
        }
    }

    /// Lifecycle status and supersession pointer, for the kinds that have
    /// them (Strategy, Insight, Process).
    pub fn lifecycle(&self) -> Option<(LifecycleStatus, Option<Uuid>)> {
        match self {
            KnowledgeRecord::Strategy(s) => Some((s.status, s.superseded_by)),
            KnowledgeRecord::Insight(i) => Some((i.status, i.superseded_by)),
            KnowledgeRecord::Process(p) => Some((p.status, p.superseded_by)),
            _ => None,
        }
    }

    /// Mutable access to lifecycle fields. Returns None for Entity/Event.
    pub fn lifecycle_mut(&mut self) -> Option<(&mut LifecycleStatus, &mut Option<Uuid>)> {
        match self {
            KnowledgeRecord::Strategy(s) => Some((&mut s.status, &mut s.superseded_by)),
            KnowledgeRecord::Insight(i) => Some((&mut i.status, &mut i.superseded_by)),
            KnowledgeRecord::Process(p) => Some((&mut p.status, &mut p.superseded_by)),
            _ => None,
        }
    }

    /// Stamp `updated_at` on the kinds that track it.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        match self {
            KnowledgeRecord::Entity(e) => e.updated_at = now,
            KnowledgeRecord::Strategy(s) => s.updated_at = now,
            KnowledgeRecord::Insight(i) => i.updated_at = now,
            KnowledgeRecord::Event(_) => {}
            KnowledgeRecord::Process(p) => p.updated_at = now,
        }
    }

    /// A short human-readable label (name/title/content prefix) for display.
    pub fn label(&self) -> &str {
        match self {
            KnowledgeRecord::Entity(e) => &e.name,
            KnowledgeRecord::Strategy(s) => &s.title,
            KnowledgeRecord::Insight(i) => &i.content,
            KnowledgeRecord::Event(e) => &e.title,
            KnowledgeRecord::Process(p) => &p.title,
        }
    }
}

/// Directed reference edges from one record to others, keyed by the
/// reference property name declared in the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct References(pub BTreeMap<String, Vec<Uuid>>);

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single reference under one property name.
    pub fn single(ref_name: &str, target: Uuid) -> Self {
        let mut refs = Self::new();
        refs.add(ref_name, target);
        refs
    }

    pub fn add(&mut self, ref_name: &str, target: Uuid) {
        self.0.entry(ref_name.to_string()).or_default().push(target);
    }

    pub fn get(&self, ref_name: &str) -> &[Uuid] {
        self.0.get(ref_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Uuid])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A referenced record resolved during fetch-with-expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub id: Uuid,
    pub record: KnowledgeRecord,
}

/// A record as returned by the store: identifier, properties, outgoing
/// reference edges, and (when expansion was requested) one level of
/// resolved reference targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: Uuid,
    pub record: KnowledgeRecord,
    #[serde(default)]
    pub references: References,
    /// Resolved targets per reference property. Targets that no longer
    /// exist are dropped at read time rather than surfaced as errors.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resolved: BTreeMap<String, Vec<ResolvedReference>>,
}
