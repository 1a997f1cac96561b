//! Paper data model
//!
//! This module defines the records returned by the paper API, the edge
//! stubs linking them, and the helpers that derive filenames and compare
//! titles.

mod slug;
mod title;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub use slug::{file_name_for, slugify_title, MAX_SLUG_CHARS};
pub use title::{title_distance, titles_match, DEFAULT_MAX_TITLE_DISTANCE};

/// One paper as returned by the paper API
///
/// Fields the crawler does not interpret (abstract, venue, authors, topics,
/// bibtex and so on) are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Stable paper identifier
    #[serde(rename = "paperId")]
    pub id: String,

    /// Display title, used to derive the output filename
    #[serde(default)]
    pub title: Option<String>,

    /// Papers this paper cites
    #[serde(default, deserialize_with = "null_as_empty_list")]
    pub references: Vec<RelatedPaperStub>,

    /// Papers citing this paper
    #[serde(default, deserialize_with = "null_as_empty_list")]
    pub citations: Vec<RelatedPaperStub>,

    /// Every other field, passed through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PaperRecord {
    /// Creates a bare record with no edges
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            references: Vec::new(),
            citations: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Returns the edge list of the given kind
    pub fn edges(&self, kind: EdgeKind) -> &[RelatedPaperStub] {
        match kind {
            EdgeKind::References => &self.references,
            EdgeKind::Citations => &self.citations,
        }
    }

    /// Returns the tracked (non-empty) target ids of the given kind, in order
    pub fn edge_ids(&self, kind: EdgeKind) -> impl Iterator<Item = &str> {
        self.edges(kind).iter().filter_map(RelatedPaperStub::tracked_id)
    }
}

/// Lightweight edge target, identified by paper id only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPaperStub {
    /// Target paper id; empty when the API does not track the paper
    #[serde(rename = "paperId", default, deserialize_with = "null_as_empty")]
    pub id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelatedPaperStub {
    /// Creates a stub pointing at `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }

    /// Returns the id unless it is the "untracked" empty marker
    pub fn tracked_id(&self) -> Option<&str> {
        if self.id.is_empty() {
            None
        } else {
            Some(&self.id)
        }
    }
}

/// The two kinds of edges followed by the crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    References,
    Citations,
}

impl EdgeKind {
    /// Expansion order for every node: references first, then citations
    pub const ORDER: [EdgeKind; 2] = [EdgeKind::References, EdgeKind::Citations];

    /// Returns the JSON field name for this edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::References => "references",
            Self::Citations => "citations",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_list<'de, D>(deserializer: D) -> Result<Vec<RelatedPaperStub>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RelatedPaperStub>>::deserialize(deserializer)?.unwrap_or_default())
}
