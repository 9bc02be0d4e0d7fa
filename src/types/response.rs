//! Match response payload

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matching::{DomainDebug, MemberText, RoleText};

/// One member's standing for a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub member: String,
    /// Amplified similarity
    pub score: f64,
    /// Softmax of the role's score row; comparable within one role only
    pub soft_score: f64,
}

/// Ranked candidates for one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub role: String,
    /// Sorted by descending `soft_score`
    pub candidates: Vec<Candidate>,
    pub winner: Option<String>,
    pub log: String,
}

/// Embedding activity during one match
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbeddingDebug {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub upstream_calls: u64,
}

/// Everything that went into the result, for transparency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    pub request_id: String,
    pub top_k: usize,
    pub roles: Vec<RoleText>,
    pub members: Vec<MemberText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainDebug>,
    pub warnings: Vec<String>,
    pub softmax_temperature: f64,
    pub embedding: EmbeddingDebug,
}

/// Result of a match request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResponse {
    /// role title -> member name; unassigned roles are absent
    pub assignments: BTreeMap<String, String>,
    /// role title -> member name -> amplified score
    pub similarity_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    /// One report per role, in role input order
    pub reports: Vec<CandidateReport>,
    pub debug: DebugInfo,
}
