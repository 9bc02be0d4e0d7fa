//! Match pipeline
//!
//! normalize -> embed -> cosine -> domain amplification -> greedy assignment
//! -> per-role reports. Tuning is validated before any embedding call; any
//! embedding failure fails the whole request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{DomainBoostSettings, MatcherConfig, MatchingSettings};
use crate::embedding::{create_cached_provider, CachedProvider, CacheStats, Embedding, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::types::{
    resolve_members, resolve_roles, DebugInfo, EmbeddingDebug, MatchRequest, MatchResponse,
};

use super::amplify::{amplify, DomainAnchor, EmbeddedSide};
use super::assign::assign;
use super::normalize::{normalize_member, normalize_role, MemberText, RoleText};
use super::report::build_reports;
use super::similarity::score;

/// Runs match requests against one embedding provider
pub struct RoleMatcher {
    provider: Arc<CachedProvider>,
    matching: MatchingSettings,
    domain_boost: DomainBoostSettings,
}

impl RoleMatcher {
    pub fn new(provider: Arc<CachedProvider>, matching: MatchingSettings, domain_boost: DomainBoostSettings) -> Self {
        Self {
            provider,
            matching,
            domain_boost,
        }
    }

    /// Build the provider stack described by `config`
    pub fn from_config(config: &MatcherConfig) -> Result<Self> {
        let provider = create_cached_provider(&config.embedding, &config.cache)?;
        Ok(Self::new(provider, config.matching.clone(), config.domain_boost.clone()))
    }

    /// Run one match request
    pub async fn run(&self, request: MatchRequest) -> Result<MatchResponse> {
        let request_id = Uuid::new_v4();
        self.run_inner(request, request_id)
            .instrument(info_span!("match", request_id = %request_id))
            .await
    }

    async fn run_inner(&self, request: MatchRequest, request_id: Uuid) -> Result<MatchResponse> {
        let started = Instant::now();
        let (matching, boost) = request.resolve_settings(&self.matching, &self.domain_boost)?;

        let MatchRequest { roles, members, .. } = request;
        let roles = resolve_roles(roles);
        let members = resolve_members(members);

        info!(
            roles = roles.len(),
            members = members.len(),
            top_k = matching.top_k,
            domain_boost = boost.is_active(),
            "Match started"
        );

        let role_texts: Vec<RoleText> = roles.iter().map(normalize_role).collect();
        let member_texts: Vec<MemberText> = members
            .iter()
            .map(|m| normalize_member(m, matching.top_k, &matching.weights))
            .collect();
        let mut warnings = degenerate_warnings(&role_texts, &member_texts);

        let stats_before = self.provider.stats();
        let mut debug_info = DebugInfo {
            request_id: request_id.to_string(),
            top_k: matching.top_k,
            roles: role_texts.clone(),
            members: member_texts.clone(),
            domain: None,
            warnings: Vec::new(),
            softmax_temperature: matching.softmax_temperature,
            embedding: EmbeddingDebug {
                provider: self.provider.provider_name().to_string(),
                model: self.provider.model_id().to_string(),
                ..Default::default()
            },
        };

        if role_texts.is_empty() || member_texts.is_empty() {
            if role_texts.is_empty() {
                warnings.push("No roles provided; nothing to match".to_string());
            }
            if member_texts.is_empty() {
                warnings.push("No members provided; nothing to match".to_string());
            }
            debug_info.warnings = warnings;
            info!("Match skipped: empty input");
            return Ok(MatchResponse {
                assignments: BTreeMap::new(),
                similarity_matrix: BTreeMap::new(),
                reports: Vec::new(),
                debug: debug_info,
            });
        }

        let anchors: &[DomainAnchor] = if boost.is_active() { &boost.anchors } else { &[] };
        let (role_vectors, member_vectors, anchor_vectors) = tokio::try_join!(
            self.embed_roles(&role_texts),
            self.embed_members(&member_texts),
            self.embed_anchors(anchors),
        )?;

        let dimensions = role_vectors.first().map(Vec::len).unwrap_or(0);
        let member_vectors: Vec<Embedding> = member_vectors
            .into_iter()
            .map(|v| v.unwrap_or_else(|| vec![0.0; dimensions]))
            .collect();
        debug!(dimensions, anchors = anchor_vectors.len(), "Embeddings ready");

        let raw = score(&role_vectors, &member_vectors)?;

        let role_names: Vec<String> = role_texts.iter().map(|r| r.role.clone()).collect();
        let member_names: Vec<String> = member_texts.iter().map(|m| m.name.clone()).collect();
        let amplified = amplify(
            &raw,
            EmbeddedSide { names: &role_names, vectors: &role_vectors },
            EmbeddedSide { names: &member_names, vectors: &member_vectors },
            anchors,
            &anchor_vectors,
            &boost,
        )?;
        let matrix = amplified.matrix;

        let assignment = assign(&matrix);
        let reports = build_reports(&matrix, &assignment, &role_texts, &member_texts, matching.softmax_temperature);

        let assignments: BTreeMap<String, String> = assignment
            .pairs()
            .map(|(r, m)| (role_names[r].clone(), member_names[m].clone()))
            .collect();

        let similarity_matrix = role_names
            .iter()
            .enumerate()
            .map(|(r, role)| {
                let row = member_names
                    .iter()
                    .enumerate()
                    .map(|(m, member)| (member.clone(), matrix.get(r, m)))
                    .collect();
                (role.clone(), row)
            })
            .collect();

        let stats: CacheStats = self.provider.stats().since(&stats_before);
        debug_info.domain = amplified.debug;
        debug_info.warnings = warnings;
        debug_info.embedding.dimensions = dimensions;
        debug_info.embedding.cache_hits = stats.hits();
        debug_info.embedding.cache_misses = stats.misses;
        debug_info.embedding.upstream_calls = stats.misses;

        info!(
            assigned = assignment.len(),
            unassigned_roles = role_names.len() - assignment.len(),
            cache_hits = stats.hits(),
            upstream_calls = stats.misses,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Match complete"
        );

        Ok(MatchResponse {
            assignments,
            similarity_matrix,
            reports,
            debug: debug_info,
        })
    }

    async fn embed_roles(&self, roles: &[RoleText]) -> Result<Vec<Embedding>> {
        let texts: Vec<String> = roles.iter().map(|r| r.text.clone()).collect();
        let labels: Vec<(usize, &str)> = roles.iter().enumerate().map(|(i, r)| (i, r.role.as_str())).collect();
        self.provider
            .embed_batch(&texts)
            .await
            .map_err(|e| locate(e, "role", &labels))
    }

    /// Members with an empty text are not sent upstream and come back as None
    async fn embed_members(&self, members: &[MemberText]) -> Result<Vec<Option<Embedding>>> {
        let (labels, texts): (Vec<(usize, &str)>, Vec<String>) = members
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_degenerate())
            .map(|(i, m)| ((i, m.name.as_str()), m.text.clone()))
            .unzip();

        let vectors = self
            .provider
            .embed_batch(&texts)
            .await
            .map_err(|e| locate(e, "member", &labels))?;

        let mut slots: Vec<Option<Embedding>> = vec![None; members.len()];
        for ((position, _), vector) in labels.into_iter().zip(vectors) {
            slots[position] = Some(vector);
        }
        Ok(slots)
    }

    async fn embed_anchors(&self, anchors: &[DomainAnchor]) -> Result<Vec<Embedding>> {
        let texts: Vec<String> = anchors.iter().map(|a| a.text.clone()).collect();
        let labels: Vec<(usize, &str)> = anchors.iter().enumerate().map(|(i, a)| (i, a.name.as_str())).collect();
        self.provider
            .embed_batch(&texts)
            .await
            .map_err(|e| locate(e, "anchor", &labels))
    }
}

/// Rewrite a batch error so it names the input and its position in the
/// original list
fn locate(err: Error, group: &str, labels: &[(usize, &str)]) -> Error {
    match err {
        Error::Embedding { index: Some(i), message } => match labels.get(i) {
            Some((position, name)) => Error::Embedding {
                index: Some(*position),
                message: format!("{} '{}': {}", group, name, message),
            },
            None => Error::Embedding { index: Some(i), message },
        },
        other => other,
    }
}

fn degenerate_warnings(roles: &[RoleText], members: &[MemberText]) -> Vec<String> {
    let mut warnings = Vec::new();
    for role in roles.iter().filter(|r| r.is_degenerate()) {
        warn!(role = %role.role, "Role has no core skills");
        warnings.push(format!(
            "Role '{}' has no core skills; its score carries no skill signal",
            role.role
        ));
    }
    for member in members.iter().filter(|m| m.is_degenerate()) {
        warn!(member = %member.name, "Member normalizes to an empty text");
        warnings.push(format!(
            "Member '{}' has no skills, languages or keywords to embed; every score is 0",
            member.name
        ));
    }
    warnings
}
