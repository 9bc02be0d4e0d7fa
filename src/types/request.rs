//! Match request payload and per-request tuning overrides

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::{CategoryWeights, DomainBoostSettings, MatchingSettings};
use crate::error::{Error, Result};
use crate::matching::{AlignmentMethod, DomainAnchor};

use super::profile::{RawMember, RawRole};

/// A match request as read from JSON
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub roles: Vec<RawRole>,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub weights: Option<WeightOverrides>,
    #[serde(default)]
    pub domain_boost: Option<DomainBoostOverrides>,
    #[serde(default)]
    pub softmax_temperature: Option<f64>,
}

/// Category weights; fractional values are rounded to the nearest integer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeightOverrides {
    pub skills: Option<f64>,
    pub languages: Option<f64>,
    pub keywords: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainBoostOverrides {
    pub enabled: Option<bool>,
    pub strength: Option<f64>,
    pub temperature: Option<f64>,
    pub method: Option<AlignmentMethod>,
    pub anchors: Option<AnchorSet>,
}

/// Anchors as a list of `{name, text}` or a `name -> text` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnchorSet {
    List(Vec<DomainAnchor>),
    Map(BTreeMap<String, String>),
}

impl AnchorSet {
    pub fn into_anchors(self) -> Vec<DomainAnchor> {
        match self {
            AnchorSet::List(anchors) => anchors,
            AnchorSet::Map(map) => map
                .into_iter()
                .map(|(name, text)| DomainAnchor::new(name, text))
                .collect(),
        }
    }
}

impl MatchRequest {
    /// Parse a request from JSON text
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Merge this request's overrides over the configured settings and
    /// validate the result
    pub fn resolve_settings(
        &self,
        base_matching: &MatchingSettings,
        base_boost: &DomainBoostSettings,
    ) -> Result<(MatchingSettings, DomainBoostSettings)> {
        let mut matching = base_matching.clone();
        let mut boost = base_boost.clone();

        if let Some(top_k) = self.top_k {
            if top_k <= 0 {
                return Err(Error::config_field_invalid(
                    "top_k",
                    format!("top_k must be a positive integer, got {}", top_k),
                ));
            }
            matching.top_k = usize::try_from(top_k)
                .map_err(|_| Error::config_field_invalid("top_k", "top_k is too large"))?;
        }

        if let Some(t) = self.softmax_temperature {
            matching.softmax_temperature = t;
        }

        if let Some(ref w) = self.weights {
            matching.weights = w.apply(&matching.weights)?;
        }

        if let Some(ref overrides) = self.domain_boost {
            if let Some(enabled) = overrides.enabled {
                boost.enabled = enabled;
            }
            if let Some(strength) = overrides.strength {
                boost.strength = strength;
            }
            if let Some(temperature) = overrides.temperature {
                boost.temperature = temperature;
            }
            if let Some(method) = overrides.method {
                boost.method = method;
            }
            if let Some(ref anchors) = overrides.anchors {
                boost.anchors = anchors.clone().into_anchors();
            }
        }

        matching.validate()?;
        boost.validate()?;
        Ok((matching, boost))
    }
}

impl WeightOverrides {
    fn apply(&self, base: &CategoryWeights) -> Result<CategoryWeights> {
        Ok(CategoryWeights {
            skills: weight_value("weights.skills", self.skills, base.skills)?,
            languages: weight_value("weights.languages", self.languages, base.languages)?,
            keywords: weight_value("weights.keywords", self.keywords, base.keywords)?,
        })
    }
}

fn weight_value(field: &str, value: Option<f64>, base: u32) -> Result<u32> {
    let Some(v) = value else {
        return Ok(base);
    };
    if !v.is_finite() || v < 0.0 {
        return Err(Error::config_field_invalid(
            field,
            format!("weight must be a non-negative number, got {}", v),
        ));
    }
    let rounded = v.round();
    if rounded > f64::from(u32::MAX) {
        return Err(Error::config_field_invalid(field, "weight is too large"));
    }
    Ok(rounded as u32)
}
