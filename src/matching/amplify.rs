//! Domain amplification
//!
//! Roles and members are compared against a set of named anchor domains
//! (frontend, backend, data-ml, ...). Each side gets a softmax distribution
//! over the anchors; pairs that agree on their strongest domain are boosted
//! and pairs that disagree are penalized, proportionally to how confident
//! both sides are.
//!
//! Two curves are available:
//! - `peak`: `1 ± strength·√(c_role·c_member)` where `c` rescales the top
//!   anchor probability from `[1/D, 1]` to `[0, 1]`
//! - `dot`: `1 + strength·(2·(p_role·p_member) − 1)`

use serde::{Deserialize, Serialize};

use crate::config::DomainBoostSettings;
use crate::embedding::Embedding;
use crate::error::{Error, Result};

use super::similarity::{cosine, SimilarityMatrix};

// ─────────────────────────────────────────────────────────────────
// Anchors
// ─────────────────────────────────────────────────────────────────

/// A named domain described by exemplar text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAnchor {
    pub name: String,
    pub text: String,
}

impl DomainAnchor {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Built-in anchor set
pub fn default_anchors() -> Vec<DomainAnchor> {
    [
        (
            "frontend",
            "frontend web development; UI; UX; React; Next.js; JavaScript; TypeScript; HTML; CSS; Tailwind; accessibility; design systems",
        ),
        (
            "backend",
            "backend server development; APIs; microservices; databases; PostgreSQL; MySQL; Redis; Node.js; Python; Java; Go; REST; GraphQL; scalability; reliability",
        ),
        (
            "data-ml",
            "data science; machine learning; deep learning; statistics; pandas; numpy; scikit-learn; TensorFlow; PyTorch; data pipelines; feature engineering; MLOps",
        ),
        (
            "devops",
            "DevOps; CI/CD; Docker; Kubernetes; Terraform; Infrastructure as Code; AWS; Azure; GCP; observability; logging; monitoring; SRE",
        ),
        (
            "mobile",
            "mobile development; iOS; Android; Swift; Kotlin; React Native; Flutter; mobile UI; app store; device APIs",
        ),
        (
            "security",
            "cybersecurity; application security; encryption; IAM; vulnerability; pentesting; threat modeling; OWASP; zero trust",
        ),
        (
            "product-design",
            "product management; product discovery; UX research; UI design; interaction design; prototyping; Figma; user testing",
        ),
        (
            "finance",
            "finance; accounting; financial markets; trading; investment banking; quant; derivatives; portfolio; risk management; fintech; payments",
        ),
        (
            "healthcare",
            "healthcare; medical; clinical; EHR; patient care; HIPAA; biomed; pharma; diagnostics; public health",
        ),
        (
            "education",
            "education; edtech; pedagogy; teaching; curriculum; learning science; assessment; LMS",
        ),
    ]
    .into_iter()
    .map(|(name, text)| DomainAnchor::new(name, text))
    .collect()
}

/// How two anchor distributions are turned into a scale factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMethod {
    /// Boost on shared top anchor, penalize otherwise, scaled by confidence
    #[default]
    Peak,
    /// Expected overlap of the two distributions
    Dot,
    /// Cosine between the two distributions
    Cosine,
}

impl AlignmentMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AlignmentMethod::Peak => "peak",
            AlignmentMethod::Dot => "dot",
            AlignmentMethod::Cosine => "cosine",
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Debug payload
// ─────────────────────────────────────────────────────────────────

/// What the amplifier saw, for the response debug section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainDebug {
    pub strength: f64,
    pub temperature: f64,
    pub method: AlignmentMethod,
    pub anchors: Vec<String>,
    pub roles: Vec<AnchorAffinity>,
    pub members: Vec<AnchorAffinity>,
    pub factors: FactorRange,
}

/// One role's or member's relation to the anchors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorAffinity {
    pub name: String,
    pub top: String,
    pub confidence: f64,
    /// Raw cosine to each anchor, in anchor order
    pub scores: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Names and vectors of one side of the matrix, in matrix order
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedSide<'a> {
    pub names: &'a [String],
    pub vectors: &'a [Embedding],
}

/// Amplified scores plus debug info (absent when amplification is off)
#[derive(Debug, Clone)]
pub struct Amplified {
    pub matrix: SimilarityMatrix,
    pub debug: Option<DomainDebug>,
}

// ─────────────────────────────────────────────────────────────────
// Math
// ─────────────────────────────────────────────────────────────────

/// Numerically stable softmax with temperature (> 0).
///
/// A temperature small enough to overflow `v / temperature` takes the
/// zero-temperature limit: the mass is split evenly over the maxima.
pub fn softmax(values: &[f64], temperature: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let scaled: Vec<f64> = values.iter().map(|v| v / temperature).collect();
    if scaled.iter().any(|v| !v.is_finite()) {
        return hard_max(values);
    }
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn hard_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ties = values.iter().filter(|v| **v == max).count().max(1) as f64;
    values
        .iter()
        .map(|v| if *v == max { 1.0 / ties } else { 0.0 })
        .collect()
}

/// Index of the largest value, first one on ties
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Distribution of one side over the anchors
#[derive(Debug, Clone)]
struct AnchorProfile {
    scores: Vec<f64>,
    distribution: Vec<f64>,
    top: usize,
    confidence: f64,
}

impl AnchorProfile {
    fn new(vector: &[f32], anchor_vectors: &[Embedding], temperature: f64) -> Result<Self> {
        let scores = anchor_vectors
            .iter()
            .map(|anchor| cosine(vector, anchor))
            .collect::<Result<Vec<f64>>>()?;
        let distribution = softmax(&scores, temperature);
        let top = argmax(&distribution);

        // One anchor cannot discriminate anything
        let d = distribution.len() as f64;
        let confidence = if distribution.len() > 1 {
            ((distribution[top] - 1.0 / d) / (1.0 - 1.0 / d)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(Self {
            scores,
            distribution,
            top,
            confidence,
        })
    }

    fn affinity(&self, name: &str, anchors: &[DomainAnchor]) -> AnchorAffinity {
        AnchorAffinity {
            name: name.to_string(),
            top: anchors[self.top].name.clone(),
            confidence: self.confidence,
            scores: self.scores.clone(),
        }
    }
}

/// Scale factor for one (role, member) pair
fn pair_factor(role: &AnchorProfile, member: &AnchorProfile, method: AlignmentMethod, strength: f64) -> f64 {
    match method {
        AlignmentMethod::Peak => {
            let agreement = (role.confidence * member.confidence).sqrt();
            if role.top == member.top {
                1.0 + strength * agreement
            } else {
                1.0 - strength * agreement
            }
        }
        AlignmentMethod::Dot => {
            let overlap = dot(&role.distribution, &member.distribution);
            1.0 + strength * (2.0 * overlap - 1.0)
        }
        AlignmentMethod::Cosine => {
            let norms = l2_norm(&role.distribution) * l2_norm(&member.distribution);
            let alignment = dot(&role.distribution, &member.distribution) / norms;
            1.0 + strength * (2.0 * alignment - 1.0)
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Floored so an all-zero distribution cannot divide by zero
fn l2_norm(values: &[f64]) -> f64 {
    dot(values, values).sqrt().max(1e-9)
}

/// Rescale `matrix` by role/member anchor agreement.
///
/// Returns the input unchanged when amplification is disabled, `strength`
/// is 0, or there are no anchors.
pub fn amplify(
    matrix: &SimilarityMatrix,
    roles: EmbeddedSide<'_>,
    members: EmbeddedSide<'_>,
    anchors: &[DomainAnchor],
    anchor_vectors: &[Embedding],
    settings: &DomainBoostSettings,
) -> Result<Amplified> {
    if !settings.is_active() || anchors.is_empty() {
        return Ok(Amplified {
            matrix: matrix.clone(),
            debug: None,
        });
    }
    if anchors.len() != anchor_vectors.len() {
        return Err(Error::Internal(format!(
            "{} anchors but {} anchor vectors",
            anchors.len(),
            anchor_vectors.len()
        )));
    }

    let temperature = settings.temperature;
    let role_profiles = roles
        .vectors
        .iter()
        .map(|v| AnchorProfile::new(v, anchor_vectors, temperature))
        .collect::<Result<Vec<_>>>()?;
    let member_profiles = members
        .vectors
        .iter()
        .map(|v| AnchorProfile::new(v, anchor_vectors, temperature))
        .collect::<Result<Vec<_>>>()?;

    let mut boosted = matrix.clone();
    let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
    for (r, role) in role_profiles.iter().enumerate() {
        for (m, member) in member_profiles.iter().enumerate() {
            let factor = pair_factor(role, member, settings.method, settings.strength);
            boosted.set(r, m, matrix.get(r, m) * factor);
            min = min.min(factor);
            max = max.max(factor);
            sum += factor;
        }
    }

    let cells = (role_profiles.len() * member_profiles.len()).max(1) as f64;
    let factors = if matrix.is_empty() {
        FactorRange { min: 1.0, max: 1.0, mean: 1.0 }
    } else {
        FactorRange { min, max, mean: sum / cells }
    };

    let debug = DomainDebug {
        strength: settings.strength,
        temperature,
        method: settings.method,
        anchors: anchors.iter().map(|a| a.name.clone()).collect(),
        roles: role_profiles
            .iter()
            .zip(roles.names)
            .map(|(p, name)| p.affinity(name, anchors))
            .collect(),
        members: member_profiles
            .iter()
            .zip(members.names)
            .map(|(p, name)| p.affinity(name, anchors))
            .collect(),
        factors,
    };

    Ok(Amplified {
        matrix: boosted,
        debug: Some(debug),
    })
}
