//! Role matching engine
//!
//! Pure scoring stages (normalization, similarity, domain amplification,
//! assignment, reports) plus the async pipeline that drives them.

mod amplify;
mod assign;
mod engine;
mod normalize;
mod report;
mod similarity;

pub use amplify::{default_anchors, AlignmentMethod, DomainAnchor, DomainDebug};
pub use engine::RoleMatcher;
pub use normalize::{MemberText, RoleText};
#[cfg(test)]
pub use similarity::cosine;
