//! Text normalization
//!
//! Turns roles and members into the single strings that get embedded.

use serde::Serialize;

use crate::config::CategoryWeights;
use crate::types::{Member, Role};

/// Embeddable form of a role, also echoed in the debug payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleText {
    pub role: String,
    pub core_skills: Vec<String>,
    pub text: String,
}

impl RoleText {
    /// A role without core skills carries no matching signal
    pub fn is_degenerate(&self) -> bool {
        self.core_skills.is_empty()
    }
}

/// Embeddable form of a member with the truncated category lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberText {
    pub name: String,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub keywords: Vec<String>,
    pub text: String,
}

impl MemberText {
    pub fn is_degenerate(&self) -> bool {
        self.text.is_empty()
    }
}

/// `"Core skills: " + core_skills.join(", ")`
pub fn normalize_role(role: &Role) -> RoleText {
    RoleText {
        role: role.title.clone(),
        core_skills: role.core_skills.clone(),
        text: format!("Core skills: {}", role.core_skills.join(", ")),
    }
}

/// Keep the strongest-first prefix of each category and render each
/// non-empty category as a labelled sentence repeated `weight` times
pub fn normalize_member(member: &Member, top_k: usize, weights: &CategoryWeights) -> MemberText {
    let skills = truncate(&member.skills, top_k);
    let languages = truncate(&member.languages, top_k);
    let keywords = truncate(&member.keywords, top_k);

    let mut parts: Vec<String> = Vec::new();
    push_category(&mut parts, "Top skills", &skills, weights.skills);
    push_category(&mut parts, "Programming languages", &languages, weights.languages);
    push_category(&mut parts, "Keywords", &keywords, weights.keywords);

    MemberText {
        name: member.name.clone(),
        skills,
        languages,
        keywords,
        text: parts.join(" "),
    }
}

/// Strongest-first prefix of at most `top_k` items
pub fn truncate(items: &[String], top_k: usize) -> Vec<String> {
    items.iter().take(top_k).cloned().collect()
}

fn push_category(parts: &mut Vec<String>, label: &str, items: &[String], weight: u32) {
    if items.is_empty() || weight == 0 {
        return;
    }
    let sentence = format!("{}: {}.", label, items.join(", "));
    parts.extend(std::iter::repeat(sentence).take(weight as usize));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(skills: u32, languages: u32, keywords: u32) -> CategoryWeights {
        CategoryWeights { skills, languages, keywords }
    }

    #[test]
    fn test_role_text() {
        let role = Role::new("Backend", &["Go", "databases"]);
        let text = normalize_role(&role);

        assert_eq!(text.text, "Core skills: Go, databases");
        assert_eq!(text.role, "Backend");
        assert!(!text.is_degenerate());
    }

    #[test]
    fn test_empty_role_is_degenerate() {
        let text = normalize_role(&Role::new("Mystery", &[]));
        assert_eq!(text.text, "Core skills: ");
        assert!(text.is_degenerate());
    }

    #[test]
    fn test_member_text_default_weights() {
        let member = Member::new("Ann", &["Go", "SQL"], &["Go"], &["api"]);
        let text = normalize_member(&member, 10, &CategoryWeights::default());

        assert_eq!(
            text.text,
            "Top skills: Go, SQL. Top skills: Go, SQL. \
             Programming languages: Go. Programming languages: Go. \
             Keywords: api."
        );
    }

    #[test]
    fn test_zero_weight_drops_category() {
        let member = Member::new("Ann", &["Go"], &["Go"], &["api"]);
        let text = normalize_member(&member, 10, &weights(1, 0, 1));

        assert_eq!(text.text, "Top skills: Go. Keywords: api.");
        // Truncated lists are still reported
        assert_eq!(text.languages, vec!["Go"]);
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let member = Member::new("Bo", &[], &["Rust"], &[]);
        let text = normalize_member(&member, 10, &weights(2, 1, 1));
        assert_eq!(text.text, "Programming languages: Rust.");
    }

    #[test]
    fn test_top_k_keeps_strongest_prefix() {
        let member = Member::new("Cy", &["a", "b", "c", "d"], &["x", "y"], &["k"]);
        let text = normalize_member(&member, 2, &weights(1, 1, 1));

        assert_eq!(text.skills, vec!["a", "b"]);
        assert_eq!(text.languages, vec!["x", "y"]);
        assert_eq!(text.text, "Top skills: a, b. Programming languages: x, y. Keywords: k.");
    }

    #[test]
    fn test_empty_member_is_degenerate() {
        let member = Member::new("Ghost", &[], &[], &[]);
        let text = normalize_member(&member, 10, &CategoryWeights::default());
        assert_eq!(text.text, "");
        assert!(text.is_degenerate());
    }

    #[test]
    fn test_truncate_shorter_than_k() {
        let items = vec!["a".to_string()];
        assert_eq!(truncate(&items, 5), items);
    }
}
