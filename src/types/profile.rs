//! Role and member profiles
//!
//! Incoming JSON is loose: members come from resume/GitHub extraction with
//! several key spellings and nested groupings. `RawRole` and `RawMember`
//! accept all of them; `Role` and `Member` are the canonical shapes the
//! matching pipeline works on.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────
// Flexible string lists
// ─────────────────────────────────────────────────────────────────

/// A list of strings that may arrive as a single string, an array, or an
/// object of arrays (flattened in document order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct FlexList(Vec<String>);

impl From<Value> for FlexList {
    fn from(value: Value) -> Self {
        let mut items = Vec::new();
        flatten_into(&value, &mut items);
        FlexList(items)
    }
}

fn flatten_into(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                flatten_into(item, out);
            }
        }
    }
}

impl FlexList {
    /// Trimmed, non-empty entries with case-insensitive duplicates removed
    pub fn into_clean(self) -> Vec<String> {
        clean_list(self.0)
    }

    fn is_empty(&self) -> bool {
        self.0.iter().all(|s| s.trim().is_empty())
    }
}

/// Trim entries, drop empties and keep the first occurrence of each
/// case-insensitive duplicate
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

/// First list that has any content, so `languages: []` still falls back to
/// `programming_languages`
fn first_non_empty(primary: Option<FlexList>, fallback: Option<FlexList>) -> Vec<String> {
    match (primary, fallback) {
        (Some(p), _) if !p.is_empty() => p.into_clean(),
        (_, Some(f)) => f.into_clean(),
        (Some(p), None) => p.into_clean(),
        (None, None) => Vec::new(),
    }
}

fn first_non_blank(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(String::from)
}

// ─────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────

/// A project role. Only `core_skills` takes part in matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub core_skills: Vec<String>,
    #[serde(default)]
    pub nice_to_have: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaboration_notes: Option<String>,
}

impl Role {
    pub fn new(title: impl Into<String>, core_skills: &[&str]) -> Self {
        Self {
            title: title.into(),
            purpose: None,
            responsibilities: Vec::new(),
            core_skills: core_skills.iter().map(|s| s.to_string()).collect(),
            nice_to_have: Vec::new(),
            collaboration_notes: None,
        }
    }
}

/// Role as received on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRole {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<FlexList>,
    #[serde(default)]
    pub core_skills: Option<FlexList>,
    #[serde(default)]
    pub skills: Option<FlexList>,
    #[serde(default)]
    pub nice_to_have: Option<FlexList>,
    #[serde(default)]
    pub collaboration_notes: Option<String>,
}

impl RawRole {
    /// Resolve aliases; `index` is the zero-based input position
    pub fn into_role(self, index: usize) -> Role {
        let title = first_non_blank(&[self.title.as_deref(), self.name.as_deref()])
            .unwrap_or_else(|| format!("Role {}", index + 1));

        Role {
            title,
            purpose: self.purpose,
            responsibilities: self.responsibilities.map(FlexList::into_clean).unwrap_or_default(),
            core_skills: first_non_empty(self.core_skills, self.skills),
            nice_to_have: self.nice_to_have.map(FlexList::into_clean).unwrap_or_default(),
            collaboration_notes: self.collaboration_notes,
        }
    }
}

/// Resolve raw roles, giving duplicate titles a numeric suffix
pub fn resolve_roles(raw: Vec<RawRole>) -> Vec<Role> {
    let mut roles: Vec<Role> = raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_role(i))
        .collect();
    let titles = disambiguate(roles.iter().map(|r| r.title.clone()).collect());
    for (role, title) in roles.iter_mut().zip(titles) {
        role.title = title;
    }
    roles
}

// ─────────────────────────────────────────────────────────────────
// Members
// ─────────────────────────────────────────────────────────────────

/// Canonical member profile; every list is ranked strongest-first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Member {
    pub fn new(name: impl Into<String>, skills: &[&str], languages: &[&str], keywords: &[&str]) -> Self {
        let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            name: name.into(),
            skills: owned(skills),
            languages: owned(languages),
            keywords: owned(keywords),
        }
    }
}

/// Member as received on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub skills: Option<FlexList>,
    #[serde(default)]
    pub languages: Option<FlexList>,
    #[serde(default)]
    pub programming_languages: Option<FlexList>,
    #[serde(default)]
    pub keywords: Option<FlexList>,
    #[serde(default)]
    pub notable_keywords: Option<FlexList>,
}

impl RawMember {
    /// Resolve aliases; `index` is the zero-based input position
    pub fn into_member(self, index: usize) -> Member {
        let id = match &self.id {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let name = first_non_blank(&[self.name.as_deref(), id.as_deref()])
            .unwrap_or_else(|| format!("Member {}", index + 1));

        Member {
            name,
            skills: self.skills.map(FlexList::into_clean).unwrap_or_default(),
            languages: first_non_empty(self.languages, self.programming_languages),
            keywords: first_non_empty(self.keywords, self.notable_keywords),
        }
    }
}

/// Resolve raw members, giving duplicate names a numeric suffix
pub fn resolve_members(raw: Vec<RawMember>) -> Vec<Member> {
    let mut members: Vec<Member> = raw
        .into_iter()
        .enumerate()
        .map(|(i, m)| m.into_member(i))
        .collect();
    let names = disambiguate(members.iter().map(|m| m.name.clone()).collect());
    for (member, name) in members.iter_mut().zip(names) {
        member.name = name;
    }
    members
}

/// Make names unique: the first occurrence keeps its name, later ones get
/// " (2)", " (3)" and so on
pub fn disambiguate(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen = HashSet::new();

    names
        .into_iter()
        .map(|name| {
            if first_seen.insert(name.clone()) {
                return name;
            }
            let n = counts.entry(name.clone()).or_insert(1);
            loop {
                *n += 1;
                let candidate = format!("{} ({})", name, n);
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_member(value: Value) -> RawMember {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_member_aliases() {
        let member = raw_member(json!({
            "id": "ann",
            "skills": ["Go", "SQL"],
            "programming_languages": ["Go"],
            "notable_keywords": "distributed systems"
        }))
        .into_member(0);

        assert_eq!(member.name, "ann");
        assert_eq!(member.skills, vec!["Go", "SQL"]);
        assert_eq!(member.languages, vec!["Go"]);
        assert_eq!(member.keywords, vec!["distributed systems"]);
    }

    #[test]
    fn test_empty_primary_falls_back_to_alias() {
        let member = raw_member(json!({
            "name": "Bo",
            "languages": [],
            "programming_languages": ["Rust", "C"]
        }))
        .into_member(0);

        assert_eq!(member.languages, vec!["Rust", "C"]);
    }

    #[test]
    fn test_grouped_lists_flatten_in_key_order() {
        let member = raw_member(json!({
            "name": "Cy",
            "skills": {"backend": ["Postgres", "gRPC"], "frontend": ["React"]}
        }))
        .into_member(0);

        assert_eq!(member.skills, vec!["Postgres", "gRPC", "React"]);
    }

    #[test]
    fn test_grouped_lists_keep_document_order() {
        let member: RawMember =
            serde_json::from_str(r#"{"name": "Ed", "skills": {"primary": ["Rust"], "backend": ["Go"]}}"#).unwrap();

        assert_eq!(member.into_member(0).skills, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_lists_are_trimmed_and_deduplicated() {
        let member = raw_member(json!({
            "name": "Di",
            "skills": [" Python ", "python", "", "Django", null, 3]
        }))
        .into_member(0);

        assert_eq!(member.skills, vec!["Python", "Django", "3"]);
    }

    #[test]
    fn test_default_names() {
        let member = raw_member(json!({"name": "  ", "skills": ["Go"]})).into_member(4);
        assert_eq!(member.name, "Member 5");

        let role: RawRole = serde_json::from_value(json!({"core_skills": ["Go"]})).unwrap();
        assert_eq!(role.into_role(1).title, "Role 2");
    }

    #[test]
    fn test_role_aliases() {
        let role: RawRole = serde_json::from_value(json!({
            "name": "Platform",
            "skills": ["Kubernetes"],
            "responsibilities": "Run the cluster"
        }))
        .unwrap();
        let role = role.into_role(0);

        assert_eq!(role.title, "Platform");
        assert_eq!(role.core_skills, vec!["Kubernetes"]);
        assert_eq!(role.responsibilities, vec!["Run the cluster"]);
    }

    #[test]
    fn test_title_wins_over_name() {
        let role: RawRole =
            serde_json::from_value(json!({"title": "Backend", "name": "ignored"})).unwrap();
        assert_eq!(role.into_role(0).title, "Backend");
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let names = disambiguate(vec![
            "Ann".to_string(),
            "Bo".to_string(),
            "Ann".to_string(),
            "Ann".to_string(),
        ]);
        assert_eq!(names, vec!["Ann", "Bo", "Ann (2)", "Ann (3)"]);
    }

    #[test]
    fn test_suffix_skips_existing_names() {
        let names = disambiguate(vec![
            "Ann".to_string(),
            "Ann (2)".to_string(),
            "Ann".to_string(),
        ]);
        assert_eq!(names, vec!["Ann", "Ann (2)", "Ann (3)"]);
    }

    #[test]
    fn test_resolve_roles_keeps_order() {
        let raw = vec![
            RawRole { title: Some("Backend".into()), ..Default::default() },
            RawRole { title: Some("Backend".into()), ..Default::default() },
            RawRole::default(),
        ];
        let titles: Vec<String> = resolve_roles(raw).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Backend", "Backend (2)", "Role 3"]);
    }
}
