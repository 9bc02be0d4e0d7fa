//! Per-role candidate reports

use crate::types::{Candidate, CandidateReport};

use super::amplify::softmax;
use super::assign::Assignment;
use super::normalize::{MemberText, RoleText};
use super::similarity::SimilarityMatrix;

/// Items quoted per category in a report log line
const LOG_ITEMS: usize = 3;

/// Build one report per role, in role order
pub fn build_reports(
    matrix: &SimilarityMatrix,
    assignment: &Assignment,
    roles: &[RoleText],
    members: &[MemberText],
    temperature: f64,
) -> Vec<CandidateReport> {
    roles
        .iter()
        .enumerate()
        .map(|(r, role)| {
            let scores = matrix.row(r);
            let soft = softmax(scores, temperature);

            let mut candidates: Vec<Candidate> = members
                .iter()
                .zip(scores.iter().zip(&soft))
                .map(|(member, (score, soft_score))| Candidate {
                    member: member.name.clone(),
                    score: *score,
                    soft_score: *soft_score,
                })
                .collect();
            // Stable: equal soft scores keep member input order
            candidates.sort_by(|a, b| b.soft_score.total_cmp(&a.soft_score));

            let winner = assignment.member_for(r).map(|m| &members[m]);
            let log = log_line(role, winner, &candidates);

            CandidateReport {
                role: role.role.clone(),
                candidates,
                winner: winner.map(|m| m.name.clone()),
                log,
            }
        })
        .collect()
}

fn log_line(role: &RoleText, winner: Option<&MemberText>, candidates: &[Candidate]) -> String {
    let Some(best) = candidates.first() else {
        return format!("Role '{}': no candidates available.", role.role);
    };

    match winner {
        Some(member) => {
            let (score, soft) = candidates
                .iter()
                .find(|c| c.member == member.name)
                .map(|c| (c.score, c.soft_score))
                .unwrap_or((best.score, best.soft_score));
            let mut line = format!(
                "Role '{}': assigned {} (score={:.4}, soft={:.4}).",
                role.role, member.name, score, soft
            );
            let evidence = evidence(member);
            if !evidence.is_empty() {
                line.push_str(&format!(" Top {}.", evidence));
            }
            line
        }
        None => format!(
            "Role '{}': unassigned, every member already holds a role. Best match: {} (score={:.4}, soft={:.4}).",
            role.role, best.member, best.score, best.soft_score
        ),
    }
}

/// "skills: a, b; languages: c" from the member's truncated lists
fn evidence(member: &MemberText) -> String {
    [
        ("skills", &member.skills),
        ("languages", &member.languages),
        ("keywords", &member.keywords),
    ]
    .into_iter()
    .filter(|(_, items)| !items.is_empty())
    .map(|(label, items)| {
        let shown: Vec<&str> = items.iter().take(LOG_ITEMS).map(String::as_str).collect();
        format!("{}: {}", label, shown.join(", "))
    })
    .collect::<Vec<_>>()
    .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryWeights;
    use crate::matching::assign::assign;
    use crate::matching::normalize::{normalize_member, normalize_role};
    use crate::types::{Member, Role};

    fn fixture(rows: Vec<Vec<f64>>, roles: &[&str], members: &[&str]) -> (SimilarityMatrix, Vec<RoleText>, Vec<MemberText>) {
        let matrix = SimilarityMatrix::from_rows(rows).unwrap();
        let roles = roles.iter().map(|t| normalize_role(&Role::new(*t, &["Go"]))).collect();
        let members = members
            .iter()
            .map(|n| normalize_member(&Member::new(*n, &["Go", "SQL", "gRPC", "Kafka"], &["Go"], &[]), 10, &CategoryWeights::default()))
            .collect();
        (matrix, roles, members)
    }

    #[test]
    fn test_soft_scores_sum_to_one() {
        let (matrix, roles, members) = fixture(vec![vec![0.1, 0.7, 0.4], vec![0.9, -0.2, 0.0]], &["A", "B"], &["x", "y", "z"]);
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &members, 0.6);

        for report in &reports {
            let total: f64 = report.candidates.iter().map(|c| c.soft_score).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_candidates_sorted_descending() {
        let (matrix, roles, members) = fixture(vec![vec![0.1, 0.7, 0.4]], &["A"], &["x", "y", "z"]);
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &members, 0.6);

        let order: Vec<&str> = reports[0].candidates.iter().map(|c| c.member.as_str()).collect();
        assert_eq!(order, vec!["y", "z", "x"]);
        assert_eq!(reports[0].winner.as_deref(), Some("y"));
        assert!((reports[0].candidates[0].score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_member_order() {
        let (matrix, roles, members) = fixture(vec![vec![0.5, 0.5, 0.5]], &["A"], &["x", "y", "z"]);
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &members, 0.6);

        let order: Vec<&str> = reports[0].candidates.iter().map(|c| c.member.as_str()).collect();
        assert_eq!(order, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_single_candidate_gets_full_soft_score() {
        let (matrix, roles, members) = fixture(vec![vec![0.3]], &["Backend"], &["Ann"]);
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &members, 0.6);

        assert_eq!(reports[0].candidates[0].soft_score, 1.0);
        assert!(reports[0].log.contains("assigned Ann"));
        assert!(reports[0].log.contains("skills: Go, SQL, gRPC"));
        assert!(!reports[0].log.contains("Kafka"));
    }

    #[test]
    fn test_unassigned_roles_still_list_everyone() {
        let (matrix, roles, members) = fixture(vec![vec![0.2], vec![0.9], vec![0.4]], &["A", "B", "C"], &["Ann"]);
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &members, 0.6);

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.candidates.len() == 1 && r.candidates[0].member == "Ann"));
        assert_eq!(reports[1].winner.as_deref(), Some("Ann"));
        assert_eq!(reports[0].winner, None);
        assert!(reports[0].log.contains("unassigned"));
    }

    #[test]
    fn test_lower_temperature_sharpens() {
        let (matrix, roles, members) = fixture(vec![vec![0.6, 0.4]], &["A"], &["x", "y"]);
        let a = assign(&matrix);
        let sharp = build_reports(&matrix, &a, &roles, &members, 0.1);
        let flat = build_reports(&matrix, &a, &roles, &members, 5.0);
        assert!(sharp[0].candidates[0].soft_score > flat[0].candidates[0].soft_score);
    }

    #[test]
    fn test_tiny_temperature_stays_a_distribution() {
        let (matrix, roles, members) = fixture(vec![vec![0.5, 0.0]], &["A"], &["x", "y"]);
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &members, 1e-310);

        let soft: Vec<f64> = reports[0].candidates.iter().map(|c| c.soft_score).collect();
        assert!(soft.iter().all(|v| v.is_finite()));
        assert_eq!(soft, vec![1.0, 0.0]);
        assert_eq!(reports[0].candidates[0].member, "x");
    }

    #[test]
    fn test_no_members() {
        let matrix = SimilarityMatrix::zeros(1, 0);
        let roles = vec![normalize_role(&Role::new("A", &["Go"]))];
        let reports = build_reports(&matrix, &assign(&matrix), &roles, &[], 0.6);
        assert!(reports[0].candidates.is_empty());
        assert!(reports[0].log.contains("no candidates"));
    }
}
