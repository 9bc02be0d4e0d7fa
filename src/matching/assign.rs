//! Greedy one-to-one assignment
//!
//! Repeatedly takes the highest remaining (role, member) score. This is not
//! a globally optimal bipartite matching: a strong early pick can push a
//! later role onto a weaker member. Ties break by role input order, then
//! member input order, so the result is fully deterministic.

use super::similarity::SimilarityMatrix;

/// Member index per role (None = unassigned)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    slots: Vec<Option<usize>>,
}

impl Assignment {
    /// Member assigned to `role`, if any
    pub fn member_for(&self, role: usize) -> Option<usize> {
        self.slots.get(role).copied().flatten()
    }

    /// (role, member) pairs in role order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(role, member)| member.map(|m| (role, m)))
    }

    /// Number of assigned roles
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assign members to roles one-to-one
pub fn assign(matrix: &SimilarityMatrix) -> Assignment {
    let (rows, cols) = (matrix.rows(), matrix.cols());
    let mut slots = vec![None; rows];

    let mut cells: Vec<(usize, usize)> = (0..rows)
        .flat_map(|r| (0..cols).map(move |m| (r, m)))
        .collect();
    // Stable sort keeps (role, member) input order among equal scores
    let key = |(r, m): (usize, usize)| unsigned_zero(matrix.get(r, m));
    cells.sort_by(|a, b| key(*b).total_cmp(&key(*a)));

    let mut member_taken = vec![false; cols];
    let mut remaining = rows.min(cols);
    for (r, m) in cells {
        if remaining == 0 {
            break;
        }
        if slots[r].is_some() || member_taken[m] {
            continue;
        }
        slots[r] = Some(m);
        member_taken[m] = true;
        remaining -= 1;
    }

    Assignment { slots }
}

/// `total_cmp` orders -0.0 below 0.0; both must tie
fn unsigned_zero(score: f64) -> f64 {
    score + 0.0
}
