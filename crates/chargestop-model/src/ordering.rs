//! Implicit visiting order via pairwise indicators
//!
//! The sequence of stops is never represented explicitly. Instead two
//! triangular tables of binaries are declared over the `n + 2` route
//! locations:
//!
//! ```text
//! both[i,j]  = visit[i] ∧ visit[j]                      0 <= j < i <= n+1
//! inter[i,k] = ∨_{k<j<i} both[i,j]                       0 <= k < i <= n+1
//!
//! adjacent(i,j) ⇔ both[i,j] - inter[i,j] = 1
//! ```
//!
//! `adjacent(i,j)` holds exactly when `i` and `j` are both visited and no
//! visited location lies strictly between them, i.e. they are consecutive
//! stops of the induced subsequence. The energy balance only ever constrains
//! adjacent pairs.
//!
//! ## Linearization
//!
//! ```text
//! visit[i] + visit[j] - 1 <= both[i,j]          AND, lower
//! visit[i] + visit[j]     >= 2 · both[i,j]      AND, upper
//! Σ_{k<j<i} both[i,j]     >= inter[i,k]          OR, upper
//! Σ_{k<j<i} both[i,j]     <= (i-k-1) · inter[i,k] OR, lower
//! ```
//!
//! The OR bound uses the number of summed terms, the tightest valid big-M.
//! When `i = k + 1` the sum is empty and `inter[i,k]` is fixed to zero.

use crate::system::{ConstraintFamily, ConstraintSink, Sense, VariableArena};
use good_lp::{Expression, Variable};

/// Values keyed by an ordered pair `(i, j)` with `j < i`.
///
/// Stored as a flat lower-triangular arena; row `i` holds `i` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTable<T> {
    rows: usize,
    values: Vec<T>,
}

impl<T> PairTable<T> {
    /// Build a table covering `1 <= i < rows`, `0 <= j < i`.
    pub fn from_fn(rows: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut values = Vec::with_capacity(rows * rows.saturating_sub(1) / 2);
        for i in 1..rows {
            for j in 0..i {
                values.push(f(i, j));
            }
        }
        Self { rows, values }
    }

    fn slot(&self, i: usize, j: usize) -> Option<usize> {
        (j < i && i < self.rows).then(|| i * (i - 1) / 2 + j)
    }

    /// Entry for `(i, j)`, `None` unless `j < i < rows`.
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        self.slot(i, j).map(|s| &self.values[s])
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All pairs `(i, j, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        (1..self.rows)
            .flat_map(|i| (0..i).map(move |j| (i, j)))
            .zip(self.values.iter())
            .map(|((i, j), v)| (i, j, v))
    }
}

/// Pairwise indicator variables produced by [`OrderingEncoder`].
#[derive(Debug, Clone)]
pub struct OrderingVariables {
    /// `both[i,j]`: both locations are visited
    pub both_visited: PairTable<Variable>,
    /// `inter[i,k]`: some location strictly between `k` and `i` is visited
    /// together with `i`
    pub has_intermediate: PairTable<Variable>,
}

impl OrderingVariables {
    /// `both[i,j] - inter[i,j]`, equal to one iff `j` and `i` are consecutive
    /// stops.
    ///
    /// # Panics
    ///
    /// Panics unless `j < i <= n + 1`.
    pub fn adjacency(&self, i: usize, j: usize) -> Expression {
        let both = self.both_visited.get(i, j);
        let inter = self.has_intermediate.get(i, j);
        match (both, inter) {
            (Some(&both), Some(&inter)) => both - inter,
            _ => panic!("no ordering pair ({i}, {j})"),
        }
    }
}

/// Declares the ordering indicators and their linking constraints.
pub struct OrderingEncoder<'a> {
    visit: &'a [Variable],
}

impl<'a> OrderingEncoder<'a> {
    /// `visit` holds one binary per location, origin and destination
    /// included.
    pub fn new(visit: &'a [Variable]) -> Self {
        Self { visit }
    }

    pub(crate) fn encode(
        &self,
        vars: &mut VariableArena,
        sink: &mut ConstraintSink,
    ) -> OrderingVariables {
        let locations = self.visit.len();

        let both_visited =
            PairTable::from_fn(locations, |i, j| vars.binary(format!("both_{i}_{j}")));
        let has_intermediate =
            PairTable::from_fn(locations, |i, k| vars.binary(format!("inter_{i}_{k}")));

        for (i, j, &both) in both_visited.iter() {
            let (vi, vj) = (self.visit[i], self.visit[j]);
            sink.add(
                ConstraintFamily::BothVisited,
                format!("both_lo_{i}_{j}"),
                vi + vj - 1.0,
                Sense::LessEqual,
                both,
            );
            sink.add(
                ConstraintFamily::BothVisited,
                format!("both_hi_{i}_{j}"),
                vi + vj,
                Sense::GreaterEqual,
                both * 2.0,
            );
        }

        for (i, k, &inter) in has_intermediate.iter() {
            let between: Vec<Variable> = (k + 1..i)
                .filter_map(|j| both_visited.get(i, j).copied())
                .collect();

            if between.is_empty() {
                sink.add(
                    ConstraintFamily::Intermediate,
                    format!("inter_none_{i}_{k}"),
                    inter,
                    Sense::Equal,
                    0.0,
                );
                continue;
            }

            let terms = between.len() as f64;
            let sum: Expression = between.into_iter().sum();
            sink.add(
                ConstraintFamily::Intermediate,
                format!("inter_hi_{i}_{k}"),
                sum.clone(),
                Sense::GreaterEqual,
                inter,
            );
            sink.add(
                ConstraintFamily::Intermediate,
                format!("inter_lo_{i}_{k}"),
                sum,
                Sense::LessEqual,
                inter * terms,
            );
        }

        OrderingVariables {
            both_visited,
            has_intermediate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_table_layout() {
        let table = PairTable::from_fn(4, |i, j| (i, j));

        assert_eq!(table.len(), 6);
        assert_eq!(table.get(1, 0), Some(&(1, 0)));
        assert_eq!(table.get(3, 2), Some(&(3, 2)));
        assert_eq!(table.get(2, 2), None);
        assert_eq!(table.get(2, 3), None);
        assert_eq!(table.get(4, 0), None);

        let pairs: Vec<(usize, usize)> = table.iter().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(pairs, vec![(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)]);
        assert!(table.iter().all(|(i, j, &(vi, vj))| i == vi && j == vj));
    }

    #[test]
    fn test_empty_pair_table() {
        let table: PairTable<u8> = PairTable::from_fn(1, |_, _| 0);
        assert!(table.is_empty());
        assert_eq!(table.get(1, 0), None);
    }

    #[test]
    fn test_encoder_declares_triangular_tables() {
        let mut vars = VariableArena::new();
        let mut sink = ConstraintSink::default();
        let visit: Vec<Variable> = (0..4).map(|i| vars.binary(format!("visit_{i}"))).collect();

        let ordering = OrderingEncoder::new(&visit).encode(&mut vars, &mut sink);

        // 4 locations: 6 pairs per table
        assert_eq!(ordering.both_visited.len(), 6);
        assert_eq!(ordering.has_intermediate.len(), 6);
        assert_eq!(vars.into_infos().len(), 4 + 12);

        // 2 AND rows per pair; OR rows: 3 empty spans fixed, 3 spans with 2 rows
        assert_eq!(sink.len(), 12 + 3 + 6);

        let rows = sink.into_rows();
        let fixed: Vec<&str> = rows
            .iter()
            .filter(|r| r.label.starts_with("inter_none"))
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(fixed, vec!["inter_none_1_0", "inter_none_2_1", "inter_none_3_2"]);
    }

    #[test]
    #[should_panic(expected = "no ordering pair")]
    fn test_adjacency_rejects_reversed_pair() {
        let mut vars = VariableArena::new();
        let mut sink = ConstraintSink::default();
        let visit: Vec<Variable> = (0..3).map(|i| vars.binary(format!("visit_{i}"))).collect();
        let ordering = OrderingEncoder::new(&visit).encode(&mut vars, &mut sink);

        let _ = ordering.adjacency(0, 2);
    }
}
