/// Reviewer × paper distance grid, stored row-major.
///
/// Row `j` is reviewer `j` in load order; column `i` is paper ID `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityMatrix {
    reviewers: usize,
    papers: usize,
    distances: Vec<f64>,
}

impl AffinityMatrix {
    /// A zero-filled matrix of the final shape.
    pub fn new(reviewers: usize, papers: usize) -> Self {
        Self {
            reviewers,
            papers,
            distances: vec![0.0; reviewers * papers],
        }
    }

    /// `(reviewers, papers)`
    pub fn shape(&self) -> (usize, usize) {
        (self.reviewers, self.papers)
    }

    pub fn reviewer_count(&self) -> usize {
        self.reviewers
    }

    pub fn paper_count(&self) -> usize {
        self.papers
    }

    pub fn get(&self, reviewer: usize, paper: usize) -> Option<f64> {
        if reviewer >= self.reviewers || paper >= self.papers {
            return None;
        }
        self.distances.get(reviewer * self.papers + paper).copied()
    }

    /// Distances from one reviewer to every paper, in paper order.
    pub fn row(&self, reviewer: usize) -> Option<&[f64]> {
        if reviewer >= self.reviewers {
            return None;
        }
        let start = reviewer * self.papers;
        self.distances.get(start..start + self.papers)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.reviewers).filter_map(move |r| self.row(r))
    }

    /// Distances from every reviewer to one paper, in reviewer order.
    pub fn column(&self, paper: usize) -> Option<Vec<f64>> {
        if paper >= self.papers {
            return None;
        }
        Some(
            (0..self.reviewers)
                .map(|r| self.distances[r * self.papers + paper])
                .collect(),
        )
    }

    pub(crate) fn set_column(&mut self, paper: usize, column: &[f64]) {
        debug_assert_eq!(column.len(), self.reviewers);
        debug_assert!(paper < self.papers);
        for (reviewer, distance) in column.iter().enumerate() {
            self.distances[reviewer * self.papers + paper] = *distance;
        }
    }
}

/// Euclidean distance, accumulated in `f64`.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
