//! Split planning: how many buckets a route is divided into.
//!
//! The bucket count must divide the sample count exactly so every bucket has
//! the same size, and must be at least [`MIN_ROUTE_SPLITS`] so the coarse
//! nearest-bucket pass stays meaningful on short routes.

/// Minimum number of buckets a route is split into.
pub const MIN_ROUTE_SPLITS: usize = 10;

/// Chooses the bucket count for a route of a given length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlanner {
    min_buckets: usize,
}

impl Default for SplitPlanner {
    fn default() -> Self {
        Self::new(MIN_ROUTE_SPLITS)
    }
}

impl SplitPlanner {
    /// Create a planner with a custom minimum bucket count (0 behaves as 1).
    pub fn new(min_buckets: usize) -> Self {
        Self {
            min_buckets: min_buckets.max(1),
        }
    }

    pub fn min_buckets(&self) -> usize {
        self.min_buckets
    }

    /// Number of buckets for a route with `n` samples.
    ///
    /// Returns the smallest divisor of `n` that is `>= min_buckets`. When no
    /// divisor qualifies (only possible for `n < min_buckets`) every sample
    /// gets its own bucket and `n` is returned. Returns `None` for `n == 0`.
    ///
    /// ```rust
    /// use route_poi::SplitPlanner;
    ///
    /// let planner = SplitPlanner::default();
    /// assert_eq!(planner.compute_split_count(12), Some(12));
    /// assert_eq!(planner.compute_split_count(20), Some(10));
    /// assert_eq!(planner.compute_split_count(0), None);
    /// ```
    pub fn compute_split_count(&self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }

        let count = divisors(n)
            .into_iter()
            .find(|&d| d >= self.min_buckets)
            .unwrap_or(n);

        Some(count)
    }
}

/// Split count using the default minimum of [`MIN_ROUTE_SPLITS`].
pub fn compute_split_count(n: usize) -> Option<usize> {
    SplitPlanner::default().compute_split_count(n)
}

/// All divisors of `n` in ascending order (empty for 0).
fn divisors(n: usize) -> Vec<usize> {
    let mut small = Vec::new();
    let mut large = Vec::new();

    let mut d = 1;
    while d <= n / d {
        if n % d == 0 {
            small.push(d);
            if d != n / d {
                large.push(n / d);
            }
        }
        d += 1;
    }

    large.reverse();
    small.extend(large);
    small
}
