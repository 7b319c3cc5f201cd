//! Explicit execution context for data-parallel work over realizations.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::ScatteringError;

/// Where realization-level work runs.
///
/// Passed explicitly to every tensor-producing call. Cloning is cheap: a
/// threaded context shares its pool.
#[derive(Clone, Debug, Default)]
pub enum ExecutionContext {
    /// Run on the calling thread.
    #[default]
    Sequential,
    /// Run on a dedicated rayon pool.
    Threaded(Arc<rayon::ThreadPool>),
}

impl ExecutionContext {
    /// Sequential execution.
    pub fn sequential() -> Self {
        Self::Sequential
    }

    /// Dedicated pool with `threads` workers (`None` = rayon default).
    ///
    /// # Errors
    ///
    /// Returns [`ScatteringError::ThreadPool`] if rayon cannot spawn the pool.
    pub fn threaded(threads: Option<usize>) -> Result<Self, ScatteringError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| ScatteringError::ThreadPool(e.to_string()))?;
        Ok(Self::Threaded(Arc::new(pool)))
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Threaded(pool) => pool.current_num_threads(),
        }
    }

    /// Maps `f` over `0..n`, preserving order.
    pub fn map<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            Self::Sequential => (0..n).map(f).collect(),
            Self::Threaded(pool) => pool.install(|| (0..n).into_par_iter().map(f).collect()),
        }
    }

    /// Fallible [`ExecutionContext::map`]; returns the first error in index order.
    pub fn try_map<T, E, F>(&self, n: usize, f: F) -> Result<Vec<T>, E>
    where
        T: Send,
        E: Send,
        F: Fn(usize) -> Result<T, E> + Sync + Send,
    {
        self.map(n, f).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_map_in_order() {
        let ctx = ExecutionContext::sequential();
        assert_eq!(ctx.map(4, |i| i * i), vec![0, 1, 4, 9]);
        assert_eq!(ctx.threads(), 1);
    }

    #[test]
    fn threaded_map_matches_sequential() {
        let ctx = ExecutionContext::threaded(Some(3)).unwrap();
        assert_eq!(ctx.threads(), 3);
        let expected: Vec<usize> = (0..100).map(|i| i * 7 % 13).collect();
        assert_eq!(ctx.map(100, |i| i * 7 % 13), expected);
    }

    #[test]
    fn try_map_reports_first_error() {
        let ctx = ExecutionContext::threaded(Some(2)).unwrap();
        let result: Result<Vec<usize>, usize> =
            ctx.try_map(10, |i| if i >= 4 { Err(i) } else { Ok(i) });
        assert_eq!(result, Err(4));
    }

    #[test]
    fn context_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + Clone>() {}
        assert_impl::<ExecutionContext>();
    }
}
