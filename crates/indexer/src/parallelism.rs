use crate::Result;
use std::num::NonZeroUsize;

/// Advisory degree of parallelism for model generation and extension.
///
/// Unset means "use every available processor". Implementations may ignore
/// the hint entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parallelism(Option<NonZeroUsize>);

impl Parallelism {
    #[must_use]
    pub const fn all() -> Self {
        Self(None)
    }

    /// A fixed thread count; zero means "all".
    #[must_use]
    pub const fn threads(count: usize) -> Self {
        Self(NonZeroUsize::new(count))
    }

    #[must_use]
    pub const fn requested(self) -> Option<usize> {
        match self.0 {
            Some(n) => Some(n.get()),
            None => None,
        }
    }

    /// Effective worker count.
    #[must_use]
    pub fn resolve(self) -> usize {
        self.requested().unwrap_or_else(num_cpus::get).max(1)
    }

    /// Run `op` inside a rayon pool sized by this hint.
    pub fn install<R, F>(self, op: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.resolve())
            .thread_name(|i| format!("media-indexer-{i}"))
            .build()?;
        Ok(pool.install(op))
    }
}

impl From<Option<usize>> for Parallelism {
    fn from(value: Option<usize>) -> Self {
        value.map_or_else(Self::all, Self::threads)
    }
}
