//! Row iteration shim.
//!
//! With the `parallel` feature the per-pixel kernels fan rows out over
//! rayon's pool. Without it (`--no-default-features`) the same
//! `into_par_iter()` calls fall back to plain iterators, so kernel code is
//! written once.

#[cfg(feature = "parallel")]
pub(crate) use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub(crate) trait IntoParallelIterator: IntoIterator + Sized {
    fn into_par_iter(self) -> Self::IntoIter {
        self.into_iter()
    }
}

#[cfg(not(feature = "parallel"))]
impl<I: IntoIterator> IntoParallelIterator for I {}
