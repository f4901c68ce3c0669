//! # Theorems.
//!
//! Theorems are proved correct by construction: the only way to obtain
//! a `Thm` is through the primitive rules of [`super::Ctx`]. Nothing
//! outside this module can build one directly.

use super::{term::Term, Ref};
use std::fmt;

/// A theorem: a set of hypotheses and a conclusion.
///
/// The hypothesis list is kept sorted and deduplicated under the alpha
/// order of [`super::term::alpha_cmp`], so that set operations on
/// hypotheses work modulo renaming of bound variables.
#[derive(Clone)]
pub struct Thm(pub(super) Ref<ThmImpl>);

#[derive(Clone)]
pub(super) struct ThmImpl {
    /// Conclusion of the theorem.
    pub concl: Term,
    /// Hypotheses of the theorem, sorted under the alpha order.
    pub hyps: Vec<Term>,
    /// Unique ID of the `Ctx` that built this theorem.
    pub ctx_uid: u32,
}

impl Thm {
    pub(super) fn make_(concl: Term, ctx_uid: u32, hyps: Vec<Term>) -> Self {
        Thm(Ref::new(ThmImpl {
            concl,
            hyps,
            ctx_uid,
        }))
    }

    /// Conclusion of the theorem.
    #[inline]
    pub fn concl(&self) -> &Term {
        &self.0.concl
    }

    /// Hypotheses of the theorem.
    #[inline]
    pub fn hyps(&self) -> &[Term] {
        self.0.hyps.as_slice()
    }
}

mod impls {
    use super::*;

    impl fmt::Debug for Thm {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            if self.hyps().is_empty() {
                write!(out, "|- {:?}", self.concl())
            } else {
                let mut first = true;
                for h in self.hyps() {
                    if first {
                        first = false;
                    } else {
                        write!(out, ", ")?;
                    }
                    write!(out, "{:?}", h)?;
                }
                write!(out, " |- {:?}", self.concl())
            }
        }
    }

    impl PartialEq for Thm {
        fn eq(&self, other: &Self) -> bool {
            std::ptr::eq(self.0.as_ref() as *const _, other.0.as_ref() as *const _)
        }
    }
}
