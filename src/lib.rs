//! # Keel core library.
//!
//! This library contains the kernel of trust for Keel, i.e. the set
//! of type definitions (most importantly, terms and theorems),
//! and rules to build them safely.
//!
//! It also contains:
//! - the boolean theory and its derived natural-deduction rules (in `logic`)
//! - a collection of algorithms built on the kernel surface: conversions,
//!   rewriting, first-order matching, a goal-directed tactic engine,
//!   a recursion-admissibility analyzer, and a model-elimination
//!   proof search (in `algo`)

#![deny(unsafe_code)]

pub mod algo;
pub mod error;
mod fnv;
pub mod kernel;
pub mod logic;

pub use fnv::{new_set_with_cap, new_table_with_cap, FnvHashMap, FnvHashSet};

pub use algo::conv::{thm_conv_concl, BetaConv, Converter};
pub use algo::tactic::{prove, Goal, GoalState, Progress, Tactic};
pub use error::{Error, ErrorKind, Result};
pub use kernel::TermView::*;
pub use kernel::{Ctx, Subst, Symbol, Term, TermView, Thm, TySubst, Type, TypeView, Var, Vars};
pub use logic::Logic;

pub(crate) mod macros {
    #[allow(unused_macros)]
    #[macro_export]
    macro_rules! ignore{
        () => { () };
        ($t :expr) => {{
            #[allow(unused_value)]
            let _ = $t;
        } };
        ($t0: expr, $($t:expr),*) => {{
            #[allow(unused_value)]
            let _ = $t0;
            crate::ignore!($($t),*)
        }}
    }

    #[macro_export]
    macro_rules! logtrace{
        ($($t:expr),*) => {{
            {
                #[cfg(feature="logging")]
                log::trace!($($t),*)
            }

            {
                #[cfg(not(feature="logging"))]
                crate::ignore!($($t),*)
            }
        }}
    }

    #[macro_export]
    macro_rules! logdebug{
        ($($t:expr),*) => {{
            {
                #[cfg(feature="logging")]
                log::debug!($($t),*)
            }

            {
                #[cfg(not(feature="logging"))]
                crate::ignore!($($t),*)
            }
        }}
    }

    #[macro_export]
    macro_rules! logerr{
        ($($t:expr),*) => {{
            {
                #[cfg(feature="logging")]
                log::error!($($t),*);
            }

            {
                #[cfg(not(feature="logging"))]
                crate::ignore!($($t),*);
            }
        }}
    }

    /// Build an `Error` from a format string.
    #[macro_export]
    macro_rules! errorstr {
        ($($t:expr),*) => {
            $crate::error::Error::new_string(format!($($t),*))
        }
    }
}
