//! Algorithms that are outside the kernel of trust itself.
//!
//! Everything here manipulates theorems exclusively through the
//! primitive rules of [`crate::kernel::Ctx`] (often via the derived
//! rules of [`crate::logic`]): conversions and rewriting, first-order
//! matching, the goal/tactic engine, the recursion-admissibility
//! analyzer, and the MESON proof search.

pub mod conv;
pub mod meson;
pub mod recdef;
pub mod tactic;
pub mod unif;

pub use conv::{thm_conv_concl, Converter, RewriteRule, RewriteRuleSet};
pub use meson::{meson, MesonParams, MesonTactic};
pub use recdef::{justify_recursion, ClauseSpec, RecEnv, RecJustification, Shape};
pub use tactic::{prove, Goal, GoalState, Progress, Tactic};
pub use unif::{term_match, unify_terms, Matching};
