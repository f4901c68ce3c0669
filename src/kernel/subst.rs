//! # Substitutions
//!
//! A substitution is useful for instantiating a theorem into a more
//! specialized theorem. It is the workhorse of theorem re-use: first,
//! prove a general theorem with free variables; then, instantiate it
//! every time it is required.

use super::{symbol::Symbol, term::Term, term::Var, ty::Type};
use smallvec::{smallvec, SmallVec};
use std::fmt;

type Binding = (Var, Term);
type Bindings = SmallVec<[Binding; 4]>;

/// A term substitution: finitely many `variable := term` bindings.
#[derive(Clone, PartialEq, Eq)]
pub struct Subst(Bindings);

/// A type substitution: finitely many `type variable := type` bindings.
#[derive(Clone, PartialEq, Eq)]
pub struct TySubst(SmallVec<[(Symbol, Type); 4]>);

impl Subst {
    /// The empty substitution.
    pub fn new() -> Self {
        Subst(smallvec![])
    }

    /// Add a binding to the substitution.
    pub fn add_binding(&mut self, v: Var, e: Term) {
        self.0.push((v, e))
    }

    /// Look the variable up.
    pub fn find(&self, v: &Var) -> Option<&Term> {
        self.0.iter().find(|(v2, _)| v2 == v).map(|(_, e)| e)
    }

    /// Drop every binding whose variable is `v`. Used when crossing a
    /// binder for `v`.
    pub fn remove_var(&self, v: &Var) -> Subst {
        Subst(self.0.iter().filter(|(v2, _)| v2 != v).cloned().collect())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.0.iter()
    }
}

impl TySubst {
    /// The empty substitution.
    pub fn new() -> Self {
        TySubst(smallvec![])
    }

    pub fn add_binding(&mut self, v: Symbol, ty: Type) {
        self.0.push((v, ty))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, Type)> {
        self.0.iter()
    }

    /// The bindings as a slice, in the form `Type::subst` consumes.
    #[inline]
    pub fn bindings(&self) -> &[(Symbol, Type)] {
        &self.0
    }
}

mod impls {
    use super::*;

    impl fmt::Debug for Subst {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "(subst")?;
            for (v, e) in self.iter() {
                write!(f, " ({:?} := {:?})", v.name(), e)?;
            }
            write!(f, ")")
        }
    }

    impl fmt::Debug for TySubst {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "(ty-subst")?;
            for (v, ty) in self.iter() {
                write!(f, " ({} := {:?})", v, ty)?;
            }
            write!(f, ")")
        }
    }

    impl Default for Subst {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Default for TySubst {
        fn default() -> Self {
            Self::new()
        }
    }

    impl std::iter::FromIterator<(Var, Term)> for Subst {
        fn from_iter<T: IntoIterator<Item = (Var, Term)>>(iter: T) -> Self {
            Subst(iter.into_iter().collect())
        }
    }

    impl std::iter::FromIterator<(Symbol, Type)> for TySubst {
        fn from_iter<T: IntoIterator<Item = (Symbol, Type)>>(iter: T) -> Self {
            TySubst(iter.into_iter().collect())
        }
    }
}
