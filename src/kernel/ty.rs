//! # Simple types.
//!
//! A type is either a type variable or the application of a declared
//! type constructor to argument types. The arrow type `a -> b` is the
//! builtin binary constructor `fun`.

use super::symbol::Symbol;
use super::Ref;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::{cmp::Ordering, fmt};

/// A type.
///
/// The type is refcounted and is thus cheaply clonable.
/// Equality and ordering are structural.
#[derive(Clone)]
pub struct Type(Ref<TypeView>);

/// Small vector of types.
pub type Types = SmallVec<[Type; 3]>;

/// The public view of a type's root.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeView {
    /// A type variable.
    TyVar(Symbol),
    /// Application of a type constructor to arguments.
    /// The constructor must be registered in the signature with
    /// a matching arity.
    TyApp(Symbol, Types),
}

pub use TypeView::*;

/// Name of the builtin arrow type constructor.
pub const FUN: &str = "fun";

/// Name of the builtin boolean type constructor.
pub const BOOL: &str = "bool";

impl Type {
    /// View the type's root.
    #[inline]
    pub fn view(&self) -> &TypeView {
        &self.0
    }

    /// Make a type variable.
    pub fn var(name: impl Into<Symbol>) -> Type {
        Type(Ref::new(TyVar(name.into())))
    }

    /// Make an application. The arity check against the signature is the
    /// context's business (`Ctx::mk_ty_app`); this is the raw constructor
    /// used internally once the check has been done.
    pub(crate) fn app_unchecked(name: Symbol, args: Types) -> Type {
        Type(Ref::new(TyApp(name, args)))
    }

    /// View as a type variable.
    pub fn as_var(&self) -> Option<&Symbol> {
        match self.view() {
            TyVar(s) => Some(s),
            _ => None,
        }
    }

    /// View as a constructor application.
    pub fn as_app(&self) -> Option<(&Symbol, &[Type])> {
        match self.view() {
            TyApp(s, args) => Some((s, &args[..])),
            _ => None,
        }
    }

    /// `(a -> b).as_fun()` returns `Some((a, b))`.
    pub fn as_fun(&self) -> Option<(&Type, &Type)> {
        match self.view() {
            TyApp(s, args) if s.name() == FUN && args.len() == 2 => Some((&args[0], &args[1])),
            _ => None,
        }
    }

    /// Is this the boolean type?
    pub fn is_bool(&self) -> bool {
        match self.view() {
            TyApp(s, args) => s.name() == BOOL && args.is_empty(),
            _ => false,
        }
    }

    /// Is this an arrow type?
    pub fn is_fun(&self) -> bool {
        self.as_fun().is_some()
    }

    /// `ty.unfold_fun()` returns `(args, ret)` such that
    /// `ty == args[0] -> … -> args[n-1] -> ret` and `ret` is not an arrow.
    pub fn unfold_fun(&self) -> (SmallVec<[&Type; 3]>, &Type) {
        let mut t = self;
        let mut v = SmallVec::new();
        while let Some((a, b)) = t.as_fun() {
            v.push(a);
            t = b;
        }
        (v, t)
    }

    /// Collect the type variables occurring in this type, in first-occurrence
    /// order, without duplicates.
    pub fn ty_vars(&self) -> Vec<Symbol> {
        fn walk(t: &Type, out: &mut Vec<Symbol>) {
            match t.view() {
                TyVar(s) => {
                    if !out.contains(s) {
                        out.push(s.clone())
                    }
                }
                TyApp(_, args) => {
                    for a in &args[..] {
                        walk(a, out)
                    }
                }
            }
        }
        let mut v = vec![];
        walk(self, &mut v);
        v
    }

    /// Does the type variable `v` occur in this type?
    pub fn contains_var(&self, v: &Symbol) -> bool {
        match self.view() {
            TyVar(s) => s == v,
            TyApp(_, args) => args.iter().any(|a| a.contains_var(v)),
        }
    }

    /// Apply the type substitution `s`, replacing type variables by types.
    /// Total: unbound variables are left alone.
    pub fn subst(&self, s: &[(Symbol, Type)]) -> Type {
        if s.is_empty() {
            return self.clone();
        }
        match self.view() {
            TyVar(name) => {
                for (v, t) in s {
                    if v == name {
                        return t.clone();
                    }
                }
                self.clone()
            }
            TyApp(name, args) => {
                let args2: Types = args.iter().map(|a| a.subst(s)).collect();
                if args2[..] == args[..] {
                    self.clone()
                } else {
                    Type::app_unchecked(name.clone(), args2)
                }
            }
        }
    }
}

/// Match the pattern type `pat` against the concrete type `t`, extending
/// `binding`. Fails if a variable of `pat` would have to be bound to two
/// distinct types, or if the constructors disagree.
pub fn type_match(pat: &Type, t: &Type, binding: &mut Vec<(Symbol, Type)>) -> Result<()> {
    match (pat.view(), t.view()) {
        (TyVar(v), _) => {
            for (v2, t2) in binding.iter() {
                if v2 == v {
                    return if t2 == t {
                        Ok(())
                    } else {
                        Err(Error::new("type_match: inconsistent binding"))
                    };
                }
            }
            binding.push((v.clone(), t.clone()));
            Ok(())
        }
        (TyApp(c1, args1), TyApp(c2, args2)) => {
            if c1 != c2 || args1.len() != args2.len() {
                return Err(Error::new("type_match: constructor mismatch"));
            }
            for (a, b) in args1.iter().zip(args2.iter()) {
                type_match(a, b, binding)?;
            }
            Ok(())
        }
        (TyApp(..), TyVar(..)) => Err(Error::new("type_match: cannot match against a variable")),
    }
}

mod impls {
    use super::*;

    impl Eq for Type {}
    impl PartialEq for Type {
        fn eq(&self, other: &Self) -> bool {
            // pointer fast path, then structural
            Ref::ptr_eq(&self.0, &other.0) || self.view() == other.view()
        }
    }

    impl std::hash::Hash for Type {
        fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
            self.view().hash(h)
        }
    }

    impl PartialOrd for Type {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Type {
        fn cmp(&self, other: &Self) -> Ordering {
            if Ref::ptr_eq(&self.0, &other.0) {
                return Ordering::Equal;
            }
            match (self.view(), other.view()) {
                (TyVar(a), TyVar(b)) => a.cmp(b),
                (TyVar(..), TyApp(..)) => Ordering::Less,
                (TyApp(..), TyVar(..)) => Ordering::Greater,
                (TyApp(c1, args1), TyApp(c2, args2)) => c1
                    .cmp(c2)
                    .then_with(|| args1.len().cmp(&args2.len()))
                    .then_with(|| {
                        for (a, b) in args1.iter().zip(args2.iter()) {
                            let o = a.cmp(b);
                            if o != Ordering::Equal {
                                return o;
                            }
                        }
                        Ordering::Equal
                    }),
            }
        }
    }

    impl fmt::Debug for Type {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            match self.view() {
                TyVar(s) => write!(out, "{}", s),
                TyApp(s, args) if args.is_empty() => write!(out, "{}", s),
                TyApp(s, args) if s.name() == FUN && args.len() == 2 => {
                    write!(out, "({:?} -> {:?})", args[0], args[1])
                }
                TyApp(s, args) => {
                    write!(out, "({}", s)?;
                    for a in &args[..] {
                        write!(out, " {:?}", a)?;
                    }
                    write!(out, ")")
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smallvec::smallvec;

    fn bool_() -> Type {
        Type::app_unchecked(Symbol::from_str(BOOL), smallvec![])
    }

    fn arrow(a: Type, b: Type) -> Type {
        Type::app_unchecked(Symbol::from_str(FUN), smallvec![a, b])
    }

    #[test]
    fn test_structural_eq() {
        let t1 = arrow(bool_(), bool_());
        let t2 = arrow(bool_(), bool_());
        assert_eq!(t1, t2);
        assert_ne!(t1, bool_());
    }

    #[test]
    fn test_as_fun() {
        let t = arrow(bool_(), Type::var("a"));
        let (a, b) = t.as_fun().unwrap();
        assert!(a.is_bool());
        assert_eq!(b.as_var().unwrap().name(), "a");
    }

    #[test]
    fn test_subst() {
        let a = Type::var("a");
        let t = arrow(a.clone(), a.clone());
        let t2 = t.subst(&[(Symbol::from_str("a"), bool_())]);
        assert_eq!(t2, arrow(bool_(), bool_()));
    }

    #[test]
    fn test_match() {
        let a = Type::var("a");
        let pat = arrow(a.clone(), a.clone());
        let t = arrow(bool_(), bool_());
        let mut b = vec![];
        type_match(&pat, &t, &mut b).unwrap();
        assert_eq!(b.len(), 1);
        assert!(b[0].1.is_bool());

        // inconsistent binding must fail
        let t_bad = arrow(bool_(), Type::var("c"));
        let mut b2 = vec![];
        assert!(type_match(&pat, &t_bad, &mut b2).is_err());
    }
}
