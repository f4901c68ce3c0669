//! # Terms and variables.
//!
//! Terms use a named representation: a binder carries a real variable,
//! and equality is syntactic. Alpha-equivalence is a *derived* relation
//! computed by [`alpha_cmp`], never by structural equality — the two
//! must not be confused, which is why hypothesis handling and several
//! primitive rules go through the alpha order explicitly.

use super::{symbol::Symbol, ty::Type, Ref};
use crate::fnv;
use smallvec::{smallvec, SmallVec};
use std::{cmp::Ordering, fmt};

/// A term.
///
/// The term is refcounted and is thus cheaply clonable. Its type is
/// computed at construction and cached.
#[derive(Clone)]
pub struct Term(pub(super) Ref<TermImpl>);

/// Small vector of terms.
pub type Terms = SmallVec<[Term; 3]>;

/// A free (or bound) variable.
///
/// Variables are equal iff they have the same name and the same type.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Var {
    pub name: Symbol,
    pub ty: Type,
}

/// A small vector of variables.
pub type Vars = SmallVec<[Var; 3]>;

/// The public view of a term's root.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TermView {
    /// A variable occurrence.
    EVar(Var),
    /// A constant with the type it is used at (an instance of the
    /// signature's type scheme for that name).
    EConst(Symbol, Type),
    /// Application.
    EApp(Term, Term),
    /// Abstraction; the binder is always a variable.
    ELambda(Var, Term),
}

pub use TermView::*;

/// The content of a term.
pub(super) struct TermImpl {
    /// The view of the term.
    pub(super) view: TermView,
    /// Cached type of the term.
    pub(super) ty: Type,
    /// Unique ID of the context responsible for creating this term.
    pub(super) ctx_uid: u32,
}

/// Name of the equality constant.
pub const EQ: &str = "=";

impl Var {
    /// Symbol for the variable.
    #[inline]
    pub fn name(&self) -> &Symbol {
        &self.name
    }

    /// Type of the variable.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn new(name: Symbol, ty: Type) -> Var {
        Var { name, ty }
    }

    /// Make a variable from a string name.
    pub fn from_str(name: &str, ty: Type) -> Var {
        Var {
            name: Symbol::from_str(name),
            ty,
        }
    }
}

impl Term {
    /// View the term's root.
    #[inline]
    pub fn view(&self) -> &TermView {
        &self.0.view
    }

    /// Type of the term.
    #[inline]
    pub fn ty(&self) -> &Type {
        &self.0.ty
    }

    pub(super) fn ctx_uid(&self) -> u32 {
        self.0.ctx_uid
    }

    // helper for building terms; the caller is responsible for `ty`
    // being the correct type of `v`.
    pub(super) fn make_(v: TermView, ty: Type, ctx_uid: u32) -> Self {
        Term(Ref::new(TermImpl {
            view: v,
            ty,
            ctx_uid,
        }))
    }

    /// View as a variable.
    pub fn as_var(&self) -> Option<&Var> {
        match self.view() {
            EVar(v) => Some(v),
            _ => None,
        }
    }

    /// View as a constant.
    pub fn as_const(&self) -> Option<(&Symbol, &Type)> {
        match self.view() {
            EConst(s, ty) => Some((s, ty)),
            _ => None,
        }
    }

    /// View as an application.
    pub fn as_app(&self) -> Option<(&Term, &Term)> {
        match self.view() {
            EApp(f, a) => Some((f, a)),
            _ => None,
        }
    }

    /// View as a lambda-abstraction.
    pub fn as_lambda(&self) -> Option<(&Var, &Term)> {
        match self.view() {
            ELambda(v, b) => Some((v, b)),
            _ => None,
        }
    }

    /// Is this the representation of the equality constant?
    pub fn is_eq(&self) -> bool {
        match self.view() {
            EConst(s, _) => s.name() == EQ,
            _ => false,
        }
    }

    /// `e.unfold_app()` returns a tuple `(f, args)` where `args`
    /// iterates over arguments.
    pub fn unfold_app(&self) -> (&Term, SmallVec<[&Term; 3]>) {
        let mut e = self;
        let mut v = smallvec![];
        while let EApp(f, a) = e.view() {
            e = f;
            v.push(a);
        }
        v.reverse();
        (e, v)
    }

    /// `(a=b).unfold_eq()` returns `Some((a,b))`.
    pub fn unfold_eq(&self) -> Option<(&Term, &Term)> {
        let (hd1, b) = self.as_app()?;
        let (hd2, a) = hd1.as_app()?;
        if hd2.is_eq() {
            Some((a, b))
        } else {
            None
        }
    }

    /// Does the variable `v` occur free in this term?
    pub fn var_free_in(&self, v: &Var) -> bool {
        match self.view() {
            EVar(v2) => v == v2,
            EConst(..) => false,
            EApp(f, a) => f.var_free_in(v) || a.var_free_in(v),
            ELambda(v2, body) => v2 != v && body.var_free_in(v),
        }
    }

    /// Free variables of the term, in first-occurrence order,
    /// without duplicates.
    pub fn free_vars(&self) -> Vars {
        let mut out = smallvec![];
        free_vars_into(self, &mut out);
        out
    }

    /// Does this term contain any free variable?
    pub fn has_free_vars(&self) -> bool {
        fn walk(t: &Term, bound: &mut Vec<Var>) -> bool {
            match t.view() {
                EVar(v) => !bound.contains(v),
                EConst(..) => false,
                EApp(f, a) => walk(f, bound) || walk(a, bound),
                ELambda(v, body) => {
                    bound.push(v.clone());
                    let r = walk(body, bound);
                    bound.pop();
                    r
                }
            }
        }
        walk(self, &mut vec![])
    }

    /// Collect the type variables occurring anywhere in the term.
    pub fn ty_vars(&self) -> Vec<Symbol> {
        fn walk(t: &Term, out: &mut Vec<Symbol>) {
            let push = |ty: &Type, out: &mut Vec<Symbol>| {
                for s in ty.ty_vars() {
                    if !out.contains(&s) {
                        out.push(s)
                    }
                }
            };
            match t.view() {
                EVar(v) => push(&v.ty, out),
                EConst(_, ty) => push(ty, out),
                EApp(f, a) => {
                    walk(f, out);
                    walk(a, out);
                }
                ELambda(v, body) => {
                    push(&v.ty, out);
                    walk(body, out);
                }
            }
        }
        let mut v = vec![];
        walk(self, &mut v);
        v
    }

    /// Basic printer.
    pub fn to_string(&self) -> String {
        format!("{:?}", self)
    }

    // pretty print
    fn pp_(&self, out: &mut fmt::Formatter) -> fmt::Result {
        match self.view() {
            EVar(v) => write!(out, "{}", v.name),
            EConst(s, _) => write!(out, "{}", s),
            EApp(..) => {
                let (f, args) = self.unfold_app();
                write!(out, "(")?;
                if f.is_eq() && args.len() == 2 {
                    args[0].pp_(out)?;
                    write!(out, " = ")?;
                    args[1].pp_(out)?;
                } else {
                    f.pp_(out)?;
                    for x in args {
                        write!(out, " ")?;
                        x.pp_(out)?;
                    }
                }
                write!(out, ")")
            }
            ELambda(v, body) => {
                write!(out, "(\\{}. ", v.name)?;
                body.pp_(out)?;
                write!(out, ")")
            }
        }
    }
}

/// Push the free variables of `t` onto `out`, deduplicated.
fn free_vars_into(t: &Term, out: &mut Vars) {
    fn walk(t: &Term, bound: &mut Vec<Var>, out: &mut Vars) {
        match t.view() {
            EVar(v) => {
                if !bound.contains(v) && !out.contains(v) {
                    out.push(v.clone())
                }
            }
            EConst(..) => (),
            EApp(f, a) => {
                walk(f, bound, out);
                walk(a, bound, out);
            }
            ELambda(v, body) => {
                bound.push(v.clone());
                walk(body, bound, out);
                bound.pop();
            }
        }
    }
    walk(t, &mut vec![], out)
}

/// Free variables of a set of terms.
pub fn free_vars_iter<'a, I>(i: I) -> Vars
where
    I: Iterator<Item = &'a Term>,
{
    let mut out = smallvec![];
    for t in i {
        free_vars_into(t, &mut out);
    }
    out
}

/// Total order on terms *up to alpha-equivalence*.
///
/// Two terms compare equal iff they are identical up to a systematic
/// renaming of bound variables. This is the order hypothesis sets are
/// kept sorted by.
pub fn alpha_cmp(t1: &Term, t2: &Term) -> Ordering {
    // `env` pairs the binders crossed so far, innermost first.
    fn cmp_vars(env: &[(Var, Var)], v1: &Var, v2: &Var) -> Ordering {
        for (x1, x2) in env.iter() {
            if v1 == x1 {
                return if v2 == x2 {
                    Ordering::Equal
                } else {
                    Ordering::Less
                };
            } else if v2 == x2 {
                return Ordering::Greater;
            }
        }
        v1.name
            .cmp(&v2.name)
            .then_with(|| v1.ty.cmp(&v2.ty))
    }

    fn cmp_(env: &mut Vec<(Var, Var)>, t1: &Term, t2: &Term) -> Ordering {
        if env.is_empty() && Ref::ptr_eq(&t1.0, &t2.0) {
            return Ordering::Equal;
        }
        match (t1.view(), t2.view()) {
            (EVar(v1), EVar(v2)) => cmp_vars(env, v1, v2),
            (EConst(s1, ty1), EConst(s2, ty2)) => s1.cmp(s2).then_with(|| ty1.cmp(ty2)),
            (EApp(f1, a1), EApp(f2, a2)) => {
                let o = cmp_(env, f1, f2);
                if o != Ordering::Equal {
                    return o;
                }
                cmp_(env, a1, a2)
            }
            (ELambda(v1, b1), ELambda(v2, b2)) => {
                let o = v1.ty.cmp(&v2.ty);
                if o != Ordering::Equal {
                    return o;
                }
                env.insert(0, (v1.clone(), v2.clone()));
                let r = cmp_(env, b1, b2);
                env.remove(0);
                r
            }
            // arbitrary but total order on the variants
            (EVar(..), _) => Ordering::Less,
            (_, EVar(..)) => Ordering::Greater,
            (EConst(..), _) => Ordering::Less,
            (_, EConst(..)) => Ordering::Greater,
            (EApp(..), _) => Ordering::Less,
            (_, EApp(..)) => Ordering::Greater,
        }
    }

    cmp_(&mut vec![], t1, t2)
}

/// Are the two terms alpha-equivalent?
#[inline]
pub fn alpha_eq(t1: &Term, t2: &Term) -> bool {
    alpha_cmp(t1, t2) == Ordering::Equal
}

/// Hash a term up to alpha-equivalence: bound variables hash as their
/// binder depth, so two alpha-equivalent terms hash identically.
/// Used for alpha-keyed caches.
pub fn alpha_hash<H: std::hash::Hasher>(t: &Term, h: &mut H) {
    use std::hash::Hash;

    fn walk<H: std::hash::Hasher>(t: &Term, bound: &mut Vec<Var>, h: &mut H) {
        match t.view() {
            EVar(v) => {
                // innermost binder first
                match bound.iter().rev().position(|w| w == v) {
                    Some(i) => {
                        1u8.hash(h);
                        i.hash(h);
                    }
                    None => {
                        2u8.hash(h);
                        v.name.hash(h);
                        v.ty.hash(h);
                    }
                }
            }
            EConst(s, ty) => {
                3u8.hash(h);
                s.hash(h);
                ty.hash(h);
            }
            EApp(f, a) => {
                4u8.hash(h);
                walk(f, bound, h);
                walk(a, bound, h);
            }
            ELambda(v, b) => {
                5u8.hash(h);
                v.ty.hash(h);
                bound.push(v.clone());
                walk(b, bound, h);
                bound.pop();
            }
        }
    }
    walk(t, &mut vec![], h)
}

/// A set of free variables, for membership tests.
pub fn free_var_set<'a, I>(i: I) -> fnv::FnvHashSet<Var>
where
    I: Iterator<Item = &'a Term>,
{
    let mut set = fnv::new_set_with_cap(16);
    for v in free_vars_iter(i) {
        set.insert(v);
    }
    set
}

mod impls {
    use super::*;

    impl fmt::Debug for Term {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            self.pp_(out)
        }
    }

    impl fmt::Debug for Var {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            write!(out, "{}:{:?}", self.name, self.ty)
        }
    }

    impl PartialOrd for Var {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Var {
        fn cmp(&self, other: &Self) -> Ordering {
            self.name.cmp(&other.name).then_with(|| self.ty.cmp(&other.ty))
        }
    }

    impl Eq for Term {}
    impl PartialEq for Term {
        fn eq(&self, other: &Self) -> bool {
            // pointer fast path, then structural. NOT alpha-equivalence.
            Ref::ptr_eq(&self.0, &other.0) || self.view() == other.view()
        }
    }

    impl std::hash::Hash for Term {
        fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
            self.view().hash(h)
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::Ctx;
    use super::*;

    #[test]
    fn test_free_vars() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let y = Var::from_str("y", b.clone());
        let ex = ctx.mk_var(x.clone());
        let ey = ctx.mk_var(y.clone());
        let e = ctx.mk_eq_app(ex.clone(), ey.clone()).unwrap();
        let lam = ctx.mk_lambda(x.clone(), e.clone()).unwrap();
        assert!(e.var_free_in(&x));
        assert!(!lam.var_free_in(&x));
        assert!(lam.var_free_in(&y));
        let expected: Vars = smallvec::smallvec![y];
        assert_eq!(lam.free_vars(), expected);
    }

    #[test]
    fn test_alpha_eq_lambda() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let y = Var::from_str("y", b.clone());
        let id_x = {
            let e = ctx.mk_var(x.clone());
            ctx.mk_lambda(x.clone(), e).unwrap()
        };
        let id_y = {
            let e = ctx.mk_var(y.clone());
            ctx.mk_lambda(y.clone(), e).unwrap()
        };
        // structurally different, alpha-equivalent
        assert_ne!(id_x, id_y);
        assert!(alpha_eq(&id_x, &id_y));
    }

    #[test]
    fn test_alpha_is_equivalence() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let mk_id = |ctx: &mut Ctx, n: &str| {
            let v = Var::from_str(n, b.clone());
            let e = ctx.mk_var(v.clone());
            ctx.mk_lambda(v, e).unwrap()
        };
        let t1 = mk_id(&mut ctx, "x");
        let t2 = mk_id(&mut ctx, "y");
        let t3 = mk_id(&mut ctx, "z");
        assert!(alpha_eq(&t1, &t1));
        assert!(alpha_eq(&t1, &t2) && alpha_eq(&t2, &t1));
        assert!(alpha_eq(&t1, &t2) && alpha_eq(&t2, &t3) && alpha_eq(&t1, &t3));
    }

    #[test]
    fn test_not_alpha_eq() {
        // \x. \y. x is not alpha-equivalent to \x. \y. y
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let y = Var::from_str("y", b.clone());
        let k = {
            let e = ctx.mk_var(x.clone());
            let inner = ctx.mk_lambda(y.clone(), e).unwrap();
            ctx.mk_lambda(x.clone(), inner).unwrap()
        };
        let ki = {
            let e = ctx.mk_var(y.clone());
            let inner = ctx.mk_lambda(y.clone(), e).unwrap();
            ctx.mk_lambda(x.clone(), inner).unwrap()
        };
        assert!(!alpha_eq(&k, &ki));
    }

    #[test]
    fn test_alpha_hash_consistent() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let mk_id = |ctx: &mut Ctx, n: &str| {
            let v = Var::from_str(n, b.clone());
            let e = ctx.mk_var(v.clone());
            ctx.mk_lambda(v, e).unwrap()
        };
        let t1 = mk_id(&mut ctx, "x");
        let t2 = mk_id(&mut ctx, "y");
        let h = |t: &Term| {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            alpha_hash(t, &mut h);
            std::hash::Hasher::finish(&h)
        };
        assert_eq!(h(&t1), h(&t2));
    }
}
