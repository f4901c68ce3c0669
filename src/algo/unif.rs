//! First-order matching and unification on terms.
//!
//! Matching instantiates the free variables (and type variables) of a
//! *pattern* term so that it becomes alpha-equivalent to a concrete
//! term. It is the workhorse behind rewrite rules and proforma-lemma
//! instantiation. Unification (both sides instantiable) is only needed
//! on binder-free terms, for pattern-overlap analysis.

use crate::kernel::{alpha_eq, type_match, Ctx, Subst, Symbol, Term, TermView, Thm, Type, TySubst, Var};
use crate::error::Result;

use TermView::*;

/// The result of a successful match: a type substitution plus a term
/// substitution. The term bindings are keyed by the pattern's variables
/// *before* type instantiation; [`Matching::apply`] handles the
/// ordering (types first, then terms with instantiated keys).
#[derive(Debug, Clone)]
pub struct Matching {
    pub tys: Vec<(Symbol, Type)>,
    pub terms: Vec<(Var, Term)>,
}

impl Matching {
    fn new() -> Self {
        Matching {
            tys: vec![],
            terms: vec![],
        }
    }

    /// Is this the trivial (empty) match?
    pub fn is_empty(&self) -> bool {
        self.tys.is_empty() && self.terms.is_empty()
    }

    /// Instantiate a theorem with this match: type substitution first,
    /// then the term substitution with type-instantiated keys.
    pub fn apply(&self, ctx: &mut Ctx, th: &Thm) -> Result<Thm> {
        let tys: TySubst = self.tys.iter().cloned().collect();
        let th2 = ctx.thm_instantiate_ty(th.clone(), &tys)?;
        let s: Subst = self
            .terms
            .iter()
            .map(|(v, t)| (Var::new(v.name.clone(), v.ty.subst(&self.tys)), t.clone()))
            .collect();
        ctx.thm_instantiate(th2, &s)
    }

    /// Instantiate a bare term with this match.
    pub fn apply_term(&self, ctx: &Ctx, t: &Term) -> Result<Term> {
        let tys: TySubst = self.tys.iter().cloned().collect();
        let t2 = ctx.inst_type(t, &tys);
        let s: Subst = self
            .terms
            .iter()
            .map(|(v, u)| (Var::new(v.name.clone(), v.ty.subst(&self.tys)), u.clone()))
            .collect();
        ctx.subst(&t2, &s)
    }
}

/// Match the pattern `pat` against `t`: find type and term bindings for
/// the free (type) variables of `pat` making it alpha-equivalent to `t`.
///
/// Returns `None` when there is no such instantiation. Bound variables
/// must correspond one-to-one, and a pattern variable never captures a
/// variable bound in `t`.
pub fn term_match(pat: &Term, t: &Term) -> Option<Matching> {
    let mut m = Matching::new();
    if walk_(pat, t, &mut vec![], &mut m) {
        Some(m)
    } else {
        None
    }
}

fn walk_(pat: &Term, t: &Term, env: &mut Vec<(Var, Var)>, m: &mut Matching) -> bool {
    match (pat.view(), t.view()) {
        (EVar(v), _) => {
            // bound pattern variable: must map to its partner
            if let Some((_, w)) = env.iter().find(|(pv, _)| pv == v) {
                return match t.view() {
                    EVar(tv) => tv == w,
                    _ => false,
                };
            }
            // free pattern variable: the image must not smuggle in a
            // variable bound in `t`
            if env.iter().any(|(_, w)| t.var_free_in(w)) {
                return false;
            }
            if type_match(&v.ty, t.ty(), &mut m.tys).is_err() {
                return false;
            }
            match m.terms.iter().find(|(v2, _)| v2 == v) {
                Some((_, prev)) => alpha_eq(prev, t),
                None => {
                    m.terms.push((v.clone(), t.clone()));
                    true
                }
            }
        }
        (EConst(n1, ty1), EConst(n2, ty2)) => {
            n1 == n2 && type_match(ty1, ty2, &mut m.tys).is_ok()
        }
        (EApp(f1, a1), EApp(f2, a2)) => walk_(f1, f2, env, m) && walk_(a1, a2, env, m),
        (ELambda(v1, b1), ELambda(v2, b2)) => {
            if type_match(&v1.ty, &v2.ty, &mut m.tys).is_err() {
                return false;
            }
            env.push((v1.clone(), v2.clone()));
            let r = walk_(b1, b2, env, m);
            env.pop();
            r
        }
        _ => false,
    }
}

/// Syntactic first-order unification of two binder-free terms, where
/// every variable of either side is an unknown. Used for pattern
/// overlap analysis; fails (returns `None`) on non-unifiable terms,
/// with the usual occurs check.
pub fn unify_terms(t1: &Term, t2: &Term) -> Option<Vec<(Var, Term)>> {
    let mut s: Vec<(Var, Term)> = vec![];
    if unify_(t1, t2, &mut s) {
        Some(s)
    } else {
        None
    }
}

fn resolve_<'a>(t: &'a Term, s: &'a [(Var, Term)]) -> &'a Term {
    let mut t = t;
    loop {
        match t.view() {
            EVar(v) => match s.iter().find(|(v2, _)| v2 == v) {
                Some((_, u)) => t = u,
                None => return t,
            },
            _ => return t,
        }
    }
}

fn occurs_(v: &Var, t: &Term, s: &[(Var, Term)]) -> bool {
    let t = resolve_(t, s);
    match t.view() {
        EVar(w) => w == v,
        EConst(..) => false,
        EApp(f, a) => occurs_(v, f, s) || occurs_(v, a, s),
        ELambda(..) => true, // conservatively refuse binders
    }
}

fn unify_(t1: &Term, t2: &Term, s: &mut Vec<(Var, Term)>) -> bool {
    let t1 = resolve_(t1, s).clone();
    let t2 = resolve_(t2, s).clone();
    match (t1.view(), t2.view()) {
        (EVar(v), _) => {
            if let EVar(w) = t2.view() {
                if v == w {
                    return true;
                }
            }
            if occurs_(v, &t2, s) {
                return false;
            }
            s.push((v.clone(), t2.clone()));
            true
        }
        (_, EVar(_)) => unify_(&t2, &t1, s),
        (EConst(n1, ty1), EConst(n2, ty2)) => n1 == n2 && ty1 == ty2,
        (EApp(f1, a1), EApp(f2, a2)) => {
            let (f1, a1, f2, a2) = (f1.clone(), a1.clone(), f2.clone(), a2.clone());
            unify_(&f1, &f2, s) && unify_(&a1, &a2, s)
        }
        _ => false,
    }
}

/// Fully apply a unifier obtained from [`unify_terms`] to a term.
pub fn apply_unifier(ctx: &Ctx, s: &[(Var, Term)], t: &Term) -> Result<Term> {
    // resolve chains first so a single pass suffices
    let mut flat: Subst = Subst::new();
    for (v, u) in s {
        flat.add_binding(v.clone(), deep_resolve_(ctx, u, s)?);
    }
    ctx.subst(t, &flat)
}

fn deep_resolve_(ctx: &Ctx, t: &Term, s: &[(Var, Term)]) -> Result<Term> {
    let t = resolve_(t, s).clone();
    match t.view() {
        EApp(f, a) => {
            let f2 = deep_resolve_(ctx, f, s)?;
            let a2 = deep_resolve_(ctx, a, s)?;
            if &f2 == f && &a2 == a {
                Ok(t.clone())
            } else {
                ctx.mk_app(f2, a2)
            }
        }
        _ => Ok(t),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_match_instance() {
        let ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = ctx.mk_var_str("x", b.clone());
        let pat = ctx.mk_eq_app(x.clone(), x.clone()).unwrap();
        // match `x = x` against `c = c`
        let t = {
            let cst = ctx.mk_var_str("c", b.clone());
            ctx.mk_eq_app(cst.clone(), cst).unwrap()
        };
        let m = term_match(&pat, &t).unwrap();
        assert_eq!(m.terms.len(), 1);
        // non-linear mismatch: `x = x` against `c = d`
        let c = ctx.mk_var_str("c", b.clone());
        let d = ctx.mk_var_str("d", b.clone());
        let t2 = ctx.mk_eq_app(c, d).unwrap();
        assert!(term_match(&pat, &t2).is_none());
    }

    #[test]
    fn test_match_no_capture() {
        // pattern `\y. x` must not match `\y. y` (the image of `x`
        // would be the bound `y`)
        let ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let y = Var::from_str("y", b.clone());
        let pat = {
            let e = ctx.mk_var(x.clone());
            ctx.mk_lambda(y.clone(), e).unwrap()
        };
        let t = {
            let e = ctx.mk_var(y.clone());
            ctx.mk_lambda(y.clone(), e).unwrap()
        };
        assert!(term_match(&pat, &t).is_none());
    }

    #[test]
    fn test_match_poly() {
        // `v:a = v:a` matches `p:bool = p:bool` with a := bool
        let ctx = Ctx::new();
        let a = ctx.mk_ty_var("a");
        let v = ctx.mk_var_str("v", a);
        let pat = ctx.mk_eq_app(v.clone(), v).unwrap();
        let p = ctx.mk_var_str("p", ctx.mk_bool());
        let t = ctx.mk_eq_app(p.clone(), p).unwrap();
        let m = term_match(&pat, &t).unwrap();
        assert_eq!(m.tys.len(), 1);
        assert!(m.tys[0].1.is_bool());
    }

    #[test]
    fn test_unify() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        ctx.new_ty_const("nat0", 0).unwrap();
        let n = ctx.mk_ty_app("nat0", vec![]).unwrap();
        ctx.new_const("S0", ctx.mk_arrow(n.clone(), n.clone())).unwrap();
        let s = ctx.mk_const("S0", ctx.mk_arrow(n.clone(), n.clone())).unwrap();
        let x = ctx.mk_var_str("x", n.clone());
        let y = ctx.mk_var_str("y", n.clone());
        let sx = ctx.mk_app(s.clone(), x.clone()).unwrap();
        let sy = ctx.mk_app(s.clone(), y.clone()).unwrap();
        assert!(unify_terms(&sx, &sy).is_some());
        // occurs check
        assert!(unify_terms(&x, &sx).is_none());
        let _ = b;
    }
}
