//! # Context for terms and theorems.
//!
//! The proof context is responsible for creating new terms and new
//! theorems, in a way that ensures theorems are valid. It owns the
//! signature: the append-only tables of declared type constructors and
//! constants, and the registry of axioms taken so far.

use super::{
    subst::{Subst, TySubst},
    symbol::Symbol,
    term::{alpha_cmp, alpha_eq, free_vars_iter, Term, TermView, Var, Vars, EQ},
    thm::Thm,
    ty::{Type, BOOL, FUN},
};
use crate::{
    error::{Error, Result},
    errorstr,
    fnv::{self, FnvHashMap as HM},
};
use smallvec::smallvec;
use std::{cmp::Ordering, sync::atomic};

use TermView::*;

/// Global manager for terms and theorems.
///
/// All terms are created through a context; all theorems are created by
/// its `thm_*` primitive rules. Each context is an isolated logical
/// session: its signature and axiom registry are not shared, and a
/// theorem is only meaningful in the context that built it (checked via
/// a per-context unique ID).
pub struct Ctx(Box<CtxImpl>);

struct CtxImpl {
    /// Declared type constructors, with arity. Append-only.
    ty_consts: HM<Symbol, usize>,
    /// Declared constants, with their most general type. Append-only.
    consts: HM<Symbol, Type>,
    /// All the axioms taken so far, with their names.
    axioms: Vec<(Symbol, Thm)>,
    /// The boolean type, cached.
    e_bool: Type,
    /// If false, `thm_axiom` will fail.
    allow_new_axioms: bool,
    /// Unique to this ctx.
    uid: u32,
}

// used to allocate unique context IDs
static CTX_ID: atomic::AtomicUsize = atomic::AtomicUsize::new(0);

// helpers
impl Ctx {
    /// Create a new context.
    ///
    /// The signature starts with the builtin type constructors `bool/0`
    /// and `fun/2`, and the polymorphic equality constant
    /// `= : a -> a -> bool`.
    pub fn new() -> Self {
        let uid = CTX_ID.fetch_add(1, atomic::Ordering::SeqCst);
        if uid > u32::MAX as usize {
            panic!("allocated more than u32::MAX contexts, cannot allocate more");
        }

        let e_bool = Type::app_unchecked(Symbol::from_str(BOOL), smallvec![]);
        let mut ctx = Ctx(Box::new(CtxImpl {
            ty_consts: fnv::new_table_with_cap(32),
            consts: fnv::new_table_with_cap(32),
            axioms: vec![],
            e_bool,
            allow_new_axioms: true,
            uid: uid as u32,
        }));

        ctx.0.ty_consts.insert(Symbol::from_str(BOOL), 0);
        ctx.0.ty_consts.insert(Symbol::from_str(FUN), 2);

        // `= : a -> a -> bool`
        let a = Type::var("a");
        let ty_eq = {
            let b = ctx.mk_arrow(a.clone(), ctx.mk_bool());
            ctx.mk_arrow(a, b)
        };
        ctx.0.consts.insert(Symbol::from_str(EQ), ty_eq);

        ctx
    }

    #[inline]
    fn check_uid_(&self, e: &Term) {
        assert!(self.0.uid == e.ctx_uid()); // term should belong to this ctx
    }

    #[inline]
    fn check_thm_uid_(&self, th: &Thm) {
        assert!(self.0.uid == th.0.ctx_uid); // theorem should belong to this ctx
    }

    fn mk_term_(&self, v: TermView, ty: Type) -> Term {
        Term::make_(v, ty, self.0.uid)
    }
}

// sorted-hypothesis plumbing, all under the alpha order
fn sort_hyps_(mut v: Vec<Term>) -> Vec<Term> {
    v.sort_by(|a, b| alpha_cmp(a, b));
    v.dedup_by(|a, b| alpha_eq(a, b));
    v
}

fn merge_hyps_(v1: &[Term], v2: &[Term]) -> Vec<Term> {
    let mut out = Vec::with_capacity(v1.len() + v2.len());
    let mut i1 = 0;
    let mut i2 = 0;
    while i1 < v1.len() && i2 < v2.len() {
        match alpha_cmp(&v1[i1], &v2[i2]) {
            Ordering::Equal => {
                // deduplication
                out.push(v1[i1].clone());
                i1 += 1;
                i2 += 1;
            }
            Ordering::Less => {
                out.push(v1[i1].clone());
                i1 += 1;
            }
            Ordering::Greater => {
                out.push(v2[i2].clone());
                i2 += 1;
            }
        }
    }
    out.extend_from_slice(&v1[i1..]);
    out.extend_from_slice(&v2[i2..]);
    out
}

fn remove_hyp_(hyps: &[Term], t: &Term) -> Vec<Term> {
    hyps.iter().filter(|h| !alpha_eq(h, t)).cloned().collect()
}

// term construction
impl Ctx {
    /// The type of booleans.
    #[inline]
    pub fn mk_bool(&self) -> Type {
        self.0.e_bool.clone()
    }

    /// Make an arrow type `a -> b`.
    pub fn mk_arrow(&self, a: Type, b: Type) -> Type {
        Type::app_unchecked(Symbol::from_str(FUN), smallvec![a, b])
    }

    /// Make a type variable.
    pub fn mk_ty_var(&self, name: &str) -> Type {
        Type::var(name)
    }

    /// Apply a declared type constructor to arguments.
    ///
    /// Fails if the constructor is unknown or the arity does not match.
    pub fn mk_ty_app(&self, name: &str, args: Vec<Type>) -> Result<Type> {
        match self.0.ty_consts.get(name) {
            None => Err(errorstr!("mk_ty_app: unknown type constructor `{}`", name)),
            Some(&arity) if arity != args.len() => Err(errorstr!(
                "mk_ty_app: constructor `{}` requires {} arguments, got {}",
                name,
                arity,
                args.len()
            )),
            Some(_) => Ok(Type::app_unchecked(
                Symbol::from_str(name),
                args.into_iter().collect(),
            )),
        }
    }

    /// Make a free variable term.
    pub fn mk_var(&self, v: Var) -> Term {
        let ty = v.ty.clone();
        self.mk_term_(EVar(v), ty)
    }

    /// Make a free variable term from a string.
    pub fn mk_var_str(&self, name: &str, ty: Type) -> Term {
        self.mk_var(Var::from_str(name, ty))
    }

    /// Make a constant term, used at type `ty`.
    ///
    /// Fails if the constant is not declared, or if `ty` is not an
    /// instance of its declared type scheme.
    pub fn mk_const(&self, name: &str, ty: Type) -> Result<Term> {
        let scheme = self
            .0
            .consts
            .get(name)
            .ok_or_else(|| errorstr!("mk_const: unknown constant `{}`", name))?;
        let mut binding = vec![];
        super::ty::type_match(scheme, &ty, &mut binding)
            .map_err(|e| errorstr!("mk_const: `{}` cannot be used at type {:?}", name, ty).with_source(e))?;
        Ok(self.mk_term_(EConst(Symbol::from_str(name), ty.clone()), ty))
    }

    /// The equality constant at type `ty -> ty -> bool`.
    pub fn mk_eq(&self, ty: Type) -> Term {
        let t_eq = {
            let b = self.mk_arrow(ty.clone(), self.mk_bool());
            self.mk_arrow(ty, b)
        };
        self.mk_term_(EConst(Symbol::from_str(EQ), t_eq.clone()), t_eq)
    }

    /// Build the term `a = b`.
    ///
    /// Fails if `a` and `b` do not have the same type.
    pub fn mk_eq_app(&self, a: Term, b: Term) -> Result<Term> {
        self.check_uid_(&a);
        self.check_uid_(&b);
        if a.ty() != b.ty() {
            return Err(Error::new("mk_eq: incompatible types"));
        }
        let eq = self.mk_eq(a.ty().clone());
        let t = self.mk_app(eq, a)?;
        self.mk_app(t, b)
    }

    /// Apply `f` to `a`.
    ///
    /// Fails unless `f` has an arrow type whose domain is the type of `a`.
    pub fn mk_app(&self, f: Term, a: Term) -> Result<Term> {
        self.check_uid_(&f);
        self.check_uid_(&a);
        match f.ty().as_fun() {
            Some((dom, rng)) if dom == a.ty() => {
                let ty = rng.clone();
                Ok(self.mk_term_(EApp(f, a), ty))
            }
            Some(_) => Err(Error::new("mk_app: incompatible types")),
            None => Err(Error::new("mk_app: cannot apply a term with a non-arrow type")),
        }
    }

    /// Apply `f` to the given arguments.
    pub fn mk_app_l(&self, f: Term, args: &[Term]) -> Result<Term> {
        let mut e = f;
        for x in args {
            e = self.mk_app(e, x.clone())?;
        }
        Ok(e)
    }

    /// Make a lambda term by abstracting on `v`.
    pub fn mk_lambda(&self, v: Var, body: Term) -> Result<Term> {
        self.check_uid_(&body);
        let ty = self.mk_arrow(v.ty.clone(), body.ty().clone());
        Ok(self.mk_term_(ELambda(v, body), ty))
    }

    /// Make a lambda term by abstracting on `vars`, rightmost innermost.
    pub fn mk_lambda_l(&self, vars: &[Var], body: Term) -> Result<Term> {
        let mut e = body;
        for v in vars.iter().rev() {
            e = self.mk_lambda(v.clone(), e)?;
        }
        Ok(e)
    }
}

// signature
impl Ctx {
    /// Declare a new type constructor with the given arity.
    ///
    /// The signature is append-only: re-declaring an existing name fails.
    pub fn new_ty_const(&mut self, name: &str, arity: usize) -> Result<()> {
        if self.0.ty_consts.contains_key(name) {
            return Err(errorstr!(
                "new_ty_const: type constructor `{}` is already declared",
                name
            ));
        }
        self.0.ty_consts.insert(Symbol::from_str(name), arity);
        Ok(())
    }

    /// Declare a new constant with the given (most general) type.
    ///
    /// The constant is entirely opaque: no theorem about it is produced.
    /// Re-declaring an existing name fails.
    pub fn new_const(&mut self, name: &str, ty: Type) -> Result<()> {
        if self.0.consts.contains_key(name) {
            return Err(errorstr!(
                "new_const: constant `{}` is already declared",
                name
            ));
        }
        self.0.consts.insert(Symbol::from_str(name), ty);
        Ok(())
    }

    /// Find a declared constant's type scheme.
    pub fn find_const(&self, name: &str) -> Option<&Type> {
        self.0.consts.get(name)
    }

    /// Find a declared type constructor's arity.
    pub fn find_ty_const(&self, name: &str) -> Option<usize> {
        self.0.ty_consts.get(name).copied()
    }

    /// Is this name a declared constant?
    #[inline]
    pub fn is_const_name(&self, name: &str) -> bool {
        self.0.consts.contains_key(name)
    }

    /// Iterate over all axioms taken so far, with their names.
    pub fn axioms(&self) -> impl Iterator<Item = (&Symbol, &Thm)> {
        self.0.axioms.iter().map(|(s, th)| (s, th))
    }

    /// Pledge that no new call to `thm_axiom` will occur.
    ///
    /// This freezes the logical theory to the consequences of the
    /// builtin rules and the already created axioms.
    pub fn pledge_no_new_axiom(&mut self) {
        self.0.allow_new_axioms = false;
    }
}

// substitution machinery
impl Ctx {
    /// Rename `v` until its name clashes neither with a variable in
    /// `avoid` nor with a declared constant.
    pub fn variant(&self, avoid: &[Var], v: &Var) -> Var {
        let mut name = v.name.name().to_string();
        loop {
            let clash =
                avoid.iter().any(|w| w.name.name() == name) || self.is_const_name(&name);
            if !clash {
                break;
            }
            name.push('\'');
        }
        if name == v.name.name() {
            v.clone()
        } else {
            Var::new(Symbol::from(name), v.ty.clone())
        }
    }

    /// For each pair `(x, u)` in `subst`, replace instances of the free
    /// variable `x` by `u` in `t`, renaming bound variables whenever
    /// keeping them would capture a free variable of some `u`.
    pub fn subst(&self, t: &Term, subst: &Subst) -> Result<Term> {
        self.check_uid_(t);
        for (v, u) in subst.iter() {
            self.check_uid_(u);
            if &v.ty != u.ty() {
                return Err(errorstr!(
                    "subst: binding for `{}` is ill-typed",
                    v.name
                ));
            }
        }
        Ok(self.subst_rec_(t, subst))
    }

    fn subst_rec_(&self, t: &Term, s: &Subst) -> Term {
        if s.is_empty() {
            return t.clone();
        }
        match t.view() {
            EVar(v) => match s.find(v) {
                Some(u) => u.clone(),
                None => t.clone(),
            },
            EConst(..) => t.clone(),
            EApp(f, a) => {
                let f2 = self.subst_rec_(f, s);
                let a2 = self.subst_rec_(a, s);
                if &f2 == f && &a2 == a {
                    t.clone()
                } else {
                    let ty = f2
                        .ty()
                        .as_fun()
                        .expect("substitution preserves typing")
                        .1
                        .clone();
                    self.mk_term_(EApp(f2, a2), ty)
                }
            }
            ELambda(v, body) => {
                let s2 = s.remove_var(v);
                if s2.is_empty() {
                    return t.clone();
                }
                // would the binder capture a free variable of an image?
                let capture = s2
                    .iter()
                    .any(|(w, u)| body.var_free_in(w) && u.var_free_in(v));
                if !capture {
                    let body2 = self.subst_rec_(body, &s2);
                    if &body2 == body {
                        t.clone()
                    } else {
                        self.mk_lambda(v.clone(), body2).expect("typed body")
                    }
                } else {
                    // rename the binder to a variant, then substitute
                    let mut avoid: Vars = body.free_vars();
                    for (w, u) in s2.iter() {
                        if body.var_free_in(w) {
                            for fv in u.free_vars() {
                                if !avoid.contains(&fv) {
                                    avoid.push(fv)
                                }
                            }
                        }
                    }
                    let v2 = self.variant(&avoid, v);
                    let mut s3 = s2.clone();
                    s3.add_binding(v.clone(), self.mk_var(v2.clone()));
                    let body2 = self.subst_rec_(body, &s3);
                    self.mk_lambda(v2, body2).expect("typed body")
                }
            }
        }
    }

    /// Apply the type substitution to every type in the term, renaming a
    /// bound variable whenever instantiation would make it collide with a
    /// distinct free variable of its body.
    pub fn inst_type(&self, t: &Term, s: &TySubst) -> Term {
        self.check_uid_(t);
        if s.is_empty() {
            return t.clone();
        }
        self.inst_type_rec_(t, s)
    }

    fn inst_type_rec_(&self, t: &Term, s: &TySubst) -> Term {
        match t.view() {
            EVar(v) => self.mk_var(Var::new(v.name.clone(), v.ty.subst(s.bindings()))),
            EConst(c, ty) => {
                let ty2 = ty.subst(s.bindings());
                self.mk_term_(EConst(c.clone(), ty2.clone()), ty2)
            }
            EApp(f, a) => {
                let f2 = self.inst_type_rec_(f, s);
                let a2 = self.inst_type_rec_(a, s);
                let ty = f2
                    .ty()
                    .as_fun()
                    .expect("type instantiation preserves typing")
                    .1
                    .clone();
                self.mk_term_(EApp(f2, a2), ty)
            }
            ELambda(v, body) => {
                let v_ty2 = v.ty.subst(s.bindings());
                // a distinct same-named free variable of the body may end up
                // with the binder's instantiated type, which would capture it
                let clash = body.free_vars().iter().any(|w| {
                    w != v && w.name == v.name && w.ty.subst(s.bindings()) == v_ty2
                });
                if !clash {
                    let body2 = self.inst_type_rec_(body, s);
                    self.mk_lambda(Var::new(v.name.clone(), v_ty2), body2)
                        .expect("typed body")
                } else {
                    let avoid: Vars = body.free_vars();
                    let vr = self.variant(&avoid, v);
                    let mut ren = Subst::new();
                    ren.add_binding(v.clone(), self.mk_var(vr.clone()));
                    let body_r = self.subst_rec_(body, &ren);
                    let body2 = self.inst_type_rec_(&body_r, s);
                    self.mk_lambda(Var::new(vr.name.clone(), v_ty2), body2)
                        .expect("typed body")
                }
            }
        }
    }
}

// the primitive rules
impl Ctx {
    /// `assume F` is `F |- F`.
    ///
    /// This fails if `F` is not a boolean.
    pub fn thm_assume(&mut self, e: Term) -> Result<Thm> {
        self.check_uid_(&e);
        if !e.ty().is_bool() {
            return Err(Error::new("assume: cannot assume a non-boolean term"));
        }
        Ok(Thm::make_(e.clone(), self.0.uid, vec![e]))
    }

    /// `refl t` is `|- t = t`.
    pub fn thm_refl(&mut self, e: Term) -> Thm {
        self.check_uid_(&e);
        let t = self.mk_eq_app(e.clone(), e).expect("refl");
        Thm::make_(t, self.0.uid, vec![])
    }

    /// `trans (F1 |- a=b) (F2 |- b'=c)` is `F1, F2 |- a=c`.
    ///
    /// `b` and `b'` must be alpha-equivalent; this is what makes the
    /// two-`refl` alpha-renaming step work.
    pub fn thm_trans(&mut self, th1: Thm, th2: Thm) -> Result<Thm> {
        self.check_thm_uid_(&th1);
        self.check_thm_uid_(&th2);
        let (a, b) = th1
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("trans: th1 must be an equation"))?;
        let (b2, c) = th2
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("trans: th2 must be an equation"))?;
        if !alpha_eq(b, b2) {
            return Err(Error::new("trans: th1 and th2's conclusions do not align"));
        }

        let eq_a_c = self.mk_eq_app(a.clone(), c.clone())?;
        let hyps = merge_hyps_(th1.hyps(), th2.hyps());
        Ok(Thm::make_(eq_a_c, self.0.uid, hyps))
    }

    /// `congr (F1 |- f=g) (F2 |- x=y)` is `F1, F2 |- f x = g y`.
    ///
    /// Fails unless `f` is applicable to `x`.
    pub fn thm_congr(&mut self, th1: Thm, th2: Thm) -> Result<Thm> {
        self.check_thm_uid_(&th1);
        self.check_thm_uid_(&th2);
        let (f, g) = th1
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("congr: th1.concl must be an equation"))?;
        let (x, y) = th2
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("congr: th2.concl must be an equation"))?;
        let fx = self.mk_app(f.clone(), x.clone())?;
        let gy = self.mk_app(g.clone(), y.clone())?;
        let eq = self.mk_eq_app(fx, gy)?;
        let hyps = merge_hyps_(th1.hyps(), th2.hyps());
        Ok(Thm::make_(eq, self.0.uid, hyps))
    }

    /// `abs x (F |- t=u)` is `F |- (\x.t) = (\x.u)`.
    ///
    /// Fails if `x` occurs freely in `F`.
    pub fn thm_abs(&mut self, v: &Var, th: Thm) -> Result<Thm> {
        self.check_thm_uid_(&th);
        if free_vars_iter(th.hyps().iter()).contains(v) {
            return Err(Error::new("abs: variable occurs in one of the hypotheses"));
        }
        let (t, u) = th
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("abs: th conclusion should be an equation"))?;
        let lam_t = self.mk_lambda(v.clone(), t.clone())?;
        let lam_u = self.mk_lambda(v.clone(), u.clone())?;
        let eq = self.mk_eq_app(lam_t, lam_u)?;
        Ok(Thm::make_(eq, self.0.uid, th.hyps().to_vec()))
    }

    /// `beta_conv ((\x.u) a)` is `|- (\x.u) a = u[x:=a]`.
    ///
    /// The substitution is capture-avoiding. Fails if the term is not a
    /// beta-redex.
    pub fn thm_beta_conv(&mut self, e: &Term) -> Result<Thm> {
        self.check_uid_(e);
        let (f, arg) = e
            .as_app()
            .ok_or_else(|| Error::new("beta-conv: expect an application"))?;
        let (v, body) = f
            .as_lambda()
            .ok_or_else(|| Error::new("beta-conv: expect a lambda in the application"))?;
        debug_assert_eq!(&v.ty, arg.ty()); // enforced by typing

        let mut s = Subst::new();
        s.add_binding(v.clone(), arg.clone());
        let rhs = self.subst(body, &s)?;
        let eq = self.mk_eq_app(e.clone(), rhs)?;
        Ok(Thm::make_(eq, self.0.uid, vec![]))
    }

    /// `bool_eq (F1 |- a) (F2 |- a'=b)` is `F1, F2 |- b`.
    /// This is the boolean equivalent of transitivity (modus ponens for
    /// equality); `a` and `a'` must be alpha-equivalent.
    pub fn thm_bool_eq(&mut self, th1: Thm, th2: Thm) -> Result<Thm> {
        self.check_thm_uid_(&th1);
        self.check_thm_uid_(&th2);
        let (a, b) = th2
            .concl()
            .unfold_eq()
            .filter(|(a, _)| a.ty().is_bool())
            .ok_or_else(|| Error::new("bool-eq: th2 should have a boolean equation as conclusion"))?;
        if !alpha_eq(a, th1.concl()) {
            return Err(errorstr!(
                "bool-eq: conclusion of th1 `{:?}` does not match th2's LHS `{:?}`",
                th1.concl(),
                a
            ));
        }
        let b = b.clone();
        let hyps = merge_hyps_(th1.hyps(), th2.hyps());
        Ok(Thm::make_(b, self.0.uid, hyps))
    }

    /// `bool_eq_intro (F1, a |- b) (F2, b |- a)` is `F1, F2 |- b=a`.
    ///
    /// This is how a boolean equation is built from mutual derivability:
    /// each side's occurrence as a hypothesis of the other proof is
    /// discharged (matching up to alpha).
    pub fn thm_bool_eq_intro(&mut self, th1: Thm, th2: Thm) -> Result<Thm> {
        self.check_thm_uid_(&th1);
        self.check_thm_uid_(&th2);
        let eq = self.mk_eq_app(th2.concl().clone(), th1.concl().clone())?;
        let hyps = merge_hyps_(
            &remove_hyp_(th1.hyps(), th2.concl()),
            &remove_hyp_(th2.hyps(), th1.concl()),
        );
        Ok(Thm::make_(eq, self.0.uid, hyps))
    }

    /// `cut (F1 |- b) (F2, b |- c)` is `F1, F2 |- c`.
    ///
    /// This fails if `b` does not occur (up to alpha) in the hypotheses
    /// of the second theorem.
    ///
    /// NOTE: this rule is derivable from the others; it is kept as a
    /// primitive because hypothesis discharge is on every proof's hot
    /// path.
    pub fn thm_cut(&mut self, th1: Thm, th2: Thm) -> Result<Thm> {
        self.check_thm_uid_(&th1);
        self.check_thm_uid_(&th2);
        let b = th1.concl();
        if !th2.hyps().iter().any(|h| alpha_eq(h, b)) {
            return Err(Error::new("cut: th2's hypotheses do not contain th1's conclusion"));
        }
        let hyps = merge_hyps_(th1.hyps(), &remove_hyp_(th2.hyps(), b));
        Ok(Thm::make_(th2.concl().clone(), self.0.uid, hyps))
    }

    /// `instantiate th σ` produces `Fσ |- Gσ` where `th` is `F |- G`.
    ///
    /// The substitution is capture-avoiding on hypotheses and conclusion
    /// alike.
    pub fn thm_instantiate(&mut self, th: Thm, subst: &Subst) -> Result<Thm> {
        self.check_thm_uid_(&th);
        if subst.is_empty() {
            return Ok(th);
        }
        let concl = self.subst(th.concl(), subst)?;
        let mut hyps = Vec::with_capacity(th.hyps().len());
        for h in th.hyps() {
            hyps.push(self.subst(h, subst)?);
        }
        Ok(Thm::make_(concl, self.0.uid, sort_hyps_(hyps)))
    }

    /// `instantiate_ty th σ` applies a type substitution to `th`'s
    /// hypotheses and conclusion.
    pub fn thm_instantiate_ty(&mut self, th: Thm, subst: &TySubst) -> Result<Thm> {
        self.check_thm_uid_(&th);
        if subst.is_empty() {
            return Ok(th);
        }
        let concl = self.inst_type(th.concl(), subst);
        let hyps: Vec<_> = th.hyps().iter().map(|h| self.inst_type(h, subst)).collect();
        Ok(Thm::make_(concl, self.0.uid, sort_hyps_(hyps)))
    }

    /// `new_basic_definition (x = rhs)` where `x` is a variable and
    /// `rhs` a closed term, declares `x` as a new constant and returns
    /// the defining theorem `|- x = rhs` along with the constant.
    ///
    /// This is a conservative extension: no axiom is taken. Fails if
    /// `rhs` has free term variables, or type variables not present in
    /// the type of `x`, or if the name is already declared.
    pub fn thm_new_basic_definition(&mut self, e: Term) -> Result<(Thm, Term)> {
        self.check_uid_(&e);
        let (x, rhs) = e
            .unfold_eq()
            .and_then(|(x, rhs)| x.as_var().map(|x| (x, rhs)))
            .ok_or_else(|| {
                Error::new("new definition: expected an equation `x = rhs` with `x` a variable")
            })?;
        debug_assert_eq!(&x.ty, rhs.ty()); // enforced by `mk_eq_app`
        if rhs.has_free_vars() {
            return Err(Error::new("new definition: RHS must have no free variables"));
        }
        let ty_vars_lhs = x.ty.ty_vars();
        for tv in rhs.ty_vars() {
            if !ty_vars_lhs.contains(&tv) {
                return Err(errorstr!(
                    "new definition: type variable `{}` of the RHS \
                     does not occur in the type of `{}`",
                    tv,
                    x.name
                ));
            }
        }

        self.new_const(x.name.name(), x.ty.clone())?;
        let c = self
            .mk_const(x.name.name(), x.ty.clone())
            .expect("constant was just declared");
        let eqn = self.mk_eq_app(c.clone(), rhs.clone())?;
        let thm = Thm::make_(eqn, self.0.uid, vec![]);
        Ok((thm, c))
    }

    /// Create a new named axiom `|- concl`. **Use with caution.**
    ///
    /// Every axiom is recorded with its name and can be audited through
    /// [`Ctx::axioms`]. Fails if `pledge_no_new_axiom` was called earlier
    /// on this context, or if `concl` is not boolean.
    pub fn thm_axiom(&mut self, name: impl Into<Symbol>, concl: Term) -> Result<Thm> {
        if !self.0.allow_new_axioms {
            return Err(Error::new("this context has pledged to not take new axioms"));
        }
        self.check_uid_(&concl);
        if !concl.ty().is_bool() {
            return Err(Error::new("axiom: conclusion must be boolean"));
        }
        let thm = Thm::make_(concl, self.0.uid, vec![]);
        self.0.axioms.push((name.into(), thm.clone()));
        Ok(thm)
    }
}

mod impls {
    use super::*;
    use std::fmt;

    impl std::default::Default for Ctx {
        fn default() -> Self {
            Ctx::new()
        }
    }

    impl fmt::Debug for Ctx {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "<logical context>")
        }
    }
}
