//! # The boolean theory.
//!
//! [`Logic::install`] introduces the logical connectives through
//! conservative definitions (`new_basic_definition`) with the classic
//! Church-style equations, plus the excluded-middle axiom as the
//! classical basis. Everything else in this module is a *derived* rule:
//! a finite composition of primitive kernel calls, with no access to
//! the theorem type's internals. This layer is therefore not separately
//! trusted.

use crate::algo::conv::{self, BetaConv, BetaWhnfConvN, BinopConv, OnceDepthConv};
use crate::error::{Error, Result};
use crate::errorstr;
use crate::kernel::{alpha_eq, Ctx, Subst, Symbol, Term, Thm, TySubst, Type, Var, Vars};

/// Names of the logical constants.
pub const TRUE: &str = "T";
pub const AND: &str = "/\\";
pub const IMP: &str = "==>";
pub const FORALL: &str = "!";
pub const EXISTS: &str = "?";
pub const OR: &str = "\\/";
pub const FALSE: &str = "F";
pub const NOT: &str = "~";
pub const EXISTS_UNIQUE: &str = "?!";

// ---- term building and destructuring ----

fn bool3_(ctx: &Ctx) -> Type {
    let b = ctx.mk_bool();
    ctx.mk_arrow(b.clone(), ctx.mk_arrow(b.clone(), b))
}

fn mk_binop_(ctx: &Ctx, name: &str, a: Term, b: Term) -> Result<Term> {
    let c = ctx.mk_const(name, bool3_(ctx))?;
    ctx.mk_app_l(c, &[a, b])
}

/// Build `a /\ b`.
pub fn mk_conj(ctx: &Ctx, a: Term, b: Term) -> Result<Term> {
    mk_binop_(ctx, AND, a, b)
}

/// Build `a ==> b`.
pub fn mk_imp(ctx: &Ctx, a: Term, b: Term) -> Result<Term> {
    mk_binop_(ctx, IMP, a, b)
}

/// Build `a \/ b`.
pub fn mk_disj(ctx: &Ctx, a: Term, b: Term) -> Result<Term> {
    mk_binop_(ctx, OR, a, b)
}

/// Build `~a`.
pub fn mk_not(ctx: &Ctx, a: Term) -> Result<Term> {
    let b = ctx.mk_bool();
    let c = ctx.mk_const(NOT, ctx.mk_arrow(b.clone(), b))?;
    ctx.mk_app(c, a)
}

/// The term `T`.
pub fn mk_true(ctx: &Ctx) -> Result<Term> {
    ctx.mk_const(TRUE, ctx.mk_bool())
}

/// The term `F`.
pub fn mk_false(ctx: &Ctx) -> Result<Term> {
    ctx.mk_const(FALSE, ctx.mk_bool())
}

fn mk_quant_(ctx: &Ctx, name: &str, v: Var, body: Term) -> Result<Term> {
    if !body.ty().is_bool() {
        return Err(Error::new("quantifier body must be boolean"));
    }
    let b = ctx.mk_bool();
    let lam_ty = ctx.mk_arrow(v.ty.clone(), b.clone());
    let c = ctx.mk_const(name, ctx.mk_arrow(lam_ty, b))?;
    let lam = ctx.mk_lambda(v, body)?;
    ctx.mk_app(c, lam)
}

/// Build `!v. body`.
pub fn mk_forall(ctx: &Ctx, v: Var, body: Term) -> Result<Term> {
    mk_quant_(ctx, FORALL, v, body)
}

/// Build `!v1 … vn. body`.
pub fn mk_forall_l(ctx: &Ctx, vars: &[Var], body: Term) -> Result<Term> {
    let mut t = body;
    for v in vars.iter().rev() {
        t = mk_forall(ctx, v.clone(), t)?;
    }
    Ok(t)
}

/// Build `?v. body`.
pub fn mk_exists(ctx: &Ctx, v: Var, body: Term) -> Result<Term> {
    mk_quant_(ctx, EXISTS, v, body)
}

/// Build `?!v. body`.
pub fn mk_exists_unique(ctx: &Ctx, v: Var, body: Term) -> Result<Term> {
    mk_quant_(ctx, EXISTS_UNIQUE, v, body)
}

/// Destructure `op a b` for a named binary constant.
pub fn dest_binop<'a>(name: &str, t: &'a Term) -> Option<(&'a Term, &'a Term)> {
    let (fa, b) = t.as_app()?;
    let (op, a) = fa.as_app()?;
    let (s, _) = op.as_const()?;
    if s.name() == name {
        Some((a, b))
    } else {
        None
    }
}

pub fn dest_conj(t: &Term) -> Option<(&Term, &Term)> {
    dest_binop(AND, t)
}

pub fn dest_imp(t: &Term) -> Option<(&Term, &Term)> {
    dest_binop(IMP, t)
}

pub fn dest_disj(t: &Term) -> Option<(&Term, &Term)> {
    dest_binop(OR, t)
}

/// Destructure `~a`.
pub fn dest_neg(t: &Term) -> Option<&Term> {
    let (op, a) = t.as_app()?;
    let (s, _) = op.as_const()?;
    if s.name() == NOT {
        Some(a)
    } else {
        None
    }
}

fn dest_quant<'a>(name: &str, t: &'a Term) -> Option<(&'a Var, &'a Term, &'a Term)> {
    let (op, lam) = t.as_app()?;
    let (s, _) = op.as_const()?;
    if s.name() != name {
        return None;
    }
    let (v, body) = lam.as_lambda()?;
    Some((v, body, lam))
}

/// Destructure `!v. body` into `(v, body)`.
pub fn dest_forall(t: &Term) -> Option<(&Var, &Term)> {
    dest_quant(FORALL, t).map(|(v, b, _)| (v, b))
}

/// Destructure `?v. body` into `(v, body)`.
pub fn dest_exists(t: &Term) -> Option<(&Var, &Term)> {
    dest_quant(EXISTS, t).map(|(v, b, _)| (v, b))
}

/// Is this the constant `T`?
pub fn is_true(t: &Term) -> bool {
    matches!(t.as_const(), Some((s, _)) if s.name() == TRUE)
}

/// Is this the constant `F`?
pub fn is_false(t: &Term) -> bool {
    matches!(t.as_const(), Some((s, _)) if s.name() == FALSE)
}

/// Strip leading universal quantifiers, returning the binders in order.
pub fn strip_forall(t: &Term) -> (Vec<Var>, Term) {
    let mut vars = vec![];
    let mut t = t.clone();
    while let Some((v, b)) = dest_forall(&t) {
        vars.push(v.clone());
        let b = b.clone();
        t = b;
    }
    (vars, t)
}

/// Split a conjunction tree into its leaves.
pub fn conjuncts(t: &Term) -> Vec<Term> {
    match dest_conj(t) {
        Some((a, b)) => {
            let mut v = conjuncts(a);
            v.extend(conjuncts(b));
            v
        }
        None => vec![t.clone()],
    }
}

/// Split a disjunction tree into its leaves.
pub fn disjuncts(t: &Term) -> Vec<Term> {
    match dest_disj(t) {
        Some((a, b)) => {
            let mut v = disjuncts(a);
            v.extend(disjuncts(b));
            v
        }
        None => vec![t.clone()],
    }
}

/// Build the conjunction of a non-empty list, right-associated.
pub fn list_mk_conj(ctx: &Ctx, ts: &[Term]) -> Result<Term> {
    let mut it = ts.iter().rev();
    let mut t = it
        .next()
        .ok_or_else(|| Error::new("list_mk_conj: empty list"))?
        .clone();
    for a in it {
        t = mk_conj(ctx, a.clone(), t)?;
    }
    Ok(t)
}

// ---- kernel-only derived equality rules ----

/// From `A |- l = r`, produce `A |- r = l`.
pub fn sym(ctx: &mut Ctx, th: Thm) -> Result<Thm> {
    let (l, _r) = th
        .concl()
        .unfold_eq()
        .ok_or_else(|| Error::new("sym: expected an equation"))?;
    let l = l.clone();
    let eq = ctx.mk_eq(l.ty().clone());
    let refl_l = ctx.thm_refl(l.clone());
    let th_eq = ctx.thm_refl(eq);
    let th1 = ctx.thm_congr(th_eq, th)?; // |- (= l) = (= r)
    let th2 = ctx.thm_congr(th1, refl_l.clone())?; // |- (l = l) = (r = l)
    ctx.thm_bool_eq(refl_l, th2)
}

/// `|- t1 = t2` for alpha-equivalent `t1`, `t2`: the transitivity of
/// two reflexivity steps, which the kernel accepts because `trans`
/// aligns middles up to alpha.
pub fn alpha_thm(ctx: &mut Ctx, t1: &Term, t2: &Term) -> Result<Thm> {
    if !alpha_eq(t1, t2) {
        return Err(Error::new("alpha: terms are not alpha-equivalent"));
    }
    let r1 = ctx.thm_refl(t1.clone());
    let r2 = ctx.thm_refl(t2.clone());
    ctx.thm_trans(r1, r2)
}

/// From `A |- a = b`, produce `A |- f a = f b`.
pub fn ap_term(ctx: &mut Ctx, f: Term, th: Thm) -> Result<Thm> {
    let th_f = ctx.thm_refl(f);
    ctx.thm_congr(th_f, th)
}

/// From `A |- f = g`, produce `A |- f x = g x`.
pub fn ap_thm(ctx: &mut Ctx, th: Thm, x: Term) -> Result<Thm> {
    let th_x = ctx.thm_refl(x);
    ctx.thm_congr(th, th_x)
}

// ---- the theory ----

/// The boolean theory: definitional theorems for the connectives, the
/// truth theorem, and the classical basis. Cheap to clone (everything
/// inside is refcounted).
#[derive(Clone)]
pub struct Logic {
    true_def: Thm,
    and_def: Thm,
    imp_def: Thm,
    forall_def: Thm,
    exists_def: Thm,
    or_def: Thm,
    false_def: Thm,
    not_def: Thm,
    exists_unique_def: Thm,
    /// `|- T`
    truth: Thm,
    /// `|- !p. p \/ ~p`
    em: Thm,
}

impl std::fmt::Debug for Logic {
    fn fmt(&self, out: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(out, "<boolean theory>")
    }
}

impl Logic {
    /// Install the boolean theory into a fresh-ish context.
    ///
    /// Fails if any of the connective names is already declared (the
    /// signature is append-only), so this is called once per context.
    pub fn install(ctx: &mut Ctx) -> Result<Logic> {
        let b = ctx.mk_bool();
        let p = Var::from_str("p", b.clone());
        let q = Var::from_str("q", b.clone());
        let r = Var::from_str("r", b.clone());

        // T = ((\p:bool. p) = (\p:bool. p))
        let id = {
            let e = ctx.mk_var(p.clone());
            ctx.mk_lambda(p.clone(), e)?
        };
        let (true_def, _) = {
            let rhs = ctx.mk_eq_app(id.clone(), id.clone())?;
            let v = ctx.mk_var_str(TRUE, b.clone());
            let eqn = ctx.mk_eq_app(v, rhs)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // |- T
        let truth = {
            let th_refl = ctx.thm_refl(id);
            let th_sym = sym(ctx, true_def.clone())?;
            ctx.thm_bool_eq(th_refl, th_sym)?
        };
        let t_tm = mk_true(ctx)?;

        // /\ = \p q. (\f. f p q) = (\f. f T T)
        let bb3 = bool3_(ctx);
        let (and_def, _) = {
            let f = Var::from_str("f", bb3.clone());
            let fv = ctx.mk_var(f.clone());
            let ep = ctx.mk_var(p.clone());
            let eq_ = ctx.mk_var(q.clone());
            let fpq = ctx.mk_app_l(fv.clone(), &[ep, eq_])?;
            let ftt = ctx.mk_app_l(fv, &[t_tm.clone(), t_tm.clone()])?;
            let lhs = ctx.mk_lambda(f.clone(), fpq)?;
            let rhs = ctx.mk_lambda(f, ftt)?;
            let body = ctx.mk_eq_app(lhs, rhs)?;
            let lam = ctx.mk_lambda_l(&[p.clone(), q.clone()], body)?;
            let v = ctx.mk_var_str(AND, bb3.clone());
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // ==> = \p q. (p /\ q) = p
        let (imp_def, _) = {
            let ep = ctx.mk_var(p.clone());
            let eq_ = ctx.mk_var(q.clone());
            let pq = mk_conj(ctx, ep.clone(), eq_)?;
            let body = ctx.mk_eq_app(pq, ep)?;
            let lam = ctx.mk_lambda_l(&[p.clone(), q.clone()], body)?;
            let v = ctx.mk_var_str(IMP, bb3.clone());
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // ! = \P:a->bool. P = (\x:a. T)
        let a_ty = ctx.mk_ty_var("a");
        let pred = Var::from_str("P", ctx.mk_arrow(a_ty.clone(), b.clone()));
        let x_a = Var::from_str("x", a_ty.clone());
        let (forall_def, _) = {
            let lam_t = ctx.mk_lambda(x_a.clone(), t_tm.clone())?;
            let body = {
                let e = ctx.mk_var(pred.clone());
                ctx.mk_eq_app(e, lam_t)?
            };
            let lam = ctx.mk_lambda(pred.clone(), body)?;
            let v = ctx.mk_var_str(FORALL, ctx.mk_arrow(pred.ty.clone(), b.clone()));
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // ? = \P:a->bool. !q. (!x. P x ==> q) ==> q
        let (exists_def, _) = {
            let px = {
                let e = ctx.mk_var(pred.clone());
                let ex = ctx.mk_var(x_a.clone());
                ctx.mk_app(e, ex)?
            };
            let imp1 = mk_imp(ctx, px, ctx.mk_var(q.clone()))?;
            let all_x = mk_forall(ctx, x_a.clone(), imp1)?;
            let imp2 = mk_imp(ctx, all_x, ctx.mk_var(q.clone()))?;
            let all_q = mk_forall(ctx, q.clone(), imp2)?;
            let lam = ctx.mk_lambda(pred.clone(), all_q)?;
            let v = ctx.mk_var_str(EXISTS, ctx.mk_arrow(pred.ty.clone(), b.clone()));
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // \/ = \p q. !r. (p ==> r) ==> (q ==> r) ==> r
        let (or_def, _) = {
            let er = ctx.mk_var(r.clone());
            let pr = mk_imp(ctx, ctx.mk_var(p.clone()), er.clone())?;
            let qr = mk_imp(ctx, ctx.mk_var(q.clone()), er.clone())?;
            let body = mk_imp(ctx, pr, mk_imp(ctx, qr, er)?)?;
            let all_r = mk_forall(ctx, r.clone(), body)?;
            let lam = ctx.mk_lambda_l(&[p.clone(), q.clone()], all_r)?;
            let v = ctx.mk_var_str(OR, bb3);
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // F = !p:bool. p
        let (false_def, _) = {
            let body = mk_forall(ctx, p.clone(), ctx.mk_var(p.clone()))?;
            let v = ctx.mk_var_str(FALSE, b.clone());
            let eqn = ctx.mk_eq_app(v, body)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // ~ = \p. p ==> F
        let (not_def, _) = {
            let body = mk_imp(ctx, ctx.mk_var(p.clone()), mk_false(ctx)?)?;
            let lam = ctx.mk_lambda(p.clone(), body)?;
            let v = ctx.mk_var_str(NOT, ctx.mk_arrow(b.clone(), b.clone()));
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // ?! = \P:a->bool. (?) P /\ (!x y. P x /\ P y ==> x = y)
        let (exists_unique_def, _) = {
            let y_a = Var::from_str("y", a_ty.clone());
            let ex_p = {
                let c = ctx.mk_const(EXISTS, ctx.mk_arrow(pred.ty.clone(), b.clone()))?;
                let e = ctx.mk_var(pred.clone());
                ctx.mk_app(c, e)?
            };
            let px = {
                let e = ctx.mk_var(pred.clone());
                ctx.mk_app(e, ctx.mk_var(x_a.clone()))?
            };
            let py = {
                let e = ctx.mk_var(pred.clone());
                ctx.mk_app(e, ctx.mk_var(y_a.clone()))?
            };
            let hyp = mk_conj(ctx, px, py)?;
            let xy = {
                let ex = ctx.mk_var(x_a.clone());
                let ey = ctx.mk_var(y_a.clone());
                ctx.mk_eq_app(ex, ey)?
            };
            let imp = mk_imp(ctx, hyp, xy)?;
            let alls = mk_forall_l(ctx, &[x_a.clone(), y_a], imp)?;
            let body = mk_conj(ctx, ex_p, alls)?;
            let lam = ctx.mk_lambda(pred, body)?;
            let v = ctx.mk_var_str(EXISTS_UNIQUE, ctx.mk_arrow(ctx.mk_arrow(a_ty, b.clone()), b.clone()));
            let eqn = ctx.mk_eq_app(v, lam)?;
            ctx.thm_new_basic_definition(eqn)?
        };

        // the classical basis, recorded as a named, auditable axiom
        let em = {
            let np = mk_not(ctx, ctx.mk_var(p.clone()))?;
            let por = mk_disj(ctx, ctx.mk_var(p.clone()), np)?;
            let t = mk_forall(ctx, p, por)?;
            ctx.thm_axiom("excluded_middle", t)?
        };

        Ok(Logic {
            true_def,
            and_def,
            imp_def,
            forall_def,
            exists_def,
            or_def,
            false_def,
            not_def,
            exists_unique_def,
            truth,
            em,
        })
    }

    /// `|- T`.
    pub fn truth(&self) -> &Thm {
        &self.truth
    }

    /// `|- !p. p \/ ~p`.
    pub fn em(&self) -> &Thm {
        &self.em
    }

    /// The defining theorem of `?!`.
    pub fn exists_unique_def(&self) -> &Thm {
        &self.exists_unique_def
    }

    // `|- op a b = body[a, b]` for a binary connective definition.
    fn unfold_binop_(&self, ctx: &mut Ctx, def: &Thm, a: &Term, b: &Term) -> Result<Thm> {
        let th = ap_thm(ctx, def.clone(), a.clone())?;
        let th = ap_thm(ctx, th, b.clone())?;
        conv::conv_rhs(ctx, &BetaWhnfConvN(2), th)
    }

    // `|- op a = body[a]` for a unary connective definition.
    fn unfold_unop_(&self, ctx: &mut Ctx, def: &Thm, a: &Term) -> Result<Thm> {
        let th = ap_thm(ctx, def.clone(), a.clone())?;
        conv::conv_rhs(ctx, &BetaWhnfConvN(1), th)
    }

    // `|- (Q) lam = body[lam]` for a quantifier definition, with the
    // definition's type variable instantiated to the binder type.
    fn unfold_quant_(&self, ctx: &mut Ctx, def: &Thm, lam: &Term) -> Result<Thm> {
        let (dom, _) = lam
            .ty()
            .as_fun()
            .ok_or_else(|| Error::new("unfold_quant: expected a predicate"))?;
        let tys: TySubst = std::iter::once((Symbol::from_str("a"), dom.clone())).collect();
        let def_i = ctx.thm_instantiate_ty(def.clone(), &tys)?;
        let th = ap_thm(ctx, def_i, lam.clone())?;
        conv::conv_rhs(ctx, &BetaWhnfConvN(1), th)
    }

    /// From `A |- t`, produce `A |- t = T`.
    pub fn eqt_intro(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        ctx.thm_bool_eq_intro(self.truth.clone(), th)
    }

    /// From `A |- t = T`, produce `A |- t`.
    pub fn eqt_elim(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let th_sym = sym(ctx, th)?;
        ctx.thm_bool_eq(self.truth.clone(), th_sym)
    }

    /// `conj (A |- p) (B |- q)` is `A, B |- p /\ q`.
    pub fn conj(&self, ctx: &mut Ctx, th1: Thm, th2: Thm) -> Result<Thm> {
        let p = th1.concl().clone();
        let q = th2.concl().clone();
        let eqt1 = self.eqt_intro(ctx, th1.clone())?;
        let eqt2 = self.eqt_intro(ctx, th2.clone())?;

        // fresh function variable for the pairing encoding
        let mut avoid: Vars = p.free_vars();
        let more = std::iter::once(&q).chain(th1.hyps().iter()).chain(th2.hyps().iter());
        for t in more {
            for v in t.free_vars() {
                if !avoid.contains(&v) {
                    avoid.push(v)
                }
            }
        }
        let f = ctx.variant(&avoid, &Var::from_str("f", bool3_(ctx)));

        let inner = {
            let fv = ctx.mk_var(f.clone());
            let th_f = ctx.thm_refl(fv);
            let th_fp = ctx.thm_congr(th_f, eqt1)?;
            ctx.thm_congr(th_fp, eqt2)?
        };
        let ab = ctx.thm_abs(&f, inner)?; // A,B |- (\f. f p q) = (\f. f T T)
        let unfold = self.unfold_binop_(ctx, &self.and_def.clone(), &p, &q)?;
        let un_sym = sym(ctx, unfold)?;
        ctx.thm_bool_eq(ab, un_sym)
    }

    // shared engine for the two conjunction projections
    fn conjunct_(&self, ctx: &mut Ctx, th: Thm, first: bool) -> Result<Thm> {
        let (p, q) = dest_conj(th.concl())
            .ok_or_else(|| Error::new("conjunct: expected a conjunction"))?;
        let (p, q) = (p.clone(), q.clone());
        let unfold = self.unfold_binop_(ctx, &self.and_def.clone(), &p, &q)?;
        let th2 = ctx.thm_bool_eq(th, unfold)?; // A |- (\f. f p q) = (\f. f T T)

        // selector `\a b. a` or `\a b. b`
        let b = ctx.mk_bool();
        let va = Var::from_str("a", b.clone());
        let vb = Var::from_str("b", b);
        let sel = {
            let e = if first {
                ctx.mk_var(va.clone())
            } else {
                ctx.mk_var(vb.clone())
            };
            ctx.mk_lambda_l(&[va, vb], e)?
        };
        let th3 = ap_thm(ctx, th2, sel)?;
        let th4 = conv::thm_conv_concl(ctx, th3, &BinopConv(BetaWhnfConvN(3)))?; // A |- x = T
        self.eqt_elim(ctx, th4)
    }

    /// `conjunct1 (A |- p /\ q)` is `A |- p`.
    pub fn conjunct1(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        self.conjunct_(ctx, th, true)
    }

    /// `conjunct2 (A |- p /\ q)` is `A |- q`.
    pub fn conjunct2(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        self.conjunct_(ctx, th, false)
    }

    /// Both projections at once.
    pub fn conj_pair(&self, ctx: &mut Ctx, th: Thm) -> Result<(Thm, Thm)> {
        Ok((
            self.conjunct_(ctx, th.clone(), true)?,
            self.conjunct_(ctx, th, false)?,
        ))
    }

    /// `mp (A |- p ==> q) (B |- p)` is `A, B |- q`.
    ///
    /// The antecedent and the second conclusion must agree up to alpha.
    pub fn mp(&self, ctx: &mut Ctx, th_imp: Thm, th: Thm) -> Result<Thm> {
        let (p, q) = dest_imp(th_imp.concl())
            .ok_or_else(|| Error::new("mp: expected an implication"))?;
        let (p, q) = (p.clone(), q.clone());
        let unfold = self.unfold_binop_(ctx, &self.imp_def.clone(), &p, &q)?;
        let th1 = ctx.thm_bool_eq(th_imp, unfold)?; // A |- (p /\ q) = p
        let th2 = sym(ctx, th1)?; // A |- p = (p /\ q)
        let th3 = ctx.thm_bool_eq(th, th2)?; // A,B |- p /\ q
        self.conjunct2(ctx, th3)
    }

    /// `disch t (A |- q)` is `A \ {t} |- t ==> q`.
    pub fn disch(&self, ctx: &mut Ctx, t: &Term, th: Thm) -> Result<Thm> {
        if !t.ty().is_bool() {
            return Err(Error::new("disch: term must be boolean"));
        }
        let q = th.concl().clone();
        let th_t = ctx.thm_assume(t.clone())?;
        let conj1 = self.conj(ctx, th_t, th)?; // A,{t} |- t /\ q
        let c1 = {
            let tq = mk_conj(ctx, t.clone(), q.clone())?;
            let a = ctx.thm_assume(tq)?;
            self.conjunct1(ctx, a)? // {t /\ q} |- t
        };
        let deq = ctx.thm_bool_eq_intro(c1, conj1)?; // A\{t} |- (t /\ q) = t
        let unfold = self.unfold_binop_(ctx, &self.imp_def.clone(), t, &q)?;
        let un_sym = sym(ctx, unfold)?;
        ctx.thm_bool_eq(deq, un_sym)
    }

    /// `undisch (A |- p ==> q)` is `A, {p} |- q`.
    pub fn undisch(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let (p, _) = dest_imp(th.concl())
            .ok_or_else(|| Error::new("undisch: expected an implication"))?;
        let p = p.clone();
        let th_p = ctx.thm_assume(p)?;
        self.mp(ctx, th, th_p)
    }

    /// From `A |- p ==> q` and `B |- q ==> p`, produce `A, B |- p = q`.
    pub fn imp_antisym(&self, ctx: &mut Ctx, th1: Thm, th2: Thm) -> Result<Thm> {
        let u1 = self.undisch(ctx, th1)?; // {p} |- q
        let u2 = self.undisch(ctx, th2)?; // {q} |- p
        ctx.thm_bool_eq_intro(u1, u2) // |- p = q
    }

    /// From `A |- p = q`, produce the two implications.
    pub fn eq_imp_rule(&self, ctx: &mut Ctx, th: Thm) -> Result<(Thm, Thm)> {
        let (p, q) = th
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("eq_imp_rule: expected an equation"))?;
        let (p, q) = (p.clone(), q.clone());
        let fwd = {
            let a = ctx.thm_assume(p.clone())?;
            let m = ctx.thm_bool_eq(a, th.clone())?;
            self.disch(ctx, &p, m)?
        };
        let bwd = {
            let a = ctx.thm_assume(q.clone())?;
            let th_s = sym(ctx, th)?;
            let m = ctx.thm_bool_eq(a, th_s)?;
            self.disch(ctx, &q, m)?
        };
        Ok((fwd, bwd))
    }

    /// `prove_hyp (A |- p) (B, p |- q)` is `A, B |- q` (cut through the
    /// derived rules, tolerant of alpha differences).
    pub fn prove_hyp(&self, ctx: &mut Ctx, th1: Thm, th2: Thm) -> Result<Thm> {
        let c = th1.concl().clone();
        let d = self.disch(ctx, &c, th2)?;
        self.mp(ctx, d, th1)
    }

    /// `spec u (A |- !x. p)` is `A |- p[u/x]`.
    ///
    /// Also accepts `(!) f` with a non-lambda predicate `f`, yielding
    /// `A |- f u`.
    pub fn spec(&self, ctx: &mut Ctx, u: &Term, th: Thm) -> Result<Thm> {
        let lam = {
            let (op, f) = th
                .concl()
                .as_app()
                .ok_or_else(|| Error::new("spec: expected a universal"))?;
            match op.as_const() {
                Some((s, _)) if s.name() == FORALL => f.clone(),
                _ => return Err(Error::new("spec: expected a universal")),
            }
        };
        let unfold = self.unfold_quant_(ctx, &self.forall_def.clone(), &lam)?;
        let th3 = ctx.thm_bool_eq(th, unfold)?; // A |- lam = (\x. T)
        let th4 = ap_thm(ctx, th3, u.clone())?; // A |- lam u = (\x. T) u
        let th5 = conv::thm_conv_concl(ctx, th4, &BinopConv(BetaConv))?; // A |- p[u] = T
        self.eqt_elim(ctx, th5)
    }

    /// Strip all leading universal quantifiers by specializing each to
    /// its own bound variable.
    pub fn spec_all(&self, ctx: &mut Ctx, mut th: Thm) -> Result<Thm> {
        while let Some((v, _)) = dest_forall(th.concl()) {
            let u = ctx.mk_var(v.clone());
            th = self.spec(ctx, &u, th)?;
        }
        Ok(th)
    }

    /// Specialize with a list of witnesses, outermost first.
    pub fn spec_l(&self, ctx: &mut Ctx, us: &[Term], mut th: Thm) -> Result<Thm> {
        for u in us {
            th = self.spec(ctx, u, th)?;
        }
        Ok(th)
    }

    /// `gen x (A |- p)` is `A |- !x. p`; `x` must not be free in `A`.
    pub fn gen(&self, ctx: &mut Ctx, x: &Var, th: Thm) -> Result<Thm> {
        let p = th.concl().clone();
        let eqt = self.eqt_intro(ctx, th)?;
        let ab = ctx.thm_abs(x, eqt)?; // A |- (\x. p) = (\x. T)
        let lam = ctx.mk_lambda(x.clone(), p)?;
        let unfold = self.unfold_quant_(ctx, &self.forall_def.clone(), &lam)?;
        let un_sym = sym(ctx, unfold)?;
        ctx.thm_bool_eq(ab, un_sym)
    }

    /// Generalize over a list of variables, outermost first.
    pub fn gen_l(&self, ctx: &mut Ctx, xs: &[Var], mut th: Thm) -> Result<Thm> {
        for x in xs.iter().rev() {
            th = self.gen(ctx, x, th)?;
        }
        Ok(th)
    }

    // unfold `?x. p`, reducing the `lam x` application inside the body
    fn unfold_exists_(&self, ctx: &mut Ctx, lam: &Term) -> Result<Thm> {
        let th = self.unfold_quant_(ctx, &self.exists_def.clone(), lam)?;
        conv::conv_rhs(ctx, &OnceDepthConv(BetaConv), th)
    }

    /// `exists_intro (?x. p) u (A |- p[u/x])` is `A |- ?x. p`.
    pub fn exists_intro(&self, ctx: &mut Ctx, etm: &Term, u: &Term, th: Thm) -> Result<Thm> {
        let (_, _, lam) = dest_quant(EXISTS, etm)
            .ok_or_else(|| Error::new("exists_intro: expected an existential"))?;
        let lam = lam.clone();
        let unfold = self.unfold_exists_(ctx, &lam)?; // |- (?x.p) = X
        let (_, x_rhs) = unfold.concl().unfold_eq().expect("unfold is an equation");
        let x_rhs = x_rhs.clone();

        // X = !qv. (!xv. p' ==> qv) ==> qv ; refresh qv against everything
        let (qv, body) = dest_forall(&x_rhs)
            .ok_or_else(|| Error::new("exists_intro: unexpected unfolding"))?;
        let (qv, body) = (qv.clone(), body.clone());
        let mut avoid: Vars = x_rhs.free_vars();
        for h in th.hyps() {
            for v in h.free_vars() {
                if !avoid.contains(&v) {
                    avoid.push(v)
                }
            }
        }
        for v in u.free_vars() {
            if !avoid.contains(&v) {
                avoid.push(v)
            }
        }
        let qv2 = ctx.variant(&avoid, &qv);
        let body2 = {
            let mut s = Subst::new();
            s.add_binding(qv.clone(), ctx.mk_var(qv2.clone()));
            ctx.subst(&body, &s)?
        };
        let (ante, _) = dest_imp(&body2)
            .ok_or_else(|| Error::new("exists_intro: unexpected unfolding"))?;
        let ante = ante.clone();

        let a_th = ctx.thm_assume(ante.clone())?;
        let s_th = self.spec(ctx, u, a_th)?; // {ante} |- p'[u] ==> qv2
        let q_th = self.mp(ctx, s_th, th)?; // {ante}, A |- qv2
        let d_th = self.disch(ctx, &ante, q_th)?; // A |- ante ==> qv2
        let g_th = self.gen(ctx, &qv2, d_th)?; // A |- !qv2. ante ==> qv2
        let al = alpha_thm(ctx, g_th.concl(), &x_rhs)
            .map_err(|e| Error::new("exists_intro: witness does not prove the body").with_source(e))?;
        let at_x = ctx.thm_bool_eq(g_th, al)?; // A |- X
        let un_sym = sym(ctx, unfold)?;
        ctx.thm_bool_eq(at_x, un_sym)
    }

    /// `choose v (A |- ?x. p) (B, p[v/x] |- r)` is `A, B |- r`.
    ///
    /// `v` must not occur free in `B \ {p[v/x]}`, in `r`, or in `?x. p`.
    pub fn choose(&self, ctx: &mut Ctx, v: &Var, th1: Thm, th2: Thm) -> Result<Thm> {
        let (x, p, lam) = dest_quant(EXISTS, th1.concl())
            .map(|(x, p, l)| (x.clone(), p.clone(), l.clone()))
            .ok_or_else(|| Error::new("choose: th1 must be an existential"))?;
        let r = th2.concl().clone();
        if r.var_free_in(v) {
            return Err(Error::new("choose: variable occurs in the conclusion"));
        }
        if th1.concl().var_free_in(v) {
            return Err(Error::new("choose: variable occurs in the existential"));
        }
        let unfold = self.unfold_exists_(ctx, &lam)?;
        let th0 = ctx.thm_bool_eq(th1, unfold)?; // A |- !q. (!x. p' ==> q) ==> q
        let s = self.spec(ctx, &r, th0)?; // A |- (!x. p' ==> r) ==> r
        let (ante, _) = dest_imp(s.concl())
            .ok_or_else(|| Error::new("choose: unexpected unfolding"))?;
        let ante = ante.clone();

        let p_v = {
            let mut su = Subst::new();
            su.add_binding(x.clone(), ctx.mk_var(v.clone()));
            ctx.subst(&p, &su)?
        };
        let d = self.disch(ctx, &p_v, th2)?; // B |- p[v] ==> r
        let g = self.gen(ctx, v, d)?; // B |- !v. p[v] ==> r
        let al = alpha_thm(ctx, g.concl(), &ante)
            .map_err(|e| Error::new("choose: hypothesis does not match the existential").with_source(e))?;
        let g2 = ctx.thm_bool_eq(g, al)?; // B |- ante
        self.mp(ctx, s, g2)
    }

    // shared or-introduction engine
    fn disj_intro_(&self, ctx: &mut Ctx, p: Term, q: Term, th: Thm, left: bool) -> Result<Thm> {
        let unfold = self.unfold_binop_(ctx, &self.or_def.clone(), &p, &q)?;
        let (_, x_rhs) = unfold.concl().unfold_eq().expect("unfold is an equation");
        let x_rhs = x_rhs.clone();
        let (rv, body) = dest_forall(&x_rhs)
            .ok_or_else(|| Error::new("disj: unexpected unfolding"))?;
        let (rv, body) = (rv.clone(), body.clone());

        let mut avoid: Vars = x_rhs.free_vars();
        for h in th.hyps() {
            for v in h.free_vars() {
                if !avoid.contains(&v) {
                    avoid.push(v)
                }
            }
        }
        let rv2 = ctx.variant(&avoid, &rv);
        let body2 = {
            let mut s = Subst::new();
            s.add_binding(rv.clone(), ctx.mk_var(rv2.clone()));
            ctx.subst(&body, &s)?
        };
        let (pr, rest) = dest_imp(&body2).ok_or_else(|| Error::new("disj: unexpected unfolding"))?;
        let (qr, _) = dest_imp(rest).ok_or_else(|| Error::new("disj: unexpected unfolding"))?;
        let (pr, qr) = (pr.clone(), qr.clone());

        let used = if left { pr.clone() } else { qr.clone() };
        let a1 = ctx.thm_assume(used.clone())?;
        let th_r = self.mp(ctx, a1, th)?; // A, {used} |- rv2
        let d2 = self.disch(ctx, &qr, th_r)?;
        let d1 = self.disch(ctx, &pr, d2)?;
        let g = self.gen(ctx, &rv2, d1)?;
        let al = alpha_thm(ctx, g.concl(), &x_rhs)?;
        let at_x = ctx.thm_bool_eq(g, al)?;
        let un_sym = sym(ctx, unfold)?;
        ctx.thm_bool_eq(at_x, un_sym)
    }

    /// `disj1 (A |- p) q` is `A |- p \/ q`.
    pub fn disj1(&self, ctx: &mut Ctx, th: Thm, q: Term) -> Result<Thm> {
        let p = th.concl().clone();
        self.disj_intro_(ctx, p, q, th, true)
    }

    /// `disj2 p (A |- q)` is `A |- p \/ q`.
    pub fn disj2(&self, ctx: &mut Ctx, p: Term, th: Thm) -> Result<Thm> {
        let q = th.concl().clone();
        self.disj_intro_(ctx, p, q, th, false)
    }

    /// `disj_cases (A |- p \/ q) (B, p |- r) (C, q |- r)` is
    /// `A, B\{p}, C\{q} |- r`.
    pub fn disj_cases(&self, ctx: &mut Ctx, th: Thm, th1: Thm, th2: Thm) -> Result<Thm> {
        let (p, q) = dest_disj(th.concl())
            .ok_or_else(|| Error::new("disj_cases: expected a disjunction"))?;
        let (p, q) = (p.clone(), q.clone());
        if !alpha_eq(th1.concl(), th2.concl()) {
            return Err(Error::new("disj_cases: the two cases prove different conclusions"));
        }
        let r = th1.concl().clone();
        let unfold = self.unfold_binop_(ctx, &self.or_def.clone(), &p, &q)?;
        let th0 = ctx.thm_bool_eq(th, unfold)?; // A |- !r. (p==>r) ==> (q==>r) ==> r
        let s = self.spec(ctx, &r, th0)?; // A |- (p==>r) ==> (q==>r) ==> r
        let d1 = self.disch(ctx, &p, th1)?;
        let m1 = self.mp(ctx, s, d1)?;
        let d2 = self.disch(ctx, &q, th2)?;
        self.mp(ctx, m1, d2)
    }

    /// `contr t (A |- F)` is `A |- t`.
    pub fn contr(&self, ctx: &mut Ctx, t: &Term, th: Thm) -> Result<Thm> {
        if !is_false(th.concl()) {
            return Err(Error::new("contr: expected a proof of F"));
        }
        let th2 = ctx.thm_bool_eq(th, self.false_def.clone())?; // A |- !p. p
        self.spec(ctx, t, th2)
    }

    /// `not_intro (A |- p ==> F)` is `A |- ~p`.
    pub fn not_intro(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let (p, f) = dest_imp(th.concl())
            .ok_or_else(|| Error::new("not_intro: expected `p ==> F`"))?;
        if !is_false(f) {
            return Err(Error::new("not_intro: expected `p ==> F`"));
        }
        let p = p.clone();
        let unfold = self.unfold_unop_(ctx, &self.not_def.clone(), &p)?;
        let un_sym = sym(ctx, unfold)?;
        ctx.thm_bool_eq(th, un_sym)
    }

    /// `not_elim (A |- ~p)` is `A |- p ==> F`.
    pub fn not_elim(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let p = dest_neg(th.concl())
            .ok_or_else(|| Error::new("not_elim: expected a negation"))?;
        let p = p.clone();
        let unfold = self.unfold_unop_(ctx, &self.not_def.clone(), &p)?;
        ctx.thm_bool_eq(th, unfold)
    }

    /// `eqf_intro (A |- ~p)` is `A |- p = F`.
    pub fn eqf_intro(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let p = dest_neg(th.concl())
            .ok_or_else(|| Error::new("eqf_intro: expected a negation"))?
            .clone();
        let fwd = self.not_elim(ctx, th)?; // p ==> F
        let bwd = {
            let f = mk_false(ctx)?;
            let a = ctx.thm_assume(f.clone())?;
            let c = self.contr(ctx, &p, a)?;
            self.disch(ctx, &f, c)? // |- F ==> p
        };
        self.imp_antisym(ctx, fwd, bwd)
    }

    /// `eqf_elim (A |- p = F)` is `A |- ~p`.
    pub fn eqf_elim(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let (p, f) = th
            .concl()
            .unfold_eq()
            .ok_or_else(|| Error::new("eqf_elim: expected an equation"))?;
        if !is_false(f) {
            return Err(Error::new("eqf_elim: expected `p = F`"));
        }
        let p = p.clone();
        let a = ctx.thm_assume(p.clone())?;
        let down = ctx.thm_bool_eq(a, th)?; // {p} |- F
        let d = self.disch(ctx, &p, down)?;
        self.not_intro(ctx, d)
    }

    /// `ccontr t (A, ~t |- F)` is `A |- t`: classical contradiction.
    pub fn ccontr(&self, ctx: &mut Ctx, t: &Term, th: Thm) -> Result<Thm> {
        let em_t = self.spec(ctx, t, self.em.clone())?; // |- t \/ ~t
        let b1 = ctx.thm_assume(t.clone())?;
        let b2 = self.contr(ctx, t, th)?; // A, ~t |- t
        self.disj_cases(ctx, em_t, b1, b2)
    }

    /// From `A |- ~p ==> p`, conclude `A |- p`.
    pub fn from_neg_imp(&self, ctx: &mut Ctx, th: Thm) -> Result<Thm> {
        let (np, p) = dest_imp(th.concl())
            .ok_or_else(|| Error::new("from_neg_imp: expected an implication"))?;
        let p = p.clone();
        if dest_neg(np).map(|inner| alpha_eq(inner, &p)) != Some(true) {
            return Err(Error::new("from_neg_imp: expected `~p ==> p`"));
        }
        let np = np.clone();
        let em_p = self.spec(ctx, &p, self.em.clone())?; // |- p \/ ~p
        let b1 = ctx.thm_assume(p.clone())?;
        let b2 = {
            let a = ctx.thm_assume(np)?;
            self.mp(ctx, th, a)? // A, {~p} |- p
        };
        self.disj_cases(ctx, em_p, b1, b2)
    }

    /// `|- (t = t) = T`.
    pub fn refl_clause(&self, ctx: &mut Ctx, t: &Term) -> Result<Thm> {
        let r = ctx.thm_refl(t.clone());
        self.eqt_intro(ctx, r)
    }

    /// `|- (F ==> p) = T`.
    pub fn imp_false_clause(&self, ctx: &mut Ctx, p: &Term) -> Result<Thm> {
        let f = mk_false(ctx)?;
        let a = ctx.thm_assume(f.clone())?;
        let c = self.contr(ctx, p, a)?;
        let d = self.disch(ctx, &f, c)?;
        self.eqt_intro(ctx, d)
    }

    /// Instantiate a (possibly universally quantified) implication so
    /// its antecedent matches `th`'s conclusion, then apply modus
    /// ponens.
    pub fn match_mp(&self, ctx: &mut Ctx, th_imp: Thm, th: Thm) -> Result<Thm> {
        let th_i = self.spec_all(ctx, th_imp)?;
        let (ante, _) = dest_imp(th_i.concl())
            .ok_or_else(|| Error::no_apply("match_mp: not an implication"))?;
        let m = crate::algo::unif::term_match(ante, th.concl())
            .ok_or_else(|| Error::no_apply("match_mp: antecedent does not match"))?;
        let th_m = m.apply(ctx, &th_i)?;
        self.mp(ctx, th_m, th)
    }

    /// Instantiate a (possibly universally quantified) theorem so its
    /// body matches `target`.
    pub fn part_match(&self, ctx: &mut Ctx, th: Thm, target: &Term) -> Result<Thm> {
        let th_i = self.spec_all(ctx, th)?;
        let m = crate::algo::unif::term_match(th_i.concl(), target)
            .ok_or_else(|| Error::no_apply("part_match: conclusion does not match"))?;
        let th_m = m.apply(ctx, &th_i)?;
        if !alpha_eq(th_m.concl(), target) {
            return Err(errorstr!(
                "part_match: instantiated to {:?}, expected {:?}",
                th_m.concl(),
                target
            ));
        }
        Ok(th_m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn setup() -> (Ctx, Logic) {
        let mut ctx = Ctx::new();
        let lg = Logic::install(&mut ctx).unwrap();
        (ctx, lg)
    }

    #[test]
    fn test_truth() {
        let (_ctx, lg) = setup();
        assert!(is_true(lg.truth().concl()));
        assert!(lg.truth().hyps().is_empty());
    }

    #[test]
    fn test_conj_roundtrip() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b.clone());
        let q = ctx.mk_var_str("q", b);
        let thp = ctx.thm_assume(p.clone()).unwrap();
        let thq = ctx.thm_assume(q.clone()).unwrap();
        let c = lg.conj(&mut ctx, thp, thq).unwrap();
        assert_eq!(c.concl(), &mk_conj(&ctx, p.clone(), q.clone()).unwrap());
        assert_eq!(c.hyps().len(), 2);
        let c1 = lg.conjunct1(&mut ctx, c.clone()).unwrap();
        let c2 = lg.conjunct2(&mut ctx, c).unwrap();
        assert_eq!(c1.concl(), &p);
        assert_eq!(c2.concl(), &q);
    }

    #[test]
    fn test_mp_disch() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b.clone());
        let q = ctx.mk_var_str("q", b);
        // from {p, q} |- q, discharge p: {q} |- p ==> q; then MP with p
        let thq = ctx.thm_assume(q.clone()).unwrap();
        let d = lg.disch(&mut ctx, &p, thq).unwrap();
        assert_eq!(d.concl(), &mk_imp(&ctx, p.clone(), q.clone()).unwrap());
        let thp = ctx.thm_assume(p.clone()).unwrap();
        let m = lg.mp(&mut ctx, d, thp).unwrap();
        assert_eq!(m.concl(), &q);
        assert_eq!(m.hyps().len(), 2); // {p, q}
    }

    #[test]
    fn test_spec_gen() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        // |- !x. x = x, then specialize to an arbitrary `c`
        let refl = {
            let e = ctx.mk_var(x.clone());
            ctx.thm_refl(e)
        };
        let g = lg.gen(&mut ctx, &x, refl).unwrap();
        assert!(dest_forall(g.concl()).is_some());
        let c = ctx.mk_var_str("c", b);
        let s = lg.spec(&mut ctx, &c, g).unwrap();
        let (l, r) = s.concl().unfold_eq().unwrap();
        assert_eq!(l, &c);
        assert_eq!(r, &c);
    }

    #[test]
    fn test_gen_var_in_hyp_fails() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b);
        let e = ctx.mk_var(x.clone());
        let th = {
            let eq = ctx.mk_eq_app(e.clone(), e.clone()).unwrap();
            let a = ctx.thm_assume(eq).unwrap();
            a
        };
        // x is free in the hypothesis `x = x`
        assert!(lg.gen(&mut ctx, &x, th).is_err());
    }

    #[test]
    fn test_disj() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b.clone());
        let q = ctx.mk_var_str("q", b);
        let thp = ctx.thm_assume(p.clone()).unwrap();
        let d = lg.disj1(&mut ctx, thp, q.clone()).unwrap();
        assert_eq!(d.concl(), &mk_disj(&ctx, p.clone(), q.clone()).unwrap());
        // case split back to p \/ q… prove r = p \/ q from both sides
        let r = mk_disj(&ctx, p.clone(), q.clone()).unwrap();
        let th1 = {
            let a = ctx.thm_assume(p.clone()).unwrap();
            lg.disj1(&mut ctx, a, q.clone()).unwrap()
        };
        let th2 = {
            let a = ctx.thm_assume(q.clone()).unwrap();
            lg.disj2(&mut ctx, p.clone(), a).unwrap()
        };
        let back = lg.disj_cases(&mut ctx, d, th1, th2).unwrap();
        assert_eq!(back.concl(), &r);
    }

    #[test]
    fn test_exists_choose() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        // witness: ?x. x = c, from |- c = c
        let c = ctx.mk_var_str("c", b.clone());
        let x = Var::from_str("x", b.clone());
        let etm = {
            let e = ctx.mk_var(x.clone());
            let eq = ctx.mk_eq_app(e, c.clone()).unwrap();
            mk_exists(&ctx, x.clone(), eq).unwrap()
        };
        let refl_c = ctx.thm_refl(c.clone());
        let ex = lg.exists_intro(&mut ctx, &etm, &c, refl_c).unwrap();
        assert_eq!(ex.concl(), &etm);
        assert!(ex.hyps().is_empty());

        // choose a fresh v with v = c, conclude `c = c`
        let v = Var::from_str("v", b.clone());
        let target = ctx.mk_eq_app(c.clone(), c.clone()).unwrap();
        let th_body = {
            // {v = c} |- c = c
            let veq = {
                let ev = ctx.mk_var(v.clone());
                ctx.mk_eq_app(ev, c.clone()).unwrap()
            };
            let r = ctx.thm_refl(c.clone());
            let d = lg.disch(&mut ctx, &veq, r).unwrap();
            let d2 = {
                let a = ctx.thm_assume(veq).unwrap();
                lg.mp(&mut ctx, d, a).unwrap()
            };
            d2
        };
        let out = lg.choose(&mut ctx, &v, ex, th_body).unwrap();
        assert_eq!(out.concl(), &target);
        assert!(out.hyps().is_empty());
    }

    #[test]
    fn test_contr_ccontr() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let t = ctx.mk_var_str("t", b.clone());
        let f = mk_false(&ctx).unwrap();
        let thf = ctx.thm_assume(f.clone()).unwrap();
        let c = lg.contr(&mut ctx, &t, thf).unwrap();
        assert_eq!(c.concl(), &t);

        // ccontr: from {~t} |- F conclude |- t with the ~t hyp gone
        let nt = mk_not(&ctx, t.clone()).unwrap();
        let a_nt = ctx.thm_assume(nt.clone()).unwrap();
        let ne = lg.not_elim(&mut ctx, a_nt).unwrap(); // {~t} |- t ==> F
        let a_t = ctx.thm_assume(t.clone()).unwrap();
        let ff = lg.mp(&mut ctx, ne, a_t).unwrap(); // {t, ~t} |- F
        let out = lg.ccontr(&mut ctx, &t, ff).unwrap();
        assert_eq!(out.concl(), &t);
        // only the `t` hypothesis may remain
        assert!(out.hyps().iter().all(|h| alpha_eq(h, &t)));
    }

    #[test]
    fn test_eqf() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b);
        let np = mk_not(&ctx, p.clone()).unwrap();
        let a = ctx.thm_assume(np.clone()).unwrap();
        let eqf = lg.eqf_intro(&mut ctx, a).unwrap();
        let (l, r) = eqf.concl().unfold_eq().unwrap();
        assert_eq!(l, &p);
        assert!(is_false(r));
        let back = lg.eqf_elim(&mut ctx, eqf).unwrap();
        assert_eq!(back.concl(), &np);
    }

    #[test]
    fn test_derived_equals_primitive_composition() {
        // metamorphic: the derived `sym` must be reproducible by hand
        // with only primitive calls
        let (mut ctx, _lg) = setup();
        let b = ctx.mk_bool();
        let u = ctx.mk_var_str("u", b.clone());
        let v = ctx.mk_var_str("v", b);
        let eq = ctx.mk_eq_app(u.clone(), v.clone()).unwrap();
        let th = ctx.thm_assume(eq).unwrap();
        let via_derived = sym(&mut ctx, th.clone()).unwrap();
        let by_hand = {
            let e = ctx.mk_eq(u.ty().clone());
            let th_eq = ctx.thm_refl(e);
            let th1 = ctx.thm_congr(th_eq, th).unwrap();
            let refl_u = ctx.thm_refl(u.clone());
            let th2 = ctx.thm_congr(th1, refl_u.clone()).unwrap();
            ctx.thm_bool_eq(refl_u, th2).unwrap()
        };
        assert_eq!(via_derived.concl(), by_hand.concl());
        assert_eq!(via_derived.hyps(), by_hand.hyps());
    }

    #[test]
    fn test_match_mp() {
        let (mut ctx, lg) = setup();
        let b = ctx.mk_bool();
        // |- !x. x ==> x, applied to |- c (assumed)
        let x = Var::from_str("x", b.clone());
        let imp = {
            let ex = ctx.mk_var(x.clone());
            let ax = ctx.thm_assume(ex.clone()).unwrap();
            let d = lg.disch(&mut ctx, &ex, ax).unwrap();
            lg.gen(&mut ctx, &x, d).unwrap()
        };
        let c = ctx.mk_var_str("c", b);
        let thc = ctx.thm_assume(c.clone()).unwrap();
        let out = lg.match_mp(&mut ctx, imp, thc).unwrap();
        assert_eq!(out.concl(), &c);
    }
}
