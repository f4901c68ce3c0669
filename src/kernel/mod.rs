//! Kernel of trust: terms and theorems.

pub type Ref<T> = std::rc::Rc<T>;

pub use crate::error::{Error, Result};

pub mod ctx;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod thm;
pub mod ty;

pub use ctx::Ctx;
pub use subst::{Subst, TySubst};
pub use symbol::Symbol;
pub use term::{alpha_cmp, alpha_eq, alpha_hash, free_vars_iter, Term, TermView, Var, Vars};
pub use thm::Thm;
pub use ty::{type_match, Type, TypeView, Types};
pub use TermView::*;

#[cfg(test)]
mod test {
    use super::*;
    use std::cmp::Ordering;

    fn b2b(ctx: &Ctx) -> Type {
        let b = ctx.mk_bool();
        ctx.mk_arrow(b.clone(), b)
    }

    #[test]
    fn test_apply() {
        let ctx = Ctx::new();
        let p = ctx.mk_var_str("p", b2b(&ctx));
        let a = ctx.mk_var_str("a", ctx.mk_bool());
        let pa = ctx.mk_app(p, a).unwrap();
        assert!(matches!(pa.view(), EApp(..)));
        assert!(pa.ty().is_bool());
    }

    #[test]
    fn test_apply_ill_typed() {
        let ctx = Ctx::new();
        let p = ctx.mk_var_str("p", b2b(&ctx));
        let q = ctx.mk_var_str("q", b2b(&ctx));
        assert!(ctx.mk_app(p.clone(), q).is_err());
        let a = ctx.mk_var_str("a", ctx.mk_bool());
        assert!(ctx.mk_app(a, p).is_err());
    }

    #[test]
    fn test_lambda() {
        let ctx = Ctx::new();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", b2b(&ctx));
        let x = Var::from_str("x", b.clone());
        let ex = ctx.mk_var(x.clone());
        let body = ctx.mk_app(p, ex).unwrap();
        let f = ctx.mk_lambda(x, body).unwrap();
        assert!(matches!(f.view(), ELambda(..)));
        let (dom, rng) = f.ty().as_fun().unwrap();
        assert!(dom.is_bool());
        assert!(rng.is_bool());
    }

    #[test]
    fn test_assume() {
        let mut ctx = Ctx::new();
        let p = ctx.mk_var_str("p", b2b(&ctx));
        let a = ctx.mk_var_str("a", ctx.mk_bool());
        let pa = ctx.mk_app(p, a).unwrap();
        let th = ctx.thm_assume(pa.clone()).unwrap();
        assert_eq!(th.concl(), &pa);
        assert_eq!(th.hyps().len(), 1);
    }

    #[test]
    fn test_assume_non_bool() {
        let mut ctx = Ctx::new();
        let p = ctx.mk_var_str("p", b2b(&ctx));
        assert!(ctx.thm_assume(p).is_err());
    }

    #[test]
    fn test_refl_const() {
        let mut ctx = Ctx::new();
        ctx.new_const("c", ctx.mk_bool()).unwrap();
        let c = ctx.mk_const("c", ctx.mk_bool()).unwrap();
        let th = ctx.thm_refl(c.clone());
        let (a, b) = th.concl().unfold_eq().unwrap();
        assert_eq!(a, &c);
        assert_eq!(b, &c);
        assert!(th.hyps().is_empty());
    }

    #[test]
    fn test_beta() {
        // `(\x. x) T0` reduces to `T0` for an opaque constant `T0`
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        ctx.new_const("T0", b.clone()).unwrap();
        let t0 = ctx.mk_const("T0", b.clone()).unwrap();
        let x = Var::from_str("x", b.clone());
        let id = {
            let ex = ctx.mk_var(x.clone());
            ctx.mk_lambda(x, ex).unwrap()
        };
        let redex = ctx.mk_app(id, t0.clone()).unwrap();
        let th = ctx.thm_beta_conv(&redex).unwrap();
        let (l, r) = th.concl().unfold_eq().unwrap();
        assert_eq!(l, &redex);
        assert_eq!(r, &t0);
    }

    #[test]
    fn test_trans_alpha_middle() {
        // transitivity accepts alpha-equivalent (not equal) middles,
        // which is what makes `trans (refl t) (refl u)` an alpha step
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let mk_id = |ctx: &Ctx, n: &str| {
            let v = Var::from_str(n, b.clone());
            let e = ctx.mk_var(v.clone());
            ctx.mk_lambda(v, e).unwrap()
        };
        let t1 = mk_id(&ctx, "x");
        let t2 = mk_id(&ctx, "y");
        let th1 = ctx.thm_refl(t1.clone());
        let th2 = ctx.thm_refl(t2.clone());
        let th = ctx.thm_trans(th1, th2).unwrap();
        let (l, r) = th.concl().unfold_eq().unwrap();
        assert_eq!(l, &t1);
        assert_eq!(r, &t2);
    }

    #[test]
    fn test_congr_ill_typed_fails() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let f = ctx.mk_var_str("f", b2b(&ctx));
        let g = ctx.mk_var_str("g", b2b(&ctx));
        let x = ctx.mk_var_str("x", b.clone());
        let thf = {
            let e = ctx.mk_eq_app(f.clone(), g.clone()).unwrap();
            ctx.thm_assume(e).unwrap()
        };
        // (f = g) applied to (f = g): argument is not a boolean function
        let thx = {
            let e = ctx.mk_eq_app(f.clone(), g.clone()).unwrap();
            ctx.thm_assume(e).unwrap()
        };
        let th_ok = {
            let e = ctx.mk_eq_app(x.clone(), x.clone()).unwrap();
            ctx.thm_assume(e).unwrap()
        };
        assert!(ctx.thm_congr(thf.clone(), th_ok).is_ok());
        assert!(ctx.thm_congr(thf.clone(), thx).is_err());
        // non-equational inputs must fail, never fabricate
        let not_eq = ctx.mk_var_str("a", b.clone());
        let th_a = ctx.thm_assume(not_eq).unwrap();
        assert!(ctx.thm_congr(th_a.clone(), thf).is_err());
    }

    #[test]
    fn test_abs_var_in_hyp_fails() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let ex = ctx.mk_var(x.clone());
        let e = ctx.mk_eq_app(ex.clone(), ex.clone()).unwrap();
        let th = ctx.thm_assume(e).unwrap();
        assert!(ctx.thm_abs(&x, th.clone()).is_err());
        let y = Var::from_str("y", b.clone());
        assert!(ctx.thm_abs(&y, th).is_ok());
    }

    #[test]
    fn test_capture_avoiding_subst() {
        // substituting y for x in `\y. x` must rename the bound y:
        // the result is alpha-equivalent to `\y'. y`, NOT `\y. y`
        let ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let y = Var::from_str("y", b.clone());
        let lam = {
            let ex = ctx.mk_var(x.clone());
            ctx.mk_lambda(y.clone(), ex).unwrap()
        };
        let mut s = Subst::new();
        s.add_binding(x.clone(), ctx.mk_var(y.clone()));
        let r = ctx.subst(&lam, &s).unwrap();
        let (v, body) = r.as_lambda().unwrap();
        assert_ne!(v, &y, "the binder must have been renamed");
        assert_eq!(body.as_var(), Some(&y), "y must still be free in the body");
        // and the result must not be the constant-function-turned-identity
        let id_y = {
            let ey = ctx.mk_var(y.clone());
            ctx.mk_lambda(y.clone(), ey).unwrap()
        };
        assert!(!alpha_eq(&r, &id_y));
    }

    #[test]
    fn test_inst_type_renames_on_clash() {
        // in `\x:a. x:a = x:bool`... build `\x:a. f (x:a) (x:bool)` and
        // instantiate a := bool; the binder must be renamed so the free
        // `x:bool` is not captured.
        let ctx = Ctx::new();
        let b = ctx.mk_bool();
        let a = ctx.mk_ty_var("a");
        let xa = Var::from_str("x", a.clone());
        let xb = Var::from_str("x", b.clone());
        let f_ty = {
            let t = ctx.mk_arrow(b.clone(), b.clone());
            ctx.mk_arrow(a.clone(), t)
        };
        let f = ctx.mk_var_str("f", f_ty);
        let body = {
            let e1 = ctx.mk_app(f, ctx.mk_var(xa.clone())).unwrap();
            ctx.mk_app(e1, ctx.mk_var(xb.clone())).unwrap()
        };
        let lam = ctx.mk_lambda(xa.clone(), body).unwrap();
        let mut s = TySubst::new();
        s.add_binding(Symbol::from_str("a"), b.clone());
        let r = ctx.inst_type(&lam, &s);
        let (v, body2) = r.as_lambda().unwrap();
        assert_ne!(v.name.name(), "x", "binder must be renamed");
        assert!(body2.var_free_in(&xb), "x:bool must remain free");
    }

    #[test]
    fn test_new_basic_definition() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        // c2 = (\x:bool. x)
        let x = Var::from_str("x", b.clone());
        let rhs = {
            let e = ctx.mk_var(x.clone());
            ctx.mk_lambda(x, e).unwrap()
        };
        let v = ctx.mk_var_str("c2", rhs.ty().clone());
        let eqn = ctx.mk_eq_app(v, rhs.clone()).unwrap();
        let (th, c) = ctx.thm_new_basic_definition(eqn).unwrap();
        assert!(th.hyps().is_empty());
        let (l, r) = th.concl().unfold_eq().unwrap();
        assert_eq!(l, &c);
        assert_eq!(r, &rhs);
        // the signature is monotonic: no redefinition
        assert!(ctx.new_const("c2", b).is_err());
    }

    #[test]
    fn test_definition_open_rhs_fails() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let y = ctx.mk_var_str("y", b.clone());
        let v = ctx.mk_var_str("c3", b);
        let eqn = ctx.mk_eq_app(v, y).unwrap();
        assert!(ctx.thm_new_basic_definition(eqn).is_err());
    }

    #[test]
    fn test_axiom_registry() {
        let mut ctx = Ctx::new();
        let a = ctx.mk_var_str("a", ctx.mk_bool());
        let e = ctx.mk_eq_app(a.clone(), a).unwrap();
        let th = ctx.thm_axiom("my_axiom", e).unwrap();
        assert!(th.hyps().is_empty());
        let axs: Vec<_> = ctx.axioms().collect();
        assert_eq!(axs.len(), 1);
        assert_eq!(axs[0].0.name(), "my_axiom");
        ctx.pledge_no_new_axiom();
        let b = ctx.mk_var_str("b", ctx.mk_bool());
        let e2 = ctx.mk_eq_app(b.clone(), b).unwrap();
        assert!(ctx.thm_axiom("late", e2).is_err());
    }

    #[test]
    fn test_instantiate() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let x = Var::from_str("x", b.clone());
        let e = {
            let ex = ctx.mk_var(x.clone());
            ctx.mk_eq_app(ex.clone(), ex).unwrap()
        };
        let th = ctx.thm_assume(e).unwrap();
        let y = ctx.mk_var_str("y", b);
        let mut s = Subst::new();
        s.add_binding(x, y.clone());
        let th2 = ctx.thm_instantiate(th, &s).unwrap();
        let (l, r) = th2.concl().unfold_eq().unwrap();
        assert_eq!(l, &y);
        assert_eq!(r, &y);
        // the hypothesis was instantiated too
        assert_eq!(th2.hyps().len(), 1);
        assert_eq!(&th2.hyps()[0], th2.concl());
    }

    #[test]
    fn test_hyp_merge_dedups_alpha() {
        let mut ctx = Ctx::new();
        let b = ctx.mk_bool();
        let p = ctx.mk_var_str("p", ctx.mk_arrow(ctx.mk_arrow(b.clone(), b.clone()), b.clone()));
        let mk = |ctx: &mut Ctx, n: &str| {
            let v = Var::from_str(n, b.clone());
            let ev = ctx.mk_var(v.clone());
            let id = ctx.mk_lambda(v, ev).unwrap();
            let e = ctx.mk_app(p.clone(), id).unwrap();
            ctx.thm_assume(e).unwrap()
        };
        // `p (\x. x)` and `p (\y. y)` as hypotheses: each is discharged
        // by the other's conclusion up to alpha
        let th1 = mk(&mut ctx, "x");
        let th2 = mk(&mut ctx, "y");
        assert_eq!(alpha_cmp(th1.concl(), th2.concl()), Ordering::Equal);
        let c = ctx.thm_bool_eq_intro(th1, th2).unwrap();
        assert!(c.hyps().is_empty());
        assert!(c.concl().unfold_eq().is_some());
    }
}
