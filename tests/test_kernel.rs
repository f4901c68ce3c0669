use keel::algo::conv::{BetaConv, Converter, OnceDepthConv, RepeatConv};
use keel::algo::meson::meson;
use keel::algo::recdef::{justify_recursion, ClauseSpec, DatatypeFacts, RecEnv};
use keel::algo::tactic::{prove, AssumptionTac, ConjTac, DischTac, Then};
use keel::kernel::{alpha_eq, Ctx, Symbol, Var};
use keel::logic::{self, Logic};

#[test]
fn test_refl_on_constant() {
    let mut ctx = Ctx::new();
    ctx.new_const("c", ctx.mk_bool()).unwrap();
    let c = ctx.mk_const("c", ctx.mk_bool()).unwrap();
    let th = ctx.thm_refl(c.clone());
    let (l, r) = th.concl().unfold_eq().unwrap();
    assert_eq!(l, &c);
    assert_eq!(r, &c);
    assert!(th.hyps().is_empty());
}

#[test]
fn test_beta_on_identity() {
    // (\x. x) T  reduces to  T
    let mut ctx = Ctx::new();
    let _lg = Logic::install(&mut ctx).unwrap();
    let t = logic::mk_true(&ctx).unwrap();
    let b = ctx.mk_bool();
    let x = Var::from_str("x", b);
    let id = {
        let e = ctx.mk_var(x.clone());
        ctx.mk_lambda(x, e).unwrap()
    };
    let redex = ctx.mk_app(id, t.clone()).unwrap();
    let th = ctx.thm_beta_conv(&redex).unwrap();
    let (l, r) = th.concl().unfold_eq().unwrap();
    assert_eq!(l, &redex);
    assert_eq!(r, &t);
}

#[test]
fn test_prove_conj_commutes() {
    // |- p /\ q ==> q /\ p through the goal engine
    let mut ctx = Ctx::new();
    let lg = Logic::install(&mut ctx).unwrap();
    let b = ctx.mk_bool();
    let p = ctx.mk_var_str("p", b.clone());
    let q = ctx.mk_var_str("q", b);
    let pq = logic::mk_conj(&ctx, p.clone(), q.clone()).unwrap();
    let qp = logic::mk_conj(&ctx, q, p).unwrap();
    let goal = logic::mk_imp(&ctx, pq, qp).unwrap();

    // after discharge, split both the hypothesis and the goal
    #[derive(Debug)]
    struct SplitHyp(Logic);
    impl keel::Tactic for SplitHyp {
        fn apply(
            &self,
            ctx: &mut Ctx,
            goal: &keel::Goal,
        ) -> keel::Result<keel::Progress> {
            let th = goal.hyps.last().map(|(_, th)| th.clone()).unwrap();
            keel::algo::tactic::ConjCasesTac(self.0.clone(), th).apply(ctx, goal)
        }
    }
    use keel::Tactic as _;

    let tac = Then(
        DischTac(lg.clone()),
        Then(SplitHyp(lg.clone()), Then(ConjTac(lg.clone()), AssumptionTac)),
    );
    let th = prove(&mut ctx, &goal, &tac).unwrap();
    assert_eq!(th.concl(), &goal);
    assert!(th.hyps().is_empty());
}

#[test]
fn test_meson_le_transitivity() {
    // the classic: reflexivity and transitivity clauses prove the
    // transitivity statement itself with a tiny bound
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ctx = Ctx::new();
    let lg = Logic::install(&mut ctx).unwrap();
    ctx.new_ty_const("num", 0).unwrap();
    let num = ctx.mk_ty_app("num", vec![]).unwrap();
    let le_ty = ctx.mk_arrow(num.clone(), ctx.mk_arrow(num.clone(), ctx.mk_bool()));
    ctx.new_const("<=", le_ty.clone()).unwrap();
    let le = ctx.mk_const("<=", le_ty).unwrap();

    let x = Var::from_str("x", num.clone());
    let y = Var::from_str("y", num.clone());
    let z = Var::from_str("z", num);
    let le_app = |ctx: &Ctx, a: &Var, b: &Var| {
        let t = ctx.mk_app(le.clone(), ctx.mk_var(a.clone())).unwrap();
        ctx.mk_app(t, ctx.mk_var(b.clone())).unwrap()
    };

    let refl_thm = {
        let t = le_app(&ctx, &x, &x);
        let t = logic::mk_forall(&ctx, x.clone(), t).unwrap();
        ctx.thm_axiom("le_refl", t).unwrap()
    };
    let trans_t = {
        let ante = logic::mk_conj(&ctx, le_app(&ctx, &x, &y), le_app(&ctx, &y, &z)).unwrap();
        let imp = logic::mk_imp(&ctx, ante, le_app(&ctx, &x, &z)).unwrap();
        logic::mk_forall_l(&ctx, &[x, y, z], imp).unwrap()
    };
    let trans_thm = ctx.thm_axiom("le_trans", trans_t.clone()).unwrap();

    let tac = meson(&lg, vec![refl_thm, trans_thm], 0, 10, 1);
    let th = prove(&mut ctx, &trans_t, &tac).unwrap();
    assert_eq!(th.concl(), &trans_t);
    assert!(th.hyps().is_empty());
}

#[test]
fn test_factorial_admissibility() {
    // f 0 = SUC 0 ; f (SUC n) = n * f n  is admissible and yields an
    // existence theorem
    let mut ctx = Ctx::new();
    let lg = Logic::install(&mut ctx).unwrap();
    ctx.new_ty_const("num", 0).unwrap();
    let num = ctx.mk_ty_app("num", vec![]).unwrap();
    let n2n = ctx.mk_arrow(num.clone(), num.clone());
    let n2n2n = ctx.mk_arrow(num.clone(), n2n.clone());
    ctx.new_const("0", num.clone()).unwrap();
    ctx.new_const("SUC", n2n.clone()).unwrap();
    ctx.new_const("*", n2n2n.clone()).unwrap();
    let zero = ctx.mk_const("0", num.clone()).unwrap();
    let suc = ctx.mk_const("SUC", n2n.clone()).unwrap();
    let mul = ctx.mk_const("*", n2n2n).unwrap();

    let n = Var::from_str("n", num.clone());
    let m = Var::from_str("m", num.clone());

    let distinct = {
        let sn = ctx.mk_app(suc.clone(), ctx.mk_var(n.clone())).unwrap();
        let eq = ctx.mk_eq_app(zero.clone(), sn).unwrap();
        let t = logic::mk_forall(&ctx, n.clone(), logic::mk_not(&ctx, eq).unwrap()).unwrap();
        ctx.thm_axiom("num_distinct", t).unwrap()
    };
    let inject = {
        let sm = ctx.mk_app(suc.clone(), ctx.mk_var(m.clone())).unwrap();
        let sn = ctx.mk_app(suc.clone(), ctx.mk_var(n.clone())).unwrap();
        let outer = {
            let e1 = ctx.mk_eq_app(sm, sn).unwrap();
            let e2 = ctx
                .mk_eq_app(ctx.mk_var(m.clone()), ctx.mk_var(n.clone()))
                .unwrap();
            ctx.mk_eq_app(e1, e2).unwrap()
        };
        let t = logic::mk_forall_l(&ctx, &[m, n.clone()], outer).unwrap();
        ctx.thm_axiom("num_inject", t).unwrap()
    };
    let recursion = {
        let a = ctx.mk_ty_var("Z");
        let e_v = Var::from_str("e", a.clone());
        let f_v = Var::from_str("f", {
            let t = ctx.mk_arrow(num.clone(), a.clone());
            ctx.mk_arrow(a.clone(), t)
        });
        let fn_v = Var::from_str("fn", ctx.mk_arrow(num.clone(), a));
        let c1 = {
            let l = ctx.mk_app(ctx.mk_var(fn_v.clone()), zero.clone()).unwrap();
            ctx.mk_eq_app(l, ctx.mk_var(e_v.clone())).unwrap()
        };
        let c2 = {
            let sn = ctx.mk_app(suc.clone(), ctx.mk_var(n.clone())).unwrap();
            let l = ctx.mk_app(ctx.mk_var(fn_v.clone()), sn).unwrap();
            let fr = ctx
                .mk_app(ctx.mk_var(fn_v.clone()), ctx.mk_var(n.clone()))
                .unwrap();
            let r = ctx
                .mk_app_l(ctx.mk_var(f_v.clone()), &[fr, ctx.mk_var(n.clone())])
                .unwrap();
            let eq = ctx.mk_eq_app(l, r).unwrap();
            logic::mk_forall(&ctx, n.clone(), eq).unwrap()
        };
        let body = logic::mk_conj(&ctx, c1, c2).unwrap();
        let ex = logic::mk_exists(&ctx, fn_v, body).unwrap();
        let t = logic::mk_forall_l(&ctx, &[e_v, f_v], ex).unwrap();
        ctx.thm_axiom("num_recursion", t).unwrap()
    };

    let env = RecEnv {
        datatypes: vec![DatatypeFacts {
            ty_name: Symbol::from_str("num"),
            constructors: vec![zero.clone(), suc.clone()],
            distinctness: vec![distinct],
            injectivity: vec![inject],
            recursion,
        }],
        ..RecEnv::default()
    };

    let f = Var::from_str("fact", ctx.mk_arrow(num.clone(), num));
    let one = ctx.mk_app(suc.clone(), zero.clone()).unwrap();
    let c1 = {
        let l = ctx.mk_app(ctx.mk_var(f.clone()), zero).unwrap();
        (l, one)
    };
    let c2 = {
        let sn = ctx.mk_app(suc, ctx.mk_var(n.clone())).unwrap();
        let l = ctx.mk_app(ctx.mk_var(f.clone()), sn).unwrap();
        let fr = ctx.mk_app(ctx.mk_var(f.clone()), ctx.mk_var(n.clone())).unwrap();
        let r = ctx.mk_app_l(mul, &[ctx.mk_var(n), fr]).unwrap();
        (l, r)
    };
    let spec = ClauseSpec {
        f,
        clauses: vec![c1, c2],
        order: None,
        wf_thm: None,
    };
    let j = justify_recursion(&mut ctx, &lg, &env, &spec).unwrap();
    assert!(j.obligations.is_empty());
    assert!(j.thm.hyps().is_empty());
    let (v, body) = logic::dest_exists(j.thm.concl()).unwrap();
    assert_eq!(v.name.name(), "fact");
    let (base, step) = logic::dest_conj(body).unwrap();
    assert!(base.unfold_eq().is_some());
    assert!(logic::dest_forall(step).is_some());
}

#[test]
fn test_conversion_left_side_contract() {
    // for every successful conversion, the equation's left side is
    // alpha-equivalent to the input
    let mut ctx = Ctx::new();
    let b = ctx.mk_bool();
    let a = ctx.mk_var_str("a", b.clone());
    let id = {
        let v = Var::from_str("v", b);
        let e = ctx.mk_var(v.clone());
        ctx.mk_lambda(v, e).unwrap()
    };
    let e = ctx.mk_app(id, a.clone()).unwrap();
    let c = RepeatConv(OnceDepthConv(BetaConv));
    let th = c.try_conv(&mut ctx, &e).unwrap().unwrap();
    let (l, r) = th.concl().unfold_eq().unwrap();
    assert!(alpha_eq(l, &e));
    assert_eq!(r, &a);
    // and repeating on the output changes nothing
    assert!(c.try_conv(&mut ctx, r).unwrap().is_none());
}

#[test]
fn test_meson_output_reproducible_by_kernel() {
    // re-derive a MESON result by hand through the kernel surface and
    // compare conclusions
    let mut ctx = Ctx::new();
    let lg = Logic::install(&mut ctx).unwrap();
    let b = ctx.mk_bool();
    ctx.new_const("p1", b.clone()).unwrap();
    let p = ctx.mk_const("p1", b).unwrap();
    let goal = logic::mk_imp(&ctx, p.clone(), p.clone()).unwrap();

    let tac = meson(&lg, vec![], 0, 5, 1);
    let th_meson = prove(&mut ctx, &goal, &tac).unwrap();

    let th_hand = {
        let a = ctx.thm_assume(p.clone()).unwrap();
        lg.disch(&mut ctx, &p, a).unwrap()
    };
    assert_eq!(th_meson.concl(), th_hand.concl());
    assert!(th_meson.hyps().is_empty());
}
