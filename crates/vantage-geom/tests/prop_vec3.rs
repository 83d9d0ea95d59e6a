use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;
use vantage_geom::Vec3;

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vapprox(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx(a.x, b.x, eps) && approx(a.y, b.y, eps) && approx(a.z, b.z, eps)
}

fn approx_abs_rel(a: f32, b: f32, atol: f32, rtol: f32) -> bool {
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs());
    diff <= atol + rtol * scale
}

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e6)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #[test]
    fn add_commutative(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(vapprox(a + b, b + a, 1e-5));
    }

    #[test]
    fn dot_distributes_over_add(a in arb_vec3(), b in arb_vec3(), c in arb_vec3()) {
        let left = (a + b).dot(c);
        let right = a.dot(c) + b.dot(c);
        prop_assert!(approx_abs_rel(left, right, 1e-6, 1e-5));
    }

    #[test]
    fn cross_is_orthogonal(a in arb_vec3(), b in arb_vec3()) {
        let c = a.cross(b);
        let scale = (a.length() * c.length()).max(b.length() * c.length()).max(1.0);
        prop_assert!(a.dot(c).abs() <= 1e-6 + 1e-5 * scale);
        prop_assert!(b.dot(c).abs() <= 1e-6 + 1e-5 * scale);
    }

    #[test]
    fn distance_sq_symmetric(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(approx_abs_rel(a.distance_sq(b), b.distance_sq(a), 1e-6, 1e-5));
    }

    #[test]
    fn neg_negates_components(a in arb_vec3()) {
        prop_assert!(vapprox(-a, a * -1.0, 0.0));
    }
}
