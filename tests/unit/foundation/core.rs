use super::*;

#[test]
fn cross_follows_right_hand_rule() {
    let x = Vec3::new(1.0, 0.0, 0.0);
    let y = Vec3::new(0.0, 1.0, 0.0);
    assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
}

#[test]
fn aabb_rejects_inverted_corners() {
    assert!(Aabb::new(Vec3::ONE, Vec3::ZERO).is_err());
    assert!(Aabb::new(Vec3::ZERO, Vec3::new(f64::NAN, 1.0, 1.0)).is_err());
}

#[test]
fn aabb_union_center_and_extents() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE).unwrap();
    let b = Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.5)).unwrap();
    let u = a.union(b);
    assert_eq!(u.min, Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(u.max, Vec3::new(1.0, 3.0, 1.0));
    assert_eq!(u.extents(), Vec3::new(2.0, 3.0, 1.0));
    assert_eq!(u.center(), Vec3::new(0.0, 1.5, 0.5));
}

#[test]
fn transform_default_is_identity() {
    let t = Transform3D::at(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(t.scale, Vec3::ONE);
    assert_eq!(t.rotation_euler, Vec3::ZERO);
    assert_eq!(t.location, Vec3::new(1.0, 2.0, 3.0));
}
