use super::*;
use crate::config::DepthRange;
use kurbo::Size;

fn surface(scene: &mut MemoryScene) -> ObjectId {
    scene
        .create_surface(&SurfaceDesc {
            name: "ref".to_string(),
            transform: Transform3D::default(),
            size: Size::new(1.0, 1.0),
            subdivisions: 0,
            visibility: Visibility::Hidden,
        })
        .unwrap()
}

fn route(scene: &mut MemoryScene, obj: ObjectId, pass: BakePass) -> MaterialId {
    let m = scene
        .create_material(&MaterialDesc {
            name: "route".to_string(),
            kind: MaterialKind::BakeRoute { pass },
        })
        .unwrap();
    scene.bind_material(obj, Some(m)).unwrap();
    m
}

fn settings(pass: BakePass, components: u8) -> PassSettings {
    PassSettings {
        pass,
        components,
        clip: DepthRange::new(0.0, 10.0).unwrap(),
    }
}

#[test]
fn created_surface_is_a_centered_quad() {
    let mut scene = MemoryScene::new();
    let id = surface(&mut scene);
    let geo = scene.surface_geometry(id).unwrap();
    assert_eq!(geo.vertices.len(), 4);
    assert_eq!(geo.vertices[0], Vec3::new(-0.5, -0.5, 0.0));
    assert_eq!(geo.vertices[2], Vec3::new(0.5, 0.5, 0.0));
    assert_eq!(scene.object_visibility(id), Some(Visibility::Hidden));
}

#[test]
fn bake_requires_routing_material() {
    let mut scene = MemoryScene::new();
    scene.add_layer(SceneLayer::new(Rect::new(0.0, 0.0, 1.0, 1.0), 1.0));
    let id = surface(&mut scene);
    let err = scene
        .bake(id, &settings(BakePass::Roughness, 1), 4)
        .unwrap_err();
    assert_eq!(err, BakeError::NotRouted(BakePass::Roughness));

    route(&mut scene, id, BakePass::Depth);
    let err = scene
        .bake(id, &settings(BakePass::Roughness, 1), 4)
        .unwrap_err();
    assert_eq!(err, BakeError::NotRouted(BakePass::Roughness));
}

#[test]
fn nearest_layer_wins_and_coverage_is_counted() {
    let mut scene = MemoryScene::new();
    let mut far = SceneLayer::new(Rect::new(0.0, 0.0, 1.0, 1.0), 4.0);
    far.roughness = 0.9;
    let mut near = SceneLayer::new(Rect::new(0.0, 0.0, 0.5, 1.0), 1.0);
    near.roughness = 0.1;
    scene.add_layer(far);
    scene.add_layer(near);
    let id = surface(&mut scene);
    route(&mut scene, id, BakePass::Roughness);

    let img = scene.bake(id, &settings(BakePass::Roughness, 1), 4).unwrap();
    assert_eq!(img.samples.len(), img.expected_len());
    assert_eq!(img.valid_samples, 16);
    // Left half is covered by the near layer.
    assert_eq!(img.samples[0], 0.1);
    assert_eq!(img.samples[3], 0.9);
}

#[test]
fn layers_outside_clip_range_are_ignored() {
    let mut scene = MemoryScene::new();
    scene.add_layer(SceneLayer::new(Rect::new(0.0, 0.0, 1.0, 1.0), 20.0));
    let id = surface(&mut scene);
    route(&mut scene, id, BakePass::Depth);
    let img = scene.bake(id, &settings(BakePass::Depth, 1), 2).unwrap();
    assert_eq!(img.valid_samples, 0);
    assert!(img.samples.iter().all(|&d| d == 10.0));
}

#[test]
fn injected_faults_and_component_mismatch_fail() {
    let mut scene = MemoryScene::new();
    scene.add_layer(SceneLayer::new(Rect::new(0.0, 0.0, 1.0, 1.0), 1.0));
    let id = surface(&mut scene);
    route(&mut scene, id, BakePass::DiffuseColor);

    assert!(matches!(
        scene.bake(id, &settings(BakePass::DiffuseColor, 1), 2),
        Err(BakeError::Render(_))
    ));

    scene.fail_pass(BakePass::DiffuseColor, BakeError::OutOfMemory);
    assert_eq!(
        scene.bake(id, &settings(BakePass::DiffuseColor, 3), 2),
        Err(BakeError::OutOfMemory)
    );
    scene.clear_faults();
    assert!(scene.bake(id, &settings(BakePass::DiffuseColor, 3), 2).is_ok());
    assert_eq!(scene.bake_log().len(), 3);
}

#[test]
fn deleting_material_unbinds_it() {
    let mut scene = MemoryScene::new();
    let id = surface(&mut scene);
    let m = route(&mut scene, id, BakePass::Alpha);
    assert_eq!(scene.delete_material(m), Ok(Removal::Removed));
    assert_eq!(scene.material_binding(id), Ok(None));
    assert_eq!(scene.delete_material(m), Ok(Removal::Missing));
}

#[test]
fn pinned_handles_refuse_deletion() {
    let mut scene = MemoryScene::new();
    let id = surface(&mut scene);
    scene.pin_handle(id.0);
    assert!(matches!(
        scene.delete_object(id),
        Err(HostError::Rejected(_))
    ));
    scene.unpin_handle(id.0);
    assert_eq!(scene.delete_object(id), Ok(Removal::Removed));
    assert_eq!(scene.delete_object(id), Ok(Removal::Missing));
}

#[test]
fn modifiers_are_removed_individually() {
    let mut scene = MemoryScene::new();
    let id = surface(&mut scene);
    let sub = scene
        .add_modifier(
            id,
            &ModifierDesc::Subdivision {
                levels: 2,
                simple: true,
            },
        )
        .unwrap();
    assert_eq!(scene.modifiers(id).len(), 1);
    assert_eq!(scene.remove_modifier(id, sub), Ok(Removal::Removed));
    assert_eq!(scene.remove_modifier(id, sub), Ok(Removal::Missing));
    assert!(scene.modifiers(id).is_empty());
}

#[test]
fn scene_description_parses_with_defaults() {
    let json = r#"{"layers": [{"footprint": {"x0": 0.0, "y0": 0.0, "x1": 1.0, "y1": 0.5}, "depth": 2.0}]}"#;
    let desc: SceneDescription = serde_json::from_str(json).unwrap();
    assert_eq!(desc.layers.len(), 1);
    assert_eq!(desc.layers[0].alpha, 1.0);
    assert_eq!(desc.layers[0].normal, [0.0, 0.0, 1.0]);
}

#[test]
fn created_surfaces_get_unique_names() {
    let mut scene = MemoryScene::new();
    let a = surface(&mut scene);
    let b = surface(&mut scene);
    let c = surface(&mut scene);
    assert_eq!(scene.object_name(a), Some("ref"));
    assert_eq!(scene.object_name(b), Some("ref.001"));
    assert_eq!(scene.object_name(c), Some("ref.002"));

    // A freed name is handed out again.
    scene.delete_object(a).unwrap();
    let d = surface(&mut scene);
    assert_eq!(scene.object_name(d), Some("ref"));
}
