use super::*;
use crate::{
    channel::BakePass,
    foundation::core::Rect,
    host::{
        memory::{MemoryScene, SceneLayer},
        scene::{BlendMode, SceneHost},
    },
    surface::ensure_surface,
};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target/unit_driver").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn setup(name: &str, channels: &[ChannelKind]) -> (MemoryScene, ReferenceSurface, CaptureConfig) {
    let mut scene = MemoryScene::new();
    scene.add_layer(SceneLayer::new(Rect::new(0.0, 0.0, 1.0, 1.0), 2.0));
    let surface = ensure_surface(&mut scene, None, "Ref", &mut PipelineArtifacts::new()).unwrap();
    let mut cfg = CaptureConfig::new(scratch(name), channels.iter().copied());
    cfg.resolution = 8;
    cfg.validate().unwrap();
    (scene, surface, cfg)
}

fn preview_material(scene: &mut MemoryScene) -> MaterialId {
    scene
        .create_material(&MaterialDesc {
            name: "Existing".to_string(),
            kind: MaterialKind::Preview {
                inputs: Vec::new(),
                blend: BlendMode::Opaque,
            },
        })
        .unwrap()
}

#[test]
fn success_writes_file_and_restores_binding() {
    let (mut scene, surface, cfg) = setup("success", &[ChannelKind::Roughness]);
    let existing = preview_material(&mut scene);
    scene.bind_material(surface.id, Some(existing)).unwrap();
    let mut artifacts = PipelineArtifacts::new();

    let r = bake_channel(&mut scene, &surface, ChannelKind::Roughness, &cfg, &mut artifacts);

    assert!(r.is_success(), "{:?}", r.failure());
    let img = r.image().unwrap();
    assert_eq!(img.path, cfg.output_dir.join("Ref_Roughness.png"));
    assert!(img.path.is_file());
    assert_eq!((img.width, img.height), (8, 8));
    assert_eq!(img.layout, PixelLayout::Luma8);

    // The bake saw the routing material, the surface got its own binding back.
    let routed = scene.bake_log()[0].bound_material.unwrap();
    assert_ne!(routed, existing);
    assert_eq!(scene.material_binding(surface.id).unwrap(), Some(existing));
    assert!(scene.material(routed).is_none());
    assert_eq!(scene.material_count(), 1);

    let roles: Vec<_> = artifacts.entries().iter().map(|a| a.role).collect();
    assert_eq!(roles, vec![ArtifactRole::BakeMaterial, ArtifactRole::OutputFile]);
}

#[test]
fn backend_failure_is_data_and_binding_is_restored() {
    let (mut scene, surface, cfg) = setup("backend_failure", &[ChannelKind::BaseColor]);
    scene.fail_pass(BakePass::DiffuseColor, BakeError::OutOfMemory);
    let mut artifacts = PipelineArtifacts::new();

    let r = bake_channel(&mut scene, &surface, ChannelKind::BaseColor, &cfg, &mut artifacts);

    assert_eq!(
        r.failure(),
        Some(&BakeFailure::Backend(BakeError::OutOfMemory))
    );
    assert!(r.path().is_none());
    assert_eq!(scene.material_binding(surface.id).unwrap(), None);
    assert_eq!(scene.material_count(), 0);
    assert!(!cfg.image_path("Ref", ChannelKind::BaseColor).exists());
}

#[test]
fn unsupported_pass_never_bakes() {
    let (mut scene, surface, cfg) = setup("unsupported", &[ChannelKind::Specular]);
    scene.disable_pass(BakePass::Specular);
    let mut artifacts = PipelineArtifacts::new();

    let r = bake_channel(&mut scene, &surface, ChannelKind::Specular, &cfg, &mut artifacts);

    assert_eq!(
        r.failure(),
        Some(&BakeFailure::Backend(BakeError::Unsupported(BakePass::Specular)))
    );
    assert!(scene.bake_log().is_empty());
    assert!(artifacts.is_empty());
}

#[test]
fn empty_capture_volume_is_a_failure() {
    let (mut scene, surface, mut cfg) = setup("no_samples", &[ChannelKind::Alpha]);
    // The only layer sits at depth 2, outside this range.
    cfg.depth = crate::config::DepthRange::new(0.001, 1.0).unwrap();
    let mut artifacts = PipelineArtifacts::new();

    let r = bake_channel(&mut scene, &surface, ChannelKind::Alpha, &cfg, &mut artifacts);
    assert_eq!(r.failure(), Some(&BakeFailure::NoValidSamples));
}

#[test]
fn depth_writes_png_and_optional_raw_exr() {
    let (mut scene, surface, mut cfg) = setup("depth", &[ChannelKind::Depth]);
    cfg.write_depth_exr = true;
    let mut artifacts = PipelineArtifacts::new();

    let r = bake_channel(&mut scene, &surface, ChannelKind::Depth, &cfg, &mut artifacts);

    let img = r.image().unwrap();
    assert_eq!(img.layout, PixelLayout::Luma16);
    assert_eq!(img.raw_path.as_deref(), Some(cfg.raw_depth_path("Ref").as_path()));
    assert!(cfg.raw_depth_path("Ref").is_file());
    assert_eq!(scene.bake_log()[0].settings.clip, cfg.depth);
}

#[test]
fn routing_material_names_follow_channel() {
    assert_eq!(routing_material_name(ChannelKind::AmbientOcclusion), "QG_Bake_AmbientOcclusion");
}
