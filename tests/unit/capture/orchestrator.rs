use super::*;
use crate::{
    artifacts::ArtifactRole,
    channel::BakePass,
    foundation::core::Rect,
    host::{
        bake::BakeError,
        memory::{MemoryScene, SceneLayer},
    },
};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target/unit_orchestrator").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn scene() -> MemoryScene {
    let mut scene = MemoryScene::new();
    scene.add_layer(SceneLayer::new(Rect::new(0.0, 0.0, 1.0, 1.0), 1.0));
    scene
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    cancel_after: Option<(usize, CancelToken)>,
}

impl CaptureObserver for Recorder {
    fn channel_started(&mut self, kind: ChannelKind, index: usize, total: usize) {
        self.events.push(format!("start {kind} {index}/{total}"));
    }

    fn channel_finished(&mut self, result: &CaptureResult) {
        self.events
            .push(format!("done {} {}", result.kind, result.is_success()));
        if let Some((n, token)) = &self.cancel_after
            && self.events.len() / 2 >= *n
        {
            token.cancel();
        }
    }
}

#[test]
fn observer_sees_channels_in_capture_order() {
    let mut scene = scene();
    scene.fail_pass(BakePass::Normal, BakeError::Render("boom".to_string()));
    let mut cfg = CaptureConfig::new(
        scratch("observer"),
        [ChannelKind::Depth, ChannelKind::Normal, ChannelKind::BaseColor],
    );
    cfg.resolution = 4;
    let mut artifacts = PipelineArtifacts::new();
    let mut rec = Recorder::default();

    let set = run_capture_with(
        &mut scene,
        &cfg,
        None,
        &mut artifacts,
        &CancelToken::new(),
        &mut rec,
    )
    .unwrap();

    assert_eq!(
        rec.events,
        vec![
            "start BaseColor 0/3",
            "done BaseColor true",
            "start Normal 1/3",
            "done Normal false",
            "start Depth 2/3",
            "done Depth true",
        ]
    );
    assert_eq!(set.status, RunStatus::Success);
    assert!(!set.cancelled);
    assert_eq!(set.preview, PreviewStatus::NotRequested);
}

#[test]
fn cancel_stops_before_the_next_bake() {
    let mut scene = scene();
    let cfg = {
        let mut c = CaptureConfig::new(
            scratch("cancel"),
            [ChannelKind::BaseColor, ChannelKind::Roughness, ChannelKind::Alpha],
        );
        c.resolution = 4;
        c
    };
    let token = CancelToken::new();
    let mut rec = Recorder {
        cancel_after: Some((1, token.clone())),
        ..Recorder::default()
    };
    let mut artifacts = PipelineArtifacts::new();

    let set = run_capture_with(&mut scene, &cfg, None, &mut artifacts, &token, &mut rec).unwrap();

    assert!(set.cancelled);
    assert_eq!(set.results.len(), 1);
    assert_eq!(scene.bake_log().len(), 1);
    let meta = CaptureMetadata::read(set.metadata_path.as_deref().unwrap()).unwrap();
    assert!(meta.cancelled);
}

#[test]
fn already_cancelled_token_bakes_nothing() {
    let mut scene = scene();
    let cfg = CaptureConfig::new(scratch("pre_cancelled"), [ChannelKind::BaseColor]);
    let token = CancelToken::new();
    token.cancel();
    let mut artifacts = PipelineArtifacts::new();

    let set =
        run_capture_with(&mut scene, &cfg, None, &mut artifacts, &token, &mut NoopObserver).unwrap();
    assert!(set.results.is_empty());
    assert_eq!(set.status, RunStatus::Failed);
}

#[test]
fn invalid_config_touches_nothing() {
    let mut scene = scene();
    let mut cfg = CaptureConfig::new(scratch("invalid"), [ChannelKind::BaseColor]);
    cfg.depth.far = cfg.depth.near;
    let mut artifacts = PipelineArtifacts::new();

    let err = run_capture(&mut scene, &cfg, None, &mut artifacts).unwrap_err();
    assert!(matches!(err, crate::QuadgrabError::Configuration(_)));
    assert!(artifacts.is_empty());
    assert_eq!(scene.object_count(), 0);
}

#[test]
fn metadata_is_registered_and_can_be_disabled() {
    let mut scene = scene();
    let mut cfg = CaptureConfig::new(scratch("metadata"), [ChannelKind::Metallic]);
    cfg.resolution = 4;
    let mut artifacts = PipelineArtifacts::new();
    let set = run_capture(&mut scene, &cfg, None, &mut artifacts).unwrap();
    let path = set.metadata_path.clone().unwrap();
    assert!(path.is_file());
    assert!(
        artifacts
            .with_role(ArtifactRole::OutputFile)
            .any(|a| a.handle == crate::ArtifactHandle::File(path.clone()))
    );

    cfg.write_metadata = false;
    cfg.output_dir = scratch("metadata_off");
    let set = run_capture(&mut scene, &cfg, Some(set.surface.id), &mut artifacts).unwrap();
    assert!(set.metadata_path.is_none());
    assert!(!cfg.metadata_path("QuadGrab_Reference").exists());
}
