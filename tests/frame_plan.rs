//! Integration tests for per-frame draw planning

use glam::{Mat4, Vec3};
use hollow_night::app::renderer::plan::{DepthState, DrawStep, FramePlan};
use hollow_night::app::renderer::programs::ObjectPass;
use hollow_night::app::renderer::skybox::SkyboxPass;
use hollow_night::app::{AppContext, CameraConfig};
use hollow_night::scene::{ObjectKind, Scene};

fn plan_at(ctx: &AppContext) -> FramePlan {
    FramePlan::build(&Scene::night(), ctx, &CameraConfig::default(), 800.0 / 600.0)
}

#[test]
fn test_skybox_is_drawn_last_with_its_own_depth_rules() {
    let plan = plan_at(&AppContext::default());

    let last = plan.steps.last().expect("steps");
    assert!(matches!(last, DrawStep::Skybox { .. }));
    assert_eq!(last.depth(), DepthState::SKYBOX);
    assert_eq!(last.depth().compare, wgpu::CompareFunction::LessEqual);
    assert!(!last.depth().write);

    let objects = &plan.steps[..plan.steps.len() - 1];
    assert_eq!(objects.len(), Scene::night().objects().len());
    assert!(objects.iter().all(|s| s.depth() == DepthState::OPAQUE));
}

#[test]
fn test_moon_model_at_start() {
    let plan = plan_at(&AppContext::default());

    let (_, _, moon) = plan
        .object_steps()
        .find(|(_, kind, _)| *kind == ObjectKind::Moon)
        .expect("moon");

    let expected = Mat4::from_translation(Vec3::new(-6.0, 29.0, 0.0)) * Mat4::from_scale(Vec3::splat(2.0));
    assert!(moon.model_matrix().abs_diff_eq(expected, 1e-5));
}

#[test]
fn test_plan_follows_state_flags() {
    let mut ctx = AppContext::default();
    ctx.state.ui_enabled = true;
    ctx.state.clear_color = Vec3::new(0.5, 0.25, 0.0);
    ctx.hdr.enabled = false;

    let plan = plan_at(&ctx);
    assert!(plan.overlay);
    assert_eq!(plan.clear_color.r, 0.5);
    assert_eq!(plan.clear_color.g, 0.25);
    assert_eq!(plan.clear_color.a, 1.0);
    assert_eq!(plan.tonemap.hdr, 0);
}

#[test]
fn test_step_depth_matches_pipelines() {
    let plan = plan_at(&AppContext::default());

    for step in &plan.steps {
        let expected = match step {
            DrawStep::Object { .. } => ObjectPass::DEPTH,
            DrawStep::Skybox { .. } => SkyboxPass::DEPTH,
        };
        assert_eq!(step.depth(), expected);
    }
}
