use std::time::{Duration, Instant};

use scratch_foil::channel::{SpawnPoint, SpawnRequest, SurfaceSize};
use scratch_foil::{EngineMsg, EngineState, EngineTuning, ParticleEngine, offscreen_surface};

fn green_at(x: i32, y: i32) -> SpawnRequest {
    SpawnRequest {
        position: SpawnPoint { x, y },
        scale: 1.0,
        fill: "#00FF00".into(),
        offset: 20,
        size: SurfaceSize { width: 100, height: 100 },
    }
}

fn engine_with_surface() -> (ParticleEngine, scratch_foil::SurfaceView) {
    let mut engine = ParticleEngine::from_seed(EngineTuning::default(), 17);
    let (surface, view) = offscreen_surface(100, 100);
    engine.handle(EngineMsg::Setup(surface), Instant::now());
    (engine, view)
}

#[test]
fn batch_appears_then_expires_after_its_lifetime() {
    let (mut engine, mut view) = engine_with_surface();
    let t0 = Instant::now();

    engine.handle(EngineMsg::Spawn(green_at(10, 10)), t0);
    assert_eq!(engine.active_count(), 4);

    assert_eq!(engine.advance_frame(t0 + Duration::from_millis(16)), EngineState::Running);
    assert!(view.latest().pixels.iter().any(|&p| p != 0), "flakes are drawn");

    // nothing advanced for longer than the 1500 ms lifetime
    assert_eq!(engine.advance_frame(t0 + Duration::from_millis(1600)), EngineState::Idle);
    assert_eq!(engine.active_count(), 0);
    assert!(view.latest().pixels.iter().all(|&p| p == 0), "last frame is blank");
}

#[test]
fn spawn_before_setup_neither_panics_nor_piles_up() {
    let mut engine = ParticleEngine::from_seed(EngineTuning::default(), 1);
    let t0 = Instant::now();
    for i in 0..10_000 {
        engine.handle(EngineMsg::Spawn(green_at(i % 100, 5)), t0);
    }
    assert_eq!(engine.active_count(), 0);
    assert_eq!(engine.pooled_count(), 0);
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.advance_frame(t0), EngineState::Idle);
    assert_eq!(engine.stats().frames_rendered, 0);
    assert_eq!(engine.stats().dropped_before_setup, 10_000);
}

#[test]
fn sustained_spawning_stays_under_the_cap() {
    let (mut engine, _view) = engine_with_surface();
    let t0 = Instant::now();
    for frame in 0..400u64 {
        let now = t0 + Duration::from_millis(frame * 4);
        for k in 0..10 {
            engine.handle(EngineMsg::Spawn(green_at(k * 9, 50)), now);
        }
        if frame >= 125 {
            // 40 per frame saturates the cap after 125 frames
            assert_eq!(engine.active_count(), 5000);
        }
        engine.advance_frame(now);
        assert!(engine.active_count() <= 5000);
        assert!(engine.pooled_count() <= 5000);
    }
    assert!(engine.stats().dropped_at_cap > 0);
    assert!(engine.pooled_count() > 0, "expired flakes were pooled for reuse");
}

#[test]
fn lifetime_uses_wall_time_not_frame_count() {
    let (mut engine, _view) = engine_with_surface();
    let t0 = Instant::now();
    engine.handle(EngineMsg::Spawn(green_at(50, 50)), t0);

    // hundreds of fast frames inside the lifetime keep everything alive
    for i in 0..300u64 {
        engine.advance_frame(t0 + Duration::from_millis(i * 4));
    }
    assert_eq!(engine.active_count(), 4);

    // one late frame is enough to retire them
    engine.advance_frame(t0 + Duration::from_millis(1501));
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn alternate_profile_from_config_changes_batch_and_cap() {
    let tuning: EngineTuning =
        serde_json::from_str(r#"{ "batch_size": 5, "max_particles": 12, "lifetime_ms": 800 }"#).unwrap();
    assert_eq!(tuning.speed_decay, 0.98);

    let mut engine = ParticleEngine::from_seed(tuning, 3);
    let (surface, _view) = offscreen_surface(10, 10);
    let t0 = Instant::now();
    engine.handle(EngineMsg::Setup(surface), t0);
    for _ in 0..4 {
        engine.handle(EngineMsg::Spawn(green_at(1, 1)), t0);
    }
    assert_eq!(engine.active_count(), 12);
    assert_eq!(engine.advance_frame(t0 + Duration::from_millis(801)), EngineState::Idle);
}
