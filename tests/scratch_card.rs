use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scratch_foil::channel::SpawnRequest;
use scratch_foil::raster::revealed_fraction;
use scratch_foil::{EngineMsg, MaskSurface, Point, ScratchConfig, particle_channel};

fn card_100() -> MaskSurface<Vec<SpawnRequest>> {
    MaskSurface::from_seed(ScratchConfig::default(), 100, 100, 1.0, Vec::new(), 2024)
}

#[test]
fn straight_stroke_across_the_card() {
    let mut card = card_100();
    let t0 = Instant::now();

    card.start_erasing(Point::new(0.0, 50.0));
    let mut last = 0.0;
    for i in 1..=50u64 {
        let now = t0 + Duration::from_millis(i);
        card.pointer_moved(Point::new(2.0 * i as f32, 50.0), now);
        let fraction = revealed_fraction(card.mask());
        assert!(fraction >= last, "step {i}: {fraction} < {last}");
        last = fraction;
        assert_eq!(card.tick(now), None, "no scan while still scratching");
    }
    card.stop_erasing();

    let settled = card.tick(t0 + Duration::from_millis(100)).expect("debounce fired");
    assert_eq!(card.scans(), 1);
    assert_eq!(settled, last);
    // brush 10 along 100 px of a 100x100 card: about a tenth, never more than
    // the 20 px band the jitter can reach
    assert!(settled >= 0.08, "settled {settled}");
    assert!(settled <= 0.2, "settled {settled}");

    let requests = card.sink();
    assert!(!requests.is_empty(), "cleared interior should shed flakes");
    for r in requests {
        assert_eq!(r.offset, 10);
        assert_eq!(r.fill, "#BBB");
        assert_eq!((r.size.width, r.size.height), (100, 100));
        assert!((0..=100).contains(&r.position.x));
        assert_eq!(r.position.y, 50);
    }
}

#[test]
fn revealed_fraction_never_decreases() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut card = MaskSurface::from_seed(ScratchConfig::default(), 80, 60, 1.5, Vec::new(), 7);
    let t0 = Instant::now();
    let mut last = revealed_fraction(card.mask());
    assert_eq!(last, 0.0);

    for i in 0..300u64 {
        let p = Point::new(rng.gen_range(-5.0..85.0), rng.gen_range(-5.0..65.0));
        match rng.gen_range(0..10) {
            0 => card.start_erasing(p),
            1 => card.stop_erasing(),
            _ => card.pointer_moved(p, t0 + Duration::from_millis(i)),
        }
        let now = revealed_fraction(card.mask());
        assert!(now >= last);
        last = now;
    }
}

#[test]
fn idle_pointer_never_spawns_or_scans() {
    let mut card = card_100();
    let t0 = Instant::now();
    for i in 0..20 {
        card.pointer_moved(Point::new(i as f32 * 5.0, 30.0), t0);
    }
    assert_eq!(card.tick(t0 + Duration::from_secs(1)), None);
    assert!(card.sink().is_empty());
    assert!(card.take_events().is_empty());
}

#[test]
fn mask_feeds_the_engine_through_the_channel() {
    let (channel, rx) = particle_channel();
    let mut card = MaskSurface::from_seed(ScratchConfig::default(), 60, 40, 1.0, channel, 11);
    let (surface, _view) = scratch_foil::offscreen_surface(60, 40);
    card.sink_mut().transfer_surface(surface);

    let t0 = Instant::now();
    card.start_erasing(Point::new(5.0, 20.0));
    for x in (6..56).step_by(2) {
        card.pointer_moved(Point::new(x as f32, 20.0), t0);
    }
    let sent = card.spawns_sent();
    assert!(sent > 0);

    let msgs: Vec<EngineMsg> = rx.try_iter().collect();
    assert!(matches!(msgs.first(), Some(EngineMsg::Setup(_))));
    assert_eq!(msgs.len() as u64, sent + 1);

    let mut engine = scratch_foil::ParticleEngine::from_seed(Default::default(), 5);
    for msg in msgs {
        engine.handle(msg, t0);
    }
    assert_eq!(engine.active_count() as u64, 4 * sent);
}
