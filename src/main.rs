// What you SEE:
// • A card covered in noisy foil; the prize (picture or code) is underneath.
// • Hold Left Mouse and drag: the foil is scratched away in jagged bites and
//   flakes drift off behind the brush (drawn by the particle worker thread).
// • The HUD shows how much is uncovered once you pause. R repaints the foil.
//   ESC quits.

use std::time::Instant;

use clap::Parser;
use tracing::info;

use scratch_foil::cli::CliArgs;
use scratch_foil::composite::compose;
use scratch_foil::config::{AppConfig, StyleFile};
use scratch_foil::draw::{Drawer, draw_text};
use scratch_foil::gamma::GammaLut;
use scratch_foil::{
    Error, FrameBuffer, MaskSurface, ParticleWorker, Point, content, logging, offscreen_surface,
    particle_channel,
};

fn main() -> Result<(), Error> {
    let args = CliArgs::parse();
    logging::init(args.debug);

    /* --- Configuration: flags act as attributes, --config as the style layer --- */
    let style = args.config.as_deref().map(StyleFile::load).transpose()?;
    let cfg = AppConfig::resolve(&args.attributes(), style.as_ref(), args.layout_overrides());
    let layout = cfg.layout;
    info!(?layout, fill = %cfg.scratch.fill, size = cfg.scratch.scratch_size, "scratch card");

    /* --- Particle worker: it gets the surface once and only spawn requests after --- */
    let (mut channel, rx) = particle_channel();
    let worker = ParticleWorker::spawn(rx, cfg.tuning.clone())?;

    /* --- Foil mask, sized in device pixels --- */
    let code = cfg.scratch.code.clone();
    let mut card = MaskSurface::new(cfg.scratch, layout.width, layout.height, layout.scale, channel);
    let (w, h) = (card.mask().width, card.mask().height);

    let (surface, mut flakes) = offscreen_surface(w, h);
    card.sink_mut().transfer_surface(surface);

    /* --- Hidden content --- */
    let hidden = match &args.image {
        Some(path) => content::load_image(path, w, h)?,
        None => content::ticket(w, h, code.as_deref()),
    };

    let mut drawer = Drawer::new("Scratch Card", w, h)?;
    let mut screen = FrameBuffer::new(w, h);
    let lut = GammaLut::new();
    let scale = layout.scale;
    let mut hud = String::from("SCRATCHED 0.0%");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Input: window pixels -> logical card pixels */
        if drawer.r_pressed_once() {
            card.reset(now);
        }
        let pointer = drawer.mouse_pos().map(|(x, y)| Point::new(x / scale, y / scale));
        match (drawer.left_mouse_down(), pointer) {
            (true, Some(p)) if !card.is_erasing() => card.start_erasing(p),
            (true, Some(p)) => card.pointer_moved(p, now),
            (true, None) => {}
            (false, p) => {
                if card.is_erasing() {
                    card.stop_erasing();
                }
                if let Some(p) = p {
                    card.pointer_moved(p, now);
                }
            }
        }

        /* 2) Debounced reveal scan */
        card.tick(now);
        for event in card.take_events() {
            hud = format!("SCRATCHED {:.1}%", event.fraction * 100.0);
        }

        /* 3) Content, foil, flakes; then HUD */
        compose(&mut screen, &hidden, &[card.mask(), flakes.latest()], &lut)?;
        draw_text(&mut screen, 8, 8, &hud, 0x00FF_FFFF, 1);

        drawer.present(&screen)?;
    }

    /* --- Shutdown: dropping the card drops the channel; the worker then exits --- */
    info!(scratched = card.scratched(), spawns = card.spawns_sent(), "closing");
    drop(card);
    let stats = worker.join()?;
    info!(?stats, "particle worker joined");
    Ok(())
}
