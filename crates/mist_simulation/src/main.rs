//! Headless дуэль MIST
//!
//! Два AI-бойца, фиксированный seed, сводка боя в консоль.

use mist_simulation::{create_headless_app, spawn_fighter, step, HudSnapshot, Side};

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    println!("Starting MIST headless duel (seed: {})", seed);

    let mut app = create_headless_app(seed);
    spawn_fighter(app.world_mut(), Side::Yin, true);
    spawn_fighter(app.world_mut(), Side::Yang, true);

    // 3600 тиков = минута боя при 60Hz
    for tick in 0..3600 {
        step(&mut app);

        if tick % 600 == 0 {
            let hud = app.world().resource::<HudSnapshot>();
            println!(
                "tick {}: round {} | YIN {} hp | YANG {} hp | score {}:{}",
                tick,
                hud.round_number,
                hud.panels[0].health,
                hud.panels[1].health,
                hud.wins[0],
                hud.wins[1]
            );
        }
    }

    let hud = app.world().resource::<HudSnapshot>();
    println!(
        "Duel complete: score {}:{} after {} round(s)",
        hud.wins[0], hud.wins[1], hud.round_number
    );
    for panel in &hud.panels {
        if let Some(best) = &panel.best_move {
            println!("best move: {}", best);
        }
    }
}
