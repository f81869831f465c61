//! Whiff punishment и тик комбо-окон.

use bevy::prelude::*;

use crate::catalog::{ActionId, MoveCatalog};
use crate::clock::FrameClock;
use crate::combat::CombatTuning;
use crate::components::{ActionState, ComboState, CombatTimers, Fighter, Health, MovementTimers};

/// Промах committal-атаки наказывается самостаном.
///
/// whiff_check_at взводится при старте атаки (конец анимации);
/// если к этому моменту ни одно попадание не подтверждено —
/// боец получает stun и уходит в hurt.
pub fn check_whiffs(
    clock: Res<FrameClock>,
    catalog: Res<MoveCatalog>,
    tuning: Res<CombatTuning>,
    mut fighters: Query<
        (
            &Fighter,
            &Health,
            &mut ActionState,
            &mut MovementTimers,
            &mut CombatTimers,
        ),
        With<Fighter>,
    >,
) {
    let now = clock.now();

    for (fighter, health, mut action, mut mt, mut ct) in fighters.iter_mut() {
        if ct.whiff_check_at == 0.0 || now < ct.whiff_check_at {
            continue;
        }

        let landed = ct.whiff_landed;
        ct.whiff_check_at = 0.0;
        ct.whiff_landed = false;

        if landed || !health.is_alive() {
            continue;
        }

        ct.stun_until = now + tuning.whiff_stun_ms;
        action.request(ActionId::Hurt, 6, false, now, &catalog);
        mt.lock_movement(now + catalog.duration_ms(ActionId::Hurt));

        crate::log(&format!(
            "{} whiffed, stunned {}ms",
            fighter.side.label(),
            tuning.whiff_stun_ms as u64
        ));
    }
}

/// Сброс комбо по истечении окна.
pub fn tick_combos(clock: Res<FrameClock>, mut combos: Query<&mut ComboState, With<Fighter>>) {
    let now = clock.now();
    for mut combo in combos.iter_mut() {
        combo.tick(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whiff_arm_and_clear_logic() {
        let mut ct = CombatTimers::default();
        assert_eq!(ct.whiff_check_at, 0.0);

        ct.arm_whiff(500.0);
        assert_eq!(ct.whiff_check_at, 500.0);
        assert!(!ct.whiff_landed);

        // Попадание до проверки — наказания не будет
        ct.whiff_landed = true;
        let now = 520.0;
        assert!(now >= ct.whiff_check_at);
        assert!(ct.whiff_landed);
    }

    #[test]
    fn test_combo_window_expires() {
        let mut combo = ComboState::default();
        combo.register_hit(100.0, 900.0);
        assert_eq!(combo.count, 1);

        // Граница строгая: ровно на reset_at комбо ещё живо
        combo.tick(999.0);
        assert_eq!(combo.count, 1);
        combo.tick(1000.0);
        assert_eq!(combo.count, 1);
        combo.tick(1000.1);
        assert_eq!(combo.count, 0);
    }

    #[test]
    fn test_whiffed_attack_self_stuns() {
        let mut app = crate::create_headless_app(2);
        let yin = crate::spawn_fighter(app.world_mut(), crate::components::Side::Yin, false);
        crate::step(&mut app);

        // Committal-атака без противника в радиусе: окно закрывается промахом
        {
            let now = app.world().resource::<FrameClock>().now();
            let mut ct = app.world_mut().get_mut::<CombatTimers>(yin).unwrap();
            ct.arm_whiff(now + 1.0);
        }
        crate::step(&mut app);

        let now = app.world().resource::<FrameClock>().now();
        let ct = app.world().get::<CombatTimers>(yin).unwrap();
        assert!(ct.stunned(now), "missed committal attack must self-stun");
        assert_eq!(ct.whiff_check_at, 0.0, "whiff window must close");

        let action = app.world().get::<ActionState>(yin).unwrap();
        assert_eq!(action.current, ActionId::Hurt);
    }
}
