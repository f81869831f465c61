//! Интеграция кинематики: гравитация, velocity → position, контакты.
//!
//! Общая для всех бойцов (input- и AI-управляемых). Коллизии —
//! только axis-aligned пол и стены арены.

use bevy::prelude::*;

use crate::clock::FrameClock;
use crate::components::{Arena, Body, Fighter};
use crate::movement::MovementTuning;

pub fn integrate_bodies(
    clock: Res<FrameClock>,
    arena: Res<Arena>,
    tuning: Res<MovementTuning>,
    mut bodies: Query<(&mut Transform, &mut Body), With<Fighter>>,
) {
    let dt = clock.delta_secs();
    if dt == 0.0 {
        // Hit-stop или пропущенный кадр — мир заморожен
        return;
    }

    for (mut transform, mut body) in bodies.iter_mut() {
        // Граница кадра: non-finite состояние не интегрируем, кадр
        // для этого бойца пропускается
        if !body.velocity.is_finite() || !transform.translation.is_finite() {
            crate::log_warning(&format!(
                "physics: non-finite kinematics ({:?} / {:?}), skipping frame",
                body.velocity, transform.translation
            ));
            body.velocity = Vec2::ZERO;
            continue;
        }

        if !body.on_floor {
            body.velocity.y -= tuning.gravity * dt;
        }

        transform.translation.x += body.velocity.x * dt;
        transform.translation.y += body.velocity.y * dt;

        // Пол
        if transform.translation.y <= arena.floor_y {
            transform.translation.y = arena.floor_y;
            if body.velocity.y < 0.0 {
                body.velocity.y = 0.0;
            }
            body.on_floor = true;
        } else {
            body.on_floor = false;
        }

        // Стены (границы мира)
        body.touching_wall_left = false;
        body.touching_wall_right = false;
        if transform.translation.x <= arena.wall_left_x {
            transform.translation.x = arena.wall_left_x;
            body.touching_wall_left = true;
            if body.velocity.x < 0.0 {
                body.velocity.x = 0.0;
            }
        } else if transform.translation.x >= arena.wall_right_x {
            transform.translation.x = arena.wall_right_x;
            body.touching_wall_right = true;
            if body.velocity.x > 0.0 {
                body.velocity.x = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_integration_logic() {
        let tuning = MovementTuning::default();
        let mut body = Body::default();
        let dt = 1.0 / 60.0;

        // Кадр в воздухе: гравитация тянет вниз
        if !body.on_floor {
            body.velocity.y -= tuning.gravity * dt;
        }
        assert!((body.velocity.y + 20.0).abs() < 0.01, "vy = {}", body.velocity.y);
    }

    #[test]
    fn test_floor_contact_clamps() {
        let arena = Arena::default();
        let mut y = -5.0f32;
        let mut vy = -300.0f32;

        if y <= arena.floor_y {
            y = arena.floor_y;
            if vy < 0.0 {
                vy = 0.0;
            }
        }
        assert_eq!(y, arena.floor_y);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn test_wall_contact_flags() {
        let arena = Arena::default();
        let mut x = arena.wall_left_x - 10.0;
        let mut touching_left = false;

        if x <= arena.wall_left_x {
            x = arena.wall_left_x;
            touching_left = true;
        }
        assert!(touching_left);
        assert_eq!(x, arena.wall_left_x);
    }
}
