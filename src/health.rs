use bevy::prelude::*;
use std::time::Duration;

/// How long an actor shows as "taking damage" after a non-lethal hit.
pub const HURT_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    Survived(f32),
    Died,
    /// The entity was already dead; nothing changed.
    Ignored,
}

#[derive(Component, Debug, Clone)]
pub struct Health {
    current: f32,
    max: f32,
    dead: bool,
    hurt: Option<Timer>,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            dead: false,
            hurt: None,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_hurt(&self) -> bool {
        self.hurt.is_some()
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    /// `amount` is expected to be non-negative.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored;
        }

        if self.current - amount <= 0.0 {
            self.current = 0.0;
            self.dead = true;
            self.hurt = None;
            return DamageOutcome::Died;
        }

        self.current -= amount;
        // A new hit restarts the window instead of stacking.
        self.hurt = Some(Timer::from_seconds(HURT_SECONDS, TimerMode::Once));
        DamageOutcome::Survived(self.current)
    }

    /// Instant death regardless of remaining health (dead zones).
    pub fn kill(&mut self) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored;
        }
        self.current = 0.0;
        self.dead = true;
        self.hurt = None;
        DamageOutcome::Died
    }

    pub fn heal(&mut self, amount: f32) {
        if self.dead {
            return;
        }
        self.current = (self.current + amount).min(self.max);
    }

    pub fn tick(&mut self, delta: Duration) {
        if let Some(timer) = self.hurt.as_mut() {
            timer.tick(delta);
            if timer.finished() {
                self.hurt = None;
            }
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Mana {
    current: f32,
    max: f32,
}

impl Mana {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current - cost >= 0.0
    }

    pub fn spend(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= cost;
        true
    }

    pub fn restore(&mut self, amount: f32) {
        self.current = (self.current + amount).clamp(0.0, self.max);
    }
}

/// Terminal flag. Once inserted, movement and behavior updates stop for good.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Dying;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_below_health_survives_with_remainder() {
        let mut h = Health::new(100.0);
        assert_eq!(h.apply_damage(30.0), DamageOutcome::Survived(70.0));
        assert_eq!(h.current(), 70.0);
        assert!(h.is_hurt());
    }

    #[test]
    fn damage_equal_to_health_dies() {
        let mut h = Health::new(10.0);
        assert_eq!(h.apply_damage(10.0), DamageOutcome::Died);
        assert_eq!(h.current(), 0.0);
        assert!(h.is_dead());
    }

    #[test]
    fn overkill_clamps_and_dies_exactly_once() {
        let mut h = Health::new(10.0);
        assert_eq!(h.apply_damage(15.0), DamageOutcome::Died);
        assert_eq!(h.apply_damage(15.0), DamageOutcome::Ignored);
        assert_eq!(h.current(), 0.0);
    }

    #[test]
    fn dead_entities_ignore_damage_heal_and_kill() {
        let mut h = Health::new(5.0);
        h.kill();
        assert_eq!(h.apply_damage(1.0), DamageOutcome::Ignored);
        assert_eq!(h.kill(), DamageOutcome::Ignored);
        h.heal(50.0);
        assert_eq!(h.current(), 0.0);
    }

    #[test]
    fn health_stays_in_bounds_for_many_values() {
        for max in [1.0_f32, 5.0, 50.0, 100.0] {
            for step in 0..=20 {
                let start = max * step as f32 / 20.0;
                let mut h = Health::new(max);
                if start < max {
                    let _ = h.apply_damage(max - start);
                }
                let before = h.current();
                for dmg in [0.0_f32, 0.5, before, before + 1.0] {
                    let mut probe = h.clone();
                    let outcome = probe.apply_damage(dmg);
                    assert!(probe.current() >= 0.0 && probe.current() <= probe.max());
                    if probe.is_dead() && !h.is_dead() {
                        assert!(dmg >= before);
                        assert_eq!(outcome, DamageOutcome::Died);
                    } else if !h.is_dead() {
                        assert_eq!(outcome, DamageOutcome::Survived(before - dmg));
                    }
                }
            }
        }
    }

    #[test]
    fn hurt_window_clears_after_duration() {
        let mut h = Health::new(20.0);
        h.apply_damage(1.0);
        h.tick(Duration::from_secs_f32(0.3));
        assert!(h.is_hurt());
        h.tick(Duration::from_secs_f32(0.3));
        assert!(!h.is_hurt());
    }

    #[test]
    fn second_hit_restarts_hurt_window() {
        let mut h = Health::new(20.0);
        h.apply_damage(1.0);
        h.tick(Duration::from_secs_f32(0.4));
        h.apply_damage(1.0);
        h.tick(Duration::from_secs_f32(0.4));
        assert!(h.is_hurt());
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut h = Health::new(100.0);
        h.apply_damage(10.0);
        h.heal(20.0);
        assert_eq!(h.current(), 100.0);
    }

    #[test]
    fn mana_gate_and_clamp() {
        let mut m = Mana::new(100.0);
        assert!(m.spend(60.0));
        assert!(!m.spend(60.0));
        assert_eq!(m.current(), 40.0);
        assert!(m.spend(40.0));
        m.restore(500.0);
        assert_eq!(m.current(), 100.0);
    }
}
