//! Data-driven enemy controller.
//!
//! Every enemy carries the same [`EnemyBrain`]; what differs between a
//! goblin, a skeleton archer and the balrog is the [`EnemyProfile`] it was
//! built with. The brain holds what the enemy perceived (region events, the
//! player jumping) and the attack cycle. Choosing between patrol, chase and
//! attack is left to the big-brain thinker in `enemy.rs`, which asks the
//! brain through [`EnemyBrain::engaged`], [`EnemyBrain::ready_to_attack`],
//! [`EnemyBrain::chase`], [`EnemyBrain::patrol`] and [`EnemyBrain::swing`].

use crate::animations::{AnimationView, Clip};
use crate::kinds::EnemyKind;
use crate::prelude::*;
use crate::regions::RegionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum AttackStyle {
    Melee,
    Ranged {
        projectile_speed: f32,
        /// Horizontal distance from the body where shots appear.
        spawn_offset: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    None,
    /// A sensor around the enemy itself.
    Vision,
    /// A separate arena region owned by the enemy.
    Arena,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PatrolRoute {
    Stationary,
    Radius { radius: f32 },
    Home { tolerance: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathEffect {
    Despawn,
    ReturnToMenu,
}

/// Complete stat block of one enemy kind. Config files override single
/// fields on top of [`EnemyProfile::for_kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub max_health: f32,
    pub damage: f32,
    pub attack: AttackStyle,
    pub impact_frame: usize,
    pub attack_cooldown: f32,
    pub speed: f32,
    pub jump_velocity: f32,
    pub mirrors_player_jump: bool,
    pub hops_walls: bool,
    pub detection: Detection,
    pub patrol: PatrolRoute,
    pub faces_left: bool,
    pub death: DeathEffect,
}

impl EnemyProfile {
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Goblin => Self::goblin(),
            EnemyKind::Skeleton => Self::skeleton(),
            EnemyKind::Balrog => Self::balrog(),
        }
    }

    pub fn goblin() -> Self {
        Self {
            max_health: 10.0,
            damage: 15.0,
            attack: AttackStyle::Melee,
            impact_frame: 4,
            attack_cooldown: 0.4,
            speed: 100.0,
            jump_velocity: 400.0,
            mirrors_player_jump: true,
            hops_walls: true,
            detection: Detection::Vision,
            patrol: PatrolRoute::Radius { radius: 80.0 },
            faces_left: false,
            death: DeathEffect::Despawn,
        }
    }

    pub fn skeleton() -> Self {
        Self {
            max_health: 5.0,
            damage: 10.0,
            attack: AttackStyle::Ranged {
                projectile_speed: 800.0,
                spawn_offset: 30.0,
            },
            impact_frame: 1,
            attack_cooldown: 1.0,
            speed: 0.0,
            jump_velocity: 300.0,
            mirrors_player_jump: true,
            hops_walls: false,
            detection: Detection::Vision,
            patrol: PatrolRoute::Stationary,
            faces_left: false,
            death: DeathEffect::Despawn,
        }
    }

    pub fn balrog() -> Self {
        Self {
            max_health: 50.0,
            damage: 50.0,
            attack: AttackStyle::Melee,
            impact_frame: 5,
            attack_cooldown: 0.8,
            speed: 80.0,
            jump_velocity: 0.0,
            mirrors_player_jump: false,
            hops_walls: false,
            detection: Detection::Arena,
            patrol: PatrolRoute::Home { tolerance: 5.0 },
            faces_left: true,
            death: DeathEffect::ReturnToMenu,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_detect: self.detection != Detection::None,
            can_attack: self.damage > 0.0,
            can_patrol: self.patrol != PatrolRoute::Stationary && self.speed > 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_detect: bool,
    pub can_attack: bool,
    pub can_patrol: bool,
}

/// Fires once per attack cycle, on the first observed attack frame at or past
/// the impact frame. Re-arms when the clip leaves `Attack` or rewinds below
/// the impact frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImpactLatch {
    fired: bool,
}

impl ImpactLatch {
    pub fn observe(&mut self, view: AnimationView, impact_frame: usize) -> bool {
        if view.clip != Clip::Attack || view.frame < impact_frame {
            self.fired = false;
            return false;
        }
        if self.fired {
            return false;
        }
        self.fired = true;
        true
    }

    pub fn rearm(&mut self) {
        self.fired = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub origin: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub target: Entity,
    pub damage: f32,
}

/// Horizontal intent for one tick of patrolling or chasing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub vx: f32,
    pub clip: Clip,
    pub facing_right: Option<bool>,
}

impl Motion {
    fn still(facing_right: Option<bool>) -> Self {
        Self {
            vx: 0.0,
            clip: Clip::Idle,
            facing_right,
        }
    }

    fn walking(vx: f32) -> Self {
        Self {
            vx,
            clip: Clip::Walk,
            facing_right: (vx != 0.0).then_some(vx > 0.0),
        }
    }
}

/// One tick of an attack in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Swing {
    pub strike: Option<Strike>,
    pub projectile: Option<EnemyShot>,
    pub facing_right: Option<bool>,
    /// The attack clip ran out; the cooldown has started.
    pub finished: bool,
}

fn facing(position: Vec2, at: Vec2) -> Option<bool> {
    let dx = at.x - position.x;
    (dx.abs() > f32::EPSILON).then_some(dx > 0.0)
}

#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    profile: EnemyProfile,
    caps: Capabilities,
    spawn: Vec2,
    target: Option<Entity>,
    in_vision: bool,
    in_attack: bool,
    holding: bool,
    attacking: bool,
    cooldown: f32,
    latch: ImpactLatch,
    pending_jump: bool,
    patrol_dir: f32,
    dead: bool,
}

impl EnemyBrain {
    pub fn new(profile: EnemyProfile, spawn: Vec2) -> Self {
        let caps = profile.capabilities();
        Self {
            profile,
            caps,
            spawn,
            target: None,
            in_vision: false,
            in_attack: false,
            holding: false,
            attacking: false,
            cooldown: 0.0,
            latch: ImpactLatch::default(),
            pending_jump: false,
            patrol_dir: 1.0,
            dead: false,
        }
    }

    pub fn profile(&self) -> &EnemyProfile {
        &self.profile
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn on_region_entered(&mut self, region: RegionKind, target: Entity) {
        if self.dead {
            return;
        }
        match region {
            RegionKind::Vision | RegionKind::Arena if self.caps.can_detect => {
                self.in_vision = true;
                self.target = Some(target);
                self.holding = false;
            }
            RegionKind::Attack => {
                self.in_attack = true;
                self.target.get_or_insert(target);
            }
            _ => {}
        }
    }

    pub fn on_region_exited(&mut self, region: RegionKind, target: Entity) {
        if self.target.is_some_and(|t| t != target) {
            return;
        }
        match region {
            RegionKind::Vision | RegionKind::Arena => {
                self.in_vision = false;
                self.in_attack = false;
            }
            RegionKind::Attack => self.in_attack = false,
            _ => {}
        }
    }

    pub fn on_player_jumped(&mut self) {
        if !self.dead && self.profile.mirrors_player_jump && self.in_vision {
            self.pending_jump = true;
        }
    }

    /// Per-tick bookkeeping before any decision: the attack cooldown runs
    /// down, and a tracked target whose position no longer resolves is
    /// dropped.
    pub fn perceive(&mut self, dt: f32, target_at: Option<Vec2>) {
        self.cooldown = (self.cooldown - dt).max(0.0);
        if self.target.is_some() && target_at.is_none() {
            self.lose_target();
        }
    }

    /// Drops the tracked target; the brain holds still until it is seen again.
    pub fn lose_target(&mut self) {
        if self.target.take().is_some() {
            log::debug!("enemy lost its target; holding position");
        }
        self.in_vision = false;
        self.in_attack = false;
        self.attacking = false;
        self.holding = true;
    }

    pub fn kill(&mut self) {
        self.dead = true;
        self.attacking = false;
        self.pending_jump = false;
        self.in_vision = false;
        self.in_attack = false;
    }

    /// A live target is in sight.
    pub fn engaged(&self, target_at: Option<Vec2>) -> bool {
        !self.dead
            && self.caps.can_detect
            && self.in_vision
            && self.target.is_some()
            && target_at.is_some()
    }

    pub fn ready_to_attack(&self, target_at: Option<Vec2>) -> bool {
        let in_range = match self.profile.attack {
            AttackStyle::Melee => self.in_attack,
            AttackStyle::Ranged { .. } => self.in_vision,
        };
        self.engaged(target_at) && in_range && self.caps.can_attack && self.cooldown <= 0.0
    }

    pub fn begin_attack(&mut self) {
        if self.dead {
            return;
        }
        self.attacking = true;
        self.latch.rearm();
    }

    /// Gives up a swing without starting the cooldown.
    pub fn abort_attack(&mut self) {
        self.attacking = false;
    }

    /// Advances the attack in progress against the clip the enemy shows.
    pub fn swing(&mut self, position: Vec2, target_at: Option<Vec2>, view: AnimationView) -> Swing {
        let mut swing = Swing {
            facing_right: target_at.and_then(|at| facing(position, at)),
            ..default()
        };
        if self.dead || !self.attacking {
            swing.finished = true;
            return swing;
        }

        if self.latch.observe(view, self.profile.impact_frame) {
            self.resolve_impact(position, target_at, &mut swing);
        }
        if view.clip == Clip::Attack && view.finished {
            self.attacking = false;
            self.cooldown = self.profile.attack_cooldown;
            swing.finished = true;
        }
        swing
    }

    pub fn chase(&self, position: Vec2, at: Vec2) -> Motion {
        let dx = at.x - position.x;
        if self.profile.speed > 0.0 && dx.abs() > 1.0 {
            Motion {
                facing_right: facing(position, at),
                ..Motion::walking(dx.signum() * self.profile.speed)
            }
        } else {
            Motion::still(facing(position, at))
        }
    }

    pub fn patrol(&mut self, position: Vec2) -> Motion {
        if self.dead || self.holding || !self.caps.can_patrol {
            return Motion::still(None);
        }
        let x = position.x;
        match self.profile.patrol {
            PatrolRoute::Stationary => Motion::still(None),
            PatrolRoute::Radius { radius } => {
                if x <= self.spawn.x - radius {
                    self.patrol_dir = 1.0;
                } else if x >= self.spawn.x + radius {
                    self.patrol_dir = -1.0;
                }
                Motion::walking(self.patrol_dir * self.profile.speed)
            }
            PatrolRoute::Home { tolerance } => {
                let dx = self.spawn.x - x;
                if dx.abs() <= tolerance {
                    Motion::still(None)
                } else {
                    Motion::walking(dx.signum() * self.profile.speed)
                }
            }
        }
    }

    /// Upward velocity to apply this tick: a mirrored player jump, or a hop
    /// when walking into a wall.
    pub fn vertical_kick(&mut self, grounded: bool, wall_ahead: bool, vx: f32) -> Option<f32> {
        if self.dead {
            self.pending_jump = false;
            return None;
        }
        if std::mem::take(&mut self.pending_jump) {
            return Some(self.profile.jump_velocity);
        }
        (self.profile.hops_walls && wall_ahead && grounded && vx != 0.0)
            .then_some(self.profile.jump_velocity)
    }

    /// Sprite flip for a facing direction; sheets drawn facing left invert it.
    pub fn flip_for(&self, facing_right: bool) -> bool {
        if self.profile.faces_left {
            facing_right
        } else {
            !facing_right
        }
    }

    fn resolve_impact(&self, position: Vec2, target_at: Option<Vec2>, swing: &mut Swing) {
        let target = self.target.zip(target_at);
        match self.profile.attack {
            AttackStyle::Melee => {
                if let (true, Some((entity, _))) = (self.in_attack, target) {
                    swing.strike = Some(Strike {
                        target: entity,
                        damage: self.profile.damage,
                    });
                }
            }
            AttackStyle::Ranged {
                projectile_speed,
                spawn_offset,
            } => {
                let Some((_, at)) = target else {
                    return;
                };
                let side = if at.x >= position.x { 1.0 } else { -1.0 };
                let origin = position + Vec2::new(side * spawn_offset, 0.0);
                let direction = (at - origin).normalize_or_zero();
                if direction == Vec2::ZERO {
                    return;
                }
                swing.projectile = Some(EnemyShot {
                    origin,
                    direction,
                    speed: projectile_speed,
                    damage: self.profile.damage,
                });
            }
        }
    }
}
