//! Deferred continuations ("wait, then do X") as plain components.

use crate::animations::Playhead;
use crate::gameflow::{GameplaySet, SceneRequest};
use crate::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Wait {
    Seconds(Timer),
    /// Until the entity's current one-shot clip reports finished.
    AnimationFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Then {
    ReloadLevel,
    ReturnToMenu,
    Despawn,
}

#[derive(Component, Debug, Clone)]
pub struct PendingSequence {
    pub wait: Wait,
    pub then: Then,
}

impl PendingSequence {
    pub fn after_seconds(seconds: f32, then: Then) -> Self {
        Self {
            wait: Wait::Seconds(Timer::from_seconds(seconds, TimerMode::Once)),
            then,
        }
    }

    pub fn after_animation(then: Then) -> Self {
        Self {
            wait: Wait::AnimationFinished,
            then,
        }
    }

    /// Returns the continuation once the wait condition is met.
    pub fn poll(&mut self, delta: Duration, animation_finished: bool) -> Option<Then> {
        let done = match &mut self.wait {
            Wait::Seconds(timer) => timer.tick(delta).finished(),
            Wait::AnimationFinished => animation_finished,
        };
        done.then_some(self.then)
    }
}

pub struct SequencePlugin;

impl Plugin for SequencePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, run_sequences.in_set(GameplaySet::Cleanup));
    }
}

fn run_sequences(
    time: Res<Time>,
    mut commands: Commands,
    mut scene: EventWriter<SceneRequest>,
    mut q: Query<(Entity, &mut PendingSequence, Option<&Playhead>)>,
) {
    for (e, mut seq, head) in &mut q {
        let finished = head.is_some_and(|h| h.view().finished);
        let Some(then) = seq.poll(time.delta(), finished) else {
            continue;
        };
        match then {
            Then::ReloadLevel => {
                scene.write(SceneRequest::ReloadLevel);
                commands.entity(e).remove::<PendingSequence>();
            }
            Then::ReturnToMenu => {
                scene.write(SceneRequest::MainMenu);
                commands.entity(e).remove::<PendingSequence>();
            }
            Then::Despawn => {
                commands.entity(e).try_despawn();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_sequence_completes_after_duration() {
        let mut seq = PendingSequence::after_seconds(1.0, Then::ReloadLevel);
        assert_eq!(seq.poll(Duration::from_millis(600), true), None);
        assert_eq!(seq.poll(Duration::from_millis(600), false), Some(Then::ReloadLevel));
    }

    #[test]
    fn animation_sequence_waits_for_clip() {
        let mut seq = PendingSequence::after_animation(Then::Despawn);
        assert_eq!(seq.poll(Duration::from_secs(5), false), None);
        assert_eq!(seq.poll(Duration::ZERO, true), Some(Then::Despawn));
    }
}
