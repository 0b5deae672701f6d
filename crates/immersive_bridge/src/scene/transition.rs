//! Active scene tracking with optional timed transitions
//!
//! An immediate swap replaces the active root before the next draw. A timed
//! swap keeps both roots renderable for the transition's duration; the
//! engine does the interpolation and the outgoing root is detached once the
//! duration has elapsed. A swap requested while a transition is running
//! completes that transition first, so at most two roots are ever
//! renderable.

use std::time::Duration;

use crate::foundation::collections::{NodeHandle, SceneHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveScene {
    Idle(Option<SceneHandle>),
    Transitioning {
        outgoing: Option<SceneHandle>,
        incoming: SceneHandle,
        started: Duration,
        duration: Duration,
    },
}

impl ActiveScene {
    fn renderable(&self) -> Vec<SceneHandle> {
        match *self {
            Self::Idle(scene) => scene.into_iter().collect(),
            Self::Transitioning { outgoing, incoming, .. } => {
                outgoing.into_iter().chain(std::iter::once(incoming)).collect()
            }
        }
    }
}

/// A timed transition reached its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionCompleted {
    /// Root that is now the only active one
    pub active: SceneHandle,
    /// Root that stopped being renderable
    pub detached: Option<SceneHandle>,
}

/// Tracks the active scene root and camera anchor of one instance
#[derive(Debug, Clone)]
pub struct SceneTransitionManager {
    active: ActiveScene,
    point_of_view: Option<NodeHandle>,
}

impl SceneTransitionManager {
    /// No active scene, default camera
    pub fn new() -> Self {
        Self {
            active: ActiveScene::Idle(None),
            point_of_view: None,
        }
    }

    /// Root the instance is showing or transitioning to
    pub fn active(&self) -> Option<SceneHandle> {
        match self.active {
            ActiveScene::Idle(scene) => scene,
            ActiveScene::Transitioning { incoming, .. } => Some(incoming),
        }
    }

    /// Root being faded out, if a transition is running
    pub fn outgoing(&self) -> Option<SceneHandle> {
        match self.active {
            ActiveScene::Idle(_) => None,
            ActiveScene::Transitioning { outgoing, .. } => outgoing,
        }
    }

    /// Roots eligible for rendering, outgoing first
    pub fn renderable(&self) -> Vec<SceneHandle> {
        self.active.renderable()
    }

    /// Whether a timed transition is running
    pub fn is_transitioning(&self) -> bool {
        matches!(self.active, ActiveScene::Transitioning { .. })
    }

    /// Roots eligible for rendering at `now`, counting an elapsed
    /// transition as finished even before [`advance`](Self::advance) runs
    pub fn renderable_at(&self, now: Duration) -> Vec<SceneHandle> {
        self.settled(now).renderable()
    }

    /// Whether a timed transition is still running at `now`
    pub fn is_transitioning_at(&self, now: Duration) -> bool {
        matches!(self.settled(now), ActiveScene::Transitioning { .. })
    }

    /// Transition progress in `[0, 1]` at `now`
    pub fn progress(&self, now: Duration) -> Option<f32> {
        match self.active {
            ActiveScene::Idle(_) => None,
            ActiveScene::Transitioning { started, duration, .. } => {
                let elapsed = now.saturating_sub(started);
                Some((elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0))
            }
        }
    }

    /// Time left in the running transition at `now`
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        match self.active {
            ActiveScene::Idle(_) => None,
            ActiveScene::Transitioning { started, duration, .. } => {
                Some(duration.saturating_sub(now.saturating_sub(started)))
            }
        }
    }

    /// Make `scene` active immediately; `None` detaches without replacement
    ///
    /// Returns the roots that stopped being renderable.
    pub fn set_immediate(&mut self, scene: Option<SceneHandle>) -> Vec<SceneHandle> {
        self.replace(ActiveScene::Idle(scene))
    }

    /// Start a timed swap to `scene`
    ///
    /// A zero duration is an immediate swap. Swapping to the root already
    /// active (or already incoming) changes nothing. Returns the roots that
    /// stopped being renderable right away.
    pub fn begin_transition(
        &mut self,
        scene: SceneHandle,
        duration: Duration,
        now: Duration,
    ) -> Vec<SceneHandle> {
        if duration.is_zero() {
            return self.set_immediate(Some(scene));
        }

        let current = self.active();
        if current == Some(scene) {
            return Vec::new();
        }

        self.replace(ActiveScene::Transitioning {
            outgoing: current,
            incoming: scene,
            started: now,
            duration,
        })
    }

    /// Finish the running transition if its duration has elapsed at `now`
    pub fn advance(&mut self, now: Duration) -> Option<TransitionCompleted> {
        let ActiveScene::Transitioning {
            outgoing,
            incoming,
            started,
            duration,
        } = self.active
        else {
            return None;
        };

        if now.saturating_sub(started) < duration {
            return None;
        }

        self.active = ActiveScene::Idle(Some(incoming));
        Some(TransitionCompleted {
            active: incoming,
            detached: outgoing,
        })
    }

    /// Stop rendering `scene` wherever it appears
    ///
    /// If the incoming root of a transition is detached, the outgoing root
    /// stays active. Returns `true` if anything changed.
    pub fn detach(&mut self, scene: SceneHandle) -> bool {
        let next = match self.active {
            ActiveScene::Idle(Some(active)) if active == scene => ActiveScene::Idle(None),
            ActiveScene::Transitioning { outgoing, incoming, .. } if incoming == scene => {
                ActiveScene::Idle(outgoing)
            }
            ActiveScene::Transitioning {
                outgoing: Some(outgoing),
                incoming,
                started,
                duration,
            } if outgoing == scene => ActiveScene::Transitioning {
                outgoing: None,
                incoming,
                started,
                duration,
            },
            _ => return false,
        };
        self.active = next;
        true
    }

    /// Node driving the camera, or `None` for the default camera
    pub fn point_of_view(&self) -> Option<NodeHandle> {
        self.point_of_view
    }

    /// Rebind the camera; returns the previous anchor
    pub fn set_point_of_view(&mut self, node: Option<NodeHandle>) -> Option<NodeHandle> {
        std::mem::replace(&mut self.point_of_view, node)
    }

    /// Revert to the default camera if `node` is the anchor
    pub fn clear_point_of_view_if(&mut self, node: NodeHandle) -> bool {
        if self.point_of_view == Some(node) {
            self.point_of_view = None;
            true
        } else {
            false
        }
    }

    /// Forget every root and the camera anchor
    pub fn clear(&mut self) -> Vec<SceneHandle> {
        self.point_of_view = None;
        self.replace(ActiveScene::Idle(None))
    }

    fn settled(&self, now: Duration) -> ActiveScene {
        match self.active {
            ActiveScene::Transitioning {
                incoming,
                started,
                duration,
                ..
            } if now.saturating_sub(started) >= duration => ActiveScene::Idle(Some(incoming)),
            active => active,
        }
    }

    fn replace(&mut self, next: ActiveScene) -> Vec<SceneHandle> {
        let kept = next.renderable();
        let detached = self
            .active
            .renderable()
            .into_iter()
            .filter(|scene| !kept.contains(scene))
            .collect();
        self.active = next;
        detached
    }
}

impl Default for SceneTransitionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::collections::{HandleKind, HandleRegistry};

    fn scenes(count: usize) -> Vec<SceneHandle> {
        let mut registry = HandleRegistry::new(HandleKind::Scene);
        (0..count).map(|_| registry.register(())).collect()
    }

    #[test]
    fn test_immediate_swap_detaches_previous() {
        let s = scenes(2);
        let mut manager = SceneTransitionManager::new();

        assert!(manager.set_immediate(Some(s[0])).is_empty());
        assert_eq!(manager.set_immediate(Some(s[1])), vec![s[0]]);
        assert_eq!(manager.active(), Some(s[1]));
        assert_eq!(manager.renderable(), vec![s[1]]);

        assert_eq!(manager.set_immediate(None), vec![s[1]]);
        assert_eq!(manager.active(), None);
    }

    #[test]
    fn test_transition_keeps_both_roots_until_elapsed() {
        let s = scenes(2);
        let mut manager = SceneTransitionManager::new();
        manager.set_immediate(Some(s[0]));

        let detached = manager.begin_transition(s[1], Duration::from_secs(2), Duration::ZERO);
        assert!(detached.is_empty());
        assert_eq!(manager.renderable(), vec![s[0], s[1]]);
        assert_eq!(manager.active(), Some(s[1]));
        assert_eq!(manager.outgoing(), Some(s[0]));

        assert_eq!(manager.advance(Duration::from_secs(1)), None);
        assert_relative_eq!(manager.progress(Duration::from_secs(1)).unwrap(), 0.5);

        let completed = manager.advance(Duration::from_secs(2)).unwrap();
        assert_eq!(completed, TransitionCompleted { active: s[1], detached: Some(s[0]) });
        assert_eq!(manager.renderable(), vec![s[1]]);
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn test_elapsed_transition_reads_as_finished_before_advance() {
        let s = scenes(2);
        let mut manager = SceneTransitionManager::new();
        manager.set_immediate(Some(s[0]));
        manager.begin_transition(s[1], Duration::from_secs(2), Duration::ZERO);

        assert_eq!(manager.renderable_at(Duration::from_secs(1)), vec![s[0], s[1]]);
        assert!(manager.is_transitioning_at(Duration::from_secs(1)));

        let later = Duration::from_secs(10);
        assert_eq!(manager.renderable_at(later), vec![s[1]]);
        assert!(!manager.is_transitioning_at(later));
        assert_eq!(manager.active(), Some(s[1]));
        assert!(manager.is_transitioning());
    }

    #[test]
    fn test_transition_from_nothing_is_never_empty() {
        let s = scenes(1);
        let mut manager = SceneTransitionManager::new();

        manager.begin_transition(s[0], Duration::from_secs(2), Duration::ZERO);
        assert_eq!(manager.renderable(), vec![s[0]]);
        let completed = manager.advance(Duration::from_secs(3)).unwrap();
        assert_eq!(completed.detached, None);
    }

    #[test]
    fn test_new_swap_supersedes_running_transition() {
        let s = scenes(3);
        let mut manager = SceneTransitionManager::new();
        manager.set_immediate(Some(s[0]));
        manager.begin_transition(s[1], Duration::from_secs(2), Duration::ZERO);

        let detached =
            manager.begin_transition(s[2], Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(detached, vec![s[0]]);
        assert_eq!(manager.renderable(), vec![s[1], s[2]]);
        assert_relative_eq!(manager.progress(Duration::from_secs(1)).unwrap(), 0.0);

        let detached = manager.set_immediate(Some(s[0]));
        assert_eq!(detached, vec![s[1], s[2]]);
        assert_eq!(manager.renderable(), vec![s[0]]);
    }

    #[test]
    fn test_swap_to_current_scene_is_noop() {
        let s = scenes(2);
        let mut manager = SceneTransitionManager::new();
        manager.set_immediate(Some(s[0]));

        assert!(manager.begin_transition(s[0], Duration::from_secs(1), Duration::ZERO).is_empty());
        assert!(!manager.is_transitioning());

        manager.begin_transition(s[1], Duration::from_secs(1), Duration::ZERO);
        assert!(manager.begin_transition(s[1], Duration::from_secs(5), Duration::ZERO).is_empty());
        assert_eq!(manager.outgoing(), Some(s[0]));
    }

    #[test]
    fn test_zero_duration_is_immediate() {
        let s = scenes(2);
        let mut manager = SceneTransitionManager::new();
        manager.set_immediate(Some(s[0]));

        assert_eq!(manager.begin_transition(s[1], Duration::ZERO, Duration::ZERO), vec![s[0]]);
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn test_detach_during_transition() {
        let s = scenes(2);
        let mut manager = SceneTransitionManager::new();
        manager.set_immediate(Some(s[0]));
        manager.begin_transition(s[1], Duration::from_secs(2), Duration::ZERO);

        assert!(manager.detach(s[0]));
        assert_eq!(manager.renderable(), vec![s[1]]);
        assert!(manager.is_transitioning());

        assert!(manager.detach(s[1]));
        assert_eq!(manager.renderable(), Vec::new());
        assert!(!manager.detach(s[1]));
    }

    #[test]
    fn test_point_of_view_rebinding() {
        let mut nodes = HandleRegistry::new(HandleKind::Node);
        let camera: NodeHandle = nodes.register(());
        let other: NodeHandle = nodes.register(());
        let mut manager = SceneTransitionManager::new();

        assert_eq!(manager.set_point_of_view(Some(camera)), None);
        assert!(!manager.clear_point_of_view_if(other));
        assert!(manager.clear_point_of_view_if(camera));
        assert_eq!(manager.point_of_view(), None);
    }
}
