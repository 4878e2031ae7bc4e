// transition.rs — scene navigation with fade timing and back history
//
// Stable -> FadingOut -> (scene swapped) -> FadingIn -> Stable
//
// Timers are deadlines checked by `advance`; they are never cancelled. A second
// request while a transition is in flight is rejected instead.

use std::collections::HashSet;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Stable,
    FadingOut { target: String, until: Instant },
    FadingIn { from: Instant, until: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    /// The active scene is now this id; load it.
    SceneSwapped(String),
    /// The overlay is gone and input may resume.
    Settled,
}

#[derive(Debug, Clone)]
pub struct SceneNavigator {
    current: String,
    phase: Phase,
    started: Option<Instant>,
    history: Vec<String>,
    known: HashSet<String>,
    fade_out: Duration,
    fade_in: Duration,
}

impl SceneNavigator {
    pub fn new<I>(entry: impl Into<String>, known: I, fade_out: Duration, fade_in: Duration) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            current: entry.into(),
            phase: Phase::Stable,
            started: None,
            history: Vec::new(),
            known: known.into_iter().collect(),
            fade_out,
            fade_in,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != Phase::Stable
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty() && !self.is_transitioning()
    }

    pub fn set_known_scenes<I>(&mut self, known: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.known = known.into_iter().collect();
    }

    /// Forward navigation. No-op for the active scene, an unknown id, or while
    /// a transition is already running. Returns whether a transition started.
    pub fn handle_scene_change(&mut self, target: &str, now: Instant) -> bool {
        if !self.accepts(target) {
            return false;
        }
        self.history.push(self.current.clone());
        self.start(target, now);
        true
    }

    /// Pop the history and replay the transition without recording it.
    pub fn go_back(&mut self, now: Instant) -> bool {
        if self.is_transitioning() {
            return false;
        }
        let Some(target) = self.history.pop() else {
            return false;
        };
        if !self.accepts(&target) {
            log::warn!("dropping back entry for missing scene {target}");
            return false;
        }
        self.start(&target, now);
        true
    }

    /// Fire whichever deadline has passed.
    pub fn advance(&mut self, now: Instant) -> Option<NavEvent> {
        match &self.phase {
            Phase::Stable => None,
            Phase::FadingOut { target, until } if now >= *until => {
                let target = target.clone();
                self.current = target.clone();
                self.phase = Phase::FadingIn {
                    from: now,
                    until: now + self.fade_in,
                };
                Some(NavEvent::SceneSwapped(target))
            }
            Phase::FadingIn { until, .. } if now >= *until => {
                self.phase = Phase::Stable;
                self.started = None;
                Some(NavEvent::Settled)
            }
            _ => None,
        }
    }

    /// Opacity of the black overlay in `[0, 1]`.
    pub fn overlay_alpha(&self, now: Instant) -> f32 {
        match &self.phase {
            Phase::Stable => 0.0,
            Phase::FadingOut { until, .. } => {
                let start = self.started.unwrap_or(now);
                ratio(now.saturating_duration_since(start), until.saturating_duration_since(start))
            }
            Phase::FadingIn { from, until } => {
                1.0 - ratio(now.saturating_duration_since(*from), until.saturating_duration_since(*from))
            }
        }
    }

    fn accepts(&self, target: &str) -> bool {
        if self.is_transitioning() || target == self.current {
            return false;
        }
        if !self.known.contains(target) {
            log::warn!("ignoring navigation to unknown scene {target}");
            return false;
        }
        true
    }

    fn start(&mut self, target: &str, now: Instant) {
        self.started = Some(now);
        self.phase = Phase::FadingOut {
            target: target.to_string(),
            until: now + self.fade_out,
        };
    }
}

fn ratio(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}
