use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::flatten::EdgePath;
use crate::point::Point;

/// Values which can be blended between two states.
pub trait Interpolate: Copy {
    #[must_use]
    fn interpolate(self, to: Self, t: f64) -> Self;
}

impl Interpolate for Point {
    fn interpolate(self, to: Self, t: f64) -> Self {
        self.lerp(to, t)
    }
}

impl Interpolate for EdgePath {
    fn interpolate(self, to: Self, t: f64) -> Self {
        Self {
            source: self.source.lerp(to.source, t),
            target: self.target.lerp(to.target, t),
        }
    }
}

/// Symmetric cubic easing, slow at both ends.
#[must_use]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        t.mul_add(t * t, 2.0) / 2.0
    }
}

/// Interpolation of one element from a start to an end value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<V> {
    pub from: V,
    pub to: V,
    pub start: Instant,
    pub duration: Duration,
}

impl<V: Interpolate> Transition<V> {
    /// Linear progress in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    #[must_use]
    pub fn value_at(&self, now: Instant) -> V {
        self.from
            .interpolate(self.to, ease_cubic_in_out(self.progress(now)))
    }

    #[must_use]
    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

#[derive(Debug, Clone)]
struct Tracked<V, M> {
    key: String,
    meta: M,
    transition: Transition<V>,
    /// Drop once the transition finished
    exiting: bool,
}

/// Running transitions, one per identity key, in draw order.
///
/// Starting a transition for a key which is still moving replaces the old one.
/// `M` is whatever the renderer needs to draw the element besides its animated value.
#[derive(Debug, Clone)]
pub struct Transitions<V, M = ()> {
    items: Vec<Tracked<V, M>>,
    by_key: HashMap<String, usize>,
}

impl<V, M> Default for Transitions<V, M> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<V: Interpolate, M> Transitions<V, M> {
    /// Current value of `key`, if it is tracked.
    #[must_use]
    pub fn value(&self, key: &str, now: Instant) -> Option<V> {
        let position = *self.by_key.get(key)?;
        Some(self.items[position].transition.value_at(now))
    }

    /// Start (or restart) the transition of `key`.
    pub fn start(&mut self, key: &str, meta: M, transition: Transition<V>, exiting: bool) {
        let tracked = Tracked {
            key: key.to_owned(),
            meta,
            transition,
            exiting,
        };
        if let Some(&position) = self.by_key.get(key) {
            self.items[position] = tracked;
        } else {
            self.by_key.insert(key.to_owned(), self.items.len());
            self.items.push(tracked);
        }
    }

    /// Like [`start`](Self::start) but begins wherever `key` currently is.
    ///
    /// `transition.from` is only used for keys which are not tracked yet.
    pub fn retarget(&mut self, key: &str, meta: M, mut transition: Transition<V>, exiting: bool) {
        if let Some(current) = self.value(key, transition.start) {
            transition.from = current;
        }
        self.start(key, meta, transition, exiting);
    }

    /// Remove the exiting elements which arrived.
    ///
    /// Returns the number of removed elements.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items
            .retain(|tracked| !(tracked.exiting && tracked.transition.is_finished(now)));
        if self.items.len() != before {
            self.by_key = self
                .items
                .iter()
                .enumerate()
                .map(|(position, tracked)| (tracked.key.clone(), position))
                .collect();
        }
        before - self.items.len()
    }

    /// Whether any element is still moving.
    #[must_use]
    pub fn is_animating(&self, now: Instant) -> bool {
        self.items
            .iter()
            .any(|tracked| !tracked.transition.is_finished(now))
    }

    /// Sample every element: key, metadata, current value and whether it is on its way out.
    pub fn sample(&self, now: Instant) -> impl Iterator<Item = (&str, &M, V, bool)> + '_ {
        self.items.iter().map(move |tracked| {
            (
                tracked.key.as_str(),
                &tracked.meta,
                tracked.transition.value_at(now),
                tracked.exiting,
            )
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: Duration = Duration::from_millis(500);

    fn transition(start: Instant, from: f64, to: f64) -> Transition<Point> {
        Transition {
            from: Point::new(from, 0.0),
            to: Point::new(to, 0.0),
            start,
            duration: DURATION,
        }
    }

    #[test]
    fn easing_is_symmetric() {
        assert!(ease_cubic_in_out(0.0).abs() < f64::EPSILON);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < f64::EPSILON);
        assert!((ease_cubic_in_out(1.0) - 1.0).abs() < f64::EPSILON);
        let quarter = ease_cubic_in_out(0.25);
        assert!((quarter + ease_cubic_in_out(0.75) - 1.0).abs() < 1e-12);
        assert!(quarter < 0.25);
    }

    #[test]
    fn transition_reaches_target() {
        let start = Instant::now();
        let transition = transition(start, 0.0, 100.0);
        assert_eq!(transition.value_at(start), Point::new(0.0, 0.0));
        assert_eq!(transition.value_at(start + DURATION / 2), Point::new(50.0, 0.0));
        assert!(!transition.is_finished(start + DURATION / 2));
        assert_eq!(transition.value_at(start + DURATION * 2), Point::new(100.0, 0.0));
        assert!(transition.is_finished(start + DURATION));
    }

    #[test]
    fn zero_duration_jumps() {
        let start = Instant::now();
        let mut transition = transition(start, 0.0, 100.0);
        transition.duration = Duration::ZERO;
        assert_eq!(transition.value_at(start), Point::new(100.0, 0.0));
    }

    #[test]
    fn restarting_continues_from_current_value() {
        let start = Instant::now();
        let mut transitions = Transitions::<Point>::default();
        transitions.start("a", (), transition(start, 0.0, 100.0), false);

        let halfway = start + DURATION / 2;
        transitions.retarget("a", (), transition(halfway, -1.0, 0.0), false);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions.value("a", halfway), Some(Point::new(50.0, 0.0)));
        assert_eq!(
            transitions.value("a", halfway + DURATION),
            Some(Point::new(0.0, 0.0))
        );
    }

    #[test]
    fn retarget_unknown_key_uses_from() {
        let start = Instant::now();
        let mut transitions = Transitions::<Point>::default();
        transitions.retarget("a", (), transition(start, 7.0, 9.0), false);
        assert_eq!(transitions.value("a", start), Some(Point::new(7.0, 0.0)));
    }

    #[test]
    fn prune_drops_only_finished_exits() {
        let start = Instant::now();
        let mut transitions = Transitions::<Point>::default();
        transitions.start("stays", (), transition(start, 0.0, 1.0), false);
        transitions.start("leaves", (), transition(start, 0.0, 1.0), true);
        transitions.start("after", (), transition(start, 0.0, 1.0), false);

        assert_eq!(transitions.prune(start + DURATION / 2), 0);
        assert!(transitions.is_animating(start + DURATION / 2));
        assert_eq!(transitions.prune(start + DURATION), 1);
        assert!(!transitions.is_animating(start + DURATION));

        let keys = transitions
            .sample(start + DURATION)
            .map(|(key, _, _, _)| key)
            .collect::<Vec<_>>();
        assert_eq!(keys, ["stays", "after"]);
        assert!(transitions.value("after", start).is_some());
        assert!(transitions.value("leaves", start).is_none());
    }
}
