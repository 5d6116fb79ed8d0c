//! Page transitions.
//!
//! A cover element slides in over the current view, navigation happens
//! behind it, and it slides back out once the destination is mounted. The
//! [`TransitionController`] owns the only copy of the transition state and
//! tells subscribers about every change. The cover, the navigator and the
//! post-title hover markers are collaborators behind small traits so the
//! same controller drives the DOM on the web and the overlay natively.

use crate::{
    error::{SceneError, SceneResult},
    tween::{Ease, TweenId, Tweens},
    uniforms::parse_hex,
};

pub const COVER_IN_SECONDS: f32 = 0.8;
pub const COVER_OUT_SECONDS: f32 = 0.3;
pub const HOVER_SECONDS: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    CoverIn,
    Navigating,
    CoverOut,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning { destination: String, phase: Phase },
}

impl TransitionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TransitionState::Idle)
    }
}

/// Animated properties of the cover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverStyle {
    pub x_percent: f32,
    pub opacity: f32,
    /// Blur radius in px.
    pub blur: f32,
    pub radius_rem: f32,
    /// sRGB, straight alpha.
    pub background: [f32; 4],
}

impl Default for CoverStyle {
    fn default() -> Self {
        Self {
            x_percent: -100.0,
            opacity: 1.0,
            blur: 3.0,
            radius_rem: 0.0,
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

pub trait CoverSurface {
    /// False while the cover element is not mounted.
    fn exists(&self) -> bool;
    fn apply(&mut self, style: &CoverStyle);
}

pub trait Navigator {
    fn navigate(&mut self, destination: &str);
}

pub trait TitleMarkers {
    fn set_hover(&mut self, hovered: bool);
}

impl<T: CoverSurface + ?Sized> CoverSurface for Box<T> {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn apply(&mut self, style: &CoverStyle) {
        (**self).apply(style)
    }
}

impl<T: Navigator + ?Sized> Navigator for Box<T> {
    fn navigate(&mut self, destination: &str) {
        (**self).navigate(destination)
    }
}

impl<T: TitleMarkers + ?Sized> TitleMarkers for Box<T> {
    fn set_hover(&mut self, hovered: bool) {
        (**self).set_hover(hovered)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Prop {
    X,
    Opacity,
    Blur,
    Radius,
    Red,
    Green,
    Blue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

type Subscriber = Box<dyn FnMut(&TransitionState)>;

pub struct TransitionController<C, N, T> {
    cover: C,
    navigator: N,
    titles: T,
    state: TransitionState,
    style: CoverStyle,
    tweens: Tweens<Prop>,
    cover_in: Option<TweenId>,
    cover_out: Option<TweenId>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u32,
}

impl<C, N, T> TransitionController<C, N, T>
where
    C: CoverSurface,
    N: Navigator,
    T: TitleMarkers,
{
    pub fn new(cover: C, navigator: N, titles: T) -> Self {
        Self {
            cover,
            navigator,
            titles,
            state: TransitionState::Idle,
            style: CoverStyle::default(),
            tweens: Tweens::new(),
            cover_in: None,
            cover_out: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn style(&self) -> &CoverStyle {
        &self.style
    }

    pub fn cover(&self) -> &C {
        &self.cover
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn titles(&self) -> &T {
        &self.titles
    }

    /// True while the cover is animating.
    pub fn is_animating(&self) -> bool {
        !self.tweens.is_empty()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&TransitionState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    fn set_state(&mut self, state: TransitionState) {
        if self.state == state {
            return;
        }
        log::debug!("transition: {:?} -> {:?}", self.state, state);
        self.state = state;
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.state);
        }
    }

    /// Slides the cover in and navigates to `destination` once it covers the
    /// view. Rejected while another transition is in flight.
    pub fn transition_in(&mut self, destination: &str) -> SceneResult<()> {
        if let TransitionState::Transitioning { destination, .. } = &self.state {
            return Err(SceneError::TransitionInFlight(destination.clone()));
        }
        self.style.x_percent = -100.0;
        self.cover.apply(&self.style);
        let id = self.tweens.start(
            [
                (Prop::X, -100.0, 0.0),
                (Prop::Opacity, self.style.opacity, 1.0),
                (Prop::Blur, self.style.blur, 0.0),
            ],
            COVER_IN_SECONDS,
            Ease::Linear,
        );
        self.cover_in = Some(id);
        self.set_state(TransitionState::Transitioning {
            destination: destination.to_string(),
            phase: Phase::CoverIn,
        });
        Ok(())
    }

    /// Slides the cover back out after the destination mounted. A no-op
    /// unless the controller is waiting for the mount.
    pub fn transition_out(&mut self) -> bool {
        let destination = match &self.state {
            TransitionState::Transitioning {
                destination,
                phase: Phase::Navigating,
            } => destination.clone(),
            _ => return false,
        };
        let id = self.tweens.start(
            [
                (Prop::X, self.style.x_percent, -99.0),
                (Prop::Blur, self.style.blur, 3.0),
            ],
            COVER_OUT_SECONDS,
            Ease::Power1Out,
        );
        self.cover_out = Some(id);
        self.set_state(TransitionState::Transitioning {
            destination,
            phase: Phase::CoverOut,
        });
        true
    }

    pub fn hover_in(&mut self, colour: &str) {
        if self.state.is_idle() && self.cover.exists() {
            let [r, g, b] = parse_hex(colour).unwrap_or_else(|err| {
                log::warn!("{}", err);
                let [r, g, b, _] = self.style.background;
                [r, g, b]
            });
            let [from_r, from_g, from_b, _] = self.style.background;
            self.tweens.start(
                [
                    (Prop::X, self.style.x_percent, -98.5),
                    (Prop::Radius, self.style.radius_rem, 0.5),
                    (Prop::Red, from_r, r),
                    (Prop::Green, from_g, g),
                    (Prop::Blue, from_b, b),
                ],
                HOVER_SECONDS,
                Ease::Linear,
            );
        }
        self.titles.set_hover(true);
    }

    pub fn hover_out(&mut self) {
        if self.state.is_idle() && self.cover.exists() {
            self.tweens.start(
                [
                    (Prop::X, self.style.x_percent, -99.5),
                    (Prop::Radius, self.style.radius_rem, 0.0),
                ],
                HOVER_SECONDS,
                Ease::Linear,
            );
        }
        self.titles.set_hover(false);
    }

    /// Advances the cover tweens by `dt` seconds and runs completions.
    pub fn tick(&mut self, dt: f32) {
        if self.tweens.is_empty() {
            return;
        }
        let style = &mut self.style;
        let finished = self.tweens.tick(dt, |prop, value| match prop {
            Prop::X => style.x_percent = value,
            Prop::Opacity => style.opacity = value,
            Prop::Blur => style.blur = value,
            Prop::Radius => style.radius_rem = value,
            Prop::Red => style.background[0] = value,
            Prop::Green => style.background[1] = value,
            Prop::Blue => style.background[2] = value,
        });
        if self.cover.exists() {
            self.cover.apply(&self.style);
        }

        if let Some(id) = self.cover_in.filter(|id| finished.contains(id)) {
            self.cover_in = None;
            if let TransitionState::Transitioning { destination, .. } = self.state.clone() {
                self.set_state(TransitionState::Transitioning {
                    destination: destination.clone(),
                    phase: Phase::Navigating,
                });
                log::info!("navigating to {} ({:?})", destination, id);
                self.navigator.navigate(&destination);
            }
        }
        if self.cover_out.is_some_and(|id| finished.contains(&id)) {
            self.cover_out = None;
            self.set_state(TransitionState::Idle);
        }
    }
}
