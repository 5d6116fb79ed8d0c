//! Keyed property tweens.
//!
//! A tween animates one or more `(key, from, to)` tracks over a shared
//! duration. Starting a tween on a key that another live tween already drives
//! takes the key away from the older tween; an older tween left without keys is
//! dropped silently and never reports completion.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ease {
    /// `power0`
    Linear,
    /// `power1.out`, the default ease for property tweens.
    Power1Out,
    /// `power4.inOut`
    Power4InOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Self::Power4InOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::Power1Out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

#[derive(Clone, Copy, Debug)]
struct Track<K> {
    key: K,
    from: f32,
    to: f32,
}

#[derive(Clone, Debug)]
struct Tween<K> {
    id: TweenId,
    tracks: Vec<Track<K>>,
    duration: f32,
    elapsed: f32,
    ease: Ease,
}

impl<K: Copy> Tween<K> {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tweens<K> {
    next: u64,
    active: Vec<Tween<K>>,
}

impl<K> Default for Tweens<K> {
    fn default() -> Self {
        Self {
            next: 0,
            active: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> Tweens<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a tween over `tracks`. Each track is `(key, from, to)`.
    pub fn start(
        &mut self,
        tracks: impl IntoIterator<Item = (K, f32, f32)>,
        duration: f32,
        ease: Ease,
    ) -> TweenId {
        let tracks: Vec<Track<K>> = tracks
            .into_iter()
            .map(|(key, from, to)| Track { key, from, to })
            .collect();
        for tween in self.active.iter_mut() {
            tween
                .tracks
                .retain(|track| !tracks.iter().any(|new| new.key == track.key));
        }
        self.active.retain(|tween| !tween.tracks.is_empty());

        let id = TweenId(self.next);
        self.next += 1;
        self.active.push(Tween {
            id,
            tracks,
            duration: duration.max(0.0),
            elapsed: 0.0,
            ease,
        });
        id
    }

    /// Advances every tween by `dt` seconds, hands the current value of each
    /// track to `apply` and returns the tweens that finished this tick.
    pub fn tick(&mut self, dt: f32, mut apply: impl FnMut(K, f32)) -> Vec<TweenId> {
        let mut finished = Vec::new();
        for tween in self.active.iter_mut() {
            tween.elapsed += dt.max(0.0);
            let progress = tween.progress();
            let eased = tween.ease.apply(progress);
            for track in &tween.tracks {
                apply(track.key, track.from + (track.to - track.from) * eased);
            }
            if progress >= 1.0 {
                finished.push(tween.id);
            }
        }
        self.active.retain(|tween| !finished.contains(&tween.id));
        finished
    }

    pub fn cancel(&mut self, id: TweenId) -> bool {
        let before = self.active.len();
        self.active.retain(|tween| tween.id != id);
        before != self.active.len()
    }

    /// Cancels every tween and returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.active.len();
        self.active.clear();
        cancelled
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.active.iter().any(|tween| tween.id == id)
    }

    /// Whether some live tween currently drives `key`.
    pub fn drives(&self, key: K) -> bool {
        self.active
            .iter()
            .any(|tween| tween.tracks.iter().any(|track| track.key == key))
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
