//! Scene lifetime bookkeeping: cancellation tokens, listener registration and
//! the report produced when a scene is torn down.

/// Shared flag checked by long running work (render loop, asset loads).
///
/// Clones observe the same state and child tokens are cancelled with their
/// parent; once cancelled a token stays cancelled.
pub use tokio_util::sync::CancellationToken;

/// Input a flow can subscribe to. The app only forwards registered kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PointerMove,
    Click,
    Wheel,
    Resize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u32);

/// Listener registry owned by a scene.
#[derive(Debug, Default)]
pub struct Listeners {
    next: u32,
    active: Vec<(ListenerId, EventKind)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every kind in `kinds`, in order.
    pub fn with(kinds: &[EventKind]) -> Self {
        let mut listeners = Self::new();
        for kind in kinds {
            listeners.register(*kind);
        }
        listeners
    }

    pub fn register(&mut self, kind: EventKind) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.active.push((id, kind));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.active.len();
        self.active.retain(|(active, _)| *active != id);
        before != self.active.len()
    }

    /// Drops every registration and returns how many there were.
    pub fn remove_all(&mut self) -> usize {
        let removed = self.active.len();
        self.active.clear();
        removed
    }

    pub fn is_listening(&self, kind: EventKind) -> bool {
        self.active.iter().any(|(_, active)| *active == kind)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// What a teardown released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub meshes: usize,
    pub groups: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
    pub render_targets: usize,
    pub listeners: usize,
    pub cancelled_loads: usize,
    pub cancelled_tweens: usize,
}

impl DisposeReport {
    pub fn merge(mut self, other: DisposeReport) -> Self {
        self.meshes += other.meshes;
        self.groups += other.groups;
        self.geometries += other.geometries;
        self.materials += other.materials;
        self.textures += other.textures;
        self.render_targets += other.render_targets;
        self.listeners += other.listeners;
        self.cancelled_loads += other.cancelled_loads;
        self.cancelled_tweens += other.cancelled_tweens;
        self
    }
}
