//! Asynchronous asset loading.
//!
//! An [`AssetLoader`] belongs to one scene. Every request gets a [`LoadId`];
//! the fetch and decode run on the platform executor and report back through
//! a channel the scene drains once per frame. Each load runs under a child
//! of the loader's [`CancellationToken`]; a cancelled load stops at its next
//! await point and anything that still arrives is dropped.

use std::{collections::BTreeMap, sync::Arc};

use futures::{
    FutureExt, StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded},
    future::{Either, select},
};
use image::RgbaImage;

use crate::lifecycle::CancellationToken;

pub mod mesh;
pub mod posts;
pub mod texture;

use mesh::ModelMesh;
use posts::Post;

/// Where the futures of a loader run.
#[derive(Clone, Debug)]
pub enum Spawner {
    /// Drives each load to completion inside [`AssetLoader::load`].
    Inline,
    #[cfg(not(target_arch = "wasm32"))]
    Tokio(tokio::runtime::Handle),
    #[cfg(target_arch = "wasm32")]
    Local,
}

impl Spawner {
    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        match self {
            Spawner::Inline => futures::executor::block_on(fut),
            Spawner::Tokio(handle) => {
                handle.spawn(fut);
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, fut: impl Future<Output = ()> + 'static) {
        match self {
            Spawner::Inline => futures::executor::block_on(fut),
            Spawner::Local => wasm_bindgen_futures::spawn_local(fut),
        }
    }
}

/// Where asset bytes come from.
#[derive(Clone, Debug, Default)]
pub enum AssetSource {
    /// `./assets` natively, `<origin>/assets/` on the web.
    #[default]
    Assets,
    /// Fixed in-memory files keyed by path.
    Memory(Arc<BTreeMap<String, Vec<u8>>>),
}

impl AssetSource {
    pub fn memory<I, K>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        Self::Memory(Arc::new(
            files.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    async fn fetch(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        match self {
            AssetSource::Assets => texture::load_binary(path).await,
            AssetSource::Memory(files) => files
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no asset at `{}`", path)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Model,
    Posts,
}

#[derive(Clone, Debug)]
pub enum Asset {
    Image(RgbaImage),
    Model(Vec<ModelMesh>),
    Posts(Vec<Post>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

#[derive(Debug)]
pub struct Loaded {
    pub id: LoadId,
    pub path: String,
    pub result: anyhow::Result<Asset>,
}

async fn fetch_and_decode(source: &AssetSource, path: &str, kind: AssetKind) -> anyhow::Result<Asset> {
    let bytes = source.fetch(path).await?;
    Ok(match kind {
        AssetKind::Image => Asset::Image(texture::decode_image(&bytes)?),
        AssetKind::Model => Asset::Model(mesh::load_model_gltf(&bytes).await?),
        AssetKind::Posts => Asset::Posts(posts::parse_posts(&bytes)?),
    })
}

#[derive(Debug)]
pub struct AssetLoader {
    spawner: Spawner,
    source: AssetSource,
    sender: UnboundedSender<Loaded>,
    receiver: UnboundedReceiver<Loaded>,
    token: CancellationToken,
    pending: BTreeMap<LoadId, CancellationToken>,
    next: u64,
}

impl AssetLoader {
    pub fn new(spawner: Spawner, source: AssetSource) -> Self {
        Self::with_token(spawner, source, CancellationToken::new())
    }

    /// Loader whose loads all stop when `token` is cancelled.
    pub fn with_token(spawner: Spawner, source: AssetSource, token: CancellationToken) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            spawner,
            source,
            sender,
            receiver,
            token,
            pending: BTreeMap::new(),
            next: 0,
        }
    }

    /// Inline loader over in-memory files.
    pub fn in_memory(source: AssetSource) -> Self {
        Self::new(Spawner::Inline, source)
    }

    pub fn load(&mut self, path: &str, kind: AssetKind) -> LoadId {
        let id = LoadId(self.next);
        self.next += 1;
        let cancel = self.token.child_token();
        self.pending.insert(id, cancel.clone());

        let source = self.source.clone();
        let sender = self.sender.clone();
        let path = path.to_string();
        self.spawner.spawn(async move {
            let work = {
                let path = path.clone();
                async move { fetch_and_decode(&source, &path, kind).await }
            };
            // Cancellation is polled first so a cancelled load never reports.
            match select(Box::pin(cancel.cancelled_owned()), Box::pin(work)).await {
                Either::Left(_) => log::debug!("load of {} cancelled", path),
                Either::Right((result, _)) => {
                    // The receiver is gone once the scene was dropped.
                    let _ = sender.unbounded_send(Loaded { id, path, result });
                }
            }
        });
        id
    }

    /// Completed loads that are still wanted, in completion order.
    pub fn drain(&mut self) -> Vec<Loaded> {
        let mut done = Vec::new();
        while let Some(Some(loaded)) = self.receiver.next().now_or_never() {
            if self.pending.remove(&loaded.id).is_some() {
                done.push(loaded);
            } else {
                log::debug!("dropping cancelled load of {}", loaded.path);
            }
        }
        done
    }

    pub fn cancel(&mut self, id: LoadId) -> bool {
        match self.pending.remove(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every outstanding load. The loader stays usable.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        for token in std::mem::take(&mut self.pending).into_values() {
            token.cancel();
        }
        cancelled
    }

    pub fn is_pending(&self, id: LoadId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> AssetLoader {
        AssetLoader::in_memory(AssetSource::memory([(
            "posts.json",
            br#"[{"title": "a", "slug": "lines"}]"#.to_vec(),
        )]))
    }

    #[test]
    fn inline_loads_complete_on_drain() {
        let mut loader = loader();
        let id = loader.load("posts.json", AssetKind::Posts);
        assert!(loader.is_pending(id));
        let done = loader.drain();
        assert_eq!(done.len(), 1);
        assert!(matches!(&done[0].result, Ok(Asset::Posts(posts)) if posts.len() == 1));
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn failures_are_reported() {
        let mut loader = loader();
        loader.load("missing.png", AssetKind::Image);
        let done = loader.drain();
        assert_eq!(done.len(), 1);
        assert!(done[0].result.is_err());
    }

    #[test]
    fn cancelled_results_are_dropped() {
        let mut loader = loader();
        let first = loader.load("posts.json", AssetKind::Posts);
        loader.load("posts.json", AssetKind::Posts);
        assert!(loader.cancel(first));
        assert_eq!(loader.drain().len(), 1);
        loader.load("posts.json", AssetKind::Posts);
        assert_eq!(loader.cancel_all(), 1);
        assert!(loader.drain().is_empty());
    }

    #[test]
    fn cancelled_loads_never_reach_the_channel() {
        let token = CancellationToken::new();
        let mut loader = AssetLoader::with_token(
            Spawner::Inline,
            AssetSource::memory([("posts.json", b"[]".to_vec())]),
            token.clone(),
        );
        token.cancel();
        let id = loader.load("posts.json", AssetKind::Posts);
        assert!(loader.is_pending(id));
        assert!(loader.drain().is_empty());
        assert_eq!(loader.cancel_all(), 1);
    }
}
