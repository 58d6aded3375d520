use bytes::Bytes;
use indexmap::IndexMap;
use url::Url;

use crate::upload::{self, ImageFile};

/// What the in-memory endpoint does with an upload.
#[derive(Debug, Clone)]
pub enum Behavior {
    Store,
    /// Never answers.
    Stall,
    Fail(String),
    /// Stores once a value arrives on the channel; fails if the sender is dropped.
    Gate(async_channel::Receiver<()>),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Rejected(String),
    #[error("invalid storage url: {0}")]
    Url(url::ParseError),
}

/// Upload endpoint backed by a map, used for dry runs and tests.
pub struct Client {
    base: Url,
    default: Behavior,
    // keyed by the selected file name
    overrides: IndexMap<String, Behavior>,
    stored: tokio::sync::Mutex<IndexMap<String, (Bytes, mime::Mime)>>,
}

impl Client {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            default: Behavior::Store,
            overrides: IndexMap::new(),
            stored: Default::default(),
        }
    }

    pub fn with_default(mut self, behavior: Behavior) -> Self {
        self.default = behavior;
        self
    }

    pub fn with_behavior(mut self, name: impl Into<String>, behavior: Behavior) -> Self {
        self.overrides.insert(name.into(), behavior);
        self
    }

    pub async fn get(&self, key: &str) -> Option<(Bytes, mime::Mime)> {
        self.stored.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.stored.lock().await.len()
    }

    async fn store(&self, image: &ImageFile) -> Result<Url, Error> {
        let key = image.upload_name();
        let url = self.base.join(&key).map_err(Error::Url)?;
        self.stored
            .lock()
            .await
            .insert(key, (image.body.clone(), image.content_type.clone()));
        Ok(url)
    }
}

impl upload::Client for Client {
    type Error = Error;

    async fn upload(&self, image: &ImageFile) -> Result<Url, Self::Error> {
        match self.overrides.get(&image.name).unwrap_or(&self.default) {
            Behavior::Store => self.store(image).await,
            Behavior::Stall => futures::future::pending().await,
            Behavior::Fail(message) => Err(Error::Rejected(message.clone())),
            Behavior::Gate(gate) => match gate.recv().await {
                Ok(()) => self.store(image).await,
                Err(_) => Err(Error::Rejected("upload cancelled".to_owned())),
            },
        }
    }
}
