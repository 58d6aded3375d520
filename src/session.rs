//! One editing session: the live document plus every image upload it started.
//!
//! Image nodes keep their local reference for the whole session. Upload tasks report
//! back over a channel and the session alone writes the reference map when it drains
//! that channel; the document is only rewritten on its way out, in
//! [`EditingSession::submit`].

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    document::{Document, ImageNode, Node},
    embed::Platform,
    extension::{self, EmbedRejected, Inserted},
    notice::{Level, NoticeBoard},
    upload::{
        self, ImageFile, ImageLimits, LocalRef, SelectedFile, UnresolvedReferences,
        UploadReferenceMap, ValidationError,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Resolved(Url),
    /// The upload endpoint's message, as given.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    PendingUploads(UnresolvedReferences),
    #[error("{} image(s) failed to upload; remove them before submitting", .failed.len())]
    FailedUploads { failed: Vec<LocalRef> },
}

/// An image that has been validated and handed to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub reference: LocalRef,
    pub width: u32,
    pub height: u32,
}

struct Completion {
    reference: LocalRef,
    result: Result<Url, String>,
}

pub struct EditingSession<C> {
    id: Uuid,
    document: Document,
    client: Arc<C>,
    limits: ImageLimits,
    link_cards: bool,
    references: UploadReferenceMap,
    statuses: IndexMap<LocalRef, UploadStatus>,
    sequence: u64,
    sender: async_channel::Sender<Completion>,
    receiver: async_channel::Receiver<Completion>,
    tasks: JoinSet<()>,
    /// Which image each running upload task belongs to.
    task_refs: HashMap<task::Id, LocalRef>,
    notices: NoticeBoard,
}

impl<C: upload::Client> EditingSession<C> {
    pub fn new(client: C, limits: ImageLimits) -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self {
            id: Uuid::new_v4(),
            document: Document::new(),
            client: Arc::new(client),
            limits,
            link_cards: true,
            references: UploadReferenceMap::new(),
            statuses: IndexMap::new(),
            sequence: 0,
            sender,
            receiver,
            tasks: JoinSet::new(),
            task_refs: HashMap::new(),
            notices: NoticeBoard::new(),
        }
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn with_link_cards(mut self, enabled: bool) -> Self {
        self.link_cards = enabled;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn references(&self) -> &UploadReferenceMap {
        &self.references
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    /// Validates the file and starts its upload. Must be called inside a tokio runtime.
    pub fn stage_image(&mut self, file: SelectedFile) -> Result<StagedImage, ValidationError> {
        let image = match ImageFile::validate(file, &self.limits) {
            Ok(image) => image,
            Err(e) => {
                warn!(%e, "image rejected");
                self.notices.push(Level::Error, e.to_string());
                return Err(e);
            }
        };
        self.sequence += 1;
        let reference = LocalRef::mint(self.id, self.sequence);
        let staged = StagedImage {
            reference: reference.clone(),
            width: image.width,
            height: image.height,
        };
        self.statuses
            .insert(reference.clone(), UploadStatus::Uploading);
        debug!(%reference, name = %image.name, "start upload");

        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let handle = self.tasks.spawn(async move {
            let result = client.upload(&image).await.map_err(|e| e.to_string());
            // The session may already be gone.
            let _ = sender.send(Completion { reference, result }).await;
        });
        self.task_refs
            .insert(handle.id(), staged.reference.clone());
        Ok(staged)
    }

    /// Puts a preview node at the cursor right away; the upload carries on in the
    /// background.
    pub fn insert_image(&mut self, file: SelectedFile) -> Result<LocalRef, ValidationError> {
        let staged = self.stage_image(file)?;
        self.document.insert_at_cursor(Node::Image(ImageNode {
            src: staged.reference.to_string(),
            width: Some(staged.width),
            height: Some(staged.height),
            ..Default::default()
        }));
        Ok(staged.reference)
    }

    pub fn insert_embed(
        &mut self,
        platform: Platform,
        url: &str,
        title: Option<String>,
    ) -> Result<Inserted, EmbedRejected> {
        let inserted = if self.link_cards {
            extension::insert_or_fallback(&mut self.document, platform, url, title)
        } else {
            extension::insert(&mut self.document, platform, url).map(|()| Inserted::Embed(platform))
        };
        if let Err(rejected) = &inserted {
            self.notices.push(Level::Warning, rejected.to_string());
        }
        inserted
    }

    /// Returns `Some` when the completion belonged to an image still in the session.
    fn apply(&mut self, completion: Completion) -> Option<LocalRef> {
        let Completion { reference, result } = completion;
        let Some(status) = self.statuses.get_mut(&reference) else {
            debug!(%reference, "dropping result for removed image");
            return None;
        };
        match result {
            Ok(url) => {
                info!(%reference, %url, "upload resolved");
                self.references.insert(&reference, url.clone());
                *status = UploadStatus::Resolved(url);
            }
            Err(message) => {
                warn!(%reference, %message, "upload failed");
                self.notices.push(Level::Error, message.clone());
                *status = UploadStatus::Failed(message);
            }
        }
        Some(reference)
    }

    /// A task that ends without reporting (it panicked) fails its image, which would
    /// otherwise stay `Uploading` for good.
    fn joined(&mut self, joined: Result<(task::Id, ()), JoinError>) -> Option<LocalRef> {
        let e = match joined {
            Ok((id, ())) => {
                self.task_refs.remove(&id);
                return None;
            }
            Err(e) => e,
        };
        let reference = self.task_refs.remove(&e.id())?;
        warn!(%reference, %e, "upload task did not finish");
        let status = self.statuses.get_mut(&reference)?;
        if *status != UploadStatus::Uploading {
            return None;
        }
        let message = "Upload stopped unexpectedly".to_owned();
        self.notices.push(Level::Error, message.clone());
        *status = UploadStatus::Failed(message);
        Some(reference)
    }

    /// Applies every completion that has arrived so far without waiting.
    pub fn sync_uploads(&mut self) -> usize {
        let mut applied = 0;
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            if self.joined(joined).is_some() {
                applied += 1;
            }
        }
        while let Ok(completion) = self.receiver.try_recv() {
            if self.apply(completion).is_some() {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next upload of an image still in the session to finish.
    pub async fn next_completion(&mut self) -> Option<LocalRef> {
        loop {
            if self.pending_uploads().is_empty() {
                return None;
            }
            tokio::select! {
                completion = self.receiver.recv() => {
                    if let Some(reference) = self.apply(completion.ok()?) {
                        return Some(reference);
                    }
                }
                Some(joined) = self.tasks.join_next_with_id() => {
                    if let Some(reference) = self.joined(joined) {
                        return Some(reference);
                    }
                }
            }
        }
    }

    /// Waits for every started upload, including ones whose image was removed.
    pub async fn wait_for_uploads(&mut self) {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            self.joined(joined);
        }
        self.sync_uploads();
    }

    pub fn upload_status(&self, reference: &LocalRef) -> Option<&UploadStatus> {
        self.statuses.get(reference)
    }

    pub fn pending_uploads(&self) -> Vec<&LocalRef> {
        self.statuses
            .iter()
            .filter(|(_, status)| **status == UploadStatus::Uploading)
            .map(|(reference, _)| reference)
            .collect()
    }

    /// Rewrites local references in `content`, or refuses and leaves everything as is.
    pub fn process_for_submit(&mut self, content: &str) -> Result<String, SubmitError> {
        self.sync_uploads();
        let error = match upload::process_for_submit(content, &self.references) {
            Ok(rewritten) => return Ok(rewritten),
            Err(unresolved) => {
                let failed = unresolved
                    .pending
                    .iter()
                    .filter_map(|pending| {
                        self.statuses.iter().find_map(|(reference, status)| {
                            (reference.as_str() == pending
                                && matches!(status, UploadStatus::Failed(_)))
                            .then(|| reference.clone())
                        })
                    })
                    .collect::<Vec<_>>();
                if failed.is_empty() {
                    SubmitError::PendingUploads(unresolved)
                } else {
                    SubmitError::FailedUploads { failed }
                }
            }
        };
        warn!(%error, "submit refused");
        self.notices.push(Level::Warning, error.to_string());
        Err(error)
    }

    /// Serializes the live document and reconciles it; the document itself is untouched.
    pub fn submit(&mut self) -> Result<String, SubmitError> {
        let html = self.document.to_html();
        self.process_for_submit(&html)
    }

    /// Drops the image node and forgets its upload. A result arriving later is ignored.
    pub fn remove_image(&mut self, reference: &LocalRef) -> bool {
        let removed = self.document.remove_where(
            |node| matches!(node, Node::Image(image) if image.src == reference.as_str()),
        );
        let tracked = self.statuses.shift_remove(reference).is_some();
        removed > 0 || tracked
    }

    /// Ends the session. Uploads already started run to completion; nobody reads them.
    pub fn discard(mut self) {
        debug!(session = %self.id, in_flight = self.tasks.len(), "discard session");
        self.task_refs.clear();
        self.tasks.detach_all();
    }
}
