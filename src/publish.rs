//! Publishes a document from disk: local image files are uploaded through an editing
//! session and the reconciled HTML is returned.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tracing::{debug, info};

use crate::{
    Error, ErrorContext, ErrorDetail,
    document::Document,
    session::{EditingSession, StagedImage},
    upload::{self, ImageLimits, LocalRef, SelectedFile},
};

/// `src` values that point at a file next to the document rather than at the web.
fn local_file(src: &str) -> bool {
    !(src.is_empty()
        || LocalRef::is_local(src)
        || src.starts_with("//")
        || src.starts_with("data:")
        || url::Url::parse(src).is_ok())
}

fn image_path(document_path: &Path, src: &str) -> PathBuf {
    let src = urlencoding::decode(src)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| src.to_owned());
    document_path
        .parent()
        .unwrap_or(Path::new("."))
        .join(src)
}

pub async fn publish<C: upload::Client>(
    path: &Path,
    client: C,
    limits: ImageLimits,
) -> Result<String, Error> {
    let ctx = ErrorContext::new(path.to_owned());
    let src = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ctx.error(ErrorDetail::ReadDocument(e)))?;
    let mut session = EditingSession::new(client, limits).with_document(Document::parse(&src));

    let sources = session
        .document()
        .images()
        .into_iter()
        .map(|image| image.src.clone())
        .filter(|src| local_file(src))
        .unique()
        .collect::<Vec<_>>();

    let mut staged = HashMap::<String, StagedImage>::new();
    for src in sources {
        let ctx = ctx.with_image(&src);
        let file = image_path(path, &src);
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| src.clone());
        let body = tokio::fs::read(&file)
            .await
            .map_err(|e| ctx.error(ErrorDetail::ReadImage(e)))?;
        let image = session
            .stage_image(SelectedFile::new(name, body))
            .map_err(|e| ctx.error(ErrorDetail::InvalidImage(e)))?;
        debug!(%src, reference = %image.reference, "staged local image");
        staged.insert(src, image);
    }

    session.document_mut().for_each_image_mut(|image| {
        let Some(staged) = staged.get(&image.src) else {
            return;
        };
        image.src = staged.reference.to_string();
        if image.width.is_none() || image.height.is_none() {
            image.width = Some(staged.width);
            image.height = Some(staged.height);
        }
    });

    session.wait_for_uploads().await;
    let html = session
        .submit()
        .map_err(|e| ctx.error(ErrorDetail::Submit(e)))?;
    info!(path = %path.display(), uploaded = session.references().len(), "published");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file() {
        assert!(local_file("images/cover.png"));
        assert!(local_file("./cover.png"));
        assert!(local_file("/abs/cover.png"));
        assert!(!local_file("https://cdn.example.com/cover.png"));
        assert!(!local_file("//cdn.example.com/cover.png"));
        assert!(!local_file("blob:newsdesk/x/1"));
        assert!(!local_file("data:image/png;base64,AAAA"));
        assert!(!local_file(""));
    }

    #[test]
    fn test_image_path_is_relative_to_document() {
        assert_eq!(
            image_path(Path::new("drafts/story.html"), "img/my%20cover.png"),
            PathBuf::from("drafts/img/my cover.png")
        );
    }
}
