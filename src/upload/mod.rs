//! Optimistic image uploads.
//!
//! An image is validated and given a local `blob:` reference the moment it is
//! selected; the binary goes to a [`Client`] in the background and the resulting URL is
//! recorded in an [`UploadReferenceMap`]. Nothing rewrites the live document:
//! [`reconcile::process_for_submit`] swaps references for URLs once, when content leaves
//! the editor.

use std::{fmt, io::Cursor};

use bytes::Bytes;
use derive_debug::Dbg;
use indexmap::IndexMap;
use url::Url;
use uuid::Uuid;

pub mod http;
pub mod memory;
pub mod reconcile;

pub use reconcile::{UnresolvedReferences, process_for_submit};

pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

const LOCAL_SCHEME: &str = "blob:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_bytes: u64,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// A file as handed over by the user, before any checks.
#[derive(Dbg, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    #[dbg(skip)]
    pub body: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{name}: cannot tell what kind of file this is")]
    UnknownType { name: String },
    #[error("{name}: {content_type} is not an image")]
    NotAnImage { name: String, content_type: String },
    #[error("{name}: file is empty")]
    Empty { name: String },
    #[error("{name}: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("{name}: image could not be decoded: {reason}")]
    Undecodable { name: String, reason: String },
}

/// A validated image, ready to be previewed and uploaded.
#[derive(Dbg, Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: mime::Mime,
    #[dbg(skip)]
    pub body: Bytes,
    pub hash: blake3::Hash,
    pub width: u32,
    pub height: u32,
}

impl ImageFile {
    pub fn validate(file: SelectedFile, limits: &ImageLimits) -> Result<Self, ValidationError> {
        let SelectedFile {
            name,
            content_type,
            body,
        } = file;
        let content_type = match content_type.as_deref().map(str::parse::<mime::Mime>) {
            Some(Ok(content_type)) => content_type,
            Some(Err(_)) | None => mime_guess::from_path(&name)
                .first()
                .ok_or_else(|| ValidationError::UnknownType { name: name.clone() })?,
        };
        if content_type.type_() != mime::IMAGE {
            return Err(ValidationError::NotAnImage {
                name,
                content_type: content_type.to_string(),
            });
        }
        let size = body.len() as u64;
        if size == 0 {
            return Err(ValidationError::Empty { name });
        }
        if size > limits.max_bytes {
            return Err(ValidationError::TooLarge {
                name,
                size,
                limit: limits.max_bytes,
            });
        }
        let (width, height) = image::ImageReader::new(Cursor::new(&body[..]))
            .with_guessed_format()
            .map_err(|e| e.to_string())
            .and_then(|reader| reader.into_dimensions().map_err(|e| e.to_string()))
            .map_err(|reason| ValidationError::Undecodable {
                name: name.clone(),
                reason,
            })?;
        Ok(Self {
            hash: blake3::hash(&body),
            name,
            content_type,
            body,
            width,
            height,
        })
    }

    /// Name sent with the upload: content hash plus the canonical extension.
    pub fn upload_name(&self) -> String {
        let extension = mime_guess::get_mime_extensions(&self.content_type)
            .and_then(|extensions| extensions.first())
            .copied()
            .unwrap_or("bin");
        let hash = self.hash.to_hex();
        format!("{}.{extension}", &hash[..16])
    }
}

/// Session-scoped stand-in for an image that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalRef(String);

impl LocalRef {
    pub(crate) fn mint(session: Uuid, sequence: u64) -> Self {
        Self(format!("{LOCAL_SCHEME}newsdesk/{session}/{sequence}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_local(src: &str) -> bool {
        src.starts_with(LOCAL_SCHEME)
    }
}

impl fmt::Display for LocalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<LocalRef> for String {
    fn from(value: LocalRef) -> Self {
        value.0
    }
}

/// Local reference to persisted URL. Append-only: the first URL recorded for a key wins.
#[derive(Debug, Clone, Default)]
pub struct UploadReferenceMap {
    map: IndexMap<String, Url>,
}

impl UploadReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &LocalRef, url: Url) -> bool {
        if self.map.contains_key(reference.as_str()) {
            return false;
        }
        self.map.insert(reference.as_str().to_owned(), url);
        true
    }

    pub fn get(&self, reference: &str) -> Option<&Url> {
        self.map.get(reference)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Url)> {
        self.map.iter().map(|(reference, url)| (reference.as_str(), url))
    }
}

/// Destination for image binaries; returns the persisted URL.
pub trait Client: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn upload(&self, image: &ImageFile) -> impl Future<Output = Result<Url, Self::Error>> + Send;
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::io::Cursor;

    use bytes::Bytes;

    pub(crate) fn png(width: u32, height: u32) -> Bytes {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, image::ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_png() {
        let image = ImageFile::validate(
            SelectedFile::new("photo.png", fixture::png(4, 3)),
            &ImageLimits::default(),
        )
        .unwrap();
        assert_eq!((image.width, image.height), (4, 3));
        assert_eq!(image.content_type, mime::IMAGE_PNG);
        assert!(image.upload_name().ends_with(".png"));
        assert_eq!(image.upload_name().len(), 16 + ".png".len());
    }

    #[test]
    fn test_declared_type_wins_over_name() {
        let error = ImageFile::validate(
            SelectedFile::new("photo.png", fixture::png(1, 1)).with_content_type("text/plain"),
            &ImageLimits::default(),
        )
        .unwrap_err();
        assert_eq!(
            error,
            ValidationError::NotAnImage {
                name: "photo.png".into(),
                content_type: "text/plain".into()
            }
        );
    }

    #[test]
    fn test_rejects_non_images() {
        let error = ImageFile::validate(
            SelectedFile::new("notes.txt", "hello"),
            &ImageLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(error, ValidationError::NotAnImage { .. }));

        let error = ImageFile::validate(
            SelectedFile::new("mystery", "hello"),
            &ImageLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(error, ValidationError::UnknownType { .. }));
    }

    #[test]
    fn test_size_ceiling() {
        let body = fixture::png(8, 8);
        let limits = ImageLimits {
            max_bytes: body.len() as u64 - 1,
        };
        let error = ImageFile::validate(SelectedFile::new("a.png", body), &limits).unwrap_err();
        assert!(matches!(error, ValidationError::TooLarge { .. }));

        let error =
            ImageFile::validate(SelectedFile::new("a.png", Bytes::new()), &ImageLimits::default())
                .unwrap_err();
        assert!(matches!(error, ValidationError::Empty { .. }));
    }

    #[test]
    fn test_rejects_corrupt_images() {
        let error = ImageFile::validate(
            SelectedFile::new("broken.png", "definitely not a png"),
            &ImageLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(error, ValidationError::Undecodable { .. }));
    }

    #[test]
    fn test_map_first_write_wins() {
        let session = Uuid::new_v4();
        let reference = LocalRef::mint(session, 1);
        let mut map = UploadReferenceMap::new();
        assert!(map.insert(&reference, Url::parse("https://cdn.example.com/a.png").unwrap()));
        assert!(!map.insert(&reference, Url::parse("https://cdn.example.com/b.png").unwrap()));
        assert_eq!(
            map.get(reference.as_str()).map(Url::as_str),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_local_refs_are_unique() {
        let session = Uuid::new_v4();
        let first = LocalRef::mint(session, 1);
        assert_ne!(first, LocalRef::mint(session, 2));
        assert_ne!(first, LocalRef::mint(Uuid::new_v4(), 1));
        assert!(LocalRef::is_local(first.as_str()));
        assert!(!LocalRef::is_local("https://cdn.example.com/a.png"));
    }
}
