use std::path::PathBuf;

pub mod config;
pub mod document;
pub mod embed;
pub mod extension;
pub mod link_card;
pub mod notice;
pub mod publish;
pub mod session;
pub mod upload;

#[cfg(test)]
mod tests;

#[derive(Debug, thiserror::Error)]
#[error("{context}: {detail}")]
pub struct Error {
    pub context: Box<ErrorContext>,
    pub detail: Box<ErrorDetail>,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub path: PathBuf,
    pub image: Option<String>,
}

impl ErrorContext {
    fn new(path: PathBuf) -> Self {
        Self { path, image: None }
    }

    fn with_image(&self, image: impl Into<String>) -> Self {
        Self {
            path: self.path.clone(),
            image: Some(image.into()),
        }
    }

    fn error(&self, detail: ErrorDetail) -> Error {
        Error {
            context: Box::new(self.clone()),
            detail: Box::new(detail),
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.image {
            Some(image) => write!(f, "{image}({})", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorDetail {
    #[error("Failed to read document: {0}")]
    ReadDocument(std::io::Error),
    #[error("Failed to read image: {0}")]
    ReadImage(std::io::Error),
    #[error("Invalid image: {0}")]
    InvalidImage(upload::ValidationError),
    #[error("Cannot submit: {0}")]
    Submit(session::SubmitError),
}
