use std::path::Path;

use log::warn;
use mime_guess::MimeGuess;
use reqwest::multipart::{Form, Part};

use crate::error::{Error, FieldErrors, Result};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_MEDIA_FILES: usize = 5;

/// A file picked by the user, held in memory until it is sent.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    /// The MIME type is guessed from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = MimeGuess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }

    pub fn into_part(self) -> Result<Part> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?)
    }

    /// Checks for a photo: image type, at most 5 MB.
    pub fn check_photo(&self) -> Result<(), String> {
        if !self.is_image() {
            return Err("only image files are allowed".to_string());
        }
        if self.len() > MAX_PHOTO_BYTES {
            return Err("file too large, maximum is 5MB".to_string());
        }
        Ok(())
    }

    /// Validate a profile photo before uploading it.
    pub fn into_photo(self) -> Result<Self> {
        match self.check_photo() {
            Ok(()) => Ok(self),
            Err(message) => Err(Error::field("photo", message)),
        }
    }
}

/// A publication being composed: text plus up to five images or videos.
#[derive(Debug, Clone, Default)]
pub struct PublicationDraft {
    pub text: String,
    files: Vec<Upload>,
}

impl PublicationDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: vec![],
        }
    }

    pub fn files(&self) -> &[Upload] {
        &self.files
    }

    pub fn remaining(&self) -> usize {
        MAX_MEDIA_FILES.saturating_sub(self.files.len())
    }

    /// Attach files. Anything that is not an image or a video is skipped;
    /// going over the limit rejects the whole batch.
    pub fn add_files(&mut self, files: Vec<Upload>) -> Result<usize> {
        let (valid, skipped): (Vec<_>, Vec<_>) =
            files.into_iter().partition(|f| f.is_image() || f.is_video());
        for file in &skipped {
            warn!("Skipping {} ({}): only images and videos are allowed", file.file_name, file.mime);
        }

        if valid.len() > self.remaining() {
            return Err(Error::field(
                "files",
                format!("at most {} files are allowed", MAX_MEDIA_FILES),
            ));
        }

        let added = valid.len();
        self.files.extend(valid);
        Ok(added)
    }

    pub fn remove_file(&mut self, index: usize) -> Option<Upload> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn build(self) -> Result<NewPublication> {
        let text = self.text.trim().to_string();
        let mut errors = FieldErrors::default();
        if text.is_empty() && self.files.is_empty() {
            errors.insert("text", "add a description or photos of the animal");
        }
        errors.into_result()?;
        Ok(NewPublication {
            text,
            files: self.files,
        })
    }
}

/// A validated publication, ready to send as multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPublication {
    pub text: String,
    pub files: Vec<Upload>,
}

impl NewPublication {
    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new().text("text", self.text);
        for file in self.files {
            form = form.part("files", file.into_part()?);
        }
        Ok(form)
    }
}
