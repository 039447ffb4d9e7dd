//! Client side validation for everything the user submits.
//!
//! Each form checks its input and turns it into a typed payload. Nothing in
//! here talks to the network, so a rejected form never reaches the backend.

pub mod account;
pub mod adoption;
pub mod animal;
pub mod media;

pub use account::{ProfileForm, RegisterForm};
pub use adoption::AdoptionForm;
pub use animal::{AnimalForm, NewAnimal};
pub use media::{NewPublication, PublicationDraft, Upload, MAX_MEDIA_FILES, MAX_PHOTO_BYTES};

use validator::{Validate, ValidationError};

use crate::error::FieldErrors;

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Run the derived rules and collect them as field messages.
pub(crate) fn check<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::default(),
        Err(errors) => errors.into(),
    }
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
