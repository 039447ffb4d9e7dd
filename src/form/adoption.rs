use chrono::{NaiveDate, NaiveTime};
use validator::{Validate, ValidationError};

use crate::{
    error::Result,
    model::{AdoptionRequest, Publication, RequesterInfo},
};

use super::{check, not_blank};

/// Request to adopt the animal of a publication.
#[derive(Debug, Clone, Default, Validate)]
pub struct AdoptionForm {
    #[validate(custom(function = "not_blank", message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "phone is required"))]
    pub phone: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    pub date: Option<NaiveDate>,
    pub time: String,
    pub experience: String,
    pub housing: String,
    pub motivation: String,
    #[validate(custom(function = "accepted", message = "you must accept the terms to continue"))]
    pub accept_terms: bool,
}

fn accepted(value: &bool) -> Result<(), ValidationError> {
    if *value {
        Ok(())
    } else {
        Err(ValidationError::new("accepted"))
    }
}

impl AdoptionForm {
    pub fn build(self, publication: &Publication) -> Result<AdoptionRequest> {
        let mut errors = check(&self);
        let Some(date) = self.date else {
            errors.insert("date", "availability date is required");
            return Err(errors.into());
        };
        let Ok(time) = NaiveTime::parse_from_str(self.time.trim(), "%H:%M") else {
            errors.insert("time", "availability time must look like HH:MM");
            return Err(errors.into());
        };
        errors.into_result()?;

        Ok(AdoptionRequest {
            publication_id: publication.id.clone(),
            publication_author_email: publication.author.email.clone(),
            publication_text: publication.text.clone(),
            requester_info: RequesterInfo {
                name: self.name.trim().to_string(),
                phone: self.phone.trim().to_string(),
                email: self.email.trim().to_string(),
                availability: format!("{} às {}", date.format("%d/%m/%Y"), time.format("%H:%M")),
                experience: self.experience.trim().to_string(),
                housing: self.housing.trim().to_string(),
                motivation: self.motivation.trim().to_string(),
            },
        })
    }
}
