use reqwest::multipart::Form;
use validator::{Validate, ValidationError};

use crate::{error::Result, model::Size};

use super::{check, non_blank, not_blank, Upload};

/// Animal registration as typed by the user.
#[derive(Debug, Clone, Default, Validate)]
pub struct AnimalForm {
    #[validate(custom(function = "not_blank", message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "species is required"))]
    pub species: String,
    #[validate(custom(function = "not_blank", message = "breed is required"))]
    pub breed: String,
    #[validate(custom(function = "positive_age", message = "age must be a positive number"))]
    pub age: String,
    pub size: Size,
    #[validate(custom(function = "not_blank", message = "location is required"))]
    pub location: String,
    #[validate(custom(function = "not_blank", message = "shelter id is required"))]
    pub shelter_id: String,
    pub description: String,
    pub vaccinated: bool,
    pub neutered: bool,
    pub photo: Option<Upload>,
}

fn positive_age(value: &str) -> Result<(), ValidationError> {
    match value.trim().parse::<u32>() {
        Ok(age) if age > 0 => Ok(()),
        _ => Err(ValidationError::new("positive")),
    }
}

impl AnimalForm {
    pub fn build(self) -> Result<NewAnimal> {
        let mut errors = check(&self);
        if let Some(Err(message)) = self.photo.as_ref().map(Upload::check_photo) {
            errors.insert("photo", message);
        }
        errors.into_result()?;

        let age = self.age.trim().parse().unwrap_or_default();
        Ok(NewAnimal {
            name: self.name.trim().to_string(),
            species: self.species.trim().to_string(),
            breed: self.breed.trim().to_string(),
            age,
            size: self.size,
            location: self.location.trim().to_string(),
            shelter_id: self.shelter_id.trim().to_string(),
            description: non_blank(&self.description),
            vaccinated: self.vaccinated,
            neutered: self.neutered,
            photo: self.photo,
        })
    }
}

/// A validated registration, ready to send as multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnimal {
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: u32,
    pub size: Size,
    pub location: String,
    pub shelter_id: String,
    pub description: Option<String>,
    pub vaccinated: bool,
    pub neutered: bool,
    pub photo: Option<Upload>,
}

impl NewAnimal {
    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new()
            .text("nome", self.name)
            .text("especie", self.species)
            .text("raca", self.breed)
            .text("idade", self.age.to_string())
            .text("porte", self.size.as_wire())
            .text("localizacao", self.location)
            .text("abrigoId", self.shelter_id)
            .text("vacinado", self.vaccinated.to_string())
            .text("castrado", self.neutered.to_string());
        if let Some(description) = self.description {
            form = form.text("descricao", description);
        }
        if let Some(photo) = self.photo {
            form = form.part("foto", photo.into_part()?);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn filled() -> AnimalForm {
        AnimalForm {
            name: "Mel".into(),
            species: "gato".into(),
            breed: "SRD".into(),
            age: "2".into(),
            size: Size::Small,
            location: "Itajubá".into(),
            shelter_id: "shelter-1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_is_trimmed() {
        let mut form = filled();
        form.name = "  Mel ".into();
        form.description = "   ".into();
        let animal = form.build().unwrap();
        assert_eq!(animal.name, "Mel");
        assert_eq!(animal.age, 2);
        assert_eq!(animal.description, None);
    }

    #[test_case("-1" ; "negative")]
    #[test_case("0" ; "zero")]
    #[test_case("abc" ; "not a number")]
    #[test_case("" ; "empty")]
    fn rejects_bad_age(age: &str) {
        let mut form = filled();
        form.age = age.into();
        let Err(Error::Validation(errors)) = form.build() else {
            panic!("age {age:?} should be rejected");
        };
        assert_eq!(errors.get("age"), Some("age must be a positive number"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn reports_every_missing_field() {
        let Err(Error::Validation(errors)) = AnimalForm::default().build() else {
            panic!("empty form should be rejected");
        };
        for field in ["name", "species", "breed", "age", "location", "shelter_id"] {
            assert!(errors.contains(field), "missing {field}");
        }
    }

    #[test]
    fn rejects_large_photo() {
        let mut form = filled();
        form.photo = Some(Upload::new("mel.jpg", vec![0; crate::form::MAX_PHOTO_BYTES + 1]));
        let Err(Error::Validation(errors)) = form.build() else {
            panic!("photo should be rejected");
        };
        assert!(errors.contains("photo"));
    }
}
