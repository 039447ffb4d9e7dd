use validator::Validate;

use crate::{
    error::Result,
    model::{NewUser, Profile},
};

use super::{check, non_blank, not_blank};

/// Sign-up details sent after the account exists at the identity provider.
#[derive(Debug, Clone, Default, Validate)]
pub struct RegisterForm {
    #[validate(custom(function = "not_blank", message = "first name is required"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank", message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "phone is required"))]
    pub phone: String,
}

impl RegisterForm {
    pub fn build(self) -> Result<NewUser> {
        check(&self).into_result()?;
        Ok(NewUser {
            name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        })
    }
}

/// Personal details edit. Blank fields are left untouched on the server.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub birth_date: String,
    pub gender: String,
    pub state: String,
    pub zip_code: String,
    pub city: String,
    pub neighbourhood: String,
    pub phone: String,
}

impl ProfileForm {
    pub fn build(self) -> Result<Profile> {
        let profile = Profile {
            full_name: non_blank(&self.full_name),
            birth_date: non_blank(&self.birth_date),
            gender: non_blank(&self.gender),
            state: non_blank(&self.state),
            zip_code: non_blank(&self.zip_code),
            city: non_blank(&self.city),
            neighbourhood: non_blank(&self.neighbourhood),
            phone: non_blank(&self.phone),
        };
        if profile.is_empty() {
            return Err(crate::error::Error::field("profile", "nothing to update"));
        }
        Ok(profile)
    }
}
