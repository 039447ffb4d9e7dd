use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::{
    form::{AdoptionForm, AnimalForm, ProfileForm, RegisterForm},
    model::{AnimalFilter, Size},
};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the adoption feed
    Feed {
        /// Also load the comments of every publication
        #[arg(long)]
        comments: bool,
    },
    /// Like or unlike a publication
    Like { publication: String },
    /// Step through the photos of a publication
    Media {
        publication: String,
        /// Photo to start from
        #[arg(long, default_value = "0")]
        start: usize,
    },
    /// List the comments of a publication
    Comments { publication: String },
    /// Comment on a publication
    Comment { publication: String, text: String },
    /// Delete one of your comments
    Uncomment { publication: String, comment: String },
    /// Publish an adoption post
    Publish {
        #[arg(short, long, default_value = "")]
        text: String,
        /// Images or videos to attach (at most 5)
        #[arg(short, long, num_args = 0..)]
        files: Vec<PathBuf>,
    },
    /// Delete one of your publications
    Unpublish { publication: String },
    /// List animals up for adoption
    Animals(FilterArgs),
    /// Register an animal
    RegisterAnimal(AnimalArgs),
    /// Remove an animal you registered
    RemoveAnimal { animal: String },
    /// Ask to adopt the animal of a publication
    Adopt(AdoptArgs),
    /// Show your account
    Me,
    /// Update your personal details
    UpdateMe(ProfileArgs),
    /// Upload a new profile photo (image, at most 5MB)
    Photo { path: PathBuf },
    /// Finish signing up after creating the account with the identity provider
    Signup(SignupArgs),
    /// Store the token issued by the identity provider
    Login { token: String },
    /// Forget the stored token
    Logout,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    #[arg(long)]
    species: Option<String>,
    #[arg(long, value_enum)]
    size: Option<Size>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    breed: Option<String>,
}

impl From<FilterArgs> for AnimalFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            species: args.species,
            size: args.size,
            location: args.location,
            breed: args.breed,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AnimalArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    species: String,
    #[arg(long)]
    breed: String,
    /// Age in years
    #[arg(long, allow_hyphen_values = true)]
    age: String,
    #[arg(long, value_enum, default_value_t = Size::Small)]
    size: Size,
    #[arg(long)]
    location: String,
    #[arg(long)]
    shelter: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    vaccinated: bool,
    #[arg(long)]
    neutered: bool,
    /// Photo of the animal (image, at most 5MB)
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

impl AnimalArgs {
    pub fn into_form(self) -> AnimalForm {
        AnimalForm {
            name: self.name,
            species: self.species,
            breed: self.breed,
            age: self.age,
            size: self.size,
            location: self.location,
            shelter_id: self.shelter,
            description: self.description,
            vaccinated: self.vaccinated,
            neutered: self.neutered,
            photo: None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AdoptArgs {
    pub publication: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    email: String,
    /// First day you can meet the animal (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Time of the visit (HH:MM)
    #[arg(long, default_value = "")]
    time: String,
    #[arg(long, default_value = "")]
    experience: String,
    #[arg(long, default_value = "")]
    housing: String,
    #[arg(long, default_value = "")]
    motivation: String,
    /// Accept the adoption terms
    #[arg(long)]
    accept_terms: bool,
}

impl From<AdoptArgs> for AdoptionForm {
    fn from(args: AdoptArgs) -> Self {
        Self {
            name: args.name,
            phone: args.phone,
            email: args.email,
            date: args.date,
            time: args.time,
            experience: args.experience,
            housing: args.housing,
            motivation: args.motivation,
            accept_terms: args.accept_terms,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ProfileArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    birth_date: String,
    #[arg(long, default_value = "")]
    gender: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    zip_code: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    neighbourhood: String,
    #[arg(long, default_value = "")]
    phone: String,
}

impl From<ProfileArgs> for ProfileForm {
    fn from(args: ProfileArgs) -> Self {
        Self {
            full_name: args.name,
            birth_date: args.birth_date,
            gender: args.gender,
            state: args.state,
            zip_code: args.zip_code,
            city: args.city,
            neighbourhood: args.neighbourhood,
            phone: args.phone,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SignupArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
}

impl From<SignupArgs> for RegisterForm {
    fn from(args: SignupArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::{config::Config, error::Error};

    #[test]
    fn negative_age_reaches_the_form() {
        let config = Config::try_parse_from([
            "petfeed", "register-animal", "--name", "Mel", "--species", "gato", "--breed", "SRD",
            "--age", "-1", "--location", "Itajubá", "--shelter", "s1",
        ])
        .unwrap();
        let Command::RegisterAnimal(args) = config.command else {
            panic!("wrong subcommand");
        };
        let Err(Error::Validation(errors)) = args.into_form().build() else {
            panic!("age should be rejected");
        };
        assert!(errors.contains("age"));
    }

    #[test]
    fn parses_filters() {
        let config =
            Config::try_parse_from(["petfeed", "animals", "--size", "medium", "--species", "cão"])
                .unwrap();
        let Command::Animals(args) = config.command else {
            panic!("wrong subcommand");
        };
        let filter = AnimalFilter::from(args);
        assert_eq!(filter.size, Some(Size::Medium));
        assert_eq!(filter.query().len(), 2);
    }
}
