use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Hash, ValueEnum, PartialEq, Eq, Default)]
pub enum Size {
    #[default]
    #[serde(rename = "pequeno")]
    Small,
    #[serde(rename = "médio", alias = "medio")]
    Medium,
    #[serde(rename = "grande")]
    Large,
}

impl Size {
    /// The value the backend stores and filters on.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Small => "pequeno",
            Self::Medium => "médio",
            Self::Large => "grande",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Animal {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "especie")]
    pub species: String,
    #[serde(rename = "raca", default)]
    pub breed: String,
    #[serde(rename = "idade", default)]
    pub age: u32,
    #[serde(rename = "porte", default)]
    pub size: Size,
    #[serde(rename = "localizacao", default)]
    pub location: String,
    #[serde(rename = "abrigoId", default)]
    pub shelter_id: String,
    #[serde(rename = "abrigoNome", default, skip_serializing_if = "Option::is_none")]
    pub shelter_name: Option<String>,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "foto", default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(rename = "vacinado", default)]
    pub vaccinated: bool,
    #[serde(rename = "castrado", default)]
    pub neutered: bool,
    #[serde(rename = "authorId", default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Animal {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.author_id.as_deref() == Some(user_id)
    }
}

/// Query filters for the animal listing. Blank values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimalFilter {
    pub species: Option<String>,
    pub size: Option<Size>,
    pub location: Option<String>,
    pub breed: Option<String>,
}

impl AnimalFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![];
        let mut push = |key: &'static str, value: Option<&str>| {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                query.push((key, value.to_string()));
            }
        };
        push("especie", self.species.as_deref());
        push("porte", self.size.as_ref().map(Size::as_wire));
        push("localizacao", self.location.as_deref());
        push("raca", self.breed.as_deref());
        query
    }

    pub fn active(&self) -> usize {
        self.query().len()
    }
}
