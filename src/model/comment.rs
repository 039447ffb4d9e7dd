use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_profile_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct NewComment<'a> {
    pub text: &'a str,
}
