use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Who wrote a publication or a comment.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    #[serde(rename = "authorId")]
    pub id: String,
    #[serde(rename = "authorName", default)]
    pub name: String,
    #[serde(rename = "authorEmail", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "authorProfilePhoto", default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// An adoption post.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub author: Author,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub likes: Likes,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: u32,
}

fn active() -> bool {
    true
}

/// Some rows carry `null` where a list or a counter is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like count plus the users behind it.
///
/// `count == users.len()` holds once a toggle has been confirmed; while one
/// is in flight the count is a prediction.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Likes {
    #[serde(rename = "likes", default, deserialize_with = "null_as_default")]
    pub count: u32,
    #[serde(rename = "likedBy", default, deserialize_with = "null_as_default")]
    pub users: BTreeSet<String>,
}

impl Likes {
    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains(user_id)
    }

    /// The state after `user_id` flips their like. The count never goes below zero.
    pub fn toggled(&self, user_id: &str) -> Self {
        let mut next = self.clone();
        if next.users.remove(user_id) {
            next.count = next.count.saturating_sub(1);
        } else {
            next.users.insert(user_id.to_string());
            next.count += 1;
        }
        next
    }
}

impl Publication {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }

    pub fn apply(&mut self, update: PublicationUpdate) {
        let PublicationUpdate {
            text,
            media,
            is_active,
            likes,
            comments,
        } = update;
        if let Some(text) = text {
            self.text = text;
        }
        if let Some(media) = media {
            self.media = media;
        }
        if let Some(is_active) = is_active {
            self.is_active = is_active;
        }
        if let Some(likes) = likes {
            self.likes = likes;
        }
        if let Some(comments) = comments {
            self.comments = comments;
        }
    }
}

/// Partial patch applied to a publication held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationUpdate {
    pub text: Option<String>,
    pub media: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub likes: Option<Likes>,
    pub comments: Option<u32>,
}

/// The like state of one publication, as the current user sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeState {
    NotLiked,
    Liked,
}

impl LikeState {
    pub fn of(publication: &Publication, user_id: &str) -> Self {
        if publication.is_liked_by(user_id) {
            Self::Liked
        } else {
            Self::NotLiked
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Liked => Self::NotLiked,
            Self::NotLiked => Self::Liked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_backend_shape_with_defaults() {
        let json = r#"{
            "id": "p1",
            "text": "Rex needs a home",
            "media": ["http://localhost:3000/uploads/rex.jpg"],
            "authorId": "u1",
            "authorName": "Ana",
            "authorEmail": "ana@example.com",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-01T10:00:00.000Z",
            "isActive": true
        }"#;
        let publication: Publication = serde_json::from_str(json).unwrap();
        assert_eq!(publication.author.id, "u1");
        assert_eq!(publication.author.email.as_deref(), Some("ana@example.com"));
        assert_eq!(publication.likes, Likes::default());
        assert_eq!(publication.comments, 0);
    }

    #[test]
    fn reads_likes_from_top_level_keys() {
        let json = r#"{"id":"p2","authorId":"u1","likes":2,"likedBy":["a","b"],
            "createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-01T10:00:00Z"}"#;
        let publication: Publication = serde_json::from_str(json).unwrap();
        assert_eq!(publication.likes.count, 2);
        assert!(publication.is_liked_by("b"));

        let back = serde_json::to_value(&publication).unwrap();
        assert_eq!(back["likes"], 2);
        assert_eq!(back["likedBy"][0], "a");
    }

    #[test]
    fn null_counters_and_lists_read_as_empty() {
        let json = r#"[
            {"id":"p1","authorId":"u1","likes":null,"likedBy":null,"comments":null,"media":null,
             "createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-01T10:00:00Z"},
            {"id":"p2","authorId":"u1","likes":1,"likedBy":["a"],
             "createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-01T10:00:00Z"}
        ]"#;
        let feed: Vec<Publication> = serde_json::from_str(json).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].likes, Likes::default());
        assert_eq!(feed[0].comments, 0);
        assert!(feed[0].media.is_empty());
        assert!(feed[1].is_liked_by("a"));
    }

    #[test]
    fn toggling_floors_at_zero() {
        let likes = Likes::default().toggled("u");
        assert_eq!(likes.count, 1);
        let likes = likes.toggled("u");
        assert_eq!(likes, Likes::default());

        // a stale count can never be driven negative
        let stale = Likes {
            count: 0,
            users: ["u".to_string()].into(),
        };
        assert_eq!(stale.toggled("u").count, 0);
    }

    #[test]
    fn like_state_flips() {
        let publication = crate::test::publication("p1", 1, &["u"]);
        let state = LikeState::of(&publication, "u");
        assert_eq!(state, LikeState::Liked);
        assert_eq!(state.toggled(), LikeState::NotLiked);
        assert_eq!(LikeState::of(&publication, "v").toggled(), LikeState::Liked);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut publication = crate::test::publication("p1", 3, &["a", "b", "c"]);
        publication.apply(PublicationUpdate {
            comments: Some(9),
            ..Default::default()
        });
        assert_eq!(publication.comments, 9);
        assert_eq!(publication.likes.count, 3);
        assert_eq!(publication.likes.users.len(), 3);
    }
}
