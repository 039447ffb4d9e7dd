use std::sync::Arc;

use log::{debug, info};

use crate::{
    api::FeedApi,
    error::{Error, Result},
    model::Comment,
    session::Session,
};

type CountListener = Box<dyn Fn(usize) + Send + Sync>;

/// Comments of a single publication.
///
/// Every load replaces the whole list. After adding or deleting, the list
/// is reloaded and its length is reported to the count listener.
pub struct CommentController {
    api: Arc<dyn FeedApi>,
    session: Session,
    publication_id: String,
    comments: Vec<Comment>,
    on_count: Option<CountListener>,
}

impl CommentController {
    pub fn new(api: Arc<dyn FeedApi>, session: Session, publication_id: impl Into<String>) -> Self {
        Self {
            api,
            session,
            publication_id: publication_id.into(),
            comments: vec![],
            on_count: None,
        }
    }

    /// Called with the new total after every add or delete.
    pub fn on_count_change(mut self, listener: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_count = Some(Box::new(listener));
        self
    }

    pub fn publication_id(&self) -> &str {
        &self.publication_id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn count(&self) -> usize {
        self.comments.len()
    }

    pub async fn load(&mut self) -> Result<&[Comment]> {
        let comments = self.api.get_comments(&self.publication_id).await?;
        debug!("{} comments on {}", comments.len(), self.publication_id);
        self.comments = comments;
        Ok(&self.comments)
    }

    pub async fn add(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::field("text", "write a comment first"));
        }
        self.session.require_user()?;

        self.api.add_comment(&self.publication_id, text).await?;
        info!("Commented on {}", self.publication_id);
        self.reload_and_notify().await
    }

    /// Whether the current user may delete `comment`, i.e. wrote it.
    pub fn can_delete(&self, comment: &Comment) -> bool {
        self.session
            .user_id()
            .is_some_and(|user_id| comment.is_authored_by(&user_id))
    }

    pub async fn delete(&mut self, comment_id: &str) -> Result<()> {
        self.session.require_user()?;
        let comment = self
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| Error::NotFound(format!("comment {comment_id}")))?;
        if !self.can_delete(comment) {
            return Err(Error::Forbidden);
        }

        self.api
            .delete_comment(&self.publication_id, comment_id)
            .await?;
        info!("Deleted comment {}", comment_id);
        self.reload_and_notify().await
    }

    async fn reload_and_notify(&mut self) -> Result<()> {
        self.load().await?;
        if let Some(listener) = &self.on_count {
            listener(self.comments.len());
        }
        Ok(())
    }
}
