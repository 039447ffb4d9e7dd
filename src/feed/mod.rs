//! The publication feed as the current user sees it.
//!
//! Likes are applied optimistically: the count and the liker set change as
//! soon as the user toggles, the request goes out, and a failure puts the
//! previous values back. While a toggle on a publication is unsettled that
//! publication refuses further toggles; other publications are unaffected.

pub mod cache;

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

pub use cache::FeedCache;

use crate::{
    api::FeedApi,
    error::{Error, Result},
    form::PublicationDraft,
    model::{LikeState, Publication, PublicationUpdate},
    optimistic::Optimistic,
    session::Session,
};

/// How long a publication stays locked after a successful toggle.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Default)]
struct FeedState {
    publications: Vec<Publication>,
    loading: bool,
    /// Publications whose like control is disabled.
    liking: HashSet<String>,
    /// Publications with a like request on the wire.
    pending: HashSet<String>,
    timers: HashMap<String, (u64, JoinHandle<()>)>,
    /// A timer that already woke up may be waiting on the lock while its
    /// publication is removed, added again and re-liked; it only clears
    /// `liking` if its generation is still the registered one.
    generation: u64,
}

impl FeedState {
    fn find_mut(&mut self, id: &str) -> Option<&mut Publication> {
        self.publications.iter_mut().find(|p| p.id == id)
    }

    fn cancel_timer(&mut self, id: &str) {
        if let Some((_, handle)) = self.timers.remove(id) {
            handle.abort();
        }
    }

    /// Replace the list with a server copy. Publications with a like request
    /// still pending keep their local like state, so the response to that
    /// request decides what the user sees.
    fn replace(&mut self, mut fresh: Vec<Publication>) {
        for publication in fresh.iter_mut() {
            if !self.pending.contains(&publication.id) {
                continue;
            }
            if let Some(local) = self.publications.iter().find(|p| p.id == publication.id) {
                debug!("Keeping local likes of {} while its toggle is in flight", publication.id);
                publication.likes = local.likes.clone();
            }
        }
        self.publications = fresh;
    }
}

pub struct FeedController {
    api: Arc<dyn FeedApi>,
    session: Session,
    state: Arc<Mutex<FeedState>>,
    settle: Duration,
    cache: FeedCache,
}

impl FeedController {
    pub fn new(api: Arc<dyn FeedApi>, session: Session) -> Self {
        Self {
            api,
            session,
            state: Arc::default(),
            settle: SETTLE_DELAY,
            cache: FeedCache::disabled(),
        }
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_cache(mut self, cache: FeedCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        lock(&self.state)
    }

    pub fn publications(&self) -> Vec<Publication> {
        self.lock().publications.clone()
    }

    pub fn get(&self, id: &str) -> Option<Publication> {
        self.lock().publications.iter().find(|p| p.id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Whether the like control of `id` is disabled.
    pub fn is_liking(&self, id: &str) -> bool {
        self.lock().liking.contains(id)
    }

    pub fn like_state(&self, id: &str) -> Option<LikeState> {
        let user_id = self.session.user_id()?;
        self.get(id).map(|p| LikeState::of(&p, &user_id))
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.like_state(id) == Some(LikeState::Liked)
    }

    /// Load the feed from the backend, replacing what is in memory.
    ///
    /// When the backend cannot be reached the cached feed is shown instead.
    /// Without a cache the feed is emptied and the error returned.
    pub async fn refetch(&self) -> Result<usize> {
        self.lock().loading = true;
        let result = self.api.list_publications().await;

        let (snapshot, outcome) = {
            let mut state = self.lock();
            state.loading = false;
            match result {
                Ok(fresh) => {
                    state.replace(fresh);
                    (Some(state.publications.clone()), Ok(state.publications.len()))
                }
                Err(e) => match self.cache.load() {
                    Some(cached) => {
                        warn!("Feed unavailable ({}), showing cached copy", e);
                        state.replace(cached);
                        (None, Ok(state.publications.len()))
                    }
                    None => {
                        state.publications.clear();
                        (None, Err(e))
                    }
                },
            }
        };

        if let Some(publications) = snapshot {
            self.cache.save(&publications);
        }
        outcome
    }

    /// Toggle the current user's like on `id`.
    ///
    /// Returns the state the backend accepted. On failure the publication is
    /// back to exactly what it was before the call.
    pub async fn toggle_like(&self, id: &str) -> Result<LikeState> {
        let user_id = self.session.require_user()?;

        let (command, next) = {
            let mut state = self.lock();
            if state.liking.contains(id) {
                return Err(Error::Busy(id.to_string()));
            }
            let Some(publication) = state.find_mut(id) else {
                return Err(Error::NotFound(format!("publication {id}")));
            };
            let next = LikeState::of(publication, &user_id).toggled();
            let command = Optimistic::apply_with(&mut publication.likes, |likes| {
                likes.toggled(&user_id)
            });
            state.liking.insert(id.to_string());
            state.pending.insert(id.to_string());
            (command, next)
        };
        debug!(
            "Optimistic like on {}: {} -> {}",
            id,
            command.original().count,
            command.predicted().count
        );

        let result = self.api.toggle_like(id).await;

        let mut state = self.lock();
        state.pending.remove(id);
        match result {
            Ok(()) => {
                command.commit();
                self.schedule_settle(&mut state, id);
                Ok(next)
            }
            Err(e) => {
                if let Some(publication) = state.find_mut(id) {
                    command.rollback(&mut publication.likes);
                }
                state.cancel_timer(id);
                state.liking.remove(id);
                error!("Could not update like on {}: {}", id, e);
                Err(e)
            }
        }
    }

    fn schedule_settle(&self, state: &mut FeedState, id: &str) {
        state.generation += 1;
        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let delay = self.settle;
        let key = id.to_string();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = lock(&shared);
            if state.timers.get(&key).map(|(g, _)| *g) == Some(generation) {
                state.timers.remove(&key);
                state.liking.remove(&key);
            }
        });

        if let Some((_, previous)) = state.timers.insert(id.to_string(), (generation, handle)) {
            previous.abort();
        }
    }

    /// Put a publication at the top of the feed.
    pub fn add_publication(&self, publication: Publication) {
        self.lock().publications.insert(0, publication);
    }

    pub fn update_publication(&self, id: &str, update: PublicationUpdate) -> bool {
        match self.lock().find_mut(id) {
            Some(publication) => {
                publication.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn set_comment_count(&self, id: &str, count: usize) -> bool {
        self.update_publication(
            id,
            PublicationUpdate {
                comments: Some(u32::try_from(count).unwrap_or(u32::MAX)),
                ..Default::default()
            },
        )
    }

    /// Callback that keeps the comment count of `id` in step with a comment list.
    pub fn comment_counter(&self, id: &str) -> impl Fn(usize) + Send + Sync + 'static {
        let shared = Arc::clone(&self.state);
        let id = id.to_string();
        move |count| {
            let mut state = lock(&shared);
            if let Some(publication) = state.find_mut(&id) {
                publication.comments = u32::try_from(count).unwrap_or(u32::MAX);
            }
        }
    }

    pub fn remove_publication(&self, id: &str) -> Option<Publication> {
        let mut state = self.lock();
        let index = state.publications.iter().position(|p| p.id == id)?;
        state.cancel_timer(id);
        state.liking.remove(id);
        Some(state.publications.remove(index))
    }

    /// Validate and send a new publication, then show it first in the feed.
    pub async fn publish(&self, draft: PublicationDraft) -> Result<Publication> {
        let publication = draft.build()?;
        self.session.require_user()?;

        let created = self.api.create_publication(publication).await?;
        info!("Published {}", created.id);
        self.add_publication(created.clone());
        Ok(created)
    }

    /// Delete one of the current user's publications.
    pub async fn delete_publication(&self, id: &str) -> Result<()> {
        let user_id = self.session.require_user()?;
        let publication = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("publication {id}")))?;
        if !publication.is_authored_by(&user_id) {
            return Err(Error::Forbidden);
        }

        self.api.delete_publication(id).await?;
        self.remove_publication(id);
        info!("Deleted publication {}", id);
        Ok(())
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        let mut state = self.lock();
        for (_, (_, handle)) in state.timers.drain() {
            handle.abort();
        }
    }
}

fn lock(state: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MockFeedApi,
        test::{publication, server_error, session_for, GatedApi},
    };
    use pretty_assertions::assert_eq;

    fn feed_with(api: impl FeedApi + 'static, user: Option<&str>) -> FeedController {
        let session = user.map(session_for).unwrap_or_else(Session::anonymous);
        FeedController::new(Arc::new(api), session)
    }

    fn seed(feed: &FeedController, publications: Vec<Publication>) {
        for publication in publications.into_iter().rev() {
            feed.add_publication(publication);
        }
    }

    #[tokio::test]
    async fn unauthenticated_like_sends_nothing() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like().never();
        let feed = feed_with(api, None);
        seed(&feed, vec![publication("p1", 3, &[])]);

        let err = feed.toggle_like("p1").await.unwrap_err();
        assert!(err.to_string().contains("must be logged in"));
        assert_eq!(feed.get("p1").unwrap().likes.count, 3);
        assert!(!feed.is_liking("p1"));
    }

    #[tokio::test]
    async fn malformed_token_is_unauthenticated() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like().never();
        let feed = FeedController::new(Arc::new(api), Session::with_token("broken"));
        seed(&feed, vec![publication("p1", 0, &[])]);

        assert!(matches!(feed.toggle_like("p1").await, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn unknown_publication_sends_nothing() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like().never();
        let feed = feed_with(api, Some("u"));

        assert!(matches!(feed.toggle_like("nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_toggles_alternate_and_settle() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like()
            .withf(|id| id == "p1")
            .times(2)
            .returning(|_| Ok(()));
        let feed = feed_with(api, Some("u"));
        seed(&feed, vec![publication("p1", 0, &[])]);

        assert_eq!(feed.toggle_like("p1").await.unwrap(), LikeState::Liked);
        let liked = feed.get("p1").unwrap();
        assert_eq!(liked.likes.count, 1);
        assert!(liked.is_liked_by("u"));
        assert!(feed.is_liked("p1"));

        // still settling: the control is disabled
        assert!(feed.is_liking("p1"));
        assert!(matches!(feed.toggle_like("p1").await, Err(Error::Busy(_))));

        tokio::time::sleep(SETTLE_DELAY + Duration::from_millis(10)).await;
        assert!(!feed.is_liking("p1"));

        assert_eq!(feed.toggle_like("p1").await.unwrap(), LikeState::NotLiked);
        let unliked = feed.get("p1").unwrap();
        assert_eq!(unliked.likes.count, 0);
        assert!(!unliked.is_liked_by("u"));
        assert!(!feed.is_liked("p1"));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_feed_aborts_settle_timers() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like().times(1).returning(|_| Ok(()));
        let feed = feed_with(api, Some("u"));
        seed(&feed, vec![publication("p1", 0, &[])]);

        feed.toggle_like("p1").await.unwrap();
        assert!(feed.is_liking("p1"));
        let state = Arc::downgrade(&feed.state);
        drop(feed);

        // the aborted timer releases its handle on the state
        tokio::task::yield_now().await;
        assert!(state.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn other_publications_are_not_blocked() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like().times(2).returning(|_| Ok(()));
        let feed = feed_with(api, Some("u"));
        seed(&feed, vec![publication("p1", 0, &[]), publication("p2", 5, &[])]);

        feed.toggle_like("p1").await.unwrap();
        assert!(feed.is_liking("p1"));
        assert_eq!(feed.toggle_like("p2").await.unwrap(), LikeState::Liked);
        assert_eq!(feed.get("p2").unwrap().likes.count, 6);
    }

    #[tokio::test]
    async fn failure_restores_previous_state() {
        let mut api = MockFeedApi::new();
        api.expect_toggle_like().times(1).returning(|_| Err(server_error()));
        let feed = feed_with(api, Some("u"));
        seed(&feed, vec![publication("p1", 2, &["u", "v"])]);
        let before = feed.get("p1").unwrap();

        let err = feed.toggle_like("p1").await.unwrap_err();
        assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
        assert_eq!(feed.get("p1").unwrap(), before);
        // no settle delay after a failure
        assert!(!feed.is_liking("p1"));
    }

    #[tokio::test]
    async fn optimistic_state_is_visible_then_reverted() {
        let api = Arc::new(GatedApi::default());
        let feed = Arc::new(FeedController::new(api.clone(), session_for("u")));
        seed(&feed, vec![publication("p1", 3, &[])]);

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.toggle_like("p1").await }
        });
        api.wait_for_request().await;

        let during = feed.get("p1").unwrap();
        assert_eq!(during.likes.count, 4);
        assert_eq!(during.likes.users.iter().collect::<Vec<_>>(), vec!["u"]);
        assert!(feed.is_liking("p1"));

        api.release(Err(server_error()));
        assert!(task.await.unwrap().is_err());

        let after = feed.get("p1").unwrap();
        assert_eq!(after.likes.count, 3);
        assert!(after.likes.users.is_empty());
    }

    #[tokio::test]
    async fn refetch_keeps_likes_of_in_flight_toggle() {
        let api = Arc::new(GatedApi::default());
        api.set_feed(vec![publication("p1", 10, &["x"]), publication("p2", 7, &[])]);
        let feed = Arc::new(FeedController::new(api.clone(), session_for("u")));
        seed(&feed, vec![publication("p1", 3, &[]), publication("p2", 1, &[])]);

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.toggle_like("p1").await }
        });
        api.wait_for_request().await;

        feed.refetch().await.unwrap();
        assert_eq!(feed.get("p1").unwrap().likes.count, 4);
        assert_eq!(feed.get("p2").unwrap().likes.count, 7);

        api.release(Err(server_error()));
        assert!(task.await.unwrap().is_err());
        assert_eq!(feed.get("p1").unwrap().likes.count, 3);
    }

    #[tokio::test]
    async fn refetch_falls_back_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(Some(dir.path().to_path_buf()));

        let mut online = MockFeedApi::new();
        online
            .expect_list_publications()
            .returning(|| Ok(vec![publication("p1", 1, &["a"])]));
        let feed = feed_with(online, None).with_cache(cache.clone());
        assert_eq!(feed.refetch().await.unwrap(), 1);

        let mut offline = MockFeedApi::new();
        offline
            .expect_list_publications()
            .returning(|| Err(server_error()));
        let feed = feed_with(offline, None).with_cache(cache);
        assert_eq!(feed.refetch().await.unwrap(), 1);
        assert_eq!(feed.publications()[0].id, "p1");
    }

    #[tokio::test]
    async fn refetch_without_cache_empties_feed() {
        let mut api = MockFeedApi::new();
        api.expect_list_publications()
            .returning(|| Err(server_error()));
        let feed = feed_with(api, None);
        seed(&feed, vec![publication("old", 0, &[])]);

        assert!(feed.refetch().await.is_err());
        assert!(feed.publications().is_empty());
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn publish_validates_before_sending() {
        let mut api = MockFeedApi::new();
        api.expect_create_publication().never();
        let feed = feed_with(api, Some("u"));

        let err = feed.publish(PublicationDraft::new("  ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn publish_prepends() {
        let mut api = MockFeedApi::new();
        api.expect_create_publication()
            .withf(|p| p.text == "Thor")
            .returning(|_| Ok(publication("new", 0, &[])));
        let feed = feed_with(api, Some("u"));
        seed(&feed, vec![publication("p1", 0, &[])]);

        feed.publish(PublicationDraft::new(" Thor ")).await.unwrap();
        let ids: Vec<_> = feed.publications().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["new", "p1"]);
    }

    #[tokio::test]
    async fn only_the_author_deletes() {
        let mut api = MockFeedApi::new();
        api.expect_delete_publication()
            .withf(|id| id == "mine")
            .times(1)
            .returning(|_| Ok(()));
        let feed = feed_with(api, Some("author"));
        // fixtures are written by "author"
        let mut theirs = publication("theirs", 0, &[]);
        theirs.author.id = "someone".into();
        seed(&feed, vec![publication("mine", 0, &[]), theirs]);

        assert!(matches!(feed.delete_publication("theirs").await, Err(Error::Forbidden)));
        feed.delete_publication("mine").await.unwrap();
        assert!(feed.get("mine").is_none());
        assert!(feed.get("theirs").is_some());
    }

    #[test]
    fn comment_counter_updates_publication() {
        let feed = feed_with(MockFeedApi::new(), None);
        seed(&feed, vec![publication("p1", 0, &[])]);
        let counter = feed.comment_counter("p1");
        counter(4);
        assert_eq!(feed.get("p1").unwrap().comments, 4);
        assert!(!feed.set_comment_count("missing", 1));
    }
}
