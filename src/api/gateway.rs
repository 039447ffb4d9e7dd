use async_trait::async_trait;
use log::debug;
use reqwest::header;
use reqwest_middleware::RequestBuilder;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::Config,
    error::{Error, Result},
    form::{NewAnimal, NewPublication, Upload},
    model::{
        AdoptionRequest, Animal, AnimalFilter, Comment, NewComment, NewUser, Profile,
        ProfilePhotoResponse, Publication, User, UserEnvelope,
    },
    session::Session,
};

use super::{check, read_json, segment, ApiClient, FeedApi};

const USER_AGENT: &str = concat!("petfeed/", env!("CARGO_PKG_VERSION"));

/// REST client for the adoption feed backend.
///
/// One call, one request: nothing is retried and any non-2xx status comes
/// back as `Error::Request`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    inner: ApiClient,
    session: Session,
}

impl GatewayClient {
    pub fn new(config: &Config, session: Session) -> Self {
        Self::with_base_url(config.api(), session, config.limit())
    }

    pub fn with_base_url(base_url: &str, session: Session, limit: usize) -> Self {
        Self {
            inner: ApiClient::new(base_url, limit),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn wrap_request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(header::USER_AGENT, USER_AGENT);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let (client, _semaphore) = self.inner.client().await;
        let request = self.wrap_request(client.get(self.inner.url(path)).query(query));
        let response = check(request.send().await?).await?;
        read_json(response).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let (client, _semaphore) = self.inner.client().await;
        let mut request = client.request(method, self.inner.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.wrap_request(request).send().await?;
        check(response).await
    }

    async fn send_form(
        &self,
        method: reqwest::Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response> {
        let (client, _semaphore) = self.inner.client().await;
        let request = client.request(method, self.inner.url(path)).multipart(form);
        let response = self.wrap_request(request).send().await?;
        check(response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send_json::<()>(reqwest::Method::DELETE, path, None)
            .await?;
        Ok(())
    }

    pub async fn list_animals(&self, filter: &AnimalFilter) -> Result<Vec<Animal>> {
        debug!("Listing animals with {} filters", filter.active());
        self.get("/animais", &filter.query()).await
    }

    pub async fn create_animal(&self, animal: NewAnimal) -> Result<Animal> {
        let form = animal.into_form()?;
        let response = self
            .send_form(reqwest::Method::POST, "/animais", form)
            .await?;
        read_json(response).await
    }

    /// Delete an animal registered by the current user.
    ///
    /// The owner is checked against the listing first; nobody else gets a
    /// DELETE sent on their behalf.
    pub async fn delete_animal(&self, animal_id: &str) -> Result<()> {
        let user_id = self.session.require_user()?;
        let animals = self.list_animals(&AnimalFilter::default()).await?;
        let animal = animals
            .iter()
            .find(|animal| animal.id == animal_id)
            .ok_or_else(|| Error::NotFound(format!("animal {animal_id}")))?;
        if !animal.is_owned_by(&user_id) {
            return Err(Error::Forbidden);
        }
        self.delete(&format!("/animais/{}", segment(animal_id))).await
    }

    pub async fn current_user(&self) -> Result<User> {
        let envelope: UserEnvelope = self.get("/auth/me", &[]).await?;
        Ok(envelope.user)
    }

    pub async fn update_user(&self, profile: &Profile) -> Result<User> {
        let response = self
            .send_json(reqwest::Method::PUT, "/auth/me", Some(profile))
            .await?;
        let envelope: UserEnvelope = read_json(response).await?;
        Ok(envelope.user)
    }

    pub async fn upload_profile_photo(&self, photo: Upload) -> Result<ProfilePhotoResponse> {
        let form = reqwest::multipart::Form::new().part("profilePhoto", photo.into_part()?);
        let response = self
            .send_form(reqwest::Method::POST, "/auth/profile-photo", form)
            .await?;
        read_json(response).await
    }

    pub async fn register(&self, user: &NewUser) -> Result<User> {
        let response = self
            .send_json(reqwest::Method::POST, "/auth/register", Some(user))
            .await?;
        let bytes = response.bytes().await?;
        // some deployments wrap the account in `{ user }`, others do not
        match serde_json::from_slice::<UserEnvelope>(&bytes) {
            Ok(envelope) => Ok(envelope.user),
            Err(_) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    pub async fn request_adoption(&self, request: &AdoptionRequest) -> Result<()> {
        self.send_json(reqwest::Method::POST, "/adoption-requests", Some(request))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FeedApi for GatewayClient {
    async fn list_publications(&self) -> Result<Vec<Publication>> {
        self.get("/publications", &[]).await
    }

    async fn create_publication(&self, publication: NewPublication) -> Result<Publication> {
        let form = publication.into_form()?;
        let response = self
            .send_form(reqwest::Method::POST, "/publications", form)
            .await?;
        read_json(response).await
    }

    async fn delete_publication(&self, publication_id: &str) -> Result<()> {
        self.delete(&format!("/publications/{}", segment(publication_id)))
            .await
    }

    async fn toggle_like(&self, publication_id: &str) -> Result<()> {
        let path = format!("/publications/{}/like", segment(publication_id));
        // the response body carries the updated publication; the feed keeps its own prediction
        self.send_json::<()>(reqwest::Method::POST, &path, None)
            .await?;
        Ok(())
    }

    async fn get_comments(&self, publication_id: &str) -> Result<Vec<Comment>> {
        let path = format!("/publications/{}/comments", segment(publication_id));
        self.get(&path, &[]).await
    }

    async fn add_comment(&self, publication_id: &str, text: &str) -> Result<()> {
        let path = format!("/publications/{}/comment", segment(publication_id));
        self.send_json(reqwest::Method::POST, &path, Some(&NewComment { text }))
            .await?;
        Ok(())
    }

    async fn delete_comment(&self, publication_id: &str, comment_id: &str) -> Result<()> {
        self.delete(&format!(
            "/publications/{}/comments/{}",
            segment(publication_id),
            segment(comment_id)
        ))
        .await
    }
}
