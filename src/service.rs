//! Joke service: the one-joke-per-date rules and the translation of store
//! failures into [`JokeError`].

use crate::{
    domain::{Clock, JokeRepository},
    errors::{JokeError, RepoError},
    models::{Joke, NewJoke, Page, PageRequest},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct JokeService {
    repo: Arc<dyn JokeRepository>,
    clock: Arc<dyn Clock>,
}

impl JokeService {
    pub fn new(repo: Arc<dyn JokeRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Lists jokes, only those dated on or after `date_from` when given.
    #[instrument(name = "jokes.service.list", skip(self, request), fields(page = request.page, size = request.size))]
    pub async fn list(
        &self,
        date_from: Option<NaiveDate>,
        request: &PageRequest,
    ) -> Result<Page<Joke>, JokeError> {
        let page = self.repo.find_page(date_from, request).await?;
        debug!(returned = page.content.len(), total = page.total_elements, "Listed jokes");
        Ok(page)
    }

    #[instrument(name = "jokes.service.get_by_id", skip(self), fields(joke_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Joke, JokeError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(JokeError::NotFound(id))
    }

    /// The joke scheduled for the clock's current date.
    #[instrument(name = "jokes.service.get_for_today", skip(self))]
    pub async fn get_for_today(&self) -> Result<Joke, JokeError> {
        let today = self.clock.today();
        self.repo
            .find_by_date(today)
            .await?
            .ok_or(JokeError::NoJokeForDate(today))
    }

    /// Exact-date lookup. Absence is not an error here.
    #[instrument(name = "jokes.service.get_for_date", skip(self))]
    pub async fn get_for_date(&self, date: NaiveDate) -> Result<Option<Joke>, JokeError> {
        Ok(self.repo.find_by_date(date).await?)
    }

    /// Today's date as seen by the service clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Stores a new joke. The date's unique index decides conflicts; nothing
    /// is checked beforehand.
    #[instrument(name = "jokes.service.create", skip(self, request), fields(date = %request.date))]
    pub async fn create(&self, request: NewJoke) -> Result<Joke, JokeError> {
        let date = request.date;
        match self.repo.insert(request).await {
            Ok(joke) => {
                info!(joke_id = %joke.id, "Joke created");
                Ok(joke)
            }
            Err(RepoError::DataCorruption(reason)) => {
                warn!(%reason, "Store accepted joke but returned an unusable row");
                Err(JokeError::Service {
                    message: "Exception while adding joke".to_string(),
                    source: Some(RepoError::DataCorruption(reason)),
                })
            }
            Err(e) => Err(classify_write_failure(date, e)),
        }
    }

    /// Replaces every field of the joke stored under `id`.
    ///
    /// A body id that differs from `id` is refused before the store is
    /// touched.
    #[instrument(name = "jokes.service.update", skip(self, record), fields(joke_id = %id))]
    pub async fn update(&self, id: Uuid, record: Joke) -> Result<Joke, JokeError> {
        if record.id != id {
            warn!(body_id = %record.id, "Refusing to change joke identity");
            return Err(JokeError::DataOperation {
                message: format!("Joke ID {} cannot be changed to {}", id, record.id),
                source: None,
            });
        }

        let mut current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(JokeError::NotFound(id))?;
        current.date = record.date;
        current.text = record.text;
        current.description = record.description;

        let updated = self
            .repo
            .update(id, &current)
            .await
            .map_err(|e| match e {
                RepoError::Missing(id) => JokeError::NotFound(id),
                e => classify_write_failure(current.date, e),
            })?;
        info!("Joke updated");
        Ok(updated)
    }

    /// Deletes a joke; unknown ids are reported rather than ignored.
    #[instrument(name = "jokes.service.remove", skip(self), fields(joke_id = %id))]
    pub async fn remove(&self, id: Uuid) -> Result<(), JokeError> {
        if !self.repo.exists_by_id(id).await? {
            return Err(JokeError::NotFound(id));
        }
        self.repo
            .delete_by_id(id)
            .await
            .map_err(|e| JokeError::Service {
                message: "Exception while removing joke".to_string(),
                source: Some(e),
            })?;
        info!("Joke removed");
        Ok(())
    }
}

/// Every store failure on a write ends up as one of the three write kinds.
fn classify_write_failure(date: NaiveDate, err: RepoError) -> JokeError {
    match err {
        e @ RepoError::Integrity(_) => JokeError::DataIntegrity { date, source: e },
        RepoError::Operation(reason) => JokeError::DataOperation {
            message: format!("Joke data operation failed: {}", reason),
            source: Some(RepoError::Operation(reason)),
        },
        e => JokeError::Service {
            message: "Exception while saving joke".to_string(),
            source: Some(e),
        },
    }
}
