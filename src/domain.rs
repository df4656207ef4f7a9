use crate::errors::RepoError;
use crate::models::{Joke, NewJoke, Page, PageRequest};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use uuid::Uuid;

/// Persistence operations for jokes.
///
/// Implementations keep a unique index on `date`; the service relies on it
/// instead of checking for duplicates up front.
#[async_trait]
pub trait JokeRepository: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Retrieves a joke by its unique ID.
    /// Returns Ok(None) if the joke is not found.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Joke>, RepoError>;

    /// Retrieves the joke scheduled for exactly `date`.
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Joke>, RepoError>;

    /// Lists one page of jokes, optionally only those dated on or after `date_from`.
    async fn find_page(
        &self,
        date_from: Option<NaiveDate>,
        request: &PageRequest,
    ) -> Result<Page<Joke>, RepoError>;

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Stores a new joke under a freshly assigned id and returns the stored row.
    async fn insert(&self, joke: NewJoke) -> Result<Joke, RepoError>;

    /// Overwrites the row stored under `id`.
    ///
    /// Fails with `RepoError::Operation` if `joke.id` differs from `id` or no
    /// row exists.
    async fn update(&self, id: Uuid, joke: &Joke) -> Result<Joke, RepoError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Source of the current calendar date.
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Reads the local date from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
