use crate::{
    errors::AppError,
    models::{Joke, NewJoke},
};
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

/// Checks a request body and turns it into the type the service accepts.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, AppError>;
}

/// JSON body extractor that rejects invalid input before any handler runs.
pub struct Valid<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned + Send,
    T::Output: Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
        Ok(Valid(payload.validate()?))
    }
}

/// Body of `POST /api/v1/jokes`; also one row of a demo CSV upload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJokeRequest {
    pub date: Option<NaiveDate>,
    pub joke: Option<String>,
    pub description: Option<String>,
}

/// Body of `PUT /api/v1/jokes/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateJokeRequest {
    pub id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub joke: Option<String>,
    pub description: Option<String>,
}

/// A validated update whose id may still be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JokeUpdate {
    pub id: Option<Uuid>,
    pub date: NaiveDate,
    pub text: String,
    pub description: Option<String>,
}

impl JokeUpdate {
    /// A body without an id targets the joke named in the path.
    pub fn into_record(self, path_id: Uuid) -> Joke {
        Joke {
            id: self.id.unwrap_or(path_id),
            date: self.date,
            text: self.text,
            description: self.description,
        }
    }
}

fn require_fields(
    date: Option<NaiveDate>,
    joke: Option<String>,
) -> Result<(NaiveDate, String), AppError> {
    let mut errors = Vec::new();
    if date.is_none() {
        errors.push("date: must not be null".to_string());
    }
    let joke = joke.filter(|j| !j.trim().is_empty());
    if joke.is_none() {
        errors.push("joke: must not be blank".to_string());
    }
    match (date, joke) {
        (Some(date), Some(joke)) => Ok((date, joke)),
        _ => Err(AppError::Validation(errors)),
    }
}

impl Validate for CreateJokeRequest {
    type Output = NewJoke;

    fn validate(self) -> Result<NewJoke, AppError> {
        let (date, text) = require_fields(self.date, self.joke)?;
        Ok(NewJoke {
            date,
            text,
            description: self.description,
        })
    }
}

impl Validate for UpdateJokeRequest {
    type Output = JokeUpdate;

    fn validate(self) -> Result<JokeUpdate, AppError> {
        let (date, text) = require_fields(self.date, self.joke)?;
        Ok(JokeUpdate {
            id: self.id,
            date,
            text,
            description: self.description,
        })
    }
}
