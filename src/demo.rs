//! Demo-only affordances: bulk CSV import and a server-rendered page.

use crate::{
    dto::{CreateJokeRequest, Validate},
    errors::{AppError, JokeError},
    models::{Joke, NewJoke},
    AppState,
};
use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::Html,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jotd", get(joke_of_the_day_page).post(upload_jokes_csv))
        .route("/jotd/{date}", get(joke_for_date_page))
}

/// One CSV record. An empty or absent description column is kept as an
/// empty string, like the JSON API does for `""`.
#[derive(Debug, Deserialize)]
struct CsvJokeRow {
    date: Option<NaiveDate>,
    joke: Option<String>,
    #[serde(default)]
    description: String,
}

impl From<CsvJokeRow> for CreateJokeRequest {
    fn from(row: CsvJokeRow) -> Self {
        CreateJokeRequest {
            date: row.date,
            joke: row.joke,
            description: Some(row.description),
        }
    }
}

/// Parses `date,joke,description` rows. Blank lines are skipped and fields
/// are trimmed; every row must pass the same validation as the JSON API.
pub fn parse_jokes_csv(data: &[u8]) -> Result<Vec<NewJoke>, AppError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::InvalidInput("CSV file is empty.".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);
    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidInput(format!("Malformed CSV header: {}", e)))?
        .clone();

    let mut jokes = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::InvalidInput(format!("Malformed CSV: {}", e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: CsvJokeRow = record
            .deserialize(Some(&headers))
            .map_err(|e| AppError::InvalidInput(format!("Malformed CSV row on line {}: {}", line, e)))?;
        jokes.push(CreateJokeRequest::from(row).validate()?);
    }

    if jokes.is_empty() {
        return Err(AppError::InvalidInput("CSV file contains no jokes.".to_string()));
    }
    Ok(jokes)
}

/// Handler for POST /jotd (multipart field `csv`)
pub async fn upload_jokes_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<&'static str, AppError> {
    let mut csv_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        match field_name.as_str() {
            "csv" => csv_data = Some(field.bytes().await?.to_vec()),
            _ => tracing::debug!("Ignoring unknown multipart field: {}", field_name),
        }
    }

    let csv_data = csv_data.ok_or_else(|| AppError::MissingFormField("csv".to_string()))?;
    let jokes = parse_jokes_csv(&csv_data)?;
    let count = jokes.len();

    // Rows are created one by one; a failure leaves earlier rows stored.
    for joke in jokes {
        state.service.create(joke).await?;
    }

    tracing::info!(count, "Jokes uploaded from CSV");
    Ok("Jokes uploaded successfully.")
}

/// Handler for GET /jotd
pub async fn joke_of_the_day_page(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, AppError> {
    let date = state.service.today();
    let joke = match state.service.get_for_today().await {
        Ok(joke) => Some(joke),
        Err(JokeError::NoJokeForDate(_)) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(Html(render_page(date, joke.as_ref())?))
}

/// Handler for GET /jotd/{date}
pub async fn joke_for_date_page(
    State(state): State<Arc<AppState>>,
    Path(date_str): Path<String>,
) -> Result<Html<String>, AppError> {
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| AppError::InvalidInput(format!("Invalid date '{}': {}", date_str, e)))?;
    let joke = state.service.get_for_date(date).await?;
    Ok(Html(render_page(date, joke.as_ref())?))
}

/// The demo page for one date.
#[derive(Template)]
#[template(path = "jotd.html")]
pub struct JotdTemplate<'a> {
    pub date: NaiveDate,
    pub joke: Option<&'a Joke>,
}

impl JotdTemplate<'_> {
    fn description(&self) -> Option<&str> {
        self.joke
            .and_then(|joke| joke.description.as_deref())
            .filter(|d| !d.is_empty())
    }
}

pub fn render_page(date: NaiveDate, joke: Option<&Joke>) -> Result<String, AppError> {
    Ok(JotdTemplate { date, joke }.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let csv = b"date,joke,description\n2024-01-01, Why did... ,\n\n2024-01-02,Knock knock,classic\n";
        let jokes = parse_jokes_csv(csv).unwrap();
        assert_eq!(jokes.len(), 2);
        assert_eq!(jokes[0].text, "Why did...");
        assert_eq!(jokes[0].description.as_deref(), Some(""));
        assert_eq!(jokes[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(jokes[1].description.as_deref(), Some("classic"));
    }

    #[test]
    fn empty_file_and_header_only_are_rejected() {
        match parse_jokes_csv(b"") {
            Err(AppError::InvalidInput(msg)) => assert_eq!(msg, "CSV file is empty."),
            other => panic!("unexpected: {other:?}"),
        }
        match parse_jokes_csv(b"date,joke,description\n") {
            Err(AppError::InvalidInput(msg)) => assert_eq!(msg, "CSV file contains no jokes."),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn invalid_rows_fail_validation() {
        let err = parse_jokes_csv(b"date,joke,description\n2024-01-01,,\n").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = parse_jokes_csv(b"date,joke,description\nyesterday,ha,\n").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn page_escapes_joke_text() {
        let joke = Joke {
            id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            text: "<script>alert('x')</script>".into(),
            description: None,
        };
        let html = render_page(joke.date, Some(&joke)).unwrap();
        assert!(html.contains("&lt;script&gt;alert("));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<h2>2024-01-01</h2>"));
        assert!(!html.contains("class=\"description\""));

        let empty = render_page(joke.date, None).unwrap();
        assert!(empty.contains("No joke is scheduled"));
    }

    #[test]
    fn page_shows_non_empty_description() {
        let joke = Joke {
            id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            text: "Knock knock".into(),
            description: Some("classic".into()),
        };
        let html = render_page(joke.date, Some(&joke)).unwrap();
        assert!(html.contains("<p class=\"description\">classic</p>"));
    }
}
