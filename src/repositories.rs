use crate::{
    domain::JokeRepository,
    errors::RepoError,
    models::{Joke, NewJoke, Page, PageRequest},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{self, info};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, date, joke, description FROM jokes";

#[derive(Debug, Clone)]
pub struct SqliteJokeRepository {
    pool: SqlitePool,
}

impl SqliteJokeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        info!("Initializing SqliteJokeRepository");
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct JokeRow {
    id: String,
    date: NaiveDate,
    joke: String,
    description: Option<String>,
}

impl TryFrom<JokeRow> for Joke {
    type Error = RepoError;

    fn try_from(row: JokeRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id).map_err(|e| {
            tracing::error!(joke_id = %row.id, "Stored joke has a malformed id");
            RepoError::DataCorruption(format!("malformed id '{}': {}", row.id, e))
        })?;
        Ok(Joke {
            id,
            date: row.date,
            text: row.joke,
            description: row.description,
        })
    }
}

fn push_date_filter(builder: &mut QueryBuilder<'_, Sqlite>, date_from: Option<NaiveDate>) {
    if let Some(date) = date_from {
        builder.push(" WHERE date >= ").push_bind(date);
    }
}

#[async_trait]
impl JokeRepository for SqliteJokeRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Joke>, RepoError> {
        let row: Option<JokeRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Joke::try_from).transpose()
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Joke>, RepoError> {
        let row: Option<JokeRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE date = ?"))
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Joke::try_from).transpose()
    }

    async fn find_page(
        &self,
        date_from: Option<NaiveDate>,
        request: &PageRequest,
    ) -> Result<Page<Joke>, RepoError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM jokes");
        push_date_filter(&mut count, date_from);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        push_date_filter(&mut select, date_from);
        select.push(" ORDER BY ");
        if request.sort.is_empty() {
            select.push("date ASC, ");
        }
        // Columns come from the SortProperty whitelist, never from user text.
        for order in &request.sort {
            select
                .push(order.property.column())
                .push(" ")
                .push(order.direction.as_str().to_ascii_uppercase())
                .push(", ");
        }
        select
            .push("id ASC LIMIT ")
            .push_bind(i64::from(request.size))
            .push(" OFFSET ")
            .push_bind(request.offset() as i64);

        let rows: Vec<JokeRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let content = rows
            .into_iter()
            .map(Joke::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            returned = content.len(),
            total,
            page = request.page,
            size = request.size,
            "SQLite: Listed page of jokes"
        );
        Ok(Page::new(content, request, total.max(0) as u64))
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jokes WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, joke: NewJoke) -> Result<Joke, RepoError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;
        let row: JokeRow = sqlx::query_as(
            "INSERT INTO jokes (id, date, joke, description) VALUES (?, ?, ?, ?) \
             RETURNING id, date, joke, description",
        )
        .bind(id.to_string())
        .bind(joke.date)
        .bind(joke.text.as_str())
        .bind(joke.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(joke_id = %id, date = %joke.date, "SQLite: Inserted joke");
        Joke::try_from(row)
    }

    async fn update(&self, id: Uuid, joke: &Joke) -> Result<Joke, RepoError> {
        if joke.id != id {
            return Err(RepoError::Operation(format!(
                "identifier of joke {} was altered to {}",
                id, joke.id
            )));
        }

        let mut tx = self.pool.begin().await?;
        let row: Option<JokeRow> = sqlx::query_as(
            "UPDATE jokes SET date = ?, joke = ?, description = ? WHERE id = ? \
             RETURNING id, date, joke, description",
        )
        .bind(joke.date)
        .bind(joke.text.as_str())
        .bind(joke.description.as_deref())
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            // Dropping the transaction rolls it back.
            return Err(RepoError::Missing(id));
        };
        tx.commit().await?;

        tracing::debug!(joke_id = %id, "SQLite: Updated joke");
        Joke::try_from(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM jokes WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(joke_id = %id, rows = result.rows_affected(), "SQLite: Delete statement executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, SortOrder, SortProperty};
    use crate::startup;

    async fn repo() -> SqliteJokeRepository {
        let pool = startup::connect_pool("sqlite::memory:", 1).await.unwrap();
        startup::init_schema(&pool).await.unwrap();
        SqliteJokeRepository::new(pool)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn new_joke(d: u32, text: &str) -> NewJoke {
        NewJoke {
            date: day(d),
            text: text.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let repo = repo().await;
        let stored = repo.insert(new_joke(1, "first")).await.unwrap();
        assert_eq!(stored.text, "first");
        assert_eq!(repo.find_by_id(stored.id).await.unwrap(), Some(stored.clone()));
        assert_eq!(repo.find_by_date(day(1)).await.unwrap(), Some(stored.clone()));
        assert!(repo.exists_by_id(stored.id).await.unwrap());
        assert!(!repo.exists_by_id(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_date_is_an_integrity_error() {
        let repo = repo().await;
        repo.insert(new_joke(1, "first")).await.unwrap();
        let err = repo.insert(new_joke(1, "second")).await.unwrap_err();
        assert!(matches!(err, RepoError::Integrity(_)), "{err:?}");
    }

    #[tokio::test]
    async fn blank_joke_is_rejected_by_check_constraint() {
        let repo = repo().await;
        let err = repo.insert(new_joke(1, "   ")).await.unwrap_err();
        assert!(matches!(err, RepoError::Operation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn update_refuses_identity_change() {
        let repo = repo().await;
        let stored = repo.insert(new_joke(1, "first")).await.unwrap();
        let mut changed = stored.clone();
        changed.id = Uuid::new_v4();
        let err = repo.update(stored.id, &changed).await.unwrap_err();
        assert!(matches!(err, RepoError::Operation(_)), "{err:?}");
        assert_eq!(repo.find_by_id(stored.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn update_into_taken_date_is_an_integrity_error() {
        let repo = repo().await;
        repo.insert(new_joke(1, "first")).await.unwrap();
        let mut second = repo.insert(new_joke(2, "second")).await.unwrap();
        second.date = day(1);
        let err = repo.update(second.id, &second).await.unwrap_err();
        assert!(matches!(err, RepoError::Integrity(_)), "{err:?}");
    }

    #[tokio::test]
    async fn update_of_vanished_row_reports_missing() {
        let repo = repo().await;
        let stored = repo.insert(new_joke(1, "first")).await.unwrap();
        repo.delete_by_id(stored.id).await.unwrap();
        let err = repo.update(stored.id, &stored).await.unwrap_err();
        assert!(matches!(err, RepoError::Missing(id) if id == stored.id), "{err:?}");
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let repo = repo().await;
        let stored = repo.insert(new_joke(1, "first")).await.unwrap();
        repo.delete_by_id(stored.id).await.unwrap();
        assert_eq!(repo.find_by_id(stored.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_page_filters_sorts_and_counts() {
        let repo = repo().await;
        for (d, text) in [(3, "c"), (1, "a"), (2, "b"), (5, "e"), (4, "d")] {
            repo.insert(new_joke(d, text)).await.unwrap();
        }

        let all = repo.find_page(None, &PageRequest::new(0, 2, vec![])).await.unwrap();
        assert_eq!(all.total_elements, 5);
        let dates: Vec<_> = all.content.iter().map(|j| j.date).collect();
        assert_eq!(dates, vec![day(1), day(2)]);

        let from_third = repo
            .find_page(Some(day(3)), &PageRequest::new(1, 2, vec![]))
            .await
            .unwrap();
        assert_eq!(from_third.total_elements, 3);
        let dates: Vec<_> = from_third.content.iter().map(|j| j.date).collect();
        assert_eq!(dates, vec![day(5)]);

        let desc = SortOrder {
            property: SortProperty::Joke,
            direction: Direction::Desc,
        };
        let sorted = repo.find_page(None, &PageRequest::new(0, 3, vec![desc])).await.unwrap();
        let texts: Vec<_> = sorted.content.iter().map(|j| j.text.as_str()).collect();
        assert_eq!(texts, vec!["e", "d", "c"]);
    }
}
