use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use gateprep_algo::UserState;
use sqlx::{PgPool, Row, SqlitePool};

use super::{StateStore, StorageError, TestRecord};

const SELECT_STATE: &str = r#"SELECT "document" FROM "adaptive_user_states" WHERE "userId" = $1"#;

const UPSERT_STATE: &str = r#"
    INSERT INTO "adaptive_user_states" ("userId", "document", "updatedAt")
    VALUES ($1, $2, $3)
    ON CONFLICT ("userId") DO UPDATE SET
        "document" = EXCLUDED."document",
        "updatedAt" = EXCLUDED."updatedAt"
"#;

const DELETE_STATE: &str = r#"DELETE FROM "adaptive_user_states" WHERE "userId" = $1"#;

const INSERT_TEST: &str = r#"
    INSERT INTO "test_history" (
        "id", "userId", "subject", "score", "difficultyLevel",
        "timeTaken", "numQuestions", "correctAnswers", "testDate"
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

const LIST_TESTS: &str = r#"
    SELECT * FROM "test_history"
    WHERE "userId" = $1
    ORDER BY "testDate" DESC
    LIMIT $2
"#;

const LIST_TESTS_FOR_SUBJECT: &str = r#"
    SELECT * FROM "test_history"
    WHERE "userId" = $1 AND "subject" = $2
    ORDER BY "testDate" DESC
    LIMIT $3
"#;

/// SQLite spells numbered parameters `?N`.
fn sqlite_sql(sql: &str) -> String {
    sql.replace('$', "?")
}

/// Fixed-width UTC timestamps so that text ordering is chronological.
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

macro_rules! test_record_from_row {
    ($row:expr) => {{
        let row = $row;
        let num_questions: i32 = row.try_get("numQuestions")?;
        let correct_answers: i32 = row.try_get("correctAnswers")?;
        let test_date: String = row.try_get("testDate")?;
        TestRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("userId")?,
            subject: row.try_get("subject")?,
            score: row.try_get("score")?,
            difficulty_level: row.try_get("difficultyLevel")?,
            time_taken: row.try_get("timeTaken")?,
            num_questions: num_questions.max(0) as u32,
            correct_answers: correct_answers.max(0) as u32,
            test_date: parse_ts(&test_date)?,
        }
    }};
}

/// State documents stored as JSON text, one row per user.
#[derive(Clone)]
pub enum SqlStateStore {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl SqlStateStore {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::Sqlite(pool)
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(pool)
    }
}

#[async_trait]
impl StateStore for SqlStateStore {
    async fn load_state(&self, user_id: &str) -> Result<Option<UserState>, StorageError> {
        let document: Option<String> = match self {
            Self::Sqlite(pool) => {
                sqlx::query_scalar(&sqlite_sql(SELECT_STATE))
                    .bind(user_id)
                    .fetch_optional(pool)
                    .await?
            }
            Self::Postgres(pool) => {
                sqlx::query_scalar(SELECT_STATE)
                    .bind(user_id)
                    .fetch_optional(pool)
                    .await?
            }
        };

        match document {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save_state(&self, state: &UserState) -> Result<(), StorageError> {
        let document = serde_json::to_string(state)?;
        let updated_at = format_ts(state.timestamp);

        match self {
            Self::Sqlite(pool) => {
                sqlx::query(&sqlite_sql(UPSERT_STATE))
                    .bind(&state.user_id)
                    .bind(&document)
                    .bind(&updated_at)
                    .execute(pool)
                    .await?;
            }
            Self::Postgres(pool) => {
                sqlx::query(UPSERT_STATE)
                    .bind(&state.user_id)
                    .bind(&document)
                    .bind(&updated_at)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete_state(&self, user_id: &str) -> Result<(), StorageError> {
        match self {
            Self::Sqlite(pool) => {
                sqlx::query(&sqlite_sql(DELETE_STATE))
                    .bind(user_id)
                    .execute(pool)
                    .await?;
            }
            Self::Postgres(pool) => {
                sqlx::query(DELETE_STATE).bind(user_id).execute(pool).await?;
            }
        }
        Ok(())
    }

    async fn append_test_result(&self, record: &TestRecord) -> Result<(), StorageError> {
        let test_date = format_ts(record.test_date);
        let num_questions = i32::try_from(record.num_questions).unwrap_or(i32::MAX);
        let correct_answers = i32::try_from(record.correct_answers).unwrap_or(i32::MAX);

        match self {
            Self::Sqlite(pool) => {
                sqlx::query(&sqlite_sql(INSERT_TEST))
                    .bind(&record.id)
                    .bind(&record.user_id)
                    .bind(&record.subject)
                    .bind(record.score)
                    .bind(&record.difficulty_level)
                    .bind(record.time_taken)
                    .bind(num_questions)
                    .bind(correct_answers)
                    .bind(&test_date)
                    .execute(pool)
                    .await?;
            }
            Self::Postgres(pool) => {
                sqlx::query(INSERT_TEST)
                    .bind(&record.id)
                    .bind(&record.user_id)
                    .bind(&record.subject)
                    .bind(record.score)
                    .bind(&record.difficulty_level)
                    .bind(record.time_taken)
                    .bind(num_questions)
                    .bind(correct_answers)
                    .bind(&test_date)
                    .execute(pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn list_test_results(
        &self,
        user_id: &str,
        subject: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TestRecord>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let records = match self {
            Self::Sqlite(pool) => {
                let rows = match subject {
                    Some(subject) => {
                        sqlx::query(&sqlite_sql(LIST_TESTS_FOR_SUBJECT))
                            .bind(user_id)
                            .bind(subject)
                            .bind(limit)
                            .fetch_all(pool)
                            .await?
                    }
                    None => {
                        sqlx::query(&sqlite_sql(LIST_TESTS))
                            .bind(user_id)
                            .bind(limit)
                            .fetch_all(pool)
                            .await?
                    }
                };
                let mut records = Vec::with_capacity(rows.len());
                for row in &rows {
                    records.push(test_record_from_row!(row));
                }
                records
            }
            Self::Postgres(pool) => {
                let rows = match subject {
                    Some(subject) => {
                        sqlx::query(LIST_TESTS_FOR_SUBJECT)
                            .bind(user_id)
                            .bind(subject)
                            .bind(limit)
                            .fetch_all(pool)
                            .await?
                    }
                    None => {
                        sqlx::query(LIST_TESTS)
                            .bind(user_id)
                            .bind(limit)
                            .fetch_all(pool)
                            .await?
                    }
                };
                let mut records = Vec::with_capacity(rows.len());
                for row in &rows {
                    records.push(test_record_from_row!(row));
                }
                records
            }
        };

        Ok(records)
    }
}
