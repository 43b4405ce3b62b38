use super::RawEvent;
use chrono::NaiveDate;
use sqlx::{error::Error as SQLError, postgres::Postgres, Executor, PgPool};

/// Creates the event log and aggregate tables if they do not exist
pub async fn setup_tables(pool: &PgPool) -> Result<(), SQLError> {
    for statement in include_str!("sql/schema.sql").split(';') {
        let statement = statement.trim();

        if !statement.is_empty() {
            sqlx::query(statement).execute(pool).await?;
        }
    }

    Ok(())
}

/// Appends one immutable row to the raw event log
pub async fn insert_event<'e, E>(con: E, event: &RawEvent) -> Result<(), SQLError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
            INSERT INTO events ( site_id, event_type, path, user_id, occurred_at )
            VALUES ( $1, $2, $3, $4, $5 )
        "#,
    )
    .bind(&event.site_id)
    .bind(&event.event_type)
    .bind(&event.path)
    .bind(event.user_id.as_deref())
    .bind(event.occurred_at)
    .execute(con)
    .await?;

    Ok(())
}

/// Records a user in the dedup ledger for the given site and day
///
/// Returns whether the row was actually inserted. `false` means the user has
/// already been counted for that day.
pub async fn record_unique_user<'e, E>(
    con: E,
    site_id: &str,
    date: NaiveDate,
    user_id: &str,
) -> Result<bool, SQLError>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
            INSERT INTO daily_unique_users ( site_id, date, user_id )
            VALUES ( $1, $2, $3 )
            ON CONFLICT DO NOTHING
        "#,
    )
    .bind(site_id)
    .bind(date)
    .bind(user_id)
    .execute(con)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Counts one view towards the daily stats of a site
///
/// `unique_inserted` must reflect whether the dedup ledger accepted the
/// event's user within the same transaction, it gates the unique counter.
pub async fn upsert_daily_stats<'e, E>(
    con: E,
    site_id: &str,
    date: NaiveDate,
    unique_inserted: bool,
) -> Result<(), SQLError>
where
    E: Executor<'e, Database = Postgres>,
{
    let unique_delta: i64 = if unique_inserted { 1 } else { 0 };

    sqlx::query(
        r#"
            INSERT INTO daily_stats ( site_id, date, total_views, unique_users )
            VALUES ( $1, $2, 1, $3 )
            ON CONFLICT ( site_id, date )
            DO UPDATE SET
                total_views = daily_stats.total_views + 1,
                unique_users = daily_stats.unique_users + EXCLUDED.unique_users
        "#,
    )
    .bind(site_id)
    .bind(date)
    .bind(unique_delta)
    .execute(con)
    .await?;

    Ok(())
}

/// Counts one view towards a path of a site
pub async fn upsert_path_views<'e, E>(
    con: E,
    site_id: &str,
    date: NaiveDate,
    path: &str,
) -> Result<(), SQLError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
            INSERT INTO daily_path_views ( site_id, date, path, views )
            VALUES ( $1, $2, $3, 1 )
            ON CONFLICT ( site_id, date, path )
            DO UPDATE SET views = daily_path_views.views + 1
        "#,
    )
    .bind(site_id)
    .bind(date)
    .bind(path)
    .execute(con)
    .await?;

    Ok(())
}

/// Fetches the `(total_views, unique_users)` counters of a site and day
pub async fn fetch_daily_stats<'e, E>(
    con: E,
    site_id: &str,
    date: NaiveDate,
) -> Result<Option<(i64, i64)>, SQLError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
            SELECT total_views, unique_users FROM daily_stats
            WHERE site_id = $1 AND date = $2
        "#,
    )
    .bind(site_id)
    .bind(date)
    .fetch_optional(con)
    .await
}

/// Fetches the most viewed paths of a site and day, ordered by views descending
pub async fn fetch_top_paths<'e, E>(
    con: E,
    site_id: &str,
    date: NaiveDate,
    limit: i64,
) -> Result<Vec<(String, i64)>, SQLError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
            SELECT path, views FROM daily_path_views
            WHERE site_id = $1 AND date = $2
            ORDER BY views DESC
            LIMIT $3
        "#,
    )
    .bind(site_id)
    .bind(date)
    .bind(limit)
    .fetch_all(con)
    .await
}
