use {
    std::{collections::BTreeMap, time::Duration},
    tracing::info,
    async_trait::async_trait,
    sqlx::{
        postgres::{PgPool, PgPoolOptions, PgRow},
        Row,
    },
    crate::{
        config::DatabaseConfig,
        entity::ReviewDocument,
        error::StoreError,
        store::{sort_bank_stats, BankStats, IndexSpec, ReviewStore, REVIEW_INDEXES},
    },
};

const COLUMNS: &[&str] = &[
    "review_id",
    "review_text",
    "rating",
    "review_date",
    "bank_name",
    "source",
    "review_length",
    "word_count",
    "sentiment_label",
    "sentiment_confidence",
    "themes",
    "processed_at",
    "uploaded_at",
    "data_version",
];

// stored analysis survives a re-upload that carries none
const MERGED_COLUMNS: &[&str] = &["sentiment_label", "sentiment_confidence", "themes"];

/// Review collection backed by a postgres table: the database name maps to a
/// schema, the collection name to a table inside it.
pub struct Database {
    pool: PgPool,
    schema: String,
    table: String,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let schema = validate_identifier(config.database_name())?;
        let table = validate_identifier(config.collection_name())?;
        let connection_string = config.connection_string()
            .ok_or_else(|| StoreError::NotConfigured("database connection string is not set".to_owned()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(Duration::from_secs(10))
            .connect(connection_string)
            .await
            .map_err(|err| StoreError::Connection(err.to_string()))?;

        info!("connected to review store {}.{}", schema, table);

        Ok(Self {
            pool,
            schema,
            table,
        })
    }

    fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

#[async_trait]
impl ReviewStore for Database {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("create schema if not exists {}", self.schema))
            .execute(&self.pool)
            .await?;
        sqlx::query(&create_table_statement(&self.qualified_table()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_batch(&self, documents: &[ReviewDocument]) -> Result<usize, StoreError> {
        let statement = upsert_statement(&self.qualified_table());
        let mut tx = self.pool.begin().await?;

        for document in documents {
            sqlx::query(&statement)
                .bind(document.review_id())
                .bind(document.review_text())
                .bind(document.rating())
                .bind(document.review_date())
                .bind(document.bank_name())
                .bind(document.source())
                .bind(document.review_length())
                .bind(document.word_count())
                .bind(document.sentiment_label())
                .bind(document.sentiment_confidence())
                .bind(document.themes().map(|v| v.to_vec()))
                .bind(document.processed_at())
                .bind(document.uploaded_at())
                .bind(document.data_version())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(documents.len())
    }

    async fn create_indexes(&self) -> Result<(), StoreError> {
        for index in REVIEW_INDEXES {
            sqlx::query(&index_statement(&self.table, &self.qualified_table(), index))
                .execute(&self.pool)
                .await?;
        }
        info!("ensured {} indexes on {}", REVIEW_INDEXES.len(), self.qualified_table());
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(&format!("select count(*) from {}", self.qualified_table()))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn count_by_bank(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(&format!("select bank_name, count(*) from {} group by bank_name", self.qualified_table()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(bank, count)| (bank, count.max(0) as u64)).collect())
    }

    async fn count_by_rating(&self) -> Result<BTreeMap<i32, u64>, StoreError> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(&format!("select rating, count(*) from {} group by rating", self.qualified_table()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(rating, count)| (rating, count.max(0) as u64)).collect())
    }

    async fn bank_comparison(&self) -> Result<Vec<BankStats>, StoreError> {
        let rows: Vec<(String, i64, f64, f64)> = sqlx::query_as(&format!(
            "select bank_name, count(*), avg(rating)::double precision, avg(review_length)::double precision from {} group by bank_name",
            self.qualified_table(),
        ))
            .fetch_all(&self.pool)
            .await?;

        let mut stats = rows.into_iter()
            .map(|(bank_name, count, average_rating, average_review_length)| BankStats {
                bank_name,
                total_reviews: count.max(0) as u64,
                average_rating,
                average_review_length,
            })
            .collect::<Vec<_>>();
        sort_bank_stats(&mut stats);
        Ok(stats)
    }

    async fn count_by_year(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(&format!("select left(review_date, 4) as year, count(*) from {} group by year", self.qualified_table()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(year, count)| (year, count.max(0) as u64)).collect())
    }

    async fn rating_distribution_by_bank(&self) -> Result<BTreeMap<String, BTreeMap<i32, u64>>, StoreError> {
        let rows: Vec<(String, i32, i64)> = sqlx::query_as(&format!("select bank_name, rating, count(*) from {} group by bank_name, rating", self.qualified_table()))
            .fetch_all(&self.pool)
            .await?;

        let mut distribution: BTreeMap<String, BTreeMap<i32, u64>> = BTreeMap::new();
        for (bank_name, rating, count) in rows {
            distribution.entry(bank_name).or_default().insert(rating, count.max(0) as u64);
        }
        Ok(distribution)
    }

    async fn all_documents(&self) -> Result<Vec<ReviewDocument>, StoreError> {
        let rows = sqlx::query(&format!("select {} from {} order by review_id", COLUMNS.join(", "), self.qualified_table()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(document_from_row).collect()
    }
}

fn document_from_row(row: &PgRow) -> Result<ReviewDocument, StoreError> {
    Ok(ReviewDocument::builder()
        .review_id(row.try_get("review_id")?)
        .review_text(row.try_get("review_text")?)
        .rating(row.try_get("rating")?)
        .review_date(row.try_get("review_date")?)
        .bank_name(row.try_get("bank_name")?)
        .source(row.try_get("source")?)
        .review_length(row.try_get("review_length")?)
        .word_count(row.try_get("word_count")?)
        .sentiment_label(row.try_get("sentiment_label")?)
        .sentiment_confidence(row.try_get("sentiment_confidence")?)
        .themes(row.try_get("themes")?)
        .processed_at(row.try_get("processed_at")?)
        .uploaded_at(row.try_get("uploaded_at")?)
        .data_version(row.try_get("data_version")?)
        .build())
}

/// Names are spliced into statements, so only plain lowercase-able
/// identifiers are accepted.
pub fn validate_identifier(name: &str) -> Result<String, StoreError> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name.to_ascii_lowercase())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_owned()))
    }
}

fn create_table_statement(table: &str) -> String {
    format!("create table if not exists {} (
        review_id text primary key,
        review_text text not null,
        rating integer not null,
        review_date text not null,
        bank_name text not null,
        source text not null,
        review_length bigint not null,
        word_count bigint not null,
        sentiment_label text,
        sentiment_confidence double precision,
        themes text[],
        processed_at text not null,
        uploaded_at text not null,
        data_version text not null
    )", table)
}

fn upsert_statement(table: &str) -> String {
    let placeholders = (1..=COLUMNS.len()).map(|i| format!("${}", i)).collect::<Vec<_>>().join(", ");
    let updates = COLUMNS.iter()
        .filter(|column| **column != "review_id")
        .map(|column| if MERGED_COLUMNS.contains(column) {
            format!("{column} = coalesce(excluded.{column}, existing.{column})")
        } else {
            format!("{column} = excluded.{column}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("insert into {} as existing ({}) values ({}) on conflict (review_id) do update set {}",
        table, COLUMNS.join(", "), placeholders, updates)
}

fn index_statement(table_name: &str, qualified_table: &str, index: &IndexSpec) -> String {
    format!("create index if not exists {}_{}_idx on {} ({})", table_name, index.name, qualified_table, index.columns.join(", "))
}
