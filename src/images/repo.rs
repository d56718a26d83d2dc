use anyhow::Context;
use sqlx::SqlitePool;

use super::repo_types::ImageRecord;

pub async fn insert_image(db: &SqlitePool, record: &ImageRecord) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO images (id, filename, storage_key, upload_date, category, confidence)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.filename)
    .bind(&record.storage_key)
    .bind(record.upload_date)
    .bind(&record.category)
    .bind(record.confidence)
    .execute(db)
    .await
    .context("insert image")?;

    Ok(())
}

/// All records for a given client filename, oldest first.
pub async fn list_images_by_filename(
    db: &SqlitePool,
    filename: &str,
) -> anyhow::Result<Vec<ImageRecord>> {
    let rows = sqlx::query_as::<_, ImageRecord>(
        r#"
        SELECT id, filename, storage_key, upload_date, category, confidence
          FROM images
         WHERE filename = ?
         ORDER BY upload_date ASC
        "#,
    )
    .bind(filename)
    .fetch_all(db)
    .await
    .context("list images by filename")?;

    Ok(rows)
}
