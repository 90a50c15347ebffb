//! Category database operations

use shared::catalog::MergePlan;
use shared::models::{Category, CategoryMove, CategoryScope};
use sqlx::{PgConnection, PgPool, Postgres};

use super::BoxError;

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    scope: String,
    name: String,
    tag_key: Option<String>,
    parent_id: Option<String>,
    sort_order: i32,
}

impl TryFrom<CategoryRow> for Category {
    type Error = BoxError;

    fn try_from(r: CategoryRow) -> Result<Self, Self::Error> {
        let scope = CategoryScope::parse(&r.scope)
            .ok_or_else(|| format!("category {} has unknown scope '{}'", r.id, r.scope))?;
        Ok(Category {
            id: r.id,
            scope,
            name: r.name,
            tag_key: r.tag_key,
            parent_id: r.parent_id,
            sort_order: r.sort_order,
        })
    }
}

/// Block concurrent category writers until the transaction ends. Plain reads
/// are not blocked. Taken before reading the snapshot a write is checked against.
pub async fn lock_for_write(conn: &mut PgConnection) -> Result<(), BoxError> {
    sqlx::query("LOCK TABLE categories IN SHARE ROW EXCLUSIVE MODE")
        .execute(conn)
        .await?;
    Ok(())
}

/// Every category of both scopes, in a stable order.
pub async fn list_all(
    conn: impl sqlx::Executor<'_, Database = Postgres>,
) -> Result<Vec<Category>, BoxError> {
    let rows: Vec<CategoryRow> = sqlx::query_as(
        r#"
        SELECT id, scope, name, tag_key, parent_id, sort_order
        FROM categories
        ORDER BY scope, sort_order, name, id
        "#,
    )
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(Category::try_from).collect()
}

pub async fn insert(
    conn: impl sqlx::Executor<'_, Database = Postgres>,
    category: &Category,
) -> Result<(), sqlx::Error> {
    let now = shared::util::now_millis();
    sqlx::query(
        r#"
        INSERT INTO categories (
            id, scope, name, tag_key, parent_id, sort_order, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        "#,
    )
    .bind(&category.id)
    .bind(category.scope.as_str())
    .bind(&category.name)
    .bind(&category.tag_key)
    .bind(&category.parent_id)
    .bind(category.sort_order)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrite name, tag key, parent and position. Scope never changes.
pub async fn update(
    conn: impl sqlx::Executor<'_, Database = Postgres>,
    category: &Category,
) -> Result<bool, sqlx::Error> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        r#"
        UPDATE categories SET
            name = $2, tag_key = $3, parent_id = $4, sort_order = $5, updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(&category.tag_key)
    .bind(&category.parent_id)
    .bind(category.sort_order)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a category; its children move up to its parent.
pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, BoxError> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    let parent: Option<Option<String>> =
        sqlx::query_scalar("SELECT parent_id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let Some(parent) = parent else {
        tx.commit().await?;
        return Ok(false);
    };

    sqlx::query("UPDATE categories SET parent_id = $2, updated_at = $3 WHERE parent_id = $1")
        .bind(id)
        .bind(&parent)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Apply validated (id, parent, position) moves in one statement.
pub async fn batch_move(
    conn: impl sqlx::Executor<'_, Database = Postgres>,
    moves: &[CategoryMove],
) -> Result<(), BoxError> {
    if moves.is_empty() {
        return Ok(());
    }
    let now = shared::util::now_millis();
    let ids: Vec<&str> = moves.iter().map(|m| m.id.as_str()).collect();
    // '' stands for "no parent" inside the array
    let parents: Vec<&str> = moves
        .iter()
        .map(|m| m.parent_id.as_deref().unwrap_or(""))
        .collect();
    let orders: Vec<i32> = moves.iter().map(|m| m.sort_order).collect();
    sqlx::query(
        r#"UPDATE categories
        SET parent_id = NULLIF(u.parent_id, ''), sort_order = u.sort_order, updated_at = $4
        FROM (SELECT * FROM UNNEST($1::text[], $2::text[], $3::integer[]))
            AS u(id, parent_id, sort_order)
        WHERE categories.id = u.id"#,
    )
    .bind(&ids)
    .bind(&parents)
    .bind(&orders)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Apply a merge plan inside the caller's transaction.
pub async fn apply_merge(conn: &mut PgConnection, plan: &MergePlan) -> Result<(), BoxError> {
    let now = shared::util::now_millis();

    if !plan.reparent.is_empty() {
        sqlx::query("UPDATE categories SET parent_id = $1, updated_at = $2 WHERE id = ANY($3)")
            .bind(&plan.target_id)
            .bind(now)
            .bind(&plan.reparent)
            .execute(&mut *conn)
            .await?;
    }

    for (product_id, tags) in &plan.retag {
        sqlx::query("UPDATE products SET tags = $2, updated_at = $3 WHERE id = $1")
            .bind(product_id)
            .bind(tags)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
        .bind(&plan.delete)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Database-backed; returns `None` when `TEST_DATABASE_URL` is unset.
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Some(pool)
    }

    #[tokio::test]
    async fn test_second_writer_waits_and_sees_first_write() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let category = Category {
            id: shared::util::new_id(),
            scope: CategoryScope::Filter,
            name: "Lock test".into(),
            tag_key: None,
            parent_id: None,
            sort_order: 0,
        };

        let mut first = pool.begin().await.unwrap();
        lock_for_write(&mut first).await.unwrap();

        let second = tokio::spawn({
            let pool = pool.clone();
            async move {
                let mut tx = pool.begin().await?;
                lock_for_write(&mut tx).await?;
                let snapshot = list_all(&mut *tx).await?;
                tx.commit().await?;
                Ok::<_, BoxError>(snapshot)
            }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!second.is_finished());

        // Plain reads go through while the lock is held
        list_all(&pool).await.unwrap();

        insert(&mut *first, &category).await.unwrap();
        first.commit().await.unwrap();

        let snapshot = second.await.unwrap().unwrap();
        assert!(snapshot.iter().any(|c| c.id == category.id));

        assert!(delete(&pool, &category.id).await.unwrap());
    }
}
