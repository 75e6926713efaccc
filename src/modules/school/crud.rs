use async_trait::async_trait;

use crate::config::DbPool;

use super::interface::{Result, SchoolError, SchoolRepository};
use super::model::School;

/// MySQL-backed repository. All mutations are single-row statements so
/// concurrent requests for the same account cannot interleave partial
/// updates.
pub struct SchoolCrud {
    pool: DbPool,
}

impl SchoolCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl SchoolRepository for SchoolCrud {
    async fn insert(&self, school: &School) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schools (id, email, password_hash, name, description, phone, address, image_url, role, verified, recovery_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&school.id)
        .bind(&school.email)
        .bind(&school.password_hash)
        .bind(&school.name)
        .bind(&school.description)
        .bind(&school.phone)
        .bind(&school.address)
        .bind(&school.image_url)
        .bind(&school.role)
        .bind(school.verified)
        .bind(&school.recovery_token)
        .bind(school.created_at)
        .bind(school.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SchoolError::DuplicateAccount
            } else {
                SchoolError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<School>> {
        let school = sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(school)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<School>> {
        let school = sqlx::query_as::<_, School>("SELECT * FROM schools WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(school)
    }

    async fn list(&self) -> Result<Vec<School>> {
        let schools = sqlx::query_as::<_, School>("SELECT * FROM schools ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        Ok(schools)
    }

    async fn mark_verified(&self, id: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE schools SET verified = TRUE WHERE id = ? AND verified = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_recovery_token(&self, id: &str, token_id: &str) -> Result<()> {
        sqlx::query("UPDATE schools SET recovery_token = ? WHERE id = ?")
            .bind(token_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn replace_password(
        &self,
        id: &str,
        token_id: &str,
        password_hash: &str,
    ) -> Result<bool> {
        // Compare-and-clear: a consumed or superseded token matches no row.
        let result = sqlx::query(
            "UPDATE schools SET password_hash = ?, recovery_token = NULL WHERE id = ? AND recovery_token = ?",
        )
        .bind(password_hash)
        .bind(id)
        .bind(token_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM schools WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
