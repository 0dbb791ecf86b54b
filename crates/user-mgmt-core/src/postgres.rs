//! PostgreSQL identity store
//!
//! Reads and writes the `users`, `addresses` and `internships` tables using
//! SQLx.
//! Table layout is owned by the deployment's migrations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use crate::{AddressRecord, CoreError, InternshipRecord, Result, UserRecord, UserStore, UserUpdate};

const USER_COLUMNS: &str = "id::text AS id, fname, lname, email, password AS password_hash, role, created_at";

const INTERNSHIP_COLUMNS: &str =
    "id::text AS id, user_id::text AS user_id, mentor_name, joined_date, completion_date, is_certified";

/// PostgreSQL-backed [`UserStore`]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new store with its own connection pool
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// User row from database
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    fname: String,
    lname: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = CoreError;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse()
            .map_err(|_| CoreError::DatabaseError(format!("Unknown role stored for user {}", row.id)))?;

        Ok(UserRecord {
            id: row.id,
            fname: row.fname,
            lname: row.lname,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

/// Address row from database
#[derive(Debug, FromRow)]
struct AddressRow {
    id: String,
    user_id: String,
    street: String,
    city: String,
    country: String,
}

impl From<AddressRow> for AddressRecord {
    fn from(row: AddressRow) -> Self {
        AddressRecord {
            id: row.id,
            user_id: row.user_id,
            street: row.street,
            city: row.city,
            country: row.country,
        }
    }
}

/// Internship row from database
#[derive(Debug, FromRow)]
struct InternshipRow {
    id: String,
    user_id: String,
    mentor_name: String,
    joined_date: NaiveDate,
    completion_date: Option<NaiveDate>,
    is_certified: bool,
}

impl From<InternshipRow> for InternshipRecord {
    fn from(row: InternshipRow) -> Self {
        InternshipRecord {
            id: row.id,
            user_id: row.user_id,
            mentor_name: row.mentor_name,
            joined_date: row.joined_date,
            completion_date: row.completion_date,
            is_certified: row.is_certified,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "23503")
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CoreError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id::text = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CoreError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn create_user(&self, user: UserRecord) -> Result<UserRecord> {
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, fname, lname, email, password, role, created_at)
            VALUES ($1::uuid, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.id)
        .bind(&user.fname)
        .bind(&user.lname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict("Email already in use".to_string())
            } else {
                CoreError::DatabaseError(format!("Failed to create user: {e}"))
            }
        })?;

        UserRecord::try_from(row)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CoreError::DatabaseError(format!("Failed to list users: {e}")))?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET
                fname = COALESCE($2, fname),
                lname = COALESCE($3, lname),
                email = COALESCE($4, email),
                password = COALESCE($5, password),
                role = COALESCE($6, role)
            WHERE id::text = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.fname)
        .bind(update.lname)
        .bind(update.email)
        .bind(update.password_hash)
        .bind(update.role.map(|role| role.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict("Email already in use".to_string())
            } else {
                CoreError::DatabaseError(format!("Failed to update user: {e}"))
            }
        })?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn delete_user(&self, id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to start transaction: {e}")))?;

        sqlx::query("DELETE FROM addresses WHERE user_id::text = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to delete addresses: {e}")))?;

        sqlx::query("DELETE FROM internships WHERE user_id::text = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to delete internships: {e}")))?;

        let result = sqlx::query("DELETE FROM users WHERE id::text = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to delete user: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| CoreError::DatabaseError(format!("Failed to commit delete: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_addresses(&self, user_id: &str) -> Result<Vec<AddressRecord>> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r#"
            SELECT id::text AS id, user_id::text AS user_id, street, city, country
            FROM addresses
            WHERE user_id::text = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to list addresses: {e}")))?;

        Ok(rows.into_iter().map(AddressRecord::from).collect())
    }

    async fn find_address(&self, id: &str) -> Result<Option<AddressRecord>> {
        let row: Option<AddressRow> = sqlx::query_as(
            r#"
            SELECT id::text AS id, user_id::text AS user_id, street, city, country
            FROM addresses
            WHERE id::text = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to fetch address: {e}")))?;

        Ok(row.map(AddressRecord::from))
    }

    async fn create_internship(&self, internship: InternshipRecord) -> Result<InternshipRecord> {
        let row: InternshipRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO internships (id, user_id, mentor_name, joined_date, completion_date, is_certified)
            VALUES ($1::uuid, $2::uuid, $3, $4, $5, $6)
            RETURNING {INTERNSHIP_COLUMNS}
            "#
        ))
        .bind(&internship.id)
        .bind(&internship.user_id)
        .bind(&internship.mentor_name)
        .bind(internship.joined_date)
        .bind(internship.completion_date)
        .bind(internship.is_certified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                CoreError::NotFound(format!("User {}", internship.user_id))
            } else {
                CoreError::DatabaseError(format!("Failed to create internship: {e}"))
            }
        })?;

        Ok(InternshipRecord::from(row))
    }

    async fn list_internships(&self, user_id: &str) -> Result<Vec<InternshipRecord>> {
        let rows: Vec<InternshipRow> = sqlx::query_as(&format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE user_id::text = $1 ORDER BY joined_date, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::DatabaseError(format!("Failed to list internships: {e}")))?;

        Ok(rows.into_iter().map(InternshipRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserRole;

    fn row(role: &str) -> UserRow {
        UserRow {
            id: "u1".to_string(),
            fname: "Ada".to_string(),
            lname: "Obi".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_row_conversion() {
        let user = UserRecord::try_from(row("ADMIN")).unwrap();
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_user_row_with_unknown_role_is_rejected() {
        assert!(matches!(
            UserRecord::try_from(row("root")),
            Err(CoreError::DatabaseError(_))
        ));
    }
}
