//! User model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id SERIAL PRIMARY KEY,
//!     username VARCHAR(255) NOT NULL,
//!     age INTEGER CHECK (age >= 0),
//!     gender VARCHAR(50),
//!     birth_date DATE,
//!     address TEXT,
//!     phone VARCHAR(50),
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     password VARCHAR(255) NOT NULL
//! );
//! ```
//!
//! The JSON representation uses the names the browser client works with
//! (`mail`, `birth`, `addr`); the struct maps them onto the column names.
//!
//! Passwords are stored and returned exactly as supplied. Hashing them would
//! change the external contract (the password field round-trips through the
//! list endpoint), so it is left as a known gap.

use crate::db::update::UpdateSet;
use crate::error::{is_unique_violation, StoreError, StoreResult};
use crate::patch::{self, FieldPatch};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{info, warn};

const COLUMNS: &str = "id, username, age, gender, birth_date, address, phone, email, password";

const DUPLICATE_MAIL: &str = "Mail address already exists.";

/// A stored user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Server-assigned id
    pub id: i32,

    pub username: String,

    /// Unique across all users
    #[sqlx(rename = "email")]
    pub mail: String,

    /// Stored as provided
    pub password: String,

    pub age: Option<i32>,

    pub gender: Option<String>,

    #[sqlx(rename = "birth_date")]
    pub birth: Option<NaiveDate>,

    #[sqlx(rename = "address")]
    pub addr: Option<String>,

    pub phone: Option<String>,
}

/// Input for creating a user
///
/// Required fields are checked by the caller; optional fields are `None`
/// when absent or empty.
#[derive(Debug, Clone, Default)]
pub struct CreateUser {
    pub username: String,
    pub mail: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub birth: Option<NaiveDate>,
    pub addr: Option<String>,
    pub phone: Option<String>,
}

impl CreateUser {
    /// Fills the optional fields from a request body, with the same coercion
    /// rules as updates (empty means absent, `age` may be a numeric string)
    pub fn with_optional_fields(mut self, body: &Map<String, Value>) -> StoreResult<Self> {
        self.age = patch::integer("age", body.get("age"))?.into_option();
        self.gender = patch::text("gender", body.get("gender"))?.into_option();
        self.birth = patch::date("birth", body.get("birth"))?.into_option();
        self.addr = patch::text("addr", body.get("addr"))?.into_option();
        self.phone = patch::text("phone", body.get("phone"))?.into_option();
        Ok(self)
    }
}

/// Parsed partial update for a user
///
/// Each field is tri-state; see [`crate::patch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateUser {
    pub username: FieldPatch<String>,
    pub mail: FieldPatch<String>,
    pub password: FieldPatch<String>,
    pub age: FieldPatch<i32>,
    pub gender: FieldPatch<String>,
    pub birth: FieldPatch<NaiveDate>,
    pub addr: FieldPatch<String>,
    pub phone: FieldPatch<String>,
}

impl UpdateUser {
    /// Parses the recognized keys of an update body
    ///
    /// Unknown keys (including `id`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a value has the wrong shape or a
    /// required field is being cleared.
    pub fn from_json(body: &Map<String, Value>) -> StoreResult<Self> {
        Ok(Self {
            username: patch::required("username", patch::text("username", body.get("username"))?)?,
            mail: patch::required("mail", patch::text("mail", body.get("mail"))?)?,
            password: patch::password(body.get("password"))?,
            age: patch::integer("age", body.get("age"))?,
            gender: patch::text("gender", body.get("gender"))?,
            birth: patch::date("birth", body.get("birth"))?,
            addr: patch::text("addr", body.get("addr"))?,
            phone: patch::text("phone", body.get("phone"))?,
        })
    }

    /// Assignments for the fields that were supplied, in column order
    pub fn to_update_set(&self) -> UpdateSet {
        let mut set = UpdateSet::new("users");
        set.push("username", self.username.clone());
        set.push("email", self.mail.clone());
        set.push("password", self.password.clone());
        set.push("age", self.age.clone());
        set.push("gender", self.gender.clone());
        set.push("birth_date", self.birth.clone());
        set.push("address", self.addr.clone());
        set.push("phone", self.phone.clone());
        set
    }
}

impl User {
    /// Lists every user ordered by id
    pub async fn list(pool: &PgPool) -> StoreResult<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: i32) -> StoreResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Inserts a user and returns the stored row
    ///
    /// # Errors
    ///
    /// - `Conflict` if the mail address is already registered
    /// - `Database` for any other failure
    pub async fn create(pool: &PgPool, data: CreateUser) -> StoreResult<Self> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, age, gender, birth_date, address, phone, email, password)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(data.username)
        .bind(data.age)
        .bind(data.gender)
        .bind(data.birth)
        .bind(data.addr)
        .bind(data.phone)
        .bind(data.mail)
        .bind(data.password)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => {
                info!(user_id = user.id, "User inserted");
                Ok(user)
            }
            Err(err) if is_unique_violation(&err) => {
                warn!("Rejected user insert with duplicate mail");
                Err(StoreError::Conflict(DUPLICATE_MAIL.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Checks whether a user other than `id` already holds `mail`
    pub async fn mail_taken_by_other(pool: &PgPool, mail: &str, id: i32) -> StoreResult<bool> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
                .bind(mail)
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(taken)
    }

    /// Applies a partial update in a single statement
    ///
    /// When the mail address changes, the row must exist and the address is
    /// checked against every other user first; the unique constraint remains
    /// the final guard against a concurrent insert.
    ///
    /// # Errors
    ///
    /// - `Validation` if no field was supplied (no statement is issued)
    /// - `Conflict` if the mail address belongs to another user
    /// - `NotFound` if no user has this id
    pub async fn update(pool: &PgPool, id: i32, data: UpdateUser) -> StoreResult<Self> {
        let set = data.to_update_set();
        if set.is_empty() {
            return Err(StoreError::validation("body", "No fields to update"));
        }

        if let FieldPatch::Set(mail) = &data.mail {
            // A missing row reports not-found before any mail conflict
            if Self::find_by_id(pool, id).await?.is_none() {
                return Err(StoreError::NotFound("User not found".to_string()));
            }
            if Self::mail_taken_by_other(pool, mail, id).await? {
                warn!(user_id = id, "Rejected update to a mail address held by another user");
                return Err(StoreError::Conflict(DUPLICATE_MAIL.to_string()));
            }
        }

        let columns = set.columns();
        let mut builder = set.into_query(id, COLUMNS)?;
        let result = builder.build_query_as::<User>().fetch_optional(pool).await;

        match result {
            Ok(Some(user)) => {
                info!(user_id = id, ?columns, "User updated");
                Ok(user)
            }
            Ok(None) => Err(StoreError::NotFound("User not found".to_string())),
            Err(err) if is_unique_violation(&err) => {
                warn!(user_id = id, "Update hit the mail uniqueness constraint");
                Err(StoreError::Conflict(DUPLICATE_MAIL.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a user and returns the row as it was before deletion
    ///
    /// Tasks owned by the user follow the schema's foreign key rule. With a
    /// restricting key the delete is refused with `Conflict`.
    pub async fn delete(pool: &PgPool, id: i32) -> StoreResult<Self> {
        let result = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await;

        match result {
            Ok(Some(user)) => {
                info!(user_id = id, "User deleted");
                Ok(user)
            }
            Ok(None) => Err(StoreError::NotFound("User not found".to_string())),
            Err(err) if crate::error::is_foreign_key_violation(&err) => Err(
                StoreError::Conflict("User still owns tasks".to_string()),
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_body_produces_empty_update() {
        let update = UpdateUser::from_json(&Map::new()).unwrap();
        assert_eq!(update, UpdateUser::default());
        assert!(update.to_update_set().is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let update = UpdateUser::from_json(&body(json!({ "id": 9, "nickname": "x" }))).unwrap();
        assert!(update.to_update_set().is_empty());
    }

    #[test]
    fn test_age_only_update() {
        let update = UpdateUser::from_json(&body(json!({ "age": 5 }))).unwrap();
        assert_eq!(update.age, FieldPatch::Set(5));
        assert_eq!(update.to_update_set().columns(), vec!["age"]);
    }

    #[test]
    fn test_blank_password_does_not_reach_statement() {
        let update =
            UpdateUser::from_json(&body(json!({ "password": "  ", "phone": "" }))).unwrap();
        assert_eq!(update.password, FieldPatch::Unchanged);
        assert_eq!(update.phone, FieldPatch::Clear);
        assert_eq!(update.to_update_set().columns(), vec!["phone"]);
    }

    #[test]
    fn test_fields_map_to_columns() {
        let update = UpdateUser::from_json(&body(json!({
            "username": "alice",
            "mail": "alice@example.com",
            "password": "pw",
            "age": "30",
            "gender": "female",
            "birth": "1994-02-03",
            "addr": "",
            "phone": null
        })))
        .unwrap();

        assert_eq!(
            update.to_update_set().columns(),
            vec![
                "username",
                "email",
                "password",
                "age",
                "gender",
                "birth_date",
                "address",
                "phone"
            ]
        );
    }

    #[test]
    fn test_clearing_required_fields_is_rejected() {
        assert!(UpdateUser::from_json(&body(json!({ "username": "" }))).is_err());
        assert!(UpdateUser::from_json(&body(json!({ "mail": null }))).is_err());
    }

    #[test]
    fn test_non_numeric_age_is_rejected() {
        let err = UpdateUser::from_json(&body(json!({ "age": "old" }))).unwrap_err();
        assert!(matches!(err, StoreError::Validation { ref field, .. } if field == "age"));
    }

    #[test]
    fn test_create_optional_fields() {
        let data = CreateUser {
            username: "a".to_string(),
            mail: "a@x.com".to_string(),
            password: "p".to_string(),
            ..Default::default()
        }
        .with_optional_fields(&body(json!({ "age": "", "gender": "", "addr": "Tokyo" })))
        .unwrap();

        assert_eq!(data.age, None);
        assert_eq!(data.gender, None);
        assert_eq!(data.addr.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_user_serializes_with_client_field_names() {
        let user = User {
            id: 1,
            username: "a".to_string(),
            mail: "a@x.com".to_string(),
            password: "p".to_string(),
            age: None,
            gender: None,
            birth: NaiveDate::from_ymd_opt(2000, 1, 31),
            addr: None,
            phone: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["mail"], "a@x.com");
        assert_eq!(json["birth"], "2000-01-31");
        assert!(json["age"].is_null());
        assert!(json.get("email").is_none());
    }
}
