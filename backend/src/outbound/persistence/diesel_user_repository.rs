//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, PasswordHash, User, UserId};

use super::diesel_error_mapping::{
    database_error_kind, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CredentialsRow, NewUserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed user store. Emails are stored lowercased and unique.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            display_name: user.display_name().as_ref(),
            email: user.email().as_ref(),
            phone: user.phone().as_ref(),
            date_of_birth: user.date_of_birth(),
            password_hash: password_hash.as_str(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| match database_error_kind(&err) {
                Some(DatabaseErrorKind::UniqueViolation) => {
                    UserPersistenceError::duplicate_email(user.email().to_string())
                }
                _ => map_diesel_error(err),
            })
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CredentialsRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(|row| StoredCredentials {
            user_id: UserId::from_uuid(row.id),
            password_hash: PasswordHash::new(row.password_hash),
        }))
    }

    async fn exists(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::id.eq(id.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}
