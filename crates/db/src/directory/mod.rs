//! Membership directory adapter.
//!
//! Typed access to the CMS tables holding users, roles, role memberships
//! and per-user profile values. Every operation runs inside a transaction
//! owned by the caller, errors are returned as-is and nothing is retried.

pub mod dialect;
pub mod fields;

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use derive_more::{Display, Error, From};
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Statement,
};
use tracing::debug;
use uuid::Uuid;

use crate::{member, role, user, user_data, user_field, SelectExt};

use self::fields::{Field, FieldValue};

/// Attempts at generating a UUID not yet present in the target table.
const UUID_ATTEMPTS: usize = 10;

/// Users with a matching login name or matching names, restricted to
/// holders of the given role.
///
/// SQLite's `LOWER` only folds ASCII letters, so on SQLite names and logins
/// with non-ASCII letters must match case exactly. Postgres folds them
/// according to the database locale.
const LOOKUP_MEMBER_QUERY: &str = r#"
SELECT {coalesce}(MIN(usr.usr_id), 0) AS usr_id
  FROM adm_users usr
  JOIN adm_members mem ON mem.mem_usr_id = usr.usr_id
  JOIN adm_roles rol ON rol.rol_id = mem.mem_rol_id
 WHERE rol.rol_name = $1
   AND (LOWER(usr.usr_login_name) = LOWER($2)
        OR (EXISTS (SELECT 1 FROM adm_user_data first_name
                     WHERE first_name.usd_usr_id = usr.usr_id
                       AND first_name.usd_usf_id = $3
                       AND LOWER(first_name.usd_value) = LOWER($4))
            AND EXISTS (SELECT 1 FROM adm_user_data last_name
                         WHERE last_name.usd_usr_id = usr.usr_id
                           AND last_name.usd_usf_id = $5
                           AND LOWER(last_name.usd_value) = LOWER($6))))
"#;

const USERS_BY_LOGIN_QUERY: &str = r#"
SELECT usr_id, usr_uuid, usr_login_name, usr_password, usr_valid
  FROM adm_users
 WHERE LOWER(usr_login_name) = LOWER($1)
 ORDER BY usr_id
"#;

/// Errors raised by the directory adapter.
#[derive(Debug, Display, From, Error)]
pub enum DirectoryError {
    /// Database-related error.
    DatabaseError(DbErr),

    #[from(ignore)]
    #[display(fmt = "login name must not be empty")]
    EmptyLoginName,

    #[from(ignore)]
    #[display(fmt = "unknown role {}", _0)]
    UnknownRole(#[error(ignore)] &'static str),

    #[from(ignore)]
    #[display(fmt = "unknown profile field {}", _0)]
    UnknownField(#[error(ignore)] &'static str),

    #[from(ignore)]
    #[display(fmt = "invalid value {:?} stored in profile field {}", value, field)]
    InvalidValue { field: &'static str, value: String },

    #[from(ignore)]
    #[display(fmt = "user {} has no member record", _0)]
    MemberNotFound(#[error(ignore)] i64),

    #[from(ignore)]
    #[display(fmt = "unable to generate a unique identifier for {}", _0)]
    UuidExhausted(#[error(ignore)] &'static str),
}

/// Directory adapter.
///
/// Holds the profile field identifier cache, which is filled lazily and
/// never invalidated, so a single instance should live for the whole process.
#[derive(Default)]
pub struct Directory {
    field_ids: RwLock<HashMap<&'static str, i64>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a valid user with a locked password.
    pub async fn create_locked(
        &self,
        txn: &DatabaseTransaction,
        login_name: &str,
    ) -> Result<user::Model, DirectoryError> {
        if login_name.trim().is_empty() {
            return Err(DirectoryError::EmptyLoginName);
        }

        let uuid = unique_uuid::<user::Entity>(txn, user::Column::Uuid, "user").await?;

        let model = user::Entity::insert(user::ActiveModel {
            uuid: ActiveValue::Set(uuid),
            login_name: ActiveValue::Set(login_name.to_owned()),
            password: ActiveValue::Set(String::from(user::LOCKED_PASSWORD)),
            valid: ActiveValue::Set(true),
            ..Default::default()
        })
        .exec_with_returning(txn)
        .await?;

        debug!(user_id = model.id, login_name, "created locked user");

        Ok(model)
    }

    /// Find users by login name, ignoring case.
    pub async fn get_by_login_name(
        &self,
        txn: &DatabaseTransaction,
        login_name: &str,
    ) -> Result<Vec<user::Model>, DirectoryError> {
        let backend = txn.get_database_backend();

        let users = user::Entity::find()
            .from_raw_sql(Statement::from_sql_and_values(
                backend,
                &dialect::render(backend, USERS_BY_LOGIN_QUERY),
                [login_name.into()],
            ))
            .all(txn)
            .await?;

        Ok(users)
    }

    /// Identifier of the member matching either `email` as a login name or
    /// both first and last names, `0` if there is none.
    pub async fn lookup_member_user_id(
        &self,
        txn: &DatabaseTransaction,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<i64, DirectoryError> {
        let first_name_id = self.resolve_field_id(txn, fields::FIRST_NAME).await?;
        let last_name_id = self.resolve_field_id(txn, fields::LAST_NAME).await?;

        let backend = txn.get_database_backend();

        let row = txn
            .query_one(Statement::from_sql_and_values(
                backend,
                &dialect::render(backend, LOOKUP_MEMBER_QUERY),
                [
                    role::MEMBER.into(),
                    email.trim().into(),
                    first_name_id.into(),
                    first_name.trim().into(),
                    last_name_id.into(),
                    last_name.trim().into(),
                ],
            ))
            .await?;

        match row {
            Some(row) => Ok(row.try_get("", "usr_id")?),
            None => Ok(0),
        }
    }

    /// Add `user_id` to the role named `role_name` for the provided period.
    pub async fn create_member(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        role_name: &'static str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<member::Model, DirectoryError> {
        let role_id = role_id(txn, role_name).await?;
        let uuid = unique_uuid::<member::Entity>(txn, member::Column::Uuid, "member").await?;

        let model = member::Entity::insert(member::ActiveModel {
            uuid: ActiveValue::Set(uuid),
            user_id: ActiveValue::Set(user_id),
            role_id: ActiveValue::Set(role_id),
            begin: ActiveValue::Set(begin),
            end: ActiveValue::Set(end),
            approved: ActiveValue::Set(Some(member::APPROVED)),
            ..Default::default()
        })
        .exec_with_returning(txn)
        .await?;

        Ok(model)
    }

    /// Membership record of `user_id` in the member role.
    pub async fn get_member_for_user(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<member::Model, DirectoryError> {
        let role_id = role_id(txn, role::MEMBER).await?;

        member::Entity::find()
            .filter(member::Column::UserId.eq(user_id))
            .filter(member::Column::RoleId.eq(role_id))
            .one(txn)
            .await?
            .ok_or(DirectoryError::MemberNotFound(user_id))
    }

    /// Extend every member role record of `user_id` to the end of `year`.
    ///
    /// Returns the number of updated records.
    pub async fn set_member_end_date(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        year: i32,
    ) -> Result<u64, DirectoryError> {
        let role_id = role_id(txn, role::MEMBER).await?;

        let result = member::Entity::update_many()
            .col_expr(
                member::Column::End,
                common::calendar::membership_end(year).into(),
            )
            .filter(member::Column::UserId.eq(user_id))
            .filter(member::Column::RoleId.eq(role_id))
            .exec(txn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Identifier of a profile field, cached for the lifetime of the adapter.
    pub async fn resolve_field_id<T>(
        &self,
        txn: &DatabaseTransaction,
        field: Field<T>,
    ) -> Result<i64, DirectoryError> {
        let cached = self
            .field_ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(field.name())
            .copied();

        if let Some(id) = cached {
            return Ok(id);
        }

        let id: i64 = user_field::Entity::find()
            .select_only()
            .column(user_field::Column::Id)
            .filter(user_field::Column::NameIntern.eq(field.name()))
            .into_tuple()
            .one(txn)
            .await?
            .ok_or(DirectoryError::UnknownField(field.name()))?;

        self.field_ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field.name(), id);

        debug!(field = field.name(), id, "resolved profile field");

        Ok(id)
    }

    /// Store a profile value, replacing the existing one if present.
    pub async fn set_value<T: FieldValue>(
        &self,
        txn: &DatabaseTransaction,
        field: Field<T>,
        user_id: i64,
        value: &T,
    ) -> Result<(), DirectoryError> {
        let field_id = self.resolve_field_id(txn, field).await?;
        let value = value.encode();

        let existing: Option<i64> = user_data::Entity::find()
            .select_only()
            .column(user_data::Column::Id)
            .filter(user_data::Column::UserId.eq(user_id))
            .filter(user_data::Column::FieldId.eq(field_id))
            .into_tuple()
            .one(txn)
            .await?;

        match existing {
            Some(id) => {
                user_data::Entity::update_many()
                    .col_expr(user_data::Column::Value, value.into())
                    .filter(user_data::Column::Id.eq(id))
                    .exec(txn)
                    .await?;
            }
            None => {
                user_data::Entity::insert(user_data::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    field_id: ActiveValue::Set(field_id),
                    value: ActiveValue::Set(value),
                    ..Default::default()
                })
                .exec_without_returning(txn)
                .await?;
            }
        }

        Ok(())
    }

    /// Profile value of `user_id`, or [`None`] if it was never set.
    pub async fn get_value_or_not_found<T: FieldValue>(
        &self,
        txn: &DatabaseTransaction,
        field: Field<T>,
        user_id: i64,
    ) -> Result<Option<T>, DirectoryError> {
        let field_id = self.resolve_field_id(txn, field).await?;

        let stored: Option<String> = user_data::Entity::find()
            .select_only()
            .column(user_data::Column::Value)
            .filter(user_data::Column::UserId.eq(user_id))
            .filter(user_data::Column::FieldId.eq(field_id))
            .into_tuple()
            .one(txn)
            .await?;

        stored
            .map(|value| {
                T::decode(&value).ok_or(DirectoryError::InvalidValue {
                    field: field.name(),
                    value,
                })
            })
            .transpose()
    }

    /// Profile value of `user_id`, or the type's zero value if it was never set.
    pub async fn get_value<T: FieldValue + Default>(
        &self,
        txn: &DatabaseTransaction,
        field: Field<T>,
        user_id: i64,
    ) -> Result<T, DirectoryError> {
        Ok(self
            .get_value_or_not_found(txn, field, user_id)
            .await?
            .unwrap_or_default())
    }
}

async fn role_id(txn: &DatabaseTransaction, name: &'static str) -> Result<i64, DirectoryError> {
    role::Entity::find()
        .select_only()
        .column(role::Column::Id)
        .filter(role::Column::Name.eq(name))
        .into_tuple()
        .one(txn)
        .await?
        .ok_or(DirectoryError::UnknownRole(name))
}

/// Generate a random UUID that is not yet present in `column`.
async fn unique_uuid<E: EntityTrait>(
    txn: &DatabaseTransaction,
    column: E::Column,
    what: &'static str,
) -> Result<String, DirectoryError> {
    for _ in 0..UUID_ATTEMPTS {
        let uuid = Uuid::new_v4().to_string();

        let taken = E::find()
            .select_only()
            .filter(column.eq(uuid.as_str()))
            .exists(txn)
            .await?;

        if !taken {
            return Ok(uuid);
        }
    }

    Err(DirectoryError::UuidExhausted(what))
}
