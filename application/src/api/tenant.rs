//! [`Tenant`]-related REST API definitions.

use axum::{extract::Path, Extension, Json};
use axum_extra::extract::WithRejection;
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, room, tenant},
    query, Query as _,
};

use crate::{api, define_error, AsError, Error, Service};

/// A person renting a room.
#[derive(Clone, Debug, Serialize)]
pub struct Tenant {
    /// Unique identifier of this `Tenant`.
    pub id: tenant::Id,

    /// Full name of this `Tenant`.
    pub name: String,

    /// Phone number of this `Tenant`.
    pub phone: String,

    /// ID of the `Room` this `Tenant` lives in, if any.
    pub room_id: Option<room::Id>,

    /// `DateTime` when the tenancy started.
    pub start_date: DateTime,

    /// `DateTime` when the tenancy ends, if known.
    pub end_date: Option<DateTime>,

    /// Status of this `Tenant`.
    pub status: tenant::Status,

    /// `DateTime` when this `Tenant` was created.
    pub created_at: DateTime,

    /// `DateTime` when this `Tenant` was last modified.
    pub updated_at: DateTime,
}

impl From<domain::Tenant> for Tenant {
    fn from(tenant: domain::Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name.to_string(),
            phone: tenant.phone.to_string(),
            room_id: tenant.room_id,
            start_date: tenant.start_date.coerce(),
            end_date: tenant.end_date.map(|d| d.coerce()),
            status: tenant.status,
            created_at: tenant.created_at.coerce(),
            updated_at: tenant.updated_at.coerce(),
        }
    }
}

/// Request body for creating or updating a [`Tenant`].
#[derive(Clone, Debug, Deserialize)]
pub struct Input {
    /// Full name of the `Tenant`.
    pub name: String,

    /// Phone number of the `Tenant`.
    pub phone: String,

    /// ID of the `Room` the `Tenant` lives in, if any.
    #[serde(default)]
    pub room_id: Option<room::Id>,

    /// `DateTime` when the tenancy starts.
    pub start_date: DateTime,

    /// `DateTime` when the tenancy ends, if known.
    #[serde(default)]
    pub end_date: Option<DateTime>,

    /// Status of the `Tenant`.
    #[serde(default)]
    pub status: tenant::Status,
}

/// Lists all the [`Tenant`]s in the order they were created.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn list(
    Extension(service): Extension<Service>,
) -> Result<Json<Vec<Tenant>>, Error> {
    let tenants = service
        .execute(query::tenant::List::by(()))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(tenants.into_iter().map(Into::into).collect()))
}

/// Returns a single [`Tenant`].
///
/// # Errors
///
/// Possible error codes:
/// - `TENANT_NOT_EXISTS` - `Tenant` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn get(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<tenant::Id>, Error>,
) -> Result<Json<Tenant>, Error> {
    service
        .execute(query::tenant::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|t| Json(t.into()))
        .ok_or_else(|| TenantError::NotExists.into())
}

/// Creates a new [`Tenant`], occupying its `Room` (if any).
///
/// # Errors
///
/// Possible error codes:
/// - `ROOM_NOT_EXISTS` - the assigned `Room` does not exist;
/// - `ROOM_OCCUPIED` - another `Tenant` lives in the assigned `Room`;
/// - `INVALID_TENANCY_PERIOD` - the tenancy ends before it starts.
#[tracing::instrument(
    skip_all,
    fields(room_id = ?input.room_id, otel.name = api::SPAN_NAME),
)]
pub async fn create(
    Extension(service): Extension<Service>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<(http::StatusCode, Json<Tenant>), Error> {
    let Input {
        name,
        phone,
        room_id,
        start_date,
        end_date,
        status,
    } = input;

    let tenant = service
        .execute(command::CreateTenant {
            name: api::parse("name", &name)?,
            phone: api::parse("phone", &phone)?,
            room_id,
            start_date: start_date.coerce(),
            end_date: end_date.map(DateTime::coerce),
            status,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok((http::StatusCode::CREATED, Json(tenant.into())))
}

/// Updates an existing [`Tenant`], moving it between `Room`s if its `Room`
/// has changed.
///
/// The `Room` to vacate is the one the stored [`Tenant`] currently lives in.
///
/// # Errors
///
/// Possible error codes:
/// - `TENANT_NOT_EXISTS` - `Tenant` with the provided ID does not exist;
/// - `ROOM_NOT_EXISTS` - the assigned `Room` does not exist;
/// - `ROOM_OCCUPIED` - another `Tenant` lives in the assigned `Room`;
/// - `INVALID_TENANCY_PERIOD` - the tenancy ends before it starts.
#[tracing::instrument(
    skip_all,
    fields(%id, room_id = ?input.room_id, otel.name = api::SPAN_NAME),
)]
pub async fn update(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<tenant::Id>, Error>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<Json<Tenant>, Error> {
    let Input {
        name,
        phone,
        room_id,
        start_date,
        end_date,
        status,
    } = input;

    let stored = service
        .execute(query::tenant::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(TenantError::NotExists))?;

    service
        .execute(command::UpdateTenant {
            id,
            old_room_id: stored.room_id,
            name: api::parse("name", &name)?,
            phone: api::parse("phone", &phone)?,
            room_id,
            start_date: start_date.coerce(),
            end_date: end_date.map(DateTime::coerce),
            status,
        })
        .await
        .map_err(AsError::into_error)
        .map(|t| Json(t.into()))
}

/// Deletes a [`Tenant`] along with its payments, vacating its `Room`.
///
/// # Errors
///
/// Possible error codes:
/// - `TENANT_NOT_EXISTS` - `Tenant` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn delete(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<tenant::Id>, Error>,
) -> Result<http::StatusCode, Error> {
    service
        .execute(command::DeleteTenant { id })
        .await
        .map_err(AsError::into_error)
        .map(|()| http::StatusCode::NO_CONTENT)
}

define_error! {
    enum TenantError {
        #[code = "TENANT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Tenant` does not exist"]
        NotExists,

        #[code = "INVALID_TENANCY_PERIOD"]
        #[status = UNPROCESSABLE_ENTITY]
        #[message = "Tenancy cannot end before it starts"]
        InvalidPeriod,
    }
}

impl AsError for command::create_tenant::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod => Some(TenantError::InvalidPeriod.into()),
            Self::Occupancy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_tenant::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidPeriod => Some(TenantError::InvalidPeriod.into()),
            Self::NotExists(_) => Some(TenantError::NotExists.into()),
            Self::Occupancy(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_tenant::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(TenantError::NotExists.into()),
            Self::Occupancy(e) => e.try_as_error(),
        }
    }
}
