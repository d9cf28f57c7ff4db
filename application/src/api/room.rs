//! [`Room`]-related REST API definitions.

use axum::{extract::Path, Extension, Json};
use axum_extra::extract::WithRejection;
use common::{DateTime, Money};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, room},
    query, Query as _,
};

use crate::{api, define_error, AsError, Error, Service};

/// A room of the boarding house.
#[derive(Clone, Debug, Serialize)]
pub struct Room {
    /// Unique identifier of this `Room`.
    pub id: room::Id,

    /// Number of this `Room`, unique across the boarding house.
    pub number: String,

    /// Monthly rent price of this `Room`.
    pub price: Money,

    /// Occupancy status of this `Room`.
    pub status: room::Status,

    /// Facilities of this `Room`.
    pub facilities: String,

    /// Notes about this `Room`.
    pub notes: String,

    /// `DateTime` when this `Room` was created.
    pub created_at: DateTime,

    /// `DateTime` when this `Room` was last modified.
    pub updated_at: DateTime,
}

impl From<domain::Room> for Room {
    fn from(room: domain::Room) -> Self {
        Self {
            id: room.id,
            number: room.number.to_string(),
            price: room.price,
            status: room.status,
            facilities: room.facilities.to_string(),
            notes: room.notes.to_string(),
            created_at: room.created_at.coerce(),
            updated_at: room.updated_at.coerce(),
        }
    }
}

/// Request body for creating or updating a [`Room`].
#[derive(Clone, Debug, Deserialize)]
pub struct Input {
    /// Number of the `Room`.
    pub number: String,

    /// Monthly rent price of the `Room`.
    pub price: Money,

    /// Facilities of the `Room`.
    #[serde(default)]
    pub facilities: String,

    /// Notes about the `Room`.
    #[serde(default)]
    pub notes: String,
}

/// Request body for overriding a [`Room`] status.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct StatusInput {
    /// New status of the `Room`.
    pub status: room::Status,
}

/// Lists all the [`Room`]s ordered by their numbers.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn list(
    Extension(service): Extension<Service>,
) -> Result<Json<Vec<Room>>, Error> {
    let rooms = service
        .execute(query::room::List::by(()))
        .await
        .map_err(AsError::into_error)?;
    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

/// Returns a single [`Room`].
///
/// # Errors
///
/// Possible error codes:
/// - `ROOM_NOT_EXISTS` - `Room` with the provided ID does not exist.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn get(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<room::Id>, Error>,
) -> Result<Json<Room>, Error> {
    service
        .execute(query::room::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|r| Json(r.into()))
        .ok_or_else(|| RoomError::NotExists.into())
}

/// Creates a new empty [`Room`].
///
/// # Errors
///
/// Possible error codes:
/// - `ROOM_NUMBER_OCCUPIED` - another `Room` has the same number;
/// - `NEGATIVE_PRICE` - the price is below zero.
#[tracing::instrument(skip_all, fields(otel.name = api::SPAN_NAME))]
pub async fn create(
    Extension(service): Extension<Service>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<(http::StatusCode, Json<Room>), Error> {
    let Input {
        number,
        price,
        facilities,
        notes,
    } = input;

    let room = service
        .execute(command::CreateRoom {
            number: api::parse("number", &number)?,
            price,
            facilities: api::parse("facilities", &facilities)?,
            notes: api::parse("notes", &notes)?,
        })
        .await
        .map_err(AsError::into_error)?;
    Ok((http::StatusCode::CREATED, Json(room.into())))
}

/// Updates an existing [`Room`], leaving its status intact.
///
/// # Errors
///
/// Possible error codes:
/// - `ROOM_NOT_EXISTS` - `Room` with the provided ID does not exist;
/// - `ROOM_NUMBER_OCCUPIED` - another `Room` has the same number;
/// - `NEGATIVE_PRICE` - the price is below zero.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn update(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<room::Id>, Error>,
    WithRejection(Json(input), _): WithRejection<Json<Input>, Error>,
) -> Result<Json<Room>, Error> {
    let Input {
        number,
        price,
        facilities,
        notes,
    } = input;

    service
        .execute(command::UpdateRoom {
            id,
            number: api::parse("number", &number)?,
            price,
            facilities: api::parse("facilities", &facilities)?,
            notes: api::parse("notes", &notes)?,
        })
        .await
        .map_err(AsError::into_error)
        .map(|r| Json(r.into()))
}

/// Overrides the status of an existing [`Room`].
///
/// # Errors
///
/// Possible error codes:
/// - `ROOM_NOT_EXISTS` - `Room` with the provided ID does not exist.
#[tracing::instrument(
    skip_all,
    fields(%id, status = %input.status, otel.name = api::SPAN_NAME),
)]
pub async fn set_status(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<room::Id>, Error>,
    WithRejection(Json(input), _): WithRejection<Json<StatusInput>, Error>,
) -> Result<Json<Room>, Error> {
    service
        .execute(command::SetRoomStatus {
            id,
            status: input.status,
        })
        .await
        .map_err(AsError::into_error)
        .map(|r| Json(r.into()))
}

/// Deletes a [`Room`] nobody lives in.
///
/// # Errors
///
/// Possible error codes:
/// - `ROOM_NOT_EXISTS` - `Room` with the provided ID does not exist;
/// - `ROOM_OCCUPIED` - a `Tenant` still lives in the `Room`.
#[tracing::instrument(skip_all, fields(%id, otel.name = api::SPAN_NAME))]
pub async fn delete(
    Extension(service): Extension<Service>,
    WithRejection(Path(id), _): WithRejection<Path<room::Id>, Error>,
) -> Result<http::StatusCode, Error> {
    service
        .execute(command::DeleteRoom { id })
        .await
        .map_err(AsError::into_error)
        .map(|()| http::StatusCode::NO_CONTENT)
}

define_error! {
    enum RoomError {
        #[code = "ROOM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Room` does not exist"]
        NotExists,

        #[code = "ROOM_NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`Room` number is occupied by another `Room`"]
        NumberOccupied,

        #[code = "NEGATIVE_PRICE"]
        #[status = UNPROCESSABLE_ENTITY]
        #[message = "`Room` price cannot be negative"]
        NegativePrice,

        #[code = "ROOM_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`Room` is occupied by a `Tenant`"]
        Occupied,
    }
}

impl AsError for command::create_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativePrice(_) => Some(RoomError::NegativePrice.into()),
            Self::NumberOccupied(_) => {
                Some(RoomError::NumberOccupied.into())
            }
        }
    }
}

impl AsError for command::update_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NegativePrice(_) => Some(RoomError::NegativePrice.into()),
            Self::NotExists(_) => Some(RoomError::NotExists.into()),
            Self::NumberOccupied(_) => {
                Some(RoomError::NumberOccupied.into())
            }
        }
    }
}

impl AsError for command::set_room_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(RoomError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(RoomError::NotExists.into()),
            Self::Occupied { .. } => Some(RoomError::Occupied.into()),
        }
    }
}
