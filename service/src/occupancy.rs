//! Synchronization of [`Room`] occupancy with [`Tenant`]s assignment.
//!
//! Every operation here is meant to be executed inside the same transaction
//! as the [`Tenant`] write it accompanies.

use common::{
    operations::{By, Lock, Select, Update},
    DateTime,
};
use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{room, tenant, Room, Tenant},
    infra::{database, Database},
    Classify, ErrorKind,
};

/// Marks the [`Room`] as occupied by the [`Tenant`].
///
/// # Errors
///
/// - [`Error::RoomNotExists`] if there is no such [`Room`];
/// - [`Error::RoomOccupied`] if another [`Tenant`] already lives
///   in the [`Room`].
pub async fn occupy<Db>(
    db: &Db,
    room_id: room::Id,
    tenant_id: tenant::Id,
    at: DateTime,
) -> Result<(), Traced<Error>>
where
    Db: Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Tenant>, room::Id>>,
            Ok = Option<Tenant>,
            Err = Traced<database::Error>,
        > + Database<Update<room::StatusUpdate>, Err = Traced<database::Error>>,
{
    use self::Error as E;

    let room = locked_room(db, room_id).await.map_err(tracerr::wrap!())?;

    let occupant = db
        .execute(Select(By::<Option<Tenant>, _>::new(room_id)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;
    if let Some(occupant) = occupant.filter(|t| t.id != tenant_id) {
        return Err(tracerr::new!(E::RoomOccupied {
            room_id,
            tenant_id: occupant.id,
        }));
    }

    db.execute(Update(room::StatusUpdate {
        id: room_id,
        status: room::Status::Occupied,
        updated_at: at.coerce(),
    }))
    .await
    .map_err(tracerr::map_from_and_wrap!(=> E))
    .map(drop)?;

    log::debug!(
        "`Room(id: {room_id})` #{} is occupied by `Tenant(id: {tenant_id})`",
        room.number,
    );

    Ok(())
}

/// Marks the [`Room`] as empty after the [`Tenant`] has left it.
///
/// The [`Room`] stays occupied if any other [`Tenant`] still lives in it.
///
/// # Errors
///
/// [`Error::RoomNotExists`] if there is no such [`Room`].
pub async fn vacate<Db>(
    db: &Db,
    room_id: room::Id,
    tenant_id: tenant::Id,
    at: DateTime,
) -> Result<(), Traced<Error>>
where
    Db: Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Tenant>, room::Id>>,
            Ok = Option<Tenant>,
            Err = Traced<database::Error>,
        > + Database<Update<room::StatusUpdate>, Err = Traced<database::Error>>,
{
    use self::Error as E;

    let room = locked_room(db, room_id).await.map_err(tracerr::wrap!())?;

    let occupant = db
        .execute(Select(By::<Option<Tenant>, _>::new(room_id)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?;
    if let Some(occupant) = occupant.filter(|t| t.id != tenant_id) {
        log::warn!(
            "`Room(id: {room_id})` #{} is left occupied: \
             `Tenant(id: {tenant_id})` doesn't live there, \
             but `Tenant(id: {})` does",
            room.number,
            occupant.id,
        );
        return Ok(());
    }

    db.execute(Update(room::StatusUpdate {
        id: room_id,
        status: room::Status::Empty,
        updated_at: at.coerce(),
    }))
    .await
    .map_err(tracerr::map_from_and_wrap!(=> E))
    .map(drop)?;

    log::debug!(
        "`Room(id: {room_id})` #{} is vacated by `Tenant(id: {tenant_id})`",
        room.number,
    );

    Ok(())
}

/// Locks the [`Room`] for the rest of the transaction and selects it.
async fn locked_room<Db>(
    db: &Db,
    room_id: room::Id,
) -> Result<Room, Traced<Error>>
where
    Db: Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        >,
{
    use self::Error as E;

    // Avoid concurrent occupancy changes of the same `Room`.
    db.execute(Lock(By::new(room_id)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

    db.execute(Select(By::<Option<Room>, _>::new(room_id)))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))?
        .ok_or(E::RoomNotExists(room_id))
        .map_err(tracerr::wrap!())
}

/// Error of synchronizing [`Room`] occupancy.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`Room`] is occupied by another [`Tenant`].
    #[display("`Room(id: {room_id})` is occupied by `Tenant(id: {tenant_id})`")]
    RoomOccupied {
        /// ID of the occupied [`Room`].
        room_id: room::Id,

        /// ID of the [`Tenant`] living in the [`Room`].
        tenant_id: tenant::Id,
    },
}

impl Classify for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::RoomNotExists(_) => ErrorKind::NotFound,
            Self::RoomOccupied { .. } => ErrorKind::Conflict,
        }
    }
}
