//! [`Command`] for overriding a [`Room`]'s [`room::Status`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{room, Room},
    infra::{database, Database},
    Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for administrative override of a [`Room`]'s [`room::Status`].
///
/// Doesn't check the [`Room`]'s tenants in any way.
#[derive(Clone, Copy, Debug)]
pub struct SetRoomStatus {
    /// ID of the [`Room`] to update.
    pub id: room::Id,

    /// New [`room::Status`] of the [`Room`].
    pub status: room::Status,
}

impl<Db> Command<SetRoomStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Update<room::StatusUpdate>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        SetRoomStatus { id, status }: SetRoomStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut room = tx
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        room.status = status;
        room.updated_at = DateTime::now().coerce();
        tx.execute(Update(room::StatusUpdate {
            id,
            status,
            updated_at: room.updated_at,
        }))
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Room(id: {id})` #{} is set to `{status}`", room.number);

        Ok(room)
    }
}

/// Error of [`SetRoomStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] room::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NotExists(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture, domain::room, query, Classify as _, Command as _,
        ErrorKind, Query as _,
    };

    use super::SetRoomStatus;

    #[tokio::test]
    async fn overrides_status() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        let updated = svc
            .execute(SetRoomStatus {
                id: room.id,
                status: room::Status::Occupied,
            })
            .await
            .unwrap();

        assert_eq!(updated.status, room::Status::Occupied);
        let stored = svc
            .execute(query::room::ById::by(room.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, room::Status::Occupied);
        assert_eq!(stored.number, room.number);
    }

    #[tokio::test]
    async fn fails_for_unknown_room() {
        let svc = fixture::service();

        let err = svc
            .execute(SetRoomStatus {
                id: room::Id::new(),
                status: room::Status::Empty,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
