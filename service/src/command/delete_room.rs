//! [`Command`] for deleting a [`Room`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{room, tenant, Room, Tenant},
    infra::{database, Database},
    Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Room`] nobody lives in.
#[derive(Clone, Copy, Debug)]
pub struct DeleteRoom {
    /// ID of the [`Room`] to delete.
    pub id: room::Id,
}

impl<Db> Command<DeleteRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Tenant>, room::Id>>,
            Ok = Option<Tenant>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteRoom { id }: DeleteRoom,
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
        _ = tx
            .execute(Select(By::<Option<Room>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        let occupant = tx
            .execute(Select(By::<Option<Tenant>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(t) = occupant {
            return Err(tracerr::new!(E::Occupied {
                room_id: id,
                tenant_id: t.id,
            }));
        }

        tx.execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] room::Id),

    /// [`Room`] is still occupied by a [`Tenant`].
    #[display("`Room(id: {room_id})` is occupied by `Tenant(id: {tenant_id})`")]
    Occupied {
        /// ID of the [`Room`] to delete.
        room_id: room::Id,

        /// ID of the [`Tenant`] living in the [`Room`].
        tenant_id: tenant::Id,
    },
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NotExists(_) => ErrorKind::NotFound,
            Self::Occupied { .. } => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, DeleteTenant},
        domain::room,
        query, Classify as _, Command as _, ErrorKind, Query as _,
    };

    use super::DeleteRoom;

    #[tokio::test]
    async fn deletes_empty_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        svc.execute(DeleteRoom { id: room.id }).await.unwrap();

        assert!(svc
            .execute(query::room::ById::by(room.id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn refuses_occupied_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        let err = svc.execute(DeleteRoom { id: room.id }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        svc.execute(DeleteTenant { id: tenant.id }).await.unwrap();
        svc.execute(DeleteRoom { id: room.id }).await.unwrap();
    }

    #[tokio::test]
    async fn fails_for_unknown_room() {
        let svc = fixture::service();

        let err = svc
            .execute(DeleteRoom {
                id: room::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
