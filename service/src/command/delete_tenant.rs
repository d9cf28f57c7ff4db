//! [`Command`] for deleting a [`Tenant`].

use common::{
    operations::{
        By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Payment;
use crate::{
    domain::{room, tenant, Room, Tenant},
    infra::{database, Database},
    occupancy, Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Tenant`] along with all its [`Payment`]s.
///
/// The [`Room`] the [`Tenant`] lived in becomes [`room::Status::Empty`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteTenant {
    /// ID of the [`Tenant`] to delete.
    pub id: tenant::Id,
}

impl<Db> Command<DeleteTenant> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Tenant, tenant::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Tenant>, tenant::Id>>,
            Ok = Option<Tenant>,
            Err = Traced<database::Error>,
        > + Database<
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
        > + Database<Update<room::StatusUpdate>, Err = Traced<database::Error>>
        + Database<
            Delete<By<Tenant, tenant::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteTenant { id }: DeleteTenant,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Tenant, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let tenant = tx
            .execute(Select(By::<Option<Tenant>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        if let Some(room_id) = tenant.room_id {
            occupancy::vacate(&tx, room_id, id, DateTime::now())
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        tx.execute(Delete(By::<Tenant, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteTenant`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Tenant`] with the provided ID does not exist.
    #[display("`Tenant(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] tenant::Id),

    /// [`Room`] occupancy cannot be changed.
    #[display("`Room` occupancy cannot be changed: {_0}")]
    #[from]
    Occupancy(occupancy::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NotExists(_) => ErrorKind::NotFound,
            Self::Occupancy(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::{fixture, SavePayment},
        domain::{payment, room, tenant},
        infra::database::memory::Table,
        query, Classify as _, Command as _, ErrorKind, Query as _,
    };

    use super::DeleteTenant;

    #[tokio::test]
    async fn vacates_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        svc.execute(DeleteTenant { id: tenant.id }).await.unwrap();

        let room = svc
            .execute(query::room::ById::by(room.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.status, room::Status::Empty);
        assert!(svc
            .execute(query::tenant::ById::by(tenant.id))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn deletes_payments() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let other = fixture::tenant(&svc, "Siti", None).await;
        for t in [&tenant, &other] {
            _ = svc
                .execute(SavePayment {
                    id: None,
                    tenant_id: t.id,
                    amount: Money::from(1_500_000),
                    due_date: fixture::at("2024-01-10T00:00:00Z").coerce(),
                    paid_at: None,
                    method: payment::Method::default(),
                    now: fixture::at("2024-01-05T00:00:00Z"),
                })
                .await
                .unwrap();
        }

        svc.execute(DeleteTenant { id: tenant.id }).await.unwrap();

        let payments = svc.execute(query::payment::List::by(())).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].tenant_id, other.id);
    }

    #[tokio::test]
    async fn fails_for_unknown_tenant() {
        let svc = fixture::service();

        let err = svc
            .execute(DeleteTenant {
                id: tenant::Id::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rolls_back_room_on_failed_delete() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(room.id)).await;
        svc.database().fail_writes_on(Table::Tenants);

        let err = svc
            .execute(DeleteTenant { id: tenant.id })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);

        svc.database().recover();
        let room = svc
            .execute(query::room::ById::by(room.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(room.status, room::Status::Occupied);
    }
}
