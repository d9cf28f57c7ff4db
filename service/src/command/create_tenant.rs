//! [`Command`] for creating a new [`Tenant`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{room, tenant, Room, Tenant},
    infra::{database, Database},
    occupancy, Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Tenant`].
///
/// If the [`Tenant`] is placed into a [`Room`], the [`Room`] becomes
/// [`room::Status::Occupied`] in the same transaction.
#[derive(Clone, Debug)]
pub struct CreateTenant {
    /// [`tenant::Name`] of a new [`Tenant`].
    pub name: tenant::Name,

    /// [`tenant::Phone`] of a new [`Tenant`].
    pub phone: tenant::Phone,

    /// ID of the [`Room`] a new [`Tenant`] lives in, if any.
    pub room_id: Option<room::Id>,

    /// [`DateTime`] when the tenancy starts.
    pub start_date: tenant::StartDateTime,

    /// [`DateTime`] when the tenancy ends, if known.
    pub end_date: Option<tenant::EndDateTime>,

    /// [`tenant::Status`] of a new [`Tenant`].
    pub status: tenant::Status,
}

impl<Db> Command<CreateTenant> for Service<Db>
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
        > + Database<Update<room::StatusUpdate>, Err = Traced<database::Error>>
        + Database<Insert<Tenant>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Tenant;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateTenant) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTenant {
            name,
            phone,
            room_id,
            start_date,
            end_date,
            status,
        } = cmd;

        let now = DateTime::now();
        let tenant = Tenant {
            id: tenant::Id::new(),
            name,
            phone,
            room_id,
            start_date,
            end_date,
            status,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        if !tenant.has_valid_period() {
            return Err(tracerr::new!(E::InvalidPeriod));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(room_id) = tenant.room_id {
            occupancy::occupy(&tx, room_id, tenant.id, now)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        tx.execute(Insert(tenant.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(tenant)
    }
}

/// Error of [`CreateTenant`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Tenancy ends before it starts.
    #[display("`Tenant` end date cannot precede its start date")]
    InvalidPeriod,

    /// [`Room`] occupancy cannot be changed.
    #[display("`Room` occupancy cannot be changed: {_0}")]
    #[from]
    Occupancy(occupancy::Error),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::InvalidPeriod => ErrorKind::Validation,
            Self::Occupancy(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture,
        domain::{room, tenant},
        infra::database::memory::Table,
        query, Classify as _, Command as _, ErrorKind, Query as _,
    };

    use super::CreateTenant;

    fn cmd(name: &str, room_id: Option<room::Id>) -> CreateTenant {
        CreateTenant {
            name: tenant::Name::new(name).unwrap(),
            phone: tenant::Phone::new("+62 812-3456-7890").unwrap(),
            room_id,
            start_date: fixture::at("2024-01-01T00:00:00Z").coerce(),
            end_date: None,
            status: tenant::Status::Active,
        }
    }

    async fn room_status(
        svc: &crate::Service<crate::infra::Memory>,
        id: room::Id,
    ) -> room::Status {
        svc.execute(query::room::ById::by(id))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn occupies_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        let tenant = svc.execute(cmd("Budi", Some(room.id))).await.unwrap();

        assert_eq!(tenant.room_id, Some(room.id));
        assert_eq!(room_status(&svc, room.id).await, room::Status::Occupied);
        assert_eq!(
            svc.execute(query::tenant::ById::by(tenant.id))
                .await
                .unwrap()
                .map(|t| t.name),
            Some(tenant.name),
        );
    }

    #[tokio::test]
    async fn touches_no_room_without_assignment() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        let tenant = svc.execute(cmd("Budi", None)).await.unwrap();

        assert_eq!(tenant.room_id, None);
        assert_eq!(room_status(&svc, room.id).await, room::Status::Empty);
    }

    #[tokio::test]
    async fn rejects_occupied_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        _ = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        let err = svc.execute(cmd("Siti", Some(room.id))).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        let tenants = svc.execute(query::tenant::List::by(())).await.unwrap();
        assert_eq!(tenants.len(), 1);
    }

    #[tokio::test]
    async fn fails_for_unknown_room() {
        let svc = fixture::service();

        let err = svc
            .execute(cmd("Budi", Some(room::Id::new())))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(svc
            .execute(query::tenant::List::by(()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_period() {
        let svc = fixture::service();
        let mut cmd = cmd("Budi", None);
        cmd.end_date = Some(fixture::at("2023-12-31T00:00:00Z").coerce());

        let err = svc.execute(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn rolls_back_room_on_failed_tenant_write() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        svc.database().fail_writes_on(Table::Tenants);

        let err = svc.execute(cmd("Budi", Some(room.id))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);

        svc.database().recover();
        assert_eq!(room_status(&svc, room.id).await, room::Status::Empty);
        assert!(svc
            .execute(query::tenant::List::by(()))
            .await
            .unwrap()
            .is_empty());
    }
}
