//! [`Command`] for updating an existing [`Tenant`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{room, tenant, Room, Tenant},
    infra::{database, Database},
    occupancy, Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Tenant`], moving it between
/// [`Room`]s if required.
///
/// The [`Room`] the [`Tenant`] lived in before (as seen by the caller, and
/// as stored, if they differ) is vacated first, and then the new one is
/// occupied, so keeping the same [`Room`] leaves it occupied.
#[derive(Clone, Debug)]
pub struct UpdateTenant {
    /// ID of the [`Tenant`] to update.
    pub id: tenant::Id,

    /// ID of the [`Room`] the [`Tenant`] lived in before this update.
    pub old_room_id: Option<room::Id>,

    /// New [`tenant::Name`] of the [`Tenant`].
    pub name: tenant::Name,

    /// New [`tenant::Phone`] of the [`Tenant`].
    pub phone: tenant::Phone,

    /// ID of the [`Room`] the [`Tenant`] lives in after this update.
    pub room_id: Option<room::Id>,

    /// New [`DateTime`] when the tenancy starts.
    pub start_date: tenant::StartDateTime,

    /// New [`DateTime`] when the tenancy ends, if known.
    pub end_date: Option<tenant::EndDateTime>,

    /// New [`tenant::Status`] of the [`Tenant`].
    pub status: tenant::Status,
}

impl<Db> Command<UpdateTenant> for Service<Db>
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
        + Database<Update<Tenant>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Tenant;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateTenant) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateTenant {
            id,
            old_room_id,
            name,
            phone,
            room_id,
            start_date,
            end_date,
            status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Tenant, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut tenant = tx
            .execute(Select(By::<Option<Tenant>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        let stored_room_id = tenant.room_id;
        if stored_room_id != old_room_id {
            log::warn!(
                "`Tenant(id: {id})` is stored in `Room(id: {:?})`, \
                 but `Room(id: {old_room_id:?})` is provided as the old one, \
                 so both are vacated",
                stored_room_id,
            );
        }

        let now = DateTime::now();
        tenant.name = name;
        tenant.phone = phone;
        tenant.room_id = room_id;
        tenant.start_date = start_date;
        tenant.end_date = end_date;
        tenant.status = status;
        tenant.updated_at = now.coerce();
        if !tenant.has_valid_period() {
            return Err(tracerr::new!(E::InvalidPeriod));
        }

        // Concurrent moves must lock the same `Room`s in the same order.
        for room in lock_order([old_room_id, stored_room_id, room_id]) {
            tx.execute(Lock(By::<Room, _>::new(room)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        for old in lock_order([old_room_id, stored_room_id]) {
            occupancy::vacate(&tx, old, id, now)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }
        if let Some(new) = room_id {
            occupancy::occupy(&tx, new, id, now)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        tx.execute(Update(tenant.clone()))
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

/// Returns the provided [`Room`]s IDs without duplicates, in the order they
/// are locked in.
fn lock_order<const N: usize>(rooms: [Option<room::Id>; N]) -> Vec<room::Id> {
    let mut ids = rooms.into_iter().flatten().collect::<Vec<_>>();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Error of [`UpdateTenant`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Tenancy ends before it starts.
    #[display("`Tenant` end date cannot precede its start date")]
    InvalidPeriod,

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
            Self::InvalidPeriod => ErrorKind::Validation,
            Self::NotExists(_) => ErrorKind::NotFound,
            Self::Occupancy(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, SetRoomStatus},
        domain::{room, tenant, Tenant},
        infra::{database::memory::Table, Memory},
        query, Classify as _, Command as _, ErrorKind, Query as _, Service,
    };

    use super::{lock_order, UpdateTenant};

    fn cmd(tenant: &Tenant, room_id: Option<room::Id>) -> UpdateTenant {
        UpdateTenant {
            id: tenant.id,
            old_room_id: tenant.room_id,
            name: tenant.name.clone(),
            phone: tenant.phone.clone(),
            room_id,
            start_date: tenant.start_date,
            end_date: tenant.end_date,
            status: tenant.status,
        }
    }

    async fn room_status(svc: &Service<Memory>, id: room::Id) -> room::Status {
        svc.execute(query::room::ById::by(id))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn moves_between_rooms() {
        let svc = fixture::service();
        let old = fixture::room(&svc, "5").await;
        let new = fixture::room(&svc, "7").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(old.id)).await;

        let updated = svc.execute(cmd(&tenant, Some(new.id))).await.unwrap();

        assert_eq!(updated.room_id, Some(new.id));
        assert_eq!(room_status(&svc, old.id).await, room::Status::Empty);
        assert_eq!(room_status(&svc, new.id).await, room::Status::Occupied);
    }

    #[tokio::test]
    async fn keeps_same_room_occupied() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "5").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        let mut cmd = cmd(&tenant, Some(room.id));
        cmd.name = tenant::Name::new("Budi Santoso").unwrap();
        let updated = svc.execute(cmd).await.unwrap();

        assert_eq!(updated.name.to_string(), "Budi Santoso");
        assert_eq!(room_status(&svc, room.id).await, room::Status::Occupied);
    }

    #[tokio::test]
    async fn vacates_room_when_unassigned() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "5").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        let updated = svc.execute(cmd(&tenant, None)).await.unwrap();

        assert_eq!(updated.room_id, None);
        assert_eq!(room_status(&svc, room.id).await, room::Status::Empty);
    }

    #[tokio::test]
    async fn rejects_room_of_another_tenant() {
        let svc = fixture::service();
        let old = fixture::room(&svc, "5").await;
        let taken = fixture::room(&svc, "7").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(old.id)).await;
        _ = fixture::tenant(&svc, "Siti", Some(taken.id)).await;

        let err = svc
            .execute(cmd(&tenant, Some(taken.id)))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        // Vacating of the old `Room` is rolled back.
        assert_eq!(room_status(&svc, old.id).await, room::Status::Occupied);
        let stored = svc
            .execute(query::tenant::ById::by(tenant.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.room_id, Some(old.id));
    }

    #[tokio::test]
    async fn rolls_back_rooms_on_failed_tenant_write() {
        let svc = fixture::service();
        let old = fixture::room(&svc, "5").await;
        let new = fixture::room(&svc, "7").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(old.id)).await;
        svc.database().fail_writes_on(Table::Tenants);

        let err = svc
            .execute(cmd(&tenant, Some(new.id)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);

        svc.database().recover();
        assert_eq!(room_status(&svc, old.id).await, room::Status::Occupied);
        assert_eq!(room_status(&svc, new.id).await, room::Status::Empty);
    }

    #[tokio::test]
    async fn uses_provided_old_room() {
        let svc = fixture::service();
        let stale = fixture::room(&svc, "5").await;
        _ = svc
            .execute(SetRoomStatus {
                id: stale.id,
                status: room::Status::Occupied,
            })
            .await
            .unwrap();
        let tenant = fixture::tenant(&svc, "Budi", None).await;

        let mut cmd = cmd(&tenant, None);
        cmd.old_room_id = Some(stale.id);
        _ = svc.execute(cmd).await.unwrap();

        assert_eq!(room_status(&svc, stale.id).await, room::Status::Empty);
    }

    #[tokio::test]
    async fn vacates_stored_room_on_stale_old_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "5").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        let mut cmd = cmd(&tenant, None);
        cmd.old_room_id = None;
        _ = svc.execute(cmd).await.unwrap();

        assert_eq!(room_status(&svc, room.id).await, room::Status::Empty);
    }

    #[tokio::test]
    async fn moves_with_stale_old_room() {
        let svc = fixture::service();
        let stored = fixture::room(&svc, "5").await;
        let stale = fixture::room(&svc, "6").await;
        let new = fixture::room(&svc, "7").await;
        let tenant = fixture::tenant(&svc, "Budi", Some(stored.id)).await;

        let mut cmd = cmd(&tenant, Some(new.id));
        cmd.old_room_id = Some(stale.id);
        _ = svc.execute(cmd).await.unwrap();

        assert_eq!(room_status(&svc, stored.id).await, room::Status::Empty);
        assert_eq!(room_status(&svc, stale.id).await, room::Status::Empty);
        assert_eq!(room_status(&svc, new.id).await, room::Status::Occupied);
    }

    #[test]
    fn locks_rooms_in_ascending_order() {
        let (a, b) = (room::Id::new(), room::Id::new());
        let (low, high) = if a < b { (a, b) } else { (b, a) };

        assert_eq!(lock_order([Some(high), None, Some(low)]), [low, high]);
        assert_eq!(lock_order([Some(low), None, Some(high)]), [low, high]);
        assert_eq!(lock_order([Some(low), Some(low), None]), [low]);
        assert!(lock_order::<2>([None, None]).is_empty());
    }

    #[tokio::test]
    async fn leaves_room_of_another_tenant_occupied() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "5").await;
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        _ = fixture::tenant(&svc, "Siti", Some(room.id)).await;

        let mut cmd = cmd(&tenant, None);
        cmd.old_room_id = Some(room.id);
        _ = svc.execute(cmd).await.unwrap();

        assert_eq!(room_status(&svc, room.id).await, room::Status::Occupied);
    }

    #[tokio::test]
    async fn fails_for_unknown_tenant() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let mut cmd = cmd(&tenant, None);
        cmd.id = tenant::Id::new();

        let err = svc.execute(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn rejects_invalid_period() {
        let svc = fixture::service();
        let tenant = fixture::tenant(&svc, "Budi", None).await;
        let mut cmd = cmd(&tenant, None);
        cmd.end_date = Some(fixture::at("2023-06-01T00:00:00Z").coerce());

        let err = svc.execute(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
