//! [`Command`] for updating an existing [`Room`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{room, Room},
    infra::{database, Database},
    Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for updating the attributes of an existing [`Room`].
///
/// [`room::Status`] of the [`Room`] is left untouched, as it's managed by
/// the tenant [`Command`]s and [`SetRoomStatus`].
///
/// [`SetRoomStatus`]: super::SetRoomStatus
#[derive(Clone, Debug)]
pub struct UpdateRoom {
    /// ID of the [`Room`] to update.
    pub id: room::Id,

    /// New [`room::Number`] of the [`Room`].
    pub number: room::Number,

    /// New monthly rent price of the [`Room`].
    pub price: Money,

    /// New [`room::Facilities`] of the [`Room`].
    pub facilities: room::Facilities,

    /// New [`room::Notes`] about the [`Room`].
    pub notes: room::Notes,
}

impl<Db> Command<UpdateRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + for<'n> Database<
            Select<By<Option<Room>, &'n room::Number>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Update<Room>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateRoom {
            id,
            number,
            price,
            facilities,
            notes,
        } = cmd;

        if price.is_negative() {
            return Err(tracerr::new!(E::NegativePrice(price)));
        }

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
            .execute(Select(By::<Option<Room>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        if room.number != number {
            let other = tx
                .execute(Select(By::<Option<Room>, _>::new(&number)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if other.is_some_and(|r| r.id != id) {
                return Err(tracerr::new!(E::NumberOccupied(number)));
            }
        }

        room.number = number;
        room.price = price;
        room.facilities = facilities;
        room.notes = notes;
        room.updated_at = DateTime::now().coerce();

        tx.execute(Update(room.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map_err(|e| number_occupied(e, &room.number))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(room)
    }
}

/// Error of [`UpdateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price of a [`Room`] is negative.
    #[display("`Room` price cannot be negative: {_0}")]
    NegativePrice(#[error(not(source))] Money),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] room::Id),

    /// [`room::Number`] is already occupied by another [`Room`].
    #[display("`{_0}` room number is occupied")]
    NumberOccupied(#[error(not(source))] room::Number),
}

/// Converts a unique violation of a [`room::Number`] into
/// [`ExecutionError::NumberOccupied`].
fn number_occupied(
    e: Traced<ExecutionError>,
    number: &room::Number,
) -> Traced<ExecutionError> {
    match e.as_ref() {
        ExecutionError::Db(db)
            if db.is_unique_violation(Some(database::ROOMS_NUMBER_KEY)) =>
        {
            tracerr::new!(ExecutionError::NumberOccupied(number.clone()))
        }
        ExecutionError::Db(_)
        | ExecutionError::NegativePrice(_)
        | ExecutionError::NotExists(_)
        | ExecutionError::NumberOccupied(_) => e,
    }
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NegativePrice(_) => ErrorKind::Validation,
            Self::NotExists(_) => ErrorKind::NotFound,
            Self::NumberOccupied(_) => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::fixture,
        domain::{room, Room},
        Classify as _, Command as _, ErrorKind,
    };

    use super::{ExecutionError, UpdateRoom};

    fn cmd(room: &Room, number: &str) -> UpdateRoom {
        UpdateRoom {
            id: room.id,
            number: room::Number::new(number).unwrap(),
            price: Money::from(2_000_000),
            facilities: room::Facilities::new("AC").unwrap(),
            notes: room::Notes::new("renovated").unwrap(),
        }
    }

    #[tokio::test]
    async fn keeps_status() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        _ = fixture::tenant(&svc, "Budi", Some(room.id)).await;

        let updated = svc.execute(cmd(&room, "101A")).await.unwrap();

        assert_eq!(updated.id, room.id);
        assert_eq!(updated.number.to_string(), "101A");
        assert_eq!(updated.price, Money::from(2_000_000));
        assert_eq!(updated.status, room::Status::Occupied);
    }

    #[tokio::test]
    async fn keeps_own_number() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;

        let updated = svc.execute(cmd(&room, "101")).await.unwrap();

        assert_eq!(updated.number, room.number);
    }

    #[tokio::test]
    async fn rejects_number_of_another_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        _ = fixture::room(&svc, "102").await;

        let err = svc.execute(cmd(&room, "102")).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn fails_for_unknown_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "101").await;
        let mut cmd = cmd(&room, "101");
        cmd.id = room::Id::new();

        let err = svc.execute(cmd).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
