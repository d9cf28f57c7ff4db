//! [`Command`] for creating a new [`Room`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
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

/// [`Command`] for creating a new [`Room`].
///
/// New [`Room`]s are always [`room::Status::Empty`].
#[derive(Clone, Debug)]
pub struct CreateRoom {
    /// [`room::Number`] of a new [`Room`].
    pub number: room::Number,

    /// Monthly rent price of a new [`Room`].
    pub price: Money,

    /// [`room::Facilities`] of a new [`Room`].
    pub facilities: room::Facilities,

    /// [`room::Notes`] about a new [`Room`].
    pub notes: room::Notes,
}

impl<Db> Command<CreateRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'n> Database<
            Select<By<Option<Room>, &'n room::Number>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Insert<Room>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRoom {
            number,
            price,
            facilities,
            notes,
        } = cmd;

        if price.is_negative() {
            return Err(tracerr::new!(E::NegativePrice(price)));
        }

        let now = DateTime::now();
        let room = Room {
            id: room::Id::new(),
            number,
            price,
            status: room::Status::Empty,
            facilities,
            notes,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::new(&room.number)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::NumberOccupied(room.number)));
        }

        tx.execute(Insert(room.clone()))
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

/// Error of [`CreateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price of a [`Room`] is negative.
    #[display("`Room` price cannot be negative: {_0}")]
    NegativePrice(#[error(not(source))] Money),

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
        | ExecutionError::NumberOccupied(_) => e,
    }
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NegativePrice(_) => ErrorKind::Validation,
            Self::NumberOccupied(_) => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::fixture,
        domain::room,
        infra::database::memory::Table,
        query,
        Classify as _, Command as _, ErrorKind, Query as _,
    };

    use super::{CreateRoom, ExecutionError};

    fn cmd(number: &str, price: i64) -> CreateRoom {
        CreateRoom {
            number: room::Number::new(number).unwrap(),
            price: Money::from(price),
            facilities: room::Facilities::default(),
            notes: room::Notes::default(),
        }
    }

    #[tokio::test]
    async fn creates_empty_room() {
        let svc = fixture::service();

        let room = svc.execute(cmd("101", 1_000_000)).await.unwrap();

        assert_eq!(room.status, room::Status::Empty);
        let stored = svc
            .execute(query::room::ById::by(room.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.number, room.number);
        assert_eq!(stored.price, Money::from(1_000_000));
    }

    #[tokio::test]
    async fn rejects_duplicate_number() {
        let svc = fixture::service();
        _ = svc.execute(cmd("101", 1_000_000)).await.unwrap();

        let err = svc.execute(cmd("101", 900_000)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn rejects_negative_price() {
        let svc = fixture::service();

        let err = svc.execute(cmd("101", -1)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(svc
            .execute(query::room::List::by(()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn reports_unavailable_database() {
        let svc = fixture::service();
        svc.database().fail_on(Table::Rooms);

        let err = svc.execute(cmd("101", 1_000_000)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Dependency);
    }
}
