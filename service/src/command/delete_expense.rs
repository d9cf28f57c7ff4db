//! [`Command`] for deleting an [`Expense`].

use common::operations::{By, Commit, Delete, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{expense, Expense},
    infra::{database, Database},
    Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for deleting an [`Expense`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteExpense {
    /// ID of the [`Expense`] to delete.
    pub id: expense::Id,
}

impl<Db> Command<DeleteExpense> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Expense>, expense::Id>>,
            Ok = Option<Expense>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Expense, expense::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteExpense { id }: DeleteExpense,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        _ = tx
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
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

/// Error of [`DeleteExpense`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Expense`] with the provided ID does not exist.
    #[display("`Expense(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] expense::Id),
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
    use common::Money;

    use crate::{
        command::{fixture, CreateExpense},
        domain::expense,
        query, Classify as _, Command as _, ErrorKind, Query as _,
    };

    use super::DeleteExpense;

    #[tokio::test]
    async fn deletes_expense() {
        let svc = fixture::service();
        let expense = svc
            .execute(CreateExpense {
                description: expense::Description::new("Water").unwrap(),
                amount: Money::from(100),
                date: fixture::at("2024-01-20T00:00:00Z").coerce(),
            })
            .await
            .unwrap();

        svc.execute(DeleteExpense { id: expense.id }).await.unwrap();

        assert!(svc
            .execute(query::expense::List::by(()))
            .await
            .unwrap()
            .is_empty());
        let err = svc
            .execute(DeleteExpense { id: expense.id })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
