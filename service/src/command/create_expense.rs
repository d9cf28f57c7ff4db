//! [`Command`] for creating a new [`Expense`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{expense, Expense},
    infra::{database, Database},
    Classify, ErrorKind, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Expense`].
#[derive(Clone, Debug)]
pub struct CreateExpense {
    /// [`expense::Description`] of a new [`Expense`].
    pub description: expense::Description,

    /// Spent amount.
    pub amount: Money,

    /// [`DateTime`] the money was spent at.
    pub date: expense::SpendingDateTime,
}

impl<Db> Command<CreateExpense> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Expense>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Expense;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateExpense,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateExpense {
            description,
            amount,
            date,
        } = cmd;

        if amount.is_negative() {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }

        let now = DateTime::now();
        let expense = Expense {
            id: expense::Id::new(),
            description,
            amount,
            date,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(expense.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(expense)
    }
}

/// Error of [`CreateExpense`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount of an [`Expense`] is negative.
    #[display("`Expense` amount cannot be negative: {_0}")]
    NegativeAmount(#[error(not(source))] Money),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NegativeAmount(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::fixture, domain::expense, query, Classify as _,
        Command as _, ErrorKind, Query as _,
    };

    use super::CreateExpense;

    fn cmd(amount: i64) -> CreateExpense {
        CreateExpense {
            description: expense::Description::new("Electricity").unwrap(),
            amount: Money::from(amount),
            date: fixture::at("2024-01-20T00:00:00Z").coerce(),
        }
    }

    #[tokio::test]
    async fn creates_expense() {
        let svc = fixture::service();

        let expense = svc.execute(cmd(200)).await.unwrap();

        let stored = svc
            .execute(query::expense::ById::by(expense.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.amount, Money::from(200));
        assert_eq!(stored.description, expense.description);
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let svc = fixture::service();

        let err = svc.execute(cmd(-200)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
