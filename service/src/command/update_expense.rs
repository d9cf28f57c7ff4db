//! [`Command`] for updating an existing [`Expense`].

use common::{
    operations::{By, Commit, Select, Transact, Transacted, Update},
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

/// [`Command`] for updating an existing [`Expense`].
#[derive(Clone, Debug)]
pub struct UpdateExpense {
    /// ID of the [`Expense`] to update.
    pub id: expense::Id,

    /// New [`expense::Description`] of the [`Expense`].
    pub description: expense::Description,

    /// New spent amount.
    pub amount: Money,

    /// New [`DateTime`] the money was spent at.
    pub date: expense::SpendingDateTime,
}

impl<Db> Command<UpdateExpense> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Expense>, expense::Id>>,
            Ok = Option<Expense>,
            Err = Traced<database::Error>,
        > + Database<Update<Expense>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Expense;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateExpense,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateExpense {
            id,
            description,
            amount,
            date,
        } = cmd;

        if amount.is_negative() {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut expense = tx
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        expense.description = description;
        expense.amount = amount;
        expense.date = date;
        expense.updated_at = DateTime::now().coerce();

        tx.execute(Update(expense.clone()))
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

/// Error of [`UpdateExpense`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount of an [`Expense`] is negative.
    #[display("`Expense` amount cannot be negative: {_0}")]
    NegativeAmount(#[error(not(source))] Money),

    /// [`Expense`] with the provided ID does not exist.
    #[display("`Expense(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] expense::Id),
}

impl Classify for ExecutionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Dependency,
            Self::NegativeAmount(_) => ErrorKind::Validation,
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
        Classify as _, Command as _, ErrorKind,
    };

    use super::UpdateExpense;

    #[tokio::test]
    async fn updates_expense() {
        let svc = fixture::service();
        let created = svc
            .execute(CreateExpense {
                description: expense::Description::new("Water").unwrap(),
                amount: Money::from(100),
                date: fixture::at("2024-01-20T00:00:00Z").coerce(),
            })
            .await
            .unwrap();

        let updated = svc
            .execute(UpdateExpense {
                id: created.id,
                description: expense::Description::new("Water bill").unwrap(),
                amount: Money::from(120),
                date: created.date,
            })
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount, Money::from(120));
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn fails_for_unknown_expense() {
        let svc = fixture::service();

        let err = svc
            .execute(UpdateExpense {
                id: expense::Id::new(),
                description: expense::Description::new("Water").unwrap(),
                amount: Money::from(100),
                date: fixture::at("2024-01-20T00:00:00Z").coerce(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
