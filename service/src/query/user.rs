//! [`Query`] collection related to [`User`]s.

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

/// Queries a [`User`] by its [`user::Email`].
pub type ByEmail<'e> = DatabaseQuery<By<Option<User>, &'e user::Email>>;

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };

    use crate::{
        command::fixture,
        domain::{user, User},
        infra::{database::USERS_EMAIL_KEY, Database as _},
        Query as _,
    };

    use super::{ByEmail, ById};

    fn user(email: &str) -> User {
        let now = DateTime::now();
        User {
            id: user::Id::new(),
            name: user::Name::new("Siti").unwrap(),
            email: user::Email::new(email).unwrap(),
            password_hash: user::PasswordHash::from("hash".to_owned()),
            role: user::Role::default(),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    #[tokio::test]
    async fn finds_user_by_id_and_email() {
        let svc = fixture::service();
        let stored = user("owner@kost.id");
        svc.database().execute(Insert(stored.clone())).await.unwrap();

        let by_id = svc.execute(ById::by(stored.id)).await.unwrap().unwrap();
        let by_email = svc
            .execute(ByEmail::by(&stored.email))
            .await
            .unwrap()
            .unwrap();
        let missing = svc
            .execute(ByEmail::by(&user::Email::new("x@kost.id").unwrap()))
            .await
            .unwrap();

        assert_eq!(by_id.email, stored.email);
        assert_eq!(by_id.role, user::Role::Staff);
        assert_eq!(by_email.id, stored.id);
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let svc = fixture::service();
        let first = user("owner@kost.id");
        svc.database().execute(Insert(first.clone())).await.unwrap();

        let err = svc
            .database()
            .execute(Insert(user("owner@kost.id")))
            .await
            .unwrap_err();

        assert!(err.as_ref().is_unique_violation(Some(USERS_EMAIL_KEY)));
        let found = svc
            .database()
            .execute(Select(By::<Option<User>, _>::new(first.id)))
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(first.id));
    }
}
