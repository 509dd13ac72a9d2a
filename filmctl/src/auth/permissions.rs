//! Authorization checks over an already-authenticated principal.
//!
//! Each check is a predicate over loaded data and returns `Forbidden` on failure. Handlers run them
//! after payload validation has passed.

use sqlx::SqliteConnection;

use crate::{
    api::models::users::CurrentUser,
    db::handlers::Critics,
    errors::{Error, Result},
    types::{FilmId, UserId},
};

pub const FORBIDDEN: &str = "Forbidden";
pub const ALREADY_REVIEWED: &str = "User has already submitted a critic for this film.";

/// The principal must be the target user. `message` names the action being refused.
pub fn require_self(principal: &CurrentUser, target: UserId, message: &str) -> Result<()> {
    if principal.id == target {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: message.to_string(),
        })
    }
}

pub fn require_admin(principal: &CurrentUser) -> Result<()> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: FORBIDDEN.to_string(),
        })
    }
}

/// Refuse a second critic by the same user for the same film.
///
/// This is a read before the insert; two concurrent submissions can both pass it.
pub async fn require_not_already_reviewed(conn: &mut SqliteConnection, principal: &CurrentUser, film_id: FilmId) -> Result<()> {
    if Critics::new(conn).exists_for_user_and_film(principal.id, film_id).await? {
        return Err(Error::Forbidden {
            message: ALREADY_REVIEWED.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::{handlers::Repository, models::critics::CriticCreateDBRequest};
    use crate::test_utils::{create_test_film, create_test_user};
    use sqlx::SqlitePool;

    fn principal(id: UserId, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            login: format!("user{id}"),
            email: format!("user{id}@x.com"),
            role,
            token_id: 1,
        }
    }

    #[test]
    fn test_require_self() {
        let me = principal(7, Role::User);
        assert!(require_self(&me, 7, "nope").is_ok());

        for other in [1, 6, 8, 1000] {
            match require_self(&me, other, "You can only view your own information.") {
                Err(Error::Forbidden { message }) => assert_eq!(message, "You can only view your own information."),
                other => panic!("expected forbidden, got {other:?}"),
            }
        }

        // Admins get no exemption
        assert!(require_self(&principal(1, Role::Admin), 2, "nope").is_err());
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&principal(1, Role::Admin)).is_ok());
        match require_admin(&principal(2, Role::User)) {
            Err(Error::Forbidden { message }) => assert_eq!(message, FORBIDDEN),
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_require_not_already_reviewed(pool: SqlitePool) {
        let user = create_test_user(&pool, Role::User).await;
        let film = create_test_film(&pool, "Academy Dinosaur").await;
        let other_film = create_test_film(&pool, "Ace Goldfinger").await;
        let me = principal(user.id, Role::User);
        let mut conn = pool.acquire().await.unwrap();

        require_not_already_reviewed(&mut conn, &me, film.id).await.unwrap();

        Critics::new(&mut conn)
            .create(&CriticCreateDBRequest {
                user_id: user.id,
                film_id: film.id,
                score: 9.0,
                comment: "Loved it".to_string(),
            })
            .await
            .unwrap();

        match require_not_already_reviewed(&mut conn, &me, film.id).await {
            Err(Error::Forbidden { message }) => assert_eq!(message, ALREADY_REVIEWED),
            other => panic!("expected forbidden, got {other:?}"),
        }
        // Other films and other users are unaffected
        require_not_already_reviewed(&mut conn, &me, other_film.id).await.unwrap();
        require_not_already_reviewed(&mut conn, &principal(user.id + 1, Role::User), film.id)
            .await
            .unwrap();
    }
}
