use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::domain::{models::UserId, User};

use super::repo_error::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Insert a credential-based account. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;
    /// Insert or refresh an account signed in through OAuth.
    async fn upsert_oauth_user(&self, email: &str, name: &str) -> Result<User, RepositoryError>;
}

pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

fn email_taken(email: &str) -> RepositoryError {
    RepositoryError::Conflict(format!("email {email} is already registered"))
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(email_taken(&user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_oauth_user(&self, email: &str, name: &str) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name)
            VALUES ($1, $2)
            ON CONFLICT(email) DO UPDATE
            SET name = EXCLUDED.name
            RETURNING id, email, name, password_hash
            "#,
        )
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user(&self, id: UserId) -> Result<User, RepositoryError> {
        self.users
            .read()
            .await
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.iter().any(|user| user.email == new_user.email) {
            return Err(email_taken(&new_user.email));
        }

        let user = User {
            id: UserId::from(users.len() as i32 + 1),
            email: new_user.email.clone(),
            name: new_user.name.clone(),
            password_hash: Some(new_user.password_hash.clone()),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn upsert_oauth_user(&self, email: &str, name: &str) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|user| user.email == email) {
            user.name = name.to_string();
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::from(users.len() as i32 + 1),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: None,
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Ada".to_string(),
            password_hash: "$argon2id$v=19$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(&new_user("ada@example.com")).await.unwrap();

        let again = repo.create_user(&new_user("ada@example.com")).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn oauth_upsert_keeps_id_and_refreshes_name() {
        let repo = InMemoryUserRepository::new();
        let first = repo
            .upsert_oauth_user("grace@example.com", "Grace")
            .await
            .unwrap();
        let second = repo
            .upsert_oauth_user("grace@example.com", "Grace Hopper")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Grace Hopper");
        assert!(second.password_hash.is_none());
    }

    #[tokio::test]
    async fn lookups_by_id_and_email() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create_user(&new_user("ada@example.com")).await.unwrap();

        let by_id = repo.get_user(created.id).await.unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        let missing = repo.get_user(UserId::from(99)).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
