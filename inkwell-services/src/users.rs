use std::{cmp::Reverse, sync::Arc};

use inkwell_common::{
    models::{Id, User},
    Delay, EntityKind, ServiceError,
};

use crate::Catalog;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub is_writer: Option<bool>,
}

/// Both sides of a follow relationship after the change.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Follow {
    pub user: User,
    pub author: User,
}

#[derive(Clone, Debug)]
pub struct UserService {
    catalog: Arc<Catalog>,
}

impl UserService {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_users(&self) -> Vec<User> {
        self.catalog.read(Delay::Standard).await.users.clone()
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_user_by_id(&self, id: Id) -> Result<User, ServiceError> {
        self.catalog.read(Delay::Standard).await.user(id).cloned()
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, ServiceError> {
        let state = self.catalog.read(Delay::Standard).await;

        state
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned()
            .ok_or(ServiceError::NotFound(EntityKind::User))
    }

    /// Stand-in for a signed in user, the first account in the catalog.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_current_user(&self) -> Result<User, ServiceError> {
        let state = self.catalog.read(Delay::Short).await;

        state
            .users
            .first()
            .cloned()
            .ok_or(ServiceError::NotFound(EntityKind::User))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn follow_author(&self, user_id: Id, author_id: Id) -> Result<Follow, ServiceError> {
        if user_id == author_id {
            return Err(ServiceError::validation("users cannot follow themselves"));
        }

        let mut state = self.catalog.write(Delay::Short).await;

        state.user(author_id)?;
        let user = state.user_mut(user_id)?;

        if !user.following_authors.contains(&author_id) {
            user.following_authors.push(author_id);
            state.user_mut(author_id)?.followers_count += 1;

            tracing::debug!("now following");
        }

        Ok(Follow {
            user: state.user(user_id)?.clone(),
            author: state.user(author_id)?.clone(),
        })
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn unfollow_author(&self, user_id: Id, author_id: Id) -> Result<Follow, ServiceError> {
        let mut state = self.catalog.write(Delay::Short).await;

        state.user(author_id)?;
        let user = state.user_mut(user_id)?;

        if let Some(index) = user.following_authors.iter().position(|id| *id == author_id) {
            user.following_authors.remove(index);

            let author = state.user_mut(author_id)?;
            author.followers_count = author.followers_count.saturating_sub(1);

            tracing::debug!("unfollowed");
        }

        Ok(Follow {
            user: state.user(user_id)?.clone(),
            author: state.user(author_id)?.clone(),
        })
    }

    #[tracing::instrument(skip(self, patch), err)]
    pub async fn update_user(&self, id: Id, patch: UserPatch) -> Result<User, ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        let user = state.user_mut(id)?;

        if let Some(display_name) = patch.display_name {
            user.display_name = display_name;
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = avatar;
        }
        if let Some(bio) = patch.bio {
            user.bio = bio;
        }
        if let Some(is_writer) = patch.is_writer {
            user.is_writer = is_writer;
        }

        Ok(user.clone())
    }

    /// Needs at least two non-blank characters to search at all.
    #[tracing::instrument(skip(self))]
    pub async fn search_users(&self, query: &str) -> Vec<User> {
        let state = self.catalog.read(Delay::Standard).await;

        let query = query.trim();
        if query.chars().count() < 2 {
            return Vec::new();
        }

        state
            .users
            .iter()
            .filter(|user| user.matches_search(query))
            .cloned()
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_popular_authors(&self, limit: usize) -> Vec<User> {
        let state = self.catalog.read(Delay::Standard).await;

        let mut writers: Vec<&User> = state.users.iter().filter(|user| user.is_writer).collect();
        writers.sort_by_key(|user| Reverse(user.followers_count));

        writers.into_iter().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use inkwell_common::Latency;

    use super::*;
    use crate::Fixtures;

    fn service() -> UserService {
        UserService::new(Catalog::new(Fixtures::embedded().unwrap(), Latency::Disabled))
    }

    #[tokio::test]
    async fn current_user_is_the_first_account() {
        assert_eq!(service().get_current_user().await.unwrap().username, "inkreader");
    }

    #[tokio::test]
    async fn follow_is_idempotent_and_counted_once() {
        let service = service();

        let first = service.follow_author(1, 4).await.unwrap();
        let second = service.follow_author(1, 4).await.unwrap();

        assert_eq!(first.author.followers_count, 216);
        assert_eq!(second.author.followers_count, 216);
        assert_eq!(second.user.following_authors, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn unfollow_only_counts_an_actual_follow() {
        let service = service();

        for _ in 0..2 {
            let outcome = service.unfollow_author(4, 2).await.unwrap();
            assert!(outcome.user.following_authors.is_empty());
            assert_eq!(outcome.author.followers_count, 1283);
        }
    }

    #[tokio::test]
    async fn following_needs_two_distinct_users() {
        let service = service();

        assert!(matches!(
            service.follow_author(2, 2).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(
            service.follow_author(1, 99).await.unwrap_err(),
            ServiceError::NotFound(EntityKind::User)
        );
    }

    #[tokio::test]
    async fn search_requires_two_characters() {
        let service = service();

        assert!(service.search_users(" s ").await.is_empty());
        assert_eq!(
            service
                .search_users("  STORM ")
                .await
                .iter()
                .map(|u| u.id)
                .collect::<Vec<_>>(),
            vec![3]
        );
        // bios are searched too
        assert_eq!(service.search_users("midnight").await.len(), 1);
    }

    #[tokio::test]
    async fn popular_authors_are_writers_by_followers() {
        let authors = service().get_popular_authors(2).await;

        assert_eq!(authors.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2, 3]);
    }
}
