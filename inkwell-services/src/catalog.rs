use std::sync::Arc;

use inkwell_common::{
    models::{Chapter, Comment, Id, ReadingList, Story, User},
    Delay, EntityKind, Latency, ServiceError,
};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{fixtures::Fixtures, stories::StoryWithAuthor};

/// Monotonic id source, never hands out the same id twice.
///
/// Once `Id::MAX` has been issued the sequence is exhausted and refuses
/// further ids instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sequence {
    next: Option<Id>,
}

impl Sequence {
    pub fn seeded<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = Id>,
    {
        Self {
            next: match ids.into_iter().max() {
                Some(max) => max.checked_add(1),
                None => Some(1),
            },
        }
    }

    pub fn peek(&self) -> Option<Id> {
        self.next
    }

    pub fn advance(&mut self) -> Result<Id, ServiceError> {
        let id = self
            .next
            .ok_or_else(|| ServiceError::validation("no ids left in this collection"))?;
        self.next = id.checked_add(1);
        Ok(id)
    }
}

#[derive(Debug)]
pub(crate) struct State {
    pub(crate) stories: Vec<Story>,
    pub(crate) chapters: Vec<Chapter>,
    pub(crate) users: Vec<User>,
    pub(crate) reading_lists: Vec<ReadingList>,
    pub(crate) comments: Vec<Comment>,

    pub(crate) story_ids: Sequence,
    pub(crate) chapter_ids: Sequence,
    pub(crate) list_ids: Sequence,
}

macro_rules! lookup {
    ($find:ident, $find_mut:ident, $field:ident: $ty:ty => $kind:expr) => {
        pub(crate) fn $find(&self, id: Id) -> Result<&$ty, ServiceError> {
            self.$field
                .iter()
                .find(|record| record.id == id)
                .ok_or(ServiceError::NotFound($kind))
        }

        pub(crate) fn $find_mut(&mut self, id: Id) -> Result<&mut $ty, ServiceError> {
            self.$field
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or(ServiceError::NotFound($kind))
        }
    };
}

impl State {
    fn from_fixtures(fixtures: Fixtures) -> Self {
        let Fixtures {
            stories,
            chapters,
            users,
            reading_lists,
            comments,
        } = fixtures;

        Self {
            story_ids: Sequence::seeded(stories.iter().map(|s| s.id)),
            chapter_ids: Sequence::seeded(chapters.iter().map(|c| c.id)),
            list_ids: Sequence::seeded(reading_lists.iter().map(|l| l.id)),
            stories,
            chapters,
            users,
            reading_lists,
            comments,
        }
    }

    lookup!(story, story_mut, stories: Story => EntityKind::Story);
    lookup!(chapter, chapter_mut, chapters: Chapter => EntityKind::Chapter);
    lookup!(user, user_mut, users: User => EntityKind::User);
    lookup!(reading_list, reading_list_mut, reading_lists: ReadingList => EntityKind::ReadingList);

    pub(crate) fn with_author(&self, story: &Story) -> StoryWithAuthor {
        StoryWithAuthor {
            story: story.clone(),
            author: self.user(story.author_id).ok().cloned(),
        }
    }

    /// Chapters of a story in reading order.
    pub(crate) fn chapters_of(&self, story_id: Id) -> Vec<Chapter> {
        let mut chapters: Vec<Chapter> = self
            .chapters
            .iter()
            .filter(|chapter| chapter.story_id == story_id)
            .cloned()
            .collect();

        chapters.sort_by_key(|chapter| chapter.chapter_number);

        chapters
    }

    pub(crate) fn chapter_number_taken(&self, story_id: Id, number: u32, except: Option<Id>) -> bool {
        self.chapters.iter().any(|chapter| {
            chapter.story_id == story_id
                && chapter.chapter_number == number
                && Some(chapter.id) != except
        })
    }
}

/// In-memory repository shared by every service.
///
/// All collections live behind one lock, so an operation touching several
/// records (a chapter and its story, a follower and the followed author) is
/// applied as a unit.
#[derive(Debug)]
pub struct Catalog {
    seed: Fixtures,
    latency: Latency,
    state: RwLock<State>,
}

impl Catalog {
    pub fn new(seed: Fixtures, latency: Latency) -> Arc<Self> {
        let state = State::from_fixtures(seed.clone());

        tracing::debug!(
            stories = state.stories.len(),
            chapters = state.chapters.len(),
            users = state.users.len(),
            reading_lists = state.reading_lists.len(),
            comments = state.comments.len(),
            "catalog seeded"
        );

        Arc::new(Self {
            seed,
            latency,
            state: RwLock::new(state),
        })
    }

    pub fn latency(&self) -> Latency {
        self.latency
    }

    /// Throws away every change and restores the seed data.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self) {
        let fresh = State::from_fixtures(self.seed.clone());

        *self.state.write().await = fresh;

        tracing::info!("catalog reset to seed data");
    }

    /// Copies the current contents out as fixtures.
    pub async fn snapshot(&self) -> Fixtures {
        let state = self.state.read().await;

        Fixtures {
            stories: state.stories.clone(),
            chapters: state.chapters.clone(),
            users: state.users.clone(),
            reading_lists: state.reading_lists.clone(),
            comments: state.comments.clone(),
        }
    }

    pub(crate) async fn state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    pub(crate) async fn read(&self, delay: Delay) -> RwLockReadGuard<'_, State> {
        self.latency.pause(delay).await;
        self.state.read().await
    }

    pub(crate) async fn write(&self, delay: Delay) -> RwLockWriteGuard<'_, State> {
        self.latency.pause(delay).await;
        self.state.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_after_the_largest_id() {
        let mut seq = Sequence::seeded([3, 9, 4]);

        assert_eq!(seq.advance(), Ok(10));
        assert_eq!(seq.advance(), Ok(11));
        assert_eq!(seq.peek(), Some(12));
    }

    #[test]
    fn sequence_starts_at_one_when_empty() {
        let mut seq = Sequence::seeded(std::iter::empty());

        assert_eq!(seq.advance(), Ok(1));
    }

    #[test]
    fn sequence_stops_at_the_largest_id() {
        let mut exhausted = Sequence::seeded([7, Id::MAX]);

        assert_eq!(exhausted.peek(), None);
        assert!(matches!(exhausted.advance(), Err(ServiceError::Validation(_))));

        let mut last = Sequence::seeded([Id::MAX - 1]);

        assert_eq!(last.advance(), Ok(Id::MAX));
        assert!(last.advance().is_err());
    }

    #[tokio::test]
    async fn reset_restores_seed_and_sequences() {
        let catalog = Catalog::new(Fixtures::embedded().unwrap(), Latency::Disabled);

        {
            let mut state = catalog.write(Delay::Standard).await;
            state.stories.clear();
            state.story_ids.advance().unwrap();
        }

        catalog.reset().await;

        let state = catalog.state().await;
        assert_eq!(state.stories.len(), 5);
        assert_eq!(state.story_ids.peek(), Some(6));
    }
}
