use std::sync::Arc;

use chrono::Utc;
use inkwell_common::{
    models::{Chapter, ChapterStatus, Comment, Id, Story},
    utils::count_words,
    Delay, EntityKind, ServiceError,
};

use crate::Catalog;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ChapterDetail {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub story: Option<Story>,
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    pub story_id: Id,
    /// Appended after the current last chapter when unset.
    #[serde(default)]
    pub chapter_number: Option<u32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: ChapterStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChapterPatch {
    pub chapter_number: Option<u32>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ChapterStatus>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Next,
    Previous,
}

#[derive(Clone, Debug)]
pub struct ChapterService {
    catalog: Arc<Catalog>,
}

impl ChapterService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_chapter_by_id(&self, id: Id) -> Result<ChapterDetail, ServiceError> {
        let state = self.catalog.read(Delay::Standard).await;

        let chapter = state.chapter(id)?;

        Ok(ChapterDetail {
            chapter: chapter.clone(),
            story: state.story(chapter.story_id).ok().cloned(),
            comments: state
                .comments
                .iter()
                .filter(|comment| comment.chapter_id == id)
                .cloned()
                .collect(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_chapters_by_story_id(&self, story_id: Id) -> Vec<Chapter> {
        self.catalog.read(Delay::Standard).await.chapters_of(story_id)
    }

    /// The chapter numbered one higher in the same story, if there is one.
    #[tracing::instrument(skip(self))]
    pub async fn get_next_chapter(&self, id: Id) -> Option<Chapter> {
        self.neighbour(id, Direction::Next).await
    }

    /// The chapter numbered one lower in the same story, if there is one.
    #[tracing::instrument(skip(self))]
    pub async fn get_previous_chapter(&self, id: Id) -> Option<Chapter> {
        self.neighbour(id, Direction::Previous).await
    }

    async fn neighbour(&self, id: Id, direction: Direction) -> Option<Chapter> {
        let state = self.catalog.read(Delay::Short).await;

        let current = state.chapter(id).ok()?;
        let wanted = match direction {
            Direction::Next => current.chapter_number.checked_add(1)?,
            Direction::Previous => current.chapter_number.checked_sub(1)?,
        };

        state
            .chapters
            .iter()
            .find(|chapter| chapter.story_id == current.story_id && chapter.chapter_number == wanted)
            .cloned()
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn vote_for_chapter(&self, id: Id) -> Result<Chapter, ServiceError> {
        let mut state = self.catalog.write(Delay::Short).await;

        let chapter = state.chapter_mut(id)?;
        chapter.votes += 1;
        let chapter = chapter.clone();

        if let Ok(story) = state.story_mut(chapter.story_id) {
            story.total_votes += 1;
        }

        Ok(chapter)
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn add_view(&self, id: Id) -> Result<Chapter, ServiceError> {
        let mut state = self.catalog.write(Delay::Brief).await;

        let chapter = state.chapter_mut(id)?;
        chapter.views += 1;
        let chapter = chapter.clone();

        if let Ok(story) = state.story_mut(chapter.story_id) {
            story.total_views += 1;
        }

        Ok(chapter)
    }

    #[tracing::instrument(skip(self, data), fields(story_id = data.story_id), err)]
    pub async fn create_chapter(&self, data: NewChapter) -> Result<Chapter, ServiceError> {
        let mut state = self.catalog.write(Delay::Slow).await;

        state.story(data.story_id)?;

        let chapter_number = match data.chapter_number {
            Some(0) => return Err(ServiceError::validation("chapter numbers start at 1")),
            Some(number) if state.chapter_number_taken(data.story_id, number, None) => {
                return Err(ServiceError::validation(format!(
                    "chapter {} already exists in story {}",
                    number, data.story_id
                )));
            }
            Some(number) => number,
            None => {
                state
                    .chapters
                    .iter()
                    .filter(|chapter| chapter.story_id == data.story_id)
                    .map(|chapter| chapter.chapter_number)
                    .max()
                    .unwrap_or(0)
                    .checked_add(1)
                    .ok_or_else(|| ServiceError::validation("no chapter number left to append"))?
            }
        };

        let now = Utc::now();
        let chapter = Chapter {
            id: state.chapter_ids.advance()?,
            story_id: data.story_id,
            chapter_number,
            title: data.title,
            word_count: count_words(&data.content),
            content: data.content,
            status: data.status,
            views: 0,
            votes: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        };

        state.chapters.push(chapter.clone());

        let story = state.story_mut(chapter.story_id)?;
        story.chapter_count += 1;
        story.word_count += chapter.word_count;
        story.updated_at = now;

        tracing::info!(chapter_id = chapter.id, chapter_number, "chapter created");

        Ok(chapter)
    }

    /// Applies the patch and moves the parent story's word count by the
    /// difference between the old and new chapter word counts.
    #[tracing::instrument(skip(self, patch), err)]
    pub async fn update_chapter(&self, id: Id, patch: ChapterPatch) -> Result<Chapter, ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        let story_id = state.chapter(id)?.story_id;

        match patch.chapter_number {
            Some(0) => return Err(ServiceError::validation("chapter numbers start at 1")),
            Some(number) if state.chapter_number_taken(story_id, number, Some(id)) => {
                return Err(ServiceError::validation(format!(
                    "chapter {} already exists in story {}",
                    number, story_id
                )));
            }
            _ => {}
        }

        let now = Utc::now();
        let chapter = state.chapter_mut(id)?;
        let old_word_count = chapter.word_count;

        if let Some(chapter_number) = patch.chapter_number {
            chapter.chapter_number = chapter_number;
        }
        if let Some(title) = patch.title {
            chapter.title = title;
        }
        if let Some(content) = patch.content {
            chapter.content = content;
        }
        if let Some(status) = patch.status {
            chapter.status = status;
        }
        chapter.word_count = count_words(&chapter.content);
        chapter.updated_at = now;

        let chapter = chapter.clone();

        if let Ok(story) = state.story_mut(story_id) {
            story.word_count = story.word_count.saturating_sub(old_word_count) + chapter.word_count;
            story.updated_at = now;
        }

        tracing::debug!(old_word_count, new_word_count = chapter.word_count, "chapter updated");

        Ok(chapter)
    }

    /// Removes the chapter and its comments, taking both out of the parent
    /// story's aggregates.
    #[tracing::instrument(skip(self), err)]
    pub async fn delete_chapter(&self, id: Id) -> Result<(), ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        let index = state
            .chapters
            .iter()
            .position(|chapter| chapter.id == id)
            .ok_or(ServiceError::NotFound(EntityKind::Chapter))?;

        let chapter = state.chapters.remove(index);

        let before = state.comments.len();
        state.comments.retain(|comment| comment.chapter_id != id);
        let removed_comments = (before - state.comments.len()) as u64;

        if let Ok(story) = state.story_mut(chapter.story_id) {
            story.chapter_count = story.chapter_count.saturating_sub(1);
            story.word_count = story.word_count.saturating_sub(chapter.word_count);
            story.total_comments = story.total_comments.saturating_sub(removed_comments);
            story.updated_at = Utc::now();
        }

        tracing::info!(removed_comments, "chapter deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use inkwell_common::Latency;

    use super::*;
    use crate::Fixtures;

    fn service() -> ChapterService {
        ChapterService::new(Catalog::new(Fixtures::embedded().unwrap(), Latency::Disabled))
    }

    #[tokio::test]
    async fn chapter_joins_story_and_comments() {
        let detail = service().get_chapter_by_id(1).await.unwrap();

        assert_eq!(detail.story.map(|s| s.id), Some(1));
        assert_eq!(
            detail.comments.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn navigation_follows_chapter_numbers() {
        let service = service();

        assert_eq!(service.get_next_chapter(1).await.map(|c| c.id), Some(2));
        assert_eq!(service.get_previous_chapter(3).await.map(|c| c.id), Some(2));
        assert_eq!(service.get_previous_chapter(1).await, None);
        assert_eq!(service.get_next_chapter(3).await, None);
        assert_eq!(service.get_next_chapter(404).await, None);
    }

    #[tokio::test]
    async fn numbering_gaps_stop_navigation() {
        let service = service();

        service
            .update_chapter(
                2,
                ChapterPatch {
                    chapter_number: Some(7),
                    ..ChapterPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(service.get_next_chapter(1).await, None);
    }

    #[tokio::test]
    async fn duplicate_or_zero_numbers_are_rejected() {
        let service = service();

        let clash = service
            .create_chapter(NewChapter {
                story_id: 1,
                chapter_number: Some(2),
                ..NewChapter::default()
            })
            .await;
        assert!(matches!(clash, Err(ServiceError::Validation(_))));

        let zero = service
            .update_chapter(
                1,
                ChapterPatch {
                    chapter_number: Some(0),
                    ..ChapterPatch::default()
                },
            )
            .await;
        assert!(matches!(zero, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unnumbered_chapters_are_appended() {
        let chapter = service()
            .create_chapter(NewChapter {
                story_id: 1,
                title: "Epilogue".into(),
                ..NewChapter::default()
            })
            .await
            .unwrap();

        assert_eq!(chapter.chapter_number, 4);
        assert_eq!(chapter.id, 9);
        assert_eq!(chapter.status, ChapterStatus::Draft);
    }

    #[tokio::test]
    async fn appending_past_the_last_chapter_number_is_rejected() {
        let service = service();

        service
            .create_chapter(NewChapter {
                story_id: 5,
                chapter_number: Some(u32::MAX),
                ..NewChapter::default()
            })
            .await
            .unwrap();

        let err = service
            .create_chapter(NewChapter {
                story_id: 5,
                ..NewChapter::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.get_chapters_by_story_id(5).await.len(), 1);
    }

    #[tokio::test]
    async fn chapters_need_an_existing_story() {
        let err = service()
            .create_chapter(NewChapter {
                story_id: 77,
                content: "lost words".into(),
                ..NewChapter::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::NotFound(EntityKind::Story));
    }

    #[tokio::test]
    async fn view_and_vote_on_missing_chapter_fail() {
        let service = service();

        assert_eq!(
            service.add_view(404).await.unwrap_err(),
            ServiceError::NotFound(EntityKind::Chapter)
        );
        assert_eq!(
            service.vote_for_chapter(404).await.unwrap_err(),
            ServiceError::NotFound(EntityKind::Chapter)
        );
    }
}
