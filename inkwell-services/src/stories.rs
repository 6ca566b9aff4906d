use std::{cmp::Reverse, collections::BTreeSet, sync::Arc};

use chrono::Utc;
use inkwell_common::{
    models::{Chapter, Id, Story, StoryStatus, User},
    Delay, EntityKind, ServiceError,
};

use crate::Catalog;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum SortBy {
    /// Most votes first.
    #[serde(rename = "popular")]
    Popular,
    /// Most recently updated first.
    #[serde(rename = "recent")]
    Recent,
    /// Most views first.
    #[serde(rename = "views")]
    Views,
    /// Most recently created first.
    #[serde(rename = "newest")]
    Newest,
}

impl SortBy {
    // `sort_by_key` is stable, ties keep their catalog order
    fn sort(self, stories: &mut [&Story]) {
        match self {
            SortBy::Popular => stories.sort_by_key(|story| Reverse(story.total_votes)),
            SortBy::Recent => stories.sort_by_key(|story| Reverse(story.updated_at)),
            SortBy::Views => stories.sort_by_key(|story| Reverse(story.total_views)),
            SortBy::Newest => stories.sort_by_key(|story| Reverse(story.created_at)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryFilters {
    /// Keep stories sharing at least one of these genres.
    pub genres: Vec<String>,
    pub status: Option<StoryStatus>,
    /// Case-insensitive substring of the title, description or any tag.
    pub search: Option<String>,
    pub sort_by: Option<SortBy>,
}

impl StoryFilters {
    pub fn matches(&self, story: &Story) -> bool {
        if !self.genres.is_empty() && !story.genres.iter().any(|genre| self.genres.contains(genre)) {
            return false;
        }

        if let Some(status) = self.status {
            if story.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => story.matches_search(needle),
            _ => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StoryWithAuthor {
    #[serde(flatten)]
    pub story: Story,
    pub author: Option<User>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    pub author: Option<User>,
    pub chapters: Vec<Chapter>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: StoryStatus,
    #[serde(default)]
    pub mature: bool,
    pub author_id: Id,
}

/// Fields left as `None` keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub genres: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<StoryStatus>,
    pub mature: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    pub stories: u64,
    pub total_votes: u64,
    pub total_views: u64,
    pub total_comments: u64,
    pub total_words: u64,
}

#[derive(Clone, Debug)]
pub struct StoryService {
    catalog: Arc<Catalog>,
}

impl StoryService {
    pub const DEFAULT_LIMIT: usize = 6;

    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_stories(&self, filters: &StoryFilters) -> Vec<StoryWithAuthor> {
        let state = self.catalog.read(Delay::Standard).await;

        let mut stories: Vec<&Story> = state
            .stories
            .iter()
            .filter(|story| filters.matches(story))
            .collect();

        if let Some(sort_by) = filters.sort_by {
            sort_by.sort(&mut stories);
        }

        tracing::debug!(matched = stories.len(), "filtered stories");

        stories.into_iter().map(|story| state.with_author(story)).collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_trending_stories(&self, limit: usize) -> Vec<StoryWithAuthor> {
        let state = self.catalog.read(Delay::Standard).await;

        let mut stories: Vec<&Story> = state.stories.iter().collect();
        stories.sort_by_key(|story| Reverse(story.trending_score()));

        stories
            .into_iter()
            .take(limit)
            .map(|story| state.with_author(story))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_recently_updated(&self, limit: usize) -> Vec<StoryWithAuthor> {
        let state = self.catalog.read(Delay::Standard).await;

        let mut stories: Vec<&Story> = state.stories.iter().collect();
        SortBy::Recent.sort(&mut stories);

        stories
            .into_iter()
            .take(limit)
            .map(|story| state.with_author(story))
            .collect()
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_story_by_id(&self, id: Id) -> Result<StoryDetail, ServiceError> {
        let state = self.catalog.read(Delay::Standard).await;

        let story = state.story(id)?;

        Ok(StoryDetail {
            story: story.clone(),
            author: state.user(story.author_id).ok().cloned(),
            chapters: state.chapters_of(id),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_stories_by_author(&self, author_id: Id) -> Vec<StoryWithAuthor> {
        let state = self.catalog.read(Delay::Standard).await;

        state
            .stories
            .iter()
            .filter(|story| story.author_id == author_id)
            .map(|story| state.with_author(story))
            .collect()
    }

    /// Dashboard totals across everything an author has written.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_author_stats(&self, author_id: Id) -> Result<AuthorStats, ServiceError> {
        let state = self.catalog.read(Delay::Standard).await;

        state.user(author_id)?;

        Ok(state
            .stories
            .iter()
            .filter(|story| story.author_id == author_id)
            .fold(AuthorStats::default(), |acc, story| AuthorStats {
                stories: acc.stories + 1,
                total_votes: acc.total_votes + story.total_votes,
                total_views: acc.total_views + story.total_views,
                total_comments: acc.total_comments + story.total_comments,
                total_words: acc.total_words + story.word_count,
            }))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn vote_for_story(&self, id: Id) -> Result<Story, ServiceError> {
        let mut state = self.catalog.write(Delay::Short).await;

        let story = state.story_mut(id)?;
        story.total_votes += 1;

        tracing::debug!(votes = story.total_votes, "story voted");

        Ok(story.clone())
    }

    #[tracing::instrument(skip(self, data), fields(author_id = data.author_id), err)]
    pub async fn create_story(&self, data: NewStory) -> Result<Story, ServiceError> {
        if data.title.trim().is_empty() {
            return Err(ServiceError::validation("story title must not be blank"));
        }

        let mut state = self.catalog.write(Delay::Slow).await;

        state.user(data.author_id)?;

        let now = Utc::now();
        let story = Story {
            id: state.story_ids.advance()?,
            title: data.title,
            description: data.description,
            cover_image: data.cover_image,
            genres: data.genres,
            tags: data.tags,
            status: data.status,
            mature: data.mature,
            author_id: data.author_id,
            total_votes: 0,
            total_views: 0,
            total_comments: 0,
            chapter_count: 0,
            word_count: 0,
            created_at: now,
            updated_at: now,
        };

        state.stories.push(story.clone());

        tracing::info!(story_id = story.id, "story created");

        Ok(story)
    }

    #[tracing::instrument(skip(self, patch), err)]
    pub async fn update_story(&self, id: Id, patch: StoryPatch) -> Result<Story, ServiceError> {
        if matches!(&patch.title, Some(title) if title.trim().is_empty()) {
            return Err(ServiceError::validation("story title must not be blank"));
        }

        let mut state = self.catalog.write(Delay::Standard).await;

        let story = state.story_mut(id)?;

        if let Some(title) = patch.title {
            story.title = title;
        }
        if let Some(description) = patch.description {
            story.description = description;
        }
        if let Some(cover_image) = patch.cover_image {
            story.cover_image = cover_image;
        }
        if let Some(genres) = patch.genres {
            story.genres = genres;
        }
        if let Some(tags) = patch.tags {
            story.tags = tags;
        }
        if let Some(status) = patch.status {
            story.status = status;
        }
        if let Some(mature) = patch.mature {
            story.mature = mature;
        }
        story.updated_at = Utc::now();

        Ok(story.clone())
    }

    /// Removes the story along with its chapters, their comments, and any
    /// reading list entries pointing at it.
    #[tracing::instrument(skip(self), err)]
    pub async fn delete_story(&self, id: Id) -> Result<(), ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        let index = state
            .stories
            .iter()
            .position(|story| story.id == id)
            .ok_or(ServiceError::NotFound(EntityKind::Story))?;

        state.stories.remove(index);

        let chapter_ids: Vec<Id> = state
            .chapters
            .iter()
            .filter(|chapter| chapter.story_id == id)
            .map(|chapter| chapter.id)
            .collect();

        state.chapters.retain(|chapter| chapter.story_id != id);
        state
            .comments
            .retain(|comment| !chapter_ids.contains(&comment.chapter_id));

        let now = Utc::now();
        for list in state.reading_lists.iter_mut().filter(|list| list.contains(id)) {
            list.story_ids.retain(|story_id| *story_id != id);
            list.updated_at = now;
        }

        tracing::info!(chapters = chapter_ids.len(), "story deleted");

        Ok(())
    }

    /// Every genre in use, sorted and deduplicated.
    pub async fn get_genres(&self) -> Vec<String> {
        let state = self.catalog.state().await;

        state
            .stories
            .iter()
            .flat_map(|story| story.genres.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
