use std::sync::Arc;

use chrono::Utc;
use inkwell_common::{
    models::{Id, ReadingList},
    Delay, EntityKind, ServiceError,
};

use crate::{stories::StoryWithAuthor, Catalog};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReadingList {
    pub user_id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Ownership and the default flag are fixed at creation and cannot be patched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReadingListPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub story_ids: Option<Vec<Id>>,
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("reading list name must not be blank"));
    }

    Ok(())
}

#[derive(Clone, Debug)]
pub struct ReadingListService {
    catalog: Arc<Catalog>,
}

impl ReadingListService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all_lists(&self) -> Vec<ReadingList> {
        self.catalog.read(Delay::Standard).await.reading_lists.clone()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_lists_by_user_id(&self, user_id: Id) -> Vec<ReadingList> {
        let state = self.catalog.read(Delay::Standard).await;

        state
            .reading_lists
            .iter()
            .filter(|list| list.user_id == user_id)
            .cloned()
            .collect()
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_list_by_id(&self, id: Id) -> Result<ReadingList, ServiceError> {
        let state = self.catalog.read(Delay::Standard).await;

        state.reading_list(id).cloned()
    }

    #[tracing::instrument(skip(self, data), fields(user_id = data.user_id), err)]
    pub async fn create_list(&self, data: NewReadingList) -> Result<ReadingList, ServiceError> {
        validate_name(&data.name)?;

        let mut state = self.catalog.write(Delay::Standard).await;

        state.user(data.user_id)?;

        let now = Utc::now();
        let list = ReadingList {
            id: state.list_ids.advance()?,
            user_id: data.user_id,
            name: data.name,
            description: data.description,
            story_ids: Vec::new(),
            is_default: false,
            created_at: now,
            updated_at: now,
        };

        state.reading_lists.push(list.clone());

        tracing::info!(list_id = list.id, "reading list created");

        Ok(list)
    }

    #[tracing::instrument(skip(self, patch), err)]
    pub async fn update_list(&self, id: Id, patch: ReadingListPatch) -> Result<ReadingList, ServiceError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }

        let mut state = self.catalog.write(Delay::Standard).await;

        let list = state.reading_list_mut(id)?;

        if let Some(name) = patch.name {
            list.name = name;
        }
        if let Some(description) = patch.description {
            list.description = description;
        }
        if let Some(story_ids) = patch.story_ids {
            list.story_ids.clear();
            for story_id in story_ids {
                if !list.story_ids.contains(&story_id) {
                    list.story_ids.push(story_id);
                }
            }
        }
        list.updated_at = Utc::now();

        Ok(list.clone())
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn delete_list(&self, id: Id) -> Result<(), ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        let index = state
            .reading_lists
            .iter()
            .position(|list| list.id == id)
            .ok_or(ServiceError::NotFound(EntityKind::ReadingList))?;

        if state.reading_lists[index].is_default {
            tracing::warn!("refusing to delete a default reading list");

            return Err(ServiceError::DefaultList);
        }

        state.reading_lists.remove(index);

        Ok(())
    }

    /// Adds the story unless it is already on the list.
    #[tracing::instrument(skip(self), err)]
    pub async fn add_story_to_list(&self, list_id: Id, story_id: Id) -> Result<ReadingList, ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        state.reading_list(list_id)?;
        state.story(story_id)?;

        let list = state.reading_list_mut(list_id)?;

        if !list.contains(story_id) {
            list.story_ids.push(story_id);
            list.updated_at = Utc::now();

            tracing::debug!("story added to list");
        }

        Ok(list.clone())
    }

    /// Removes the story if it is on the list.
    #[tracing::instrument(skip(self), err)]
    pub async fn remove_story_from_list(&self, list_id: Id, story_id: Id) -> Result<ReadingList, ServiceError> {
        let mut state = self.catalog.write(Delay::Standard).await;

        let list = state.reading_list_mut(list_id)?;

        if let Some(index) = list.story_ids.iter().position(|id| *id == story_id) {
            list.story_ids.remove(index);
            list.updated_at = Utc::now();

            tracing::debug!("story removed from list");
        }

        Ok(list.clone())
    }

    /// Stories on the list, in catalog order.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_stories_in_list(&self, list_id: Id) -> Result<Vec<StoryWithAuthor>, ServiceError> {
        let state = self.catalog.read(Delay::Standard).await;

        let list = state.reading_list(list_id)?;

        Ok(state
            .stories
            .iter()
            .filter(|story| list.contains(story.id))
            .map(|story| state.with_author(story))
            .collect())
    }

    /// The user's lists that already hold the story.
    #[tracing::instrument(skip(self))]
    pub async fn get_lists_containing_story(&self, story_id: Id, user_id: Id) -> Vec<ReadingList> {
        let state = self.catalog.read(Delay::Standard).await;

        state
            .reading_lists
            .iter()
            .filter(|list| list.user_id == user_id && list.contains(story_id))
            .cloned()
            .collect()
    }

    /// `false` for a list that does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn is_story_in_list(&self, list_id: Id, story_id: Id) -> bool {
        let state = self.catalog.read(Delay::Standard).await;

        state
            .reading_list(list_id)
            .map(|list| list.contains(story_id))
            .unwrap_or(false)
    }
}
