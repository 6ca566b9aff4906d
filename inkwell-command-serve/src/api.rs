use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use inkwell_common::models::{Chapter, Id, ReadingList, Story, StoryStatus, User};
use inkwell_services::{
    chapters::{ChapterDetail, ChapterPatch, NewChapter},
    reading_lists::{NewReadingList, ReadingListPatch},
    stories::{AuthorStats, NewStory, SortBy, StoryDetail, StoryFilters, StoryPatch, StoryWithAuthor},
    users::{Follow, UserPatch},
    Services, StoryService, UserService,
};

use crate::Error;

type Reply<T> = Result<Json<T>, Error>;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoriesQuery {
    /// Comma separated.
    genres: Option<String>,
    status: Option<StoryStatus>,
    search: Option<String>,
    sort_by: Option<SortBy>,
}

impl From<StoriesQuery> for StoryFilters {
    fn from(query: StoriesQuery) -> Self {
        Self {
            genres: query
                .genres
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|genre| !genre.is_empty())
                .map(String::from)
                .collect(),
            status: query.status,
            search: query.search,
            sort_by: query.sort_by,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchQuery {
    q: String,
}

// stories

pub(crate) async fn list_stories(
    Extension(services): Extension<Services>,
    Query(query): Query<StoriesQuery>,
) -> Reply<Vec<StoryWithAuthor>> {
    Ok(Json(services.stories.get_stories(&query.into()).await))
}

pub(crate) async fn trending_stories(
    Extension(services): Extension<Services>,
    Query(query): Query<LimitQuery>,
) -> Reply<Vec<StoryWithAuthor>> {
    let limit = query.limit.unwrap_or(StoryService::DEFAULT_LIMIT);

    Ok(Json(services.stories.get_trending_stories(limit).await))
}

pub(crate) async fn recent_stories(
    Extension(services): Extension<Services>,
    Query(query): Query<LimitQuery>,
) -> Reply<Vec<StoryWithAuthor>> {
    let limit = query.limit.unwrap_or(StoryService::DEFAULT_LIMIT);

    Ok(Json(services.stories.get_recently_updated(limit).await))
}

pub(crate) async fn genres(Extension(services): Extension<Services>) -> Reply<Vec<String>> {
    Ok(Json(services.stories.get_genres().await))
}

pub(crate) async fn get_story(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<StoryDetail> {
    Ok(Json(services.stories.get_story_by_id(id).await?))
}

pub(crate) async fn create_story(
    Extension(services): Extension<Services>,
    Json(data): Json<NewStory>,
) -> Result<(StatusCode, Json<Story>), Error> {
    Ok((StatusCode::CREATED, Json(services.stories.create_story(data).await?)))
}

pub(crate) async fn update_story(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
    Json(patch): Json<StoryPatch>,
) -> Reply<Story> {
    Ok(Json(services.stories.update_story(id, patch).await?))
}

pub(crate) async fn delete_story(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Result<StatusCode, Error> {
    services.stories.delete_story(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn vote_for_story(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Story> {
    Ok(Json(services.stories.vote_for_story(id).await?))
}

pub(crate) async fn story_chapters(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Vec<Chapter>> {
    Ok(Json(services.chapters.get_chapters_by_story_id(id).await))
}

pub(crate) async fn author_stories(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Vec<StoryWithAuthor>> {
    Ok(Json(services.stories.get_stories_by_author(id).await))
}

pub(crate) async fn author_stats(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<AuthorStats> {
    Ok(Json(services.stories.get_author_stats(id).await?))
}

// chapters

pub(crate) async fn get_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<ChapterDetail> {
    Ok(Json(services.chapters.get_chapter_by_id(id).await?))
}

pub(crate) async fn next_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Option<Chapter>> {
    Ok(Json(services.chapters.get_next_chapter(id).await))
}

pub(crate) async fn previous_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Option<Chapter>> {
    Ok(Json(services.chapters.get_previous_chapter(id).await))
}

pub(crate) async fn create_chapter(
    Extension(services): Extension<Services>,
    Json(data): Json<NewChapter>,
) -> Result<(StatusCode, Json<Chapter>), Error> {
    Ok((StatusCode::CREATED, Json(services.chapters.create_chapter(data).await?)))
}

pub(crate) async fn update_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
    Json(patch): Json<ChapterPatch>,
) -> Reply<Chapter> {
    Ok(Json(services.chapters.update_chapter(id, patch).await?))
}

pub(crate) async fn delete_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Result<StatusCode, Error> {
    services.chapters.delete_chapter(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn vote_for_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Chapter> {
    Ok(Json(services.chapters.vote_for_chapter(id).await?))
}

pub(crate) async fn view_chapter(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Chapter> {
    Ok(Json(services.chapters.add_view(id).await?))
}

// users

pub(crate) async fn list_users(Extension(services): Extension<Services>) -> Reply<Vec<User>> {
    Ok(Json(services.users.get_users().await))
}

pub(crate) async fn current_user(Extension(services): Extension<Services>) -> Reply<User> {
    Ok(Json(services.users.get_current_user().await?))
}

pub(crate) async fn get_user(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<User> {
    Ok(Json(services.users.get_user_by_id(id).await?))
}

pub(crate) async fn get_user_by_username(
    Extension(services): Extension<Services>,
    Path(username): Path<String>,
) -> Reply<User> {
    Ok(Json(services.users.get_user_by_username(&username).await?))
}

pub(crate) async fn update_user(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
    Json(patch): Json<UserPatch>,
) -> Reply<User> {
    Ok(Json(services.users.update_user(id, patch).await?))
}

pub(crate) async fn search_users(
    Extension(services): Extension<Services>,
    Query(query): Query<SearchQuery>,
) -> Reply<Vec<User>> {
    Ok(Json(services.users.search_users(&query.q).await))
}

pub(crate) async fn popular_authors(
    Extension(services): Extension<Services>,
    Query(query): Query<LimitQuery>,
) -> Reply<Vec<User>> {
    let limit = query.limit.unwrap_or(UserService::DEFAULT_LIMIT);

    Ok(Json(services.users.get_popular_authors(limit).await))
}

pub(crate) async fn follow_author(
    Extension(services): Extension<Services>,
    Path((user_id, author_id)): Path<(Id, Id)>,
) -> Reply<Follow> {
    Ok(Json(services.users.follow_author(user_id, author_id).await?))
}

pub(crate) async fn unfollow_author(
    Extension(services): Extension<Services>,
    Path((user_id, author_id)): Path<(Id, Id)>,
) -> Reply<Follow> {
    Ok(Json(services.users.unfollow_author(user_id, author_id).await?))
}

// reading lists

pub(crate) async fn list_reading_lists(Extension(services): Extension<Services>) -> Reply<Vec<ReadingList>> {
    Ok(Json(services.reading_lists.get_all_lists().await))
}

pub(crate) async fn user_reading_lists(
    Extension(services): Extension<Services>,
    Path(user_id): Path<Id>,
) -> Reply<Vec<ReadingList>> {
    Ok(Json(services.reading_lists.get_lists_by_user_id(user_id).await))
}

pub(crate) async fn lists_containing_story(
    Extension(services): Extension<Services>,
    Path((user_id, story_id)): Path<(Id, Id)>,
) -> Reply<Vec<ReadingList>> {
    Ok(Json(
        services
            .reading_lists
            .get_lists_containing_story(story_id, user_id)
            .await,
    ))
}

pub(crate) async fn get_reading_list(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<ReadingList> {
    Ok(Json(services.reading_lists.get_list_by_id(id).await?))
}

pub(crate) async fn create_reading_list(
    Extension(services): Extension<Services>,
    Json(data): Json<NewReadingList>,
) -> Result<(StatusCode, Json<ReadingList>), Error> {
    Ok((StatusCode::CREATED, Json(services.reading_lists.create_list(data).await?)))
}

pub(crate) async fn update_reading_list(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
    Json(patch): Json<ReadingListPatch>,
) -> Reply<ReadingList> {
    Ok(Json(services.reading_lists.update_list(id, patch).await?))
}

pub(crate) async fn delete_reading_list(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Result<StatusCode, Error> {
    services.reading_lists.delete_list(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn reading_list_stories(
    Extension(services): Extension<Services>,
    Path(id): Path<Id>,
) -> Reply<Vec<StoryWithAuthor>> {
    Ok(Json(services.reading_lists.get_stories_in_list(id).await?))
}

pub(crate) async fn is_story_in_list(
    Extension(services): Extension<Services>,
    Path((list_id, story_id)): Path<(Id, Id)>,
) -> Reply<bool> {
    Ok(Json(services.reading_lists.is_story_in_list(list_id, story_id).await))
}

pub(crate) async fn add_story_to_list(
    Extension(services): Extension<Services>,
    Path((list_id, story_id)): Path<(Id, Id)>,
) -> Reply<ReadingList> {
    Ok(Json(services.reading_lists.add_story_to_list(list_id, story_id).await?))
}

pub(crate) async fn remove_story_from_list(
    Extension(services): Extension<Services>,
    Path((list_id, story_id)): Path<(Id, Id)>,
) -> Reply<ReadingList> {
    Ok(Json(
        services
            .reading_lists
            .remove_story_from_list(list_id, story_id)
            .await?,
    ))
}

// maintenance

pub(crate) async fn reset(Extension(services): Extension<Services>) -> StatusCode {
    services.catalog().reset().await;

    StatusCode::NO_CONTENT
}
