use std::sync::Arc;

use chrono::{TimeZone as _, Utc};
use inkwell_common::{
    models::{Chapter, ChapterStatus, Story, StoryStatus, User},
    EntityKind, Latency, ServiceError,
};
use inkwell_services::{
    chapters::{ChapterPatch, NewChapter},
    reading_lists::NewReadingList,
    stories::{NewStory, StoryFilters},
    Catalog, Fixtures, Services,
};

fn services() -> Services {
    Services::new(Catalog::new(Fixtures::embedded().unwrap(), Latency::Disabled))
}

#[tokio::test]
async fn lookups_reject_unknown_ids() {
    let services = services();

    assert_eq!(
        services.stories.get_story_by_id(404).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::Story)
    );
    assert_eq!(
        services.chapters.get_chapter_by_id(404).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::Chapter)
    );
    assert_eq!(
        services.users.get_user_by_id(404).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::User)
    );
    assert_eq!(
        services.users.get_user_by_username("ghost").await.unwrap_err(),
        ServiceError::NotFound(EntityKind::User)
    );
    assert_eq!(
        services.reading_lists.get_list_by_id(404).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::ReadingList)
    );
    assert_eq!(
        services.reading_lists.get_stories_in_list(404).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::ReadingList)
    );
}

#[tokio::test]
async fn story_detail_lists_chapters_in_reading_order() {
    let services = services();

    services
        .chapters
        .update_chapter(
            1,
            ChapterPatch {
                chapter_number: Some(9),
                ..ChapterPatch::default()
            },
        )
        .await
        .unwrap();

    let detail = services.stories.get_story_by_id(1).await.unwrap();

    assert_eq!(detail.author.map(|a| a.username), Some("elaravance".to_string()));
    assert_eq!(
        detail.chapters.iter().map(|c| c.chapter_number).collect::<Vec<_>>(),
        vec![2, 3, 9]
    );
}

#[tokio::test]
async fn created_records_round_trip_with_fresh_ids() {
    let services = services();
    let fixtures = services.catalog().snapshot().await;
    let max_story = fixtures.stories.iter().map(|s| s.id).max().unwrap();

    let story = services
        .stories
        .create_story(NewStory {
            title: "Glass Orchard".into(),
            description: "Fruit that shows the future.".into(),
            genres: vec!["Fantasy".into()],
            status: StoryStatus::Ongoing,
            author_id: 2,
            ..NewStory::default()
        })
        .await
        .unwrap();

    assert!(story.id > max_story);
    assert_eq!((story.total_votes, story.chapter_count, story.word_count), (0, 0, 0));
    assert_eq!(services.stories.get_story_by_id(story.id).await.unwrap().story, story);

    let chapter = services
        .chapters
        .create_chapter(NewChapter {
            story_id: story.id,
            title: "Seeds".into(),
            content: "one two three".into(),
            status: ChapterStatus::Published,
            ..NewChapter::default()
        })
        .await
        .unwrap();

    assert_eq!(chapter.word_count, 3);
    assert_eq!(services.chapters.get_chapter_by_id(chapter.id).await.unwrap().chapter, chapter);

    let list = services
        .reading_lists
        .create_list(NewReadingList {
            user_id: 1,
            name: "Orchards".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(services.reading_lists.get_list_by_id(list.id).await.unwrap(), list);
}

#[tokio::test]
async fn creating_a_chapter_updates_story_aggregates() {
    let services = services();
    let before = services.stories.get_story_by_id(3).await.unwrap().story;

    let chapter = services
        .chapters
        .create_chapter(NewChapter {
            story_id: 3,
            content: "one two three".into(),
            ..NewChapter::default()
        })
        .await
        .unwrap();

    let after = services.stories.get_story_by_id(3).await.unwrap().story;

    assert_eq!(chapter.word_count, 3);
    assert_eq!(chapter.chapter_number, 2);
    assert_eq!(after.chapter_count, before.chapter_count + 1);
    assert_eq!(after.word_count, before.word_count + 3);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn updating_content_moves_story_word_count_by_the_delta() {
    let services = services();

    // chapter 2 holds 16 words of story 1's 44
    let before = services.stories.get_story_by_id(1).await.unwrap().story;
    assert_eq!(before.word_count, 44);

    let chapter = services
        .chapters
        .update_chapter(
            2,
            ChapterPatch {
                content: Some("a much shorter chapter".into()),
                ..ChapterPatch::default()
            },
        )
        .await
        .unwrap();

    let after = services.stories.get_story_by_id(1).await.unwrap().story;

    assert_eq!(chapter.word_count, 4);
    assert_eq!(after.word_count, 44 - 16 + 4);

    // a title only patch keeps the content and the count
    services
        .chapters
        .update_chapter(
            2,
            ChapterPatch {
                title: Some("Ash".into()),
                ..ChapterPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(services.stories.get_story_by_id(1).await.unwrap().story.word_count, 32);
}

#[tokio::test]
async fn deleting_a_chapter_unwinds_its_aggregates() {
    let services = services();

    services.chapters.delete_chapter(1).await.unwrap();

    let story = services.stories.get_story_by_id(1).await.unwrap().story;
    assert_eq!(story.chapter_count, 2);
    assert_eq!(story.word_count, 44 - 15);
    assert_eq!(story.total_comments, 1);

    let remaining = services.catalog().snapshot().await.comments;
    assert!(remaining.iter().all(|comment| comment.chapter_id != 1));

    assert_eq!(
        services.chapters.delete_chapter(1).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::Chapter)
    );
}

#[tokio::test]
async fn deleting_a_story_cascades() {
    let services = services();

    services.stories.delete_story(1).await.unwrap();

    assert!(services.chapters.get_chapters_by_story_id(1).await.is_empty());
    assert_eq!(
        services.chapters.get_chapter_by_id(2).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::Chapter)
    );

    let fixtures = services.catalog().snapshot().await;
    assert!(fixtures.comments.iter().all(|c| ![1, 2, 3].contains(&c.chapter_id)));

    let favorites = services.reading_lists.get_list_by_id(1).await.unwrap();
    assert_eq!(favorites.story_ids, vec![2]);

    // deleted ids are never handed out again
    let next = services
        .stories
        .create_story(NewStory {
            title: "Replacement".into(),
            author_id: 2,
            ..NewStory::default()
        })
        .await
        .unwrap();
    assert_eq!(next.id, 6);
}

#[tokio::test]
async fn removing_a_story_from_a_list_hides_it() {
    let services = services();

    services.reading_lists.remove_story_from_list(1, 2).await.unwrap();

    let stories = services.reading_lists.get_stories_in_list(1).await.unwrap();

    assert_eq!(stories.iter().map(|s| s.story.id).collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn adding_a_story_twice_is_idempotent() {
    let services = services();

    services.reading_lists.add_story_to_list(3, 5).await.unwrap();
    let list = services.reading_lists.add_story_to_list(3, 5).await.unwrap();

    assert_eq!(list.story_ids.iter().filter(|id| **id == 5).count(), 1);
    assert_eq!(
        services.reading_lists.add_story_to_list(3, 404).await.unwrap_err(),
        ServiceError::NotFound(EntityKind::Story)
    );
}

fn small_catalog() -> Arc<Catalog> {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let author = User {
        id: 1,
        username: "quill".into(),
        display_name: "Quill".into(),
        avatar: String::new(),
        bio: String::new(),
        is_writer: true,
        followers_count: 0,
        following_authors: Vec::new(),
        created_at: at,
    };

    let story = Story {
        id: 1,
        title: "Tidewater".into(),
        description: String::new(),
        cover_image: String::new(),
        genres: vec!["Drama".into()],
        tags: Vec::new(),
        status: StoryStatus::Ongoing,
        mature: false,
        author_id: 1,
        total_votes: 20,
        total_views: 0,
        total_comments: 0,
        chapter_count: 1,
        word_count: 2,
        created_at: at,
        updated_at: at,
    };

    let chapter = Chapter {
        id: 1,
        story_id: 1,
        chapter_number: 1,
        title: "Low Tide".into(),
        content: "low tide".into(),
        status: ChapterStatus::Published,
        views: 0,
        votes: 5,
        comment_count: 0,
        word_count: 2,
        created_at: at,
        updated_at: at,
    };

    Catalog::new(
        Fixtures {
            stories: vec![story],
            chapters: vec![chapter],
            users: vec![author],
            ..Fixtures::default()
        },
        Latency::Disabled,
    )
}

#[tokio::test]
async fn chapter_votes_and_views_reach_the_story() {
    let services = Services::new(small_catalog());

    let chapter = services.chapters.vote_for_chapter(1).await.unwrap();
    let story = services.stories.get_story_by_id(1).await.unwrap().story;

    assert_eq!(chapter.votes, 6);
    assert_eq!(story.total_votes, 21);

    services.chapters.add_view(1).await.unwrap();
    services.chapters.add_view(1).await.unwrap();

    let story = services.stories.get_story_by_id(1).await.unwrap().story;
    assert_eq!(story.total_views, 2);
}

#[tokio::test]
async fn empty_collections_start_ids_at_one() {
    let services = Services::new(small_catalog());

    let list = services
        .reading_lists
        .create_list(NewReadingList {
            user_id: 1,
            name: "Mine".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(list.id, 1);
}

#[tokio::test]
async fn reset_discards_every_change() {
    let services = services();

    services.stories.delete_story(2).await.unwrap();
    services.users.follow_author(1, 4).await.unwrap();

    services.catalog().reset().await;

    assert_eq!(services.stories.get_stories(&StoryFilters::default()).await.len(), 5);
    assert_eq!(services.users.get_user_by_id(4).await.unwrap().followers_count, 215);
    assert_eq!(services.catalog().snapshot().await, Fixtures::embedded().unwrap());
}
