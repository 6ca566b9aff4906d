use chrono::{DateTime, Utc};

pub type Id = u32;

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(rename = "Id")]
    pub id: Id,
    pub title: String,
    pub description: String,
    pub cover_image: String,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub status: StoryStatus,
    pub mature: bool,
    pub author_id: Id,
    pub total_votes: u64,
    pub total_views: u64,
    pub total_comments: u64,
    pub chapter_count: u64,
    pub word_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    /// Trending rank, scaled by ten so the `views / 10` term stays integral.
    pub fn trending_score(&self) -> u64 {
        self.total_votes * 10 + self.total_views + self.total_comments * 50
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();

        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
    }
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum StoryStatus {
    #[default]
    #[serde(rename = "ongoing")]
    Ongoing,
    #[serde(rename = "complete")]
    Complete,
}

serde_plain::derive_display_from_serialize!(StoryStatus);
serde_plain::derive_fromstr_from_deserialize!(StoryStatus);

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(rename = "Id")]
    pub id: Id,
    pub story_id: Id,
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
    pub status: ChapterStatus,
    pub views: u64,
    pub votes: u64,
    pub comment_count: u64,
    pub word_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum ChapterStatus {
    #[default]
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "published")]
    Published,
}

serde_plain::derive_display_from_serialize!(ChapterStatus);
serde_plain::derive_fromstr_from_deserialize!(ChapterStatus);

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "Id")]
    pub id: Id,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
    pub is_writer: bool,
    pub followers_count: u64,
    pub following_authors: Vec<Id>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();

        self.username.to_lowercase().contains(&needle)
            || self.display_name.to_lowercase().contains(&needle)
            || self.bio.to_lowercase().contains(&needle)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingList {
    #[serde(rename = "Id")]
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub story_ids: Vec<Id>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReadingList {
    pub fn contains(&self, story_id: Id) -> bool {
        self.story_ids.contains(&story_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "Id")]
    pub id: Id,
    pub chapter_id: Id,
    pub user_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
