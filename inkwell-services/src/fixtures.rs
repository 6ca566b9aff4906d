use std::path::Path;

use inkwell_common::{
    models::{Chapter, Comment, ReadingList, Story, User},
    Context as _, Report,
};
use serde::{de::DeserializeOwned, Serialize};

static STORIES: &str = include_str!("../../fixtures/stories.json");
static CHAPTERS: &str = include_str!("../../fixtures/chapters.json");
static USERS: &str = include_str!("../../fixtures/users.json");
static READING_LISTS: &str = include_str!("../../fixtures/readingLists.json");
static COMMENTS: &str = include_str!("../../fixtures/comments.json");

/// The five collections the catalog is seeded from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fixtures {
    pub stories: Vec<Story>,
    pub chapters: Vec<Chapter>,
    pub users: Vec<User>,
    pub reading_lists: Vec<ReadingList>,
    pub comments: Vec<Comment>,
}

impl Fixtures {
    pub const STORIES_FILE: &'static str = "stories.json";
    pub const CHAPTERS_FILE: &'static str = "chapters.json";
    pub const USERS_FILE: &'static str = "users.json";
    pub const READING_LISTS_FILE: &'static str = "readingLists.json";
    pub const COMMENTS_FILE: &'static str = "comments.json";

    /// The sample data compiled into the binary.
    pub fn embedded() -> Result<Self, Report> {
        Ok(Self {
            stories: parse(Self::STORIES_FILE, STORIES)?,
            chapters: parse(Self::CHAPTERS_FILE, CHAPTERS)?,
            users: parse(Self::USERS_FILE, USERS)?,
            reading_lists: parse(Self::READING_LISTS_FILE, READING_LISTS)?,
            comments: parse(Self::COMMENTS_FILE, COMMENTS)?,
        })
    }

    #[tracing::instrument(skip(dir), fields(dir = %dir.as_ref().display()), err)]
    pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self, Report> {
        let dir = dir.as_ref();

        let fixtures = Self {
            stories: read(dir, Self::STORIES_FILE).await?,
            chapters: read(dir, Self::CHAPTERS_FILE).await?,
            users: read(dir, Self::USERS_FILE).await?,
            reading_lists: read(dir, Self::READING_LISTS_FILE).await?,
            comments: read(dir, Self::COMMENTS_FILE).await?,
        };

        tracing::info!(stories = fixtures.stories.len(), "loaded fixtures");

        Ok(fixtures)
    }

    #[tracing::instrument(skip(self, dir), fields(dir = %dir.as_ref().display()), err)]
    pub async fn write_dir(&self, dir: impl AsRef<Path>) -> Result<(), Report> {
        let dir = dir.as_ref();

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("unable to create `{}`", dir.display()))?;

        write(dir, Self::STORIES_FILE, &self.stories).await?;
        write(dir, Self::CHAPTERS_FILE, &self.chapters).await?;
        write(dir, Self::USERS_FILE, &self.users).await?;
        write(dir, Self::READING_LISTS_FILE, &self.reading_lists).await?;
        write(dir, Self::COMMENTS_FILE, &self.comments).await?;

        Ok(())
    }
}

fn parse<T: DeserializeOwned>(name: &str, raw: &str) -> Result<Vec<T>, Report> {
    serde_json::from_str(raw).with_context(|| format!("malformed fixture `{}`", name))
}

async fn read<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, Report> {
    let path = dir.join(name);

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("unable to read `{}`", path.display()))?;

    parse(name, &raw)
}

async fn write<T: Serialize>(dir: &Path, name: &str, records: &[T]) -> Result<(), Report> {
    let path = dir.join(name);
    let data = serde_json::to_vec_pretty(records)?;

    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("unable to write `{}`", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_fixtures_parse() {
        let fixtures = Fixtures::embedded().unwrap();

        assert_eq!(fixtures.stories.len(), 5);
        assert_eq!(fixtures.chapters.len(), 8);
        assert_eq!(fixtures.users.len(), 4);
        assert_eq!(fixtures.reading_lists.len(), 3);
        assert_eq!(fixtures.comments.len(), 7);
    }

    #[tokio::test]
    async fn written_fixtures_load_back() {
        let dir = std::env::temp_dir().join(format!("inkwell-fixtures-{}", std::process::id()));
        let fixtures = Fixtures::embedded().unwrap();

        fixtures.write_dir(&dir).await.unwrap();
        let loaded = Fixtures::load_dir(&dir).await.unwrap();

        assert_eq!(loaded, fixtures);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_directory_names_the_file() {
        let err = Fixtures::load_dir("/definitely/not/here").await.unwrap_err();

        assert!(format!("{:#}", err).contains("stories.json"));
    }
}
