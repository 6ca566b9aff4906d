//! Consistency checks for the denormalized counters and cross references.
//!
//! Story and chapter aggregates are maintained incrementally by the services,
//! hand edited fixtures are not, so drift is detected here and can be folded
//! back with [`Catalog::reconcile`].

use std::collections::{HashMap, HashSet};

use inkwell_common::{models::Id, utils::count_words, Delay};

use crate::{catalog::State, Catalog};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Finding {
    #[serde(rename_all = "camelCase")]
    StoryChapterCount { story_id: Id, stored: u64, computed: u64 },
    #[serde(rename_all = "camelCase")]
    StoryWordCount { story_id: Id, stored: u64, computed: u64 },
    #[serde(rename_all = "camelCase")]
    StoryCommentCount { story_id: Id, stored: u64, computed: u64 },
    #[serde(rename_all = "camelCase")]
    ChapterWordCount { chapter_id: Id, stored: u64, computed: u64 },
    #[serde(rename_all = "camelCase")]
    ChapterCommentCount { chapter_id: Id, stored: u64, computed: u64 },
    #[serde(rename_all = "camelCase")]
    DuplicateChapterNumber { story_id: Id, chapter_number: u32 },
    #[serde(rename_all = "camelCase")]
    DuplicateListEntry { list_id: Id, story_id: Id },
    #[serde(rename_all = "camelCase")]
    MissingAuthor { story_id: Id, author_id: Id },
    #[serde(rename_all = "camelCase")]
    OrphanChapter { chapter_id: Id, story_id: Id },
    #[serde(rename_all = "camelCase")]
    OrphanComment { comment_id: Id, chapter_id: Id },
    #[serde(rename_all = "camelCase")]
    MissingListOwner { list_id: Id, user_id: Id },
    #[serde(rename_all = "camelCase")]
    MissingListStory { list_id: Id, story_id: Id },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub stories: usize,
    pub chapters: usize,
    pub reading_lists: usize,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

#[derive(Default)]
struct Computed {
    chapter_counts: HashMap<Id, u64>,
    word_counts: HashMap<Id, u64>,
    comment_counts: HashMap<Id, u64>,
    story_comment_counts: HashMap<Id, u64>,
}

impl Computed {
    fn of(state: &State) -> Self {
        let mut computed = Self::default();

        for chapter in &state.chapters {
            *computed.chapter_counts.entry(chapter.story_id).or_default() += 1;
            *computed.word_counts.entry(chapter.story_id).or_default() += count_words(&chapter.content);
        }

        let chapter_stories: HashMap<Id, Id> = state
            .chapters
            .iter()
            .map(|chapter| (chapter.id, chapter.story_id))
            .collect();

        for comment in &state.comments {
            *computed.comment_counts.entry(comment.chapter_id).or_default() += 1;

            if let Some(story_id) = chapter_stories.get(&comment.chapter_id) {
                *computed.story_comment_counts.entry(*story_id).or_default() += 1;
            }
        }

        computed
    }
}

impl Catalog {
    #[tracing::instrument(skip(self))]
    pub async fn audit(&self) -> AuditReport {
        let state = self.read(Delay::Standard).await;
        let computed = Computed::of(&state);

        let story_ids: HashSet<Id> = state.stories.iter().map(|story| story.id).collect();
        let chapter_ids: HashSet<Id> = state.chapters.iter().map(|chapter| chapter.id).collect();
        let user_ids: HashSet<Id> = state.users.iter().map(|user| user.id).collect();

        let mut findings = Vec::new();

        for story in &state.stories {
            let chapter_count = computed.chapter_counts.get(&story.id).copied().unwrap_or(0);
            if story.chapter_count != chapter_count {
                findings.push(Finding::StoryChapterCount {
                    story_id: story.id,
                    stored: story.chapter_count,
                    computed: chapter_count,
                });
            }

            let word_count = computed.word_counts.get(&story.id).copied().unwrap_or(0);
            if story.word_count != word_count {
                findings.push(Finding::StoryWordCount {
                    story_id: story.id,
                    stored: story.word_count,
                    computed: word_count,
                });
            }

            let comment_count = computed.story_comment_counts.get(&story.id).copied().unwrap_or(0);
            if story.total_comments != comment_count {
                findings.push(Finding::StoryCommentCount {
                    story_id: story.id,
                    stored: story.total_comments,
                    computed: comment_count,
                });
            }

            if !user_ids.contains(&story.author_id) {
                findings.push(Finding::MissingAuthor {
                    story_id: story.id,
                    author_id: story.author_id,
                });
            }
        }

        let mut numbers = HashSet::new();
        for chapter in &state.chapters {
            let word_count = count_words(&chapter.content);
            if chapter.word_count != word_count {
                findings.push(Finding::ChapterWordCount {
                    chapter_id: chapter.id,
                    stored: chapter.word_count,
                    computed: word_count,
                });
            }

            let comment_count = computed.comment_counts.get(&chapter.id).copied().unwrap_or(0);
            if chapter.comment_count != comment_count {
                findings.push(Finding::ChapterCommentCount {
                    chapter_id: chapter.id,
                    stored: chapter.comment_count,
                    computed: comment_count,
                });
            }

            if !numbers.insert((chapter.story_id, chapter.chapter_number)) {
                findings.push(Finding::DuplicateChapterNumber {
                    story_id: chapter.story_id,
                    chapter_number: chapter.chapter_number,
                });
            }

            if !story_ids.contains(&chapter.story_id) {
                findings.push(Finding::OrphanChapter {
                    chapter_id: chapter.id,
                    story_id: chapter.story_id,
                });
            }
        }

        for comment in &state.comments {
            if !chapter_ids.contains(&comment.chapter_id) {
                findings.push(Finding::OrphanComment {
                    comment_id: comment.id,
                    chapter_id: comment.chapter_id,
                });
            }
        }

        for list in &state.reading_lists {
            if !user_ids.contains(&list.user_id) {
                findings.push(Finding::MissingListOwner {
                    list_id: list.id,
                    user_id: list.user_id,
                });
            }

            let mut seen = HashSet::new();
            for story_id in &list.story_ids {
                if !seen.insert(*story_id) {
                    findings.push(Finding::DuplicateListEntry {
                        list_id: list.id,
                        story_id: *story_id,
                    });
                } else if !story_ids.contains(story_id) {
                    findings.push(Finding::MissingListStory {
                        list_id: list.id,
                        story_id: *story_id,
                    });
                }
            }
        }

        if findings.is_empty() {
            tracing::info!("catalog is consistent");
        } else {
            tracing::warn!(findings = findings.len(), "catalog has drifted");
        }

        AuditReport {
            stories: state.stories.len(),
            chapters: state.chapters.len(),
            reading_lists: state.reading_lists.len(),
            findings,
        }
    }

    /// Recomputes every derived counter and drops duplicate list entries.
    ///
    /// Returns how many records were touched. Dangling references are left
    /// alone, [`Catalog::audit`] still reports them afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> usize {
        let mut state = self.write(Delay::Standard).await;
        let computed = Computed::of(&state);
        let mut changed = 0;

        for chapter in &mut state.chapters {
            let word_count = count_words(&chapter.content);
            let comment_count = computed.comment_counts.get(&chapter.id).copied().unwrap_or(0);

            if chapter.word_count != word_count || chapter.comment_count != comment_count {
                chapter.word_count = word_count;
                chapter.comment_count = comment_count;
                changed += 1;
            }
        }

        for story in &mut state.stories {
            let chapter_count = computed.chapter_counts.get(&story.id).copied().unwrap_or(0);
            let word_count = computed.word_counts.get(&story.id).copied().unwrap_or(0);
            let comment_count = computed.story_comment_counts.get(&story.id).copied().unwrap_or(0);

            if story.chapter_count != chapter_count
                || story.word_count != word_count
                || story.total_comments != comment_count
            {
                story.chapter_count = chapter_count;
                story.word_count = word_count;
                story.total_comments = comment_count;
                changed += 1;
            }
        }

        for list in &mut state.reading_lists {
            let mut seen = HashSet::new();
            let before = list.story_ids.len();

            list.story_ids.retain(|story_id| seen.insert(*story_id));

            if list.story_ids.len() != before {
                changed += 1;
            }
        }

        tracing::info!(changed, "reconciled catalog");

        changed
    }
}
