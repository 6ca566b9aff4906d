//! In-memory data services for stories, chapters, reading lists and users.
//!
//! Every service is a cheap handle onto one shared [`Catalog`]; build them
//! together through [`Services`].

pub mod audit;
mod catalog;
pub mod chapters;
pub mod fixtures;
pub mod reading_lists;
pub mod stories;
pub mod users;

use std::sync::Arc;

use inkwell_common::{Conf, Report};

pub use catalog::{Catalog, Sequence};
pub use chapters::ChapterService;
pub use fixtures::Fixtures;
pub use reading_lists::ReadingListService;
pub use stories::StoryService;
pub use users::UserService;

#[tracing::instrument(skip(conf), err)]
pub async fn init_catalog(conf: &Conf) -> Result<Arc<Catalog>, Report> {
    let fixtures = match &conf.fixtures {
        Some(dir) => Fixtures::load_dir(dir).await?,
        None => {
            tracing::debug!("using embedded fixtures");

            Fixtures::embedded()?
        }
    };

    Ok(Catalog::new(fixtures, conf.latency()?))
}

#[derive(Clone, Debug)]
pub struct Services {
    pub stories: StoryService,
    pub chapters: ChapterService,
    pub reading_lists: ReadingListService,
    pub users: UserService,
    catalog: Arc<Catalog>,
}

impl Services {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            stories: StoryService::new(catalog.clone()),
            chapters: ChapterService::new(catalog.clone()),
            reading_lists: ReadingListService::new(catalog.clone()),
            users: UserService::new(catalog.clone()),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}
