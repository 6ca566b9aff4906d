pub mod errors;
pub mod models;
pub mod utils;

pub use color_eyre::{
    eyre::{bail, eyre as err, Context, Report},
    install,
};

pub use errors::{EntityKind, ServiceError};
pub use utils::{Delay, Latency};

#[twelf::config]
pub struct Conf {
    /// Directory holding stories.json, chapters.json, users.json, readingLists.json and comments.json
    pub fixtures: Option<String>,

    /// Address the built-in web server binds to
    pub address: Option<String>,

    /// Either `simulated` or `disabled`
    pub latency: Option<String>,
}

impl Conf {
    pub const DEFAULT_ADDRESS: &'static str = "0.0.0.0:8080";

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or(Self::DEFAULT_ADDRESS)
    }

    pub fn latency(&self) -> Result<Latency, Report> {
        match self.latency.as_deref() {
            Some(raw) => serde_plain::from_str(raw)
                .with_context(|| format!("unknown latency mode `{}`", raw)),
            None => Ok(Latency::default()),
        }
    }
}
