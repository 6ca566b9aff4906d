use std::time::Duration;

/// Fixed response times the data layer pretends to have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delay {
    /// View counting.
    Brief,
    /// Votes, chapter navigation, follows and the current user.
    Short,
    /// Plain reads, updates and deletes.
    Standard,
    /// Creating stories and chapters.
    Slow,
}

impl Delay {
    pub fn duration(self) -> Duration {
        Duration::from_millis(match self {
            Delay::Brief => 100,
            Delay::Short => 200,
            Delay::Standard => 300,
            Delay::Slow => 500,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum Latency {
    #[default]
    #[serde(rename = "simulated")]
    Simulated,
    #[serde(rename = "disabled")]
    Disabled,
}

impl Latency {
    #[tracing::instrument(level = "trace")]
    pub async fn pause(self, delay: Delay) {
        if self == Latency::Simulated {
            tokio::time::sleep(delay.duration()).await;
        }
    }
}

/// Counts whitespace separated words.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_collapses_whitespace_runs() {
        assert_eq!(count_words("one two three"), 3);
        assert_eq!(count_words("  one \n\t two   "), 2);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn latency_modes_parse_from_config_strings() {
        assert_eq!(serde_plain::from_str::<Latency>("disabled").unwrap(), Latency::Disabled);
        assert!(serde_plain::from_str::<Latency>("instant").is_err());
    }

    #[tokio::test]
    async fn disabled_latency_returns_immediately() {
        let start = std::time::Instant::now();

        Latency::Disabled.pause(Delay::Slow).await;

        assert!(start.elapsed() < Delay::Slow.duration());
    }
}
