//! `-v`/`-q` counting flags mapped onto a tracing level filter.

use tracing::{level_filters::LevelFilter, Level};

#[derive(clap::Args, Debug, Clone)]
pub struct Verbosity {
    /// More output per occurrence
    #[clap(long, short = 'v', parse(from_occurrences), global = true)]
    verbose: i8,

    /// Less output per occurrence
    #[clap(
        long,
        short = 'q',
        parse(from_occurrences),
        global = true,
        conflicts_with = "verbose"
    )]
    quiet: i8,
}

impl Verbosity {
    // warnings by default so drift and rejected deletes show up
    const BASE: i8 = 1;

    pub fn log_level_filter(&self) -> LevelFilter {
        level(Self::BASE - self.quiet + self.verbose)
            .map(LevelFilter::from_level)
            .unwrap_or(LevelFilter::OFF)
    }
}

fn level(verbosity: i8) -> Option<Level> {
    match verbosity {
        i8::MIN..=-1 => None,
        0 => Some(Level::ERROR),
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        4..=i8::MAX => Some(Level::TRACE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_shift_the_level() {
        let at = |verbose, quiet| Verbosity { verbose, quiet }.log_level_filter();

        assert_eq!(at(0, 0), LevelFilter::WARN);
        assert_eq!(at(2, 0), LevelFilter::DEBUG);
        assert_eq!(at(9, 0), LevelFilter::TRACE);
        assert_eq!(at(0, 2), LevelFilter::OFF);
    }
}
