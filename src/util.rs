use std::time;

use failure;
use slog;
use tokio;

use tokio::prelude::*;

/// Yields once every `duration`, the first time one `duration` from now.
pub fn every(
    log: slog::Logger,
    name: String,
    duration: time::Duration,
) -> impl Stream<Item = (), Error = failure::Error> {
    debug!(log, "starting timer"; "name" => %name, "period_ms" => duration_ms(duration));

    tokio::timer::Interval::new(time::Instant::now() + duration, duration)
        .map(move |_| {
            trace!(log, "timer tick"; "name" => %name);
        })
        .map_err(failure::Error::from)
}

pub fn duration_ms(duration: time::Duration) -> u64 {
    duration.as_secs() * 1000 + u64::from(duration.subsec_millis())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ticks_until_taken() {
        let log = slog::Logger::root(slog::Discard, o!());
        let timer = every(log, "test".to_owned(), time::Duration::from_millis(5));

        let started = time::Instant::now();
        let ticks = tokio::runtime::current_thread::block_on_all(timer.take(3).collect()).unwrap();

        assert_eq!(3, ticks.len());
        assert!(started.elapsed() >= time::Duration::from_millis(15));
    }

    #[test]
    fn millis() {
        assert_eq!(2500, duration_ms(time::Duration::from_millis(2500)));
    }
}
