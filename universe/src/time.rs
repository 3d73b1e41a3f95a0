/// Clock seam so tests can pin event timestamps.
pub trait Clock: Send + Sync {
    /// ISO-8601 timestamp in UTC.
    fn now_iso(&self) -> String;
}

#[derive(Clone)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_iso(&self) -> String {
        time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .expect("failed to iso8601 format timestamp")
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, SystemClock};

    #[test]
    fn system_clock_is_lexically_monotonic() {
        let clock = SystemClock {};
        let first = clock.now_iso();
        let second = clock.now_iso();

        assert!(first <= second);
    }
}
