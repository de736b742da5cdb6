use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};
use once_cell::sync::Lazy;

// "Sun, 06 Nov 1994 08:49:37 GMT".len()
const DATE_VALUE_LENGTH: usize = 29;

static CURRENT_DATE: Lazy<Mutex<Date>> = Lazy::new(|| Mutex::new(Date::new(SystemTime::now())));

/// append the current http date to the buffer
pub(crate) fn put_date(dst: &mut BytesMut) {
    let now = SystemTime::now();
    let mut date = match CURRENT_DATE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    date.refresh(now);
    dst.put_slice(date.as_bytes());
}

struct Date {
    bytes: [u8; DATE_VALUE_LENGTH],
    second: u64,
}

impl Date {
    fn new(now: SystemTime) -> Date {
        let mut date = Date {
            bytes: [b' '; DATE_VALUE_LENGTH],
            second: u64::MAX,
        };
        date.refresh(now);
        date
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    // only re-render when the wall clock moved to another second
    fn refresh(&mut self, now: SystemTime) {
        let second = now
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        if second == self.second {
            return;
        }
        let rendered = httpdate::fmt_http_date(now);
        let len = rendered.len().min(DATE_VALUE_LENGTH);
        self.bytes[..len].copy_from_slice(&rendered.as_bytes()[..len]);
        self.second = second;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn renders_rfc7231_date() {
        let date = Date::new(UNIX_EPOCH + Duration::from_secs(784_111_777));
        assert_eq!(date.as_bytes(), b"Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn refresh_within_the_same_second_keeps_value() {
        let base = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let mut date = Date::new(base);
        date.refresh(base + Duration::from_millis(900));
        assert_eq!(date.as_bytes(), b"Sun, 06 Nov 1994 08:49:37 GMT");
        date.refresh(base + Duration::from_secs(1));
        assert_eq!(date.as_bytes(), b"Sun, 06 Nov 1994 08:49:38 GMT");
    }

    #[test]
    fn put_date_appends_full_value() {
        let mut buf = BytesMut::new();
        put_date(&mut buf);
        assert_eq!(buf.len(), DATE_VALUE_LENGTH);
        assert!(buf.ends_with(b" GMT"));
    }
}
