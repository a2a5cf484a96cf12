use reqwest::Url;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_USER_AGENT: &str = "savepagenow (https://github.com/pastpages/savepagenow)";
pub const ACCESS_KEY_ENV: &str = "SAVEPAGENOW_ACCESS_KEY";
pub const SECRET_KEY_ENV: &str = "SAVEPAGENOW_SECRET_KEY";
// wayback timestamps, e.g. 20240101000000
pub const FORMAT_STRING: &str = "%Y%m%d%H%M%S";

lazy_static! {
    pub static ref DEFAULT_DOMAIN: Url = {
        Url::parse("https://web.archive.org").expect("default domain is a valid url")
    };
}

pub fn get_unix_timestamp() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

fn base(domain: &Url) -> &str {
    domain.as_str().trim_end_matches('/')
}

/// `<domain>/save/<target_url>`, the target is appended untouched.
pub fn save_url(domain: &Url, target_url: &str) -> String {
    format!("{}/save/{}", base(domain), target_url)
}

pub fn enqueue_url(domain: &Url) -> String {
    format!("{}/save", base(domain))
}

/// The status endpoint sits behind a cache, so every poll carries a fresh token.
pub fn status_url(domain: &Url, job_id: &str) -> String {
    format!(
        "{}/save/status/{}?dont-cache={}",
        base(domain),
        job_id,
        get_unix_timestamp().as_millis()
    )
}

pub fn archive_url(domain: &Url, timestamp: &str, original_url: &str) -> String {
    format!("{}/web/{}/{}", base(domain), timestamp, original_url)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let d = DEFAULT_DOMAIN.clone();
        assert_eq!(d.to_string(), "https://web.archive.org/");
        assert_eq!(
            save_url(&d, "https://example.com/a?b=c"),
            "https://web.archive.org/save/https://example.com/a?b=c"
        );
        assert_eq!(enqueue_url(&d), "https://web.archive.org/save");
        assert_eq!(
            archive_url(&d, "20240101000000", "https://x.com"),
            "https://web.archive.org/web/20240101000000/https://x.com"
        );
    }

    #[test]
    fn status_url_busts_cache() {
        let d = Url::parse("http://127.0.0.1:8080").unwrap();
        let u = status_url(&d, "spn2-abc");
        assert!(u.starts_with("http://127.0.0.1:8080/save/status/spn2-abc?dont-cache="));
        let token = u.split("dont-cache=").nth(1).unwrap();
        assert!(token.parse::<u128>().is_ok());
    }

    #[test]
    fn timestamp_is_after_epoch() {
        assert!(get_unix_timestamp().as_secs() > 0);
    }
}
