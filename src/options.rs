use std::time::Duration;

use crate::errors::{Result, SavePageNowError};

/// `if_not_archived_within`: skip the capture if the url (and optionally its
/// outlinks) was archived more recently than this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveWindow {
    Single(Duration),
    // url timeframe, outlinks timeframe
    Pair(Duration, Duration),
}

impl ArchiveWindow {
    pub fn to_form_value(&self) -> String {
        match self {
            ArchiveWindow::Single(d) => d.as_secs().to_string(),
            ArchiveWindow::Pair(url, outlinks) => {
                format!("{},{}", url.as_secs(), outlinks.as_secs())
            }
        }
    }
}

impl From<Duration> for ArchiveWindow {
    fn from(d: Duration) -> Self {
        ArchiveWindow::Single(d)
    }
}

impl From<(Duration, Duration)> for ArchiveWindow {
    fn from((url, outlinks): (Duration, Duration)) -> Self {
        ArchiveWindow::Pair(url, outlinks)
    }
}

#[derive(Builder, Debug, Clone, Default, PartialEq)]
#[builder(setter(into))]
pub struct JobOptions {
    // capture pages that return errors (4xx/5xx)
    #[builder(default = "false")]
    pub capture_all: bool,
    #[builder(default = "false")]
    pub capture_outlinks: bool,
    #[builder(default = "false")]
    pub capture_screenshot: bool,
    // make the capture available in the wayback later, in exchange for less load
    #[builder(default = "false")]
    pub delay_wb_availability: bool,
    // skip the headless browser and fetch with a plain GET
    #[builder(default = "false")]
    pub force_get: bool,
    #[builder(default = "false")]
    pub skip_first_archive: bool,
    #[builder(default = "false")]
    pub outlinks_availability: bool,
    #[builder(default = "false")]
    pub email_result: bool,
    #[builder(setter(into, strip_option), default)]
    pub if_not_archived_within: Option<ArchiveWindow>,
    // seconds, must not be negative
    #[builder(setter(into, strip_option), default)]
    pub js_behavior_timeout: Option<i64>,
    #[builder(setter(into, strip_option), default)]
    pub capture_cookie: Option<String>,
    #[builder(setter(into, strip_option), default)]
    pub target_username: Option<String>,
    #[builder(setter(into, strip_option), default)]
    pub target_password: Option<String>,
}

impl JobOptions {
    pub fn default_builder() -> JobOptionsBuilder {
        JobOptionsBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.js_behavior_timeout {
            if t < 0 {
                return Err(SavePageNowError::invalid_argument(&format!(
                    "js_behavior_timeout must be >= 0, got {}",
                    t
                )));
            }
        }
        Ok(())
    }

    /// Form fields for `POST /save`. Flags are always sent as 0/1, the
    /// remaining fields only when set.
    pub fn to_form(&self, url: &str) -> Result<Vec<(&'static str, String)>> {
        self.validate()?;

        let flag = |b: bool| if b { "1".to_string() } else { "0".to_string() };
        let mut form = vec![
            ("url", url.to_string()),
            ("capture_all", flag(self.capture_all)),
            ("capture_outlinks", flag(self.capture_outlinks)),
            ("capture_screenshot", flag(self.capture_screenshot)),
            ("delay_wb_availability", flag(self.delay_wb_availability)),
            ("force_get", flag(self.force_get)),
            ("skip_first_archive", flag(self.skip_first_archive)),
            ("outlinks_availability", flag(self.outlinks_availability)),
            ("email_result", flag(self.email_result)),
        ];

        if let Some(window) = &self.if_not_archived_within {
            form.push(("if_not_archived_within", window.to_form_value()));
        }
        if let Some(t) = self.js_behavior_timeout {
            form.push(("js_behavior_timeout", t.to_string()));
        }

        let optional = [
            ("capture_cookie", &self.capture_cookie),
            ("target_username", &self.target_username),
            ("target_password", &self.target_password),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                if !v.is_empty() {
                    form.push((name, v.clone()));
                }
            }
        }

        Ok(form)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::ErrorKind;

    fn field<'a>(form: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_form_sends_every_flag() {
        let form = JobOptions::default_builder()
            .build()
            .unwrap()
            .to_form("https://x.com")
            .unwrap();
        assert_eq!(field(&form, "url"), Some("https://x.com"));
        for name in [
            "capture_all",
            "capture_outlinks",
            "capture_screenshot",
            "force_get",
            "skip_first_archive",
            "outlinks_availability",
            "email_result",
        ] {
            assert_eq!(field(&form, name), Some("0"), "{}", name);
        }
        assert_eq!(field(&form, "if_not_archived_within"), None);
        assert_eq!(field(&form, "js_behavior_timeout"), None);
        assert_eq!(field(&form, "capture_cookie"), None);
    }

    #[test]
    fn set_options_are_encoded() {
        let form = JobOptions::default_builder()
            .capture_all(true)
            .capture_screenshot(true)
            .if_not_archived_within((Duration::from_secs(3600), Duration::from_secs(86400)))
            .js_behavior_timeout(7)
            .capture_cookie("session=1")
            .target_username("")
            .build()
            .unwrap()
            .to_form("https://x.com")
            .unwrap();
        assert_eq!(field(&form, "capture_all"), Some("1"));
        assert_eq!(field(&form, "capture_screenshot"), Some("1"));
        assert_eq!(field(&form, "capture_outlinks"), Some("0"));
        assert_eq!(field(&form, "if_not_archived_within"), Some("3600,86400"));
        assert_eq!(field(&form, "js_behavior_timeout"), Some("7"));
        assert_eq!(field(&form, "capture_cookie"), Some("session=1"));
        // empty strings are left out
        assert_eq!(field(&form, "target_username"), None);
    }

    #[test]
    fn single_window() {
        assert_eq!(
            ArchiveWindow::from(Duration::from_secs(90)).to_form_value(),
            "90"
        );
    }

    #[test]
    fn negative_js_timeout_is_rejected() {
        let opts = JobOptions::default_builder()
            .js_behavior_timeout(-1)
            .build()
            .unwrap();
        let err = opts.to_form("https://x.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let opts = JobOptions::default_builder()
            .js_behavior_timeout(0)
            .build()
            .unwrap();
        assert!(opts.validate().is_ok());
    }
}
