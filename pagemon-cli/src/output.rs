#[cfg(feature = "colored-output")]
use colored::*;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use page_monitor::CheckOutcome;
use url::Url;

/// How many times the change alert line is repeated.
const CHANGE_ALERT_REPEAT: usize = 5;

/// Renders check outcomes for the operator.
pub struct OutputManager {
    colored: bool,
    target_url: Url,
    cookies_file: PathBuf,
}

enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
}

impl OutputManager {
    pub fn new(colored: bool, target_url: Url, cookies_file: impl Into<PathBuf>) -> Self {
        Self {
            colored,
            target_url,
            cookies_file: cookies_file.into(),
        }
    }

    /// Print the startup banner.
    pub fn print_startup(&self, interval_secs: u64) {
        let line = format!(
            "{} {} every {}s",
            self.colorize("Monitoring", &Color::Green, true),
            self.colorize(self.target_url.as_str(), &Color::Blue, false),
            interval_secs
        );
        self.emit(&line);
    }

    /// Print the report for one finished cycle.
    pub fn report(&self, outcome: &CheckOutcome) {
        self.emit(&self.format_outcome(outcome, Local::now()));
    }

    fn emit(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout must not take the monitor down.
        let _ = writeln!(stdout, "{}", text);
        let _ = stdout.flush();
    }

    pub fn format_outcome(&self, outcome: &CheckOutcome, at: DateTime<Local>) -> String {
        let stamp = self.colorize(
            &format!("[{}]", at.format("%Y-%m-%d %H:%M:%S")),
            &Color::Cyan,
            false,
        );
        let url = self.target_url.as_str();

        match outcome {
            CheckOutcome::CredentialsMissing { reason } => {
                let mut output = format!(
                    "{} {} {}\n",
                    stamp,
                    self.colorize("Cannot load cookies:", &Color::Yellow, true),
                    reason
                );
                output.push_str(&cookie_instructions(&self.cookies_file));
                output
            }
            CheckOutcome::CredentialsExpired { resolved_url } => format!(
                "{} {} {}\nCookies have probably expired. Log in manually again and re-export them.",
                stamp,
                self.colorize("Redirected to the login page:", &Color::Yellow, true),
                resolved_url
            ),
            CheckOutcome::FetchFailed { reason } => format!(
                "{} {} {}",
                stamp,
                self.colorize("Error while checking the page:", &Color::Red, false),
                reason
            ),
            CheckOutcome::Baseline { fingerprint, .. } => format!(
                "{} First check of {}. Content stored ({}).",
                stamp,
                url,
                fingerprint.short()
            ),
            CheckOutcome::Changed { .. } => {
                let alert = self.colorize(
                    &format!("!!! CHANGE DETECTED ON {} !!!", url),
                    &Color::Red,
                    true,
                );
                let mut output = String::new();
                for _ in 0..CHANGE_ALERT_REPEAT {
                    output.push_str(&format!("{} {}\n", stamp, alert));
                }
                output.push_str("Check the page to see what changed.");
                output
            }
            CheckOutcome::Unchanged { .. } => {
                format!("{} No change detected on {}.", stamp, url)
            }
        }
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Red => text.red(),
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold);
            text.to_string()
        }
    }
}

/// Steps to produce a cookie export from a logged-in browser session.
fn cookie_instructions(cookies_file: &Path) -> String {
    format!(
        "To create the cookie file:\n\
         1. Log in to the site manually in your browser\n\
         2. Install the 'EditThisCookie' extension or a similar cookie exporter\n\
         3. Open the monitored page and export its cookies as JSON\n\
         4. Save the export as '{}'",
        cookies_file.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use page_monitor::{Fingerprint, RegionSource};

    fn manager() -> OutputManager {
        OutputManager::new(
            false,
            Url::parse("https://moodle.example.org/mod/view.php?id=7").unwrap(),
            "moodle_cookies.json",
        )
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_changed_alert_repeats() {
        let outcome = CheckOutcome::Changed {
            previous: Fingerprint::of("a"),
            current: Fingerprint::of("b"),
            region: RegionSource::WholeBody,
        };
        let output = manager().format_outcome(&outcome, at());

        let alerts = output
            .lines()
            .filter(|line| {
                line.contains("!!! CHANGE DETECTED ON https://moodle.example.org/mod/view.php?id=7 !!!")
            })
            .count();
        assert_eq!(alerts, CHANGE_ALERT_REPEAT);
        assert!(output.starts_with("[2026-03-01 12:30:05] "));
        assert!(output.ends_with("Check the page to see what changed."));
    }

    #[test]
    fn test_missing_credentials_include_instructions() {
        let outcome = CheckOutcome::CredentialsMissing {
            reason: "cookie file not found".to_string(),
        };
        let output = manager().format_outcome(&outcome, at());
        assert!(output.contains("Cannot load cookies: cookie file not found"));
        assert!(output.contains("EditThisCookie"));
        assert!(output.contains("'moodle_cookies.json'"));
    }

    #[test]
    fn test_expired_credentials() {
        let outcome = CheckOutcome::CredentialsExpired {
            resolved_url: Url::parse("https://moodle.example.org/login/index.php").unwrap(),
        };
        let output = manager().format_outcome(&outcome, at());
        assert!(output.contains("login page: https://moodle.example.org/login/index.php"));
        assert!(output.contains("expired"));
    }

    #[test]
    fn test_single_line_outcomes() {
        let fp = Fingerprint::of("a");
        let baseline = CheckOutcome::Baseline {
            fingerprint: fp,
            region: RegionSource::WholeBody,
        };
        let unchanged = CheckOutcome::Unchanged { fingerprint: fp };
        let failed = CheckOutcome::FetchFailed {
            reason: "timed out".to_string(),
        };

        let manager = manager();
        let baseline = manager.format_outcome(&baseline, at());
        assert!(baseline.contains("First check of"));
        assert!(baseline.contains(&fp.short()));
        assert!(manager.format_outcome(&unchanged, at()).contains("No change detected"));
        assert!(
            manager
                .format_outcome(&failed, at())
                .ends_with("Error while checking the page: timed out")
        );
        assert_eq!(baseline.lines().count(), 1);
    }
}
