//! The external scraper collaborator.

use std::fmt;
use std::io;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub category: String,
    pub subcategory: String,
    pub link: Option<String>,
    pub path: PathBuf,
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subcategory)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Success,
    Timeout,
    /// The scraper could not be started, crashed, or reported failure.
    Error(String),
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScrapeOutcome::Success => "success",
            ScrapeOutcome::Timeout => "timeout",
            ScrapeOutcome::Error(_) => "error",
        }
    }

    pub fn into_result(self, target: &ScrapeTarget, timeout: Duration) -> Result<(), Error> {
        match self {
            ScrapeOutcome::Success => Ok(()),
            ScrapeOutcome::Timeout => Err(Error::ScrapeTimeout {
                target: target.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
            ScrapeOutcome::Error(detail) => Err(Error::ScrapeFailure {
                target: target.to_string(),
                detail,
            }),
        }
    }
}

impl fmt::Display for ScrapeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeOutcome::Error(detail) => write!(f, "error: {}", detail),
            other => f.write_str(other.label()),
        }
    }
}

/// Something that can fill one subcategory with videos within `timeout`.
pub trait Scraper {
    fn scrape(&self, target: &ScrapeTarget, timeout: Duration) -> ScrapeOutcome;
}

impl<F> Scraper for F
where
    F: Fn(&ScrapeTarget, Duration) -> ScrapeOutcome,
{
    fn scrape(&self, target: &ScrapeTarget, timeout: Duration) -> ScrapeOutcome {
        self(target, timeout)
    }
}

/// Runs the scraper as a child process, killing it once the timeout passes.
/// A zero exit status is success. On unix the child leads its own process
/// group and the whole group is killed, so browsers or drivers it started do
/// not outlive the timeout.
#[derive(Debug, Clone)]
pub struct CommandScraper {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandScraper {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn render_args(&self, target: &ScrapeTarget, timeout: Duration) -> Vec<String> {
        let path = target.path.to_string_lossy();
        let timeout = timeout.as_secs().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{category}", &target.category)
                    .replace("{subcategory}", &target.subcategory)
                    .replace("{link}", target.link.as_deref().unwrap_or(""))
                    .replace("{path}", &path)
                    .replace("{timeout}", &timeout)
            })
            .collect()
    }
}

impl Scraper for CommandScraper {
    fn scrape(&self, target: &ScrapeTarget, timeout: Duration) -> ScrapeOutcome {
        let args = self.render_args(target, timeout);
        debug!("Running {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command.args(&args).stdin(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => return ScrapeOutcome::Error(format!("failed to start {}: {}", self.program, err)),
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return ScrapeOutcome::Success,
                Ok(Some(status)) => return ScrapeOutcome::Error(format!("scraper exited with {}", status)),
                Ok(None) => {}
                Err(err) => return ScrapeOutcome::Error(format!("failed to wait on scraper: {}", err)),
            }

            if start.elapsed() >= timeout {
                warn!("{} still running after {}s, killing it", target, timeout.as_secs());
                if let Err(err) = kill_process_tree(&mut child) {
                    warn!("Failed to kill scraper for {}: {}", target, err);
                }
                if let Err(err) = child.wait() {
                    warn!("Failed to reap scraper for {}: {}", target, err);
                }
                return ScrapeOutcome::Timeout;
            }

            thread::sleep(self.poll_interval.min(timeout.saturating_sub(start.elapsed())));
        }
    }
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(child.id())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: killpg only sends a signal; the group was created at spawn.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    debug!("killpg({}) failed: {}, killing the child only", pgid, err);
    child.kill()
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) -> io::Result<()> {
    child.kill()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ScrapeTarget {
        ScrapeTarget {
            category: "Nature".to_string(),
            subcategory: "Deep Oceans".to_string(),
            link: Some("https://example.com/oceans".to_string()),
            path: PathBuf::from("Nature/Deep Oceans"),
        }
    }

    fn sh(script: &str) -> CommandScraper {
        CommandScraper::new("sh", vec!["-c".to_string(), script.to_string()])
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_render_args() {
        let scraper = CommandScraper::new(
            "python3",
            vec![
                "scrape.py".to_string(),
                "--url={link}".to_string(),
                "{category}/{subcategory}".to_string(),
                "{timeout}".to_string(),
            ],
        );
        assert_eq!(
            scraper.render_args(&target(), Duration::from_secs(1800)),
            vec![
                "scrape.py",
                "--url=https://example.com/oceans",
                "Nature/Deep Oceans",
                "1800"
            ]
        );
    }

    #[test]
    fn test_closure_scraper() {
        let fake = |t: &ScrapeTarget, _: Duration| {
            if t.subcategory.starts_with("Deep") {
                ScrapeOutcome::Success
            } else {
                ScrapeOutcome::Timeout
            }
        };
        assert_eq!(fake.scrape(&target(), Duration::from_secs(1)), ScrapeOutcome::Success);
    }

    #[test]
    fn test_outcome_into_result() {
        let timeout = Duration::from_secs(1800);
        assert!(ScrapeOutcome::Success.into_result(&target(), timeout).is_ok());
        assert!(matches!(
            ScrapeOutcome::Timeout.into_result(&target(), timeout),
            Err(Error::ScrapeTimeout { timeout_secs: 1800, .. })
        ));
        assert!(matches!(
            ScrapeOutcome::Error("boom".to_string()).into_result(&target(), timeout),
            Err(Error::ScrapeFailure { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exit_status() {
        assert_eq!(sh("exit 0").scrape(&target(), Duration::from_secs(10)), ScrapeOutcome::Success);
        match sh("exit 3").scrape(&target(), Duration::from_secs(10)) {
            ScrapeOutcome::Error(detail) => assert!(detail.contains('3')),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_timeout_kills_child() {
        let start = Instant::now();
        let outcome = sh("sleep 30").scrape(&target(), Duration::from_millis(200));
        assert_eq!(outcome, ScrapeOutcome::Timeout);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_timeout_kills_background_jobs() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("late.json");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());

        let outcome = sh(&script).scrape(&target(), Duration::from_millis(300));
        assert_eq!(outcome, ScrapeOutcome::Timeout);

        thread::sleep(Duration::from_secs(2));
        assert!(!marker.exists(), "background job outlived the timeout");
    }

    #[test]
    fn test_missing_program_is_error() {
        let scraper = CommandScraper::new("definitely-not-a-real-scraper-binary", vec![]);
        assert!(matches!(
            scraper.scrape(&target(), Duration::from_secs(1)),
            ScrapeOutcome::Error(_)
        ));
    }
}
