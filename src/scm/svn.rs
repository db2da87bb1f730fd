//! [`ScmClient`] backed by the `svn` command line client.
//!
//! Commits are read from `svn log --xml --verbose` and dated revisions from `svn info --xml`.
use super::ScmClient;
use crate::collector::config::SvnConfig;
use crate::db::models::{commit::Commit, subversion_repo::SubversionRepo};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};
use xmltree::Element;

/// Runs `svn` for every request. Credentials are never cached; the password is written to the
/// child's standard input.
#[derive(Clone)]
pub struct SvnClient {
    /// Path or name of the `svn` binary.
    binary: String,
    /// User name for authenticated repositories.
    username: Option<String>,
    /// Password for authenticated repositories.
    password: Option<String>,
}

impl fmt::Debug for SvnClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SvnClient using `{}` as {}",
            self.binary,
            self.username.as_deref().unwrap_or("anonymous")
        )
    }
}

impl SvnClient {
    /// Create a client from the `[svn]` section of the config.
    #[must_use]
    pub fn new(config: &SvnConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Run `svn` with `args` and return its standard output.
    async fn run(&self, args: Vec<String>) -> anyhow::Result<Vec<u8>> {
        let binary = self.binary.clone();
        let password = self.password.clone();
        let mut all_args = args;
        all_args.extend(common_args(self.username.as_deref(), password.is_some()));
        tracing::debug!(subcommand = all_args.first().map(String::as_str), "Running svn");
        let output = async_std::task::spawn_blocking(move || {
            let mut command = Command::new(&binary);
            command
                .args(&all_args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
            let mut child = command.spawn()?;
            if let Some(mut stdin) = child.stdin.take() {
                if let Some(password) = password {
                    writeln!(stdin, "{password}")?;
                }
            }
            child.wait_with_output()
        })
        .await
        .with_context(|| format!("failed to run `{}`", self.binary))?;
        if !output.status.success() {
            anyhow::bail!(
                "`{}` exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.stdout)
    }

    /// Root url of the repository holding `url`.
    async fn repository_root(&self, url: &str) -> anyhow::Result<String> {
        let stdout = self.run(info_args(url, None)).await?;
        parse_info_root(&stdout).with_context(|| format!("unreadable svn info of {url}"))
    }
}

/// Arguments shared by every invocation. The password itself is read from standard input.
fn common_args(username: Option<&str>, has_password: bool) -> Vec<String> {
    let mut args = vec!["--non-interactive".to_owned(), "--no-auth-cache".to_owned()];
    if let Some(username) = username {
        args.push("--username".to_owned());
        args.push(username.to_owned());
    }
    if has_password {
        args.push("--password-from-stdin".to_owned());
    }
    args
}

/// `svn log` of `url` from `start_revision` up to the head revision.
fn log_args(url: &str, start_revision: i64) -> Vec<String> {
    vec![
        "log".to_owned(),
        "--xml".to_owned(),
        "--verbose".to_owned(),
        "--revision".to_owned(),
        format!("{start_revision}:HEAD"),
        url.to_owned(),
    ]
}

/// `svn info` of `url`, at the revision current on `date` when given.
fn info_args(url: &str, date: Option<DateTime<Utc>>) -> Vec<String> {
    let mut args = vec!["info".to_owned(), "--xml".to_owned()];
    if let Some(date) = date {
        args.push("--revision".to_owned());
        args.push(format!("{{{}}}", date.format("%Y-%m-%dT%H:%M:%SZ")));
    }
    args.push(url.to_owned());
    args
}

#[async_trait]
impl ScmClient for SvnClient {
    #[tracing::instrument(skip(self, repo), fields(url = %repo.url))]
    async fn get_commits(
        &self,
        repo: &SubversionRepo,
        start_revision: i64,
    ) -> anyhow::Result<Vec<Commit>> {
        let stdout = self.run(log_args(&repo.url, start_revision)).await?;
        parse_log(&stdout, &repo.url).with_context(|| format!("unreadable svn log of {}", repo.url))
    }

    /// The date is resolved against the repository root, so paths created after `date` still
    /// get the revision that was the head at that time.
    #[tracing::instrument(skip(self))]
    async fn get_revision_closest_to(
        &self,
        url: &str,
        date: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let root = self.repository_root(url).await?;
        let stdout = self.run(info_args(&root, Some(date))).await?;
        parse_info_revision(&stdout).with_context(|| format!("unreadable svn info of {root}"))
    }
}

/// Parse the output of `svn log --xml --verbose` into commits of the repository at `url`.
///
/// Log entries keep the order of the document. Revision numbers are kept as reported.
///
/// # Errors
/// Errors if the document is not well formed or an entry has no revision or an unreadable date.
pub fn parse_log(xml: &[u8], url: &str) -> anyhow::Result<Vec<Commit>> {
    let document =
        Element::parse(xml).map_err(|err| anyhow::anyhow!("XML parse error: {err}"))?;
    document
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(|element| element.name == "logentry")
        .map(|entry| parse_log_entry(entry, url))
        .collect()
}

/// Convert one `<logentry>` element.
fn parse_log_entry(entry: &Element, url: &str) -> anyhow::Result<Commit> {
    let revision = entry
        .attributes
        .get("revision")
        .context("logentry without a revision attribute")?;
    let author = child_text(entry, "author");
    let message = child_text(entry, "msg");
    let timestamp = match entry.get_child("date").and_then(|date| date.get_text()) {
        Some(date) => DateTime::parse_from_rfc3339(date.trim())
            .with_context(|| format!("bad date `{date}` in revision {revision}"))?
            .timestamp_millis(),
        None => 0,
    };
    let num_files_changed = entry.get_child("paths").map_or(0, |paths| {
        paths
            .children
            .iter()
            .filter_map(|node| node.as_element())
            .filter(|path| path.name == "path")
            .count()
    });
    Ok(Commit::new(
        url.to_owned(),
        revision.clone(),
        author,
        message,
        timestamp,
        i64::try_from(num_files_changed)?,
    ))
}

/// Text of the child element `name`, empty when the child is missing or empty.
fn child_text(element: &Element, name: &str) -> String {
    element
        .get_child(name)
        .and_then(|child| child.get_text())
        .map_or_else(String::new, |text| text.into_owned())
}

/// Parse the revision of the first `<entry>` of `svn info --xml` output.
///
/// # Errors
/// Errors if the document is not well formed or carries no numeric revision.
pub fn parse_info_revision(xml: &[u8]) -> anyhow::Result<i64> {
    let document =
        Element::parse(xml).map_err(|err| anyhow::anyhow!("XML parse error: {err}"))?;
    let revision = document
        .get_child("entry")
        .and_then(|entry| entry.attributes.get("revision"))
        .context("svn info without an entry revision")?;
    revision
        .parse::<i64>()
        .with_context(|| format!("invalid revision `{revision}` in svn info"))
}

/// Parse the repository root url of the first `<entry>` of `svn info --xml` output.
///
/// # Errors
/// Errors if the document is not well formed or carries no repository root.
pub fn parse_info_root(xml: &[u8]) -> anyhow::Result<String> {
    let document =
        Element::parse(xml).map_err(|err| anyhow::anyhow!("XML parse error: {err}"))?;
    let root = document
        .get_child("entry")
        .and_then(|entry| entry.get_child("repository"))
        .and_then(|repository| repository.get_child("root"))
        .and_then(|root| root.get_text())
        .context("svn info without a repository root")?;
    Ok(root.trim().to_owned())
}
