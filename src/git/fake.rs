//! Scripted git runner for unit tests

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::runner::{GitOutput, GitRunner};

struct Rule {
    path: Option<PathBuf>,
    args: String,
    output: GitOutput,
}

/// Answers git invocations from a list of scripted rules.
///
/// Rules bound to a path win over path-agnostic ones; the first matching rule
/// of each kind is used. Unscripted commands succeed with empty output.
#[derive(Default)]
pub(crate) struct FakeGit {
    rules: Vec<Rule>,
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeGit {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `git <args>` succeeds with `stdout` in any directory
    pub(crate) fn ok(self, args: &str, stdout: &str) -> Self {
        self.respond(None, args, GitOutput::ok(stdout))
    }

    /// `git <args>` fails in any directory
    pub(crate) fn fail(self, args: &str) -> Self {
        self.respond(None, args, GitOutput::failed("scripted failure"))
    }

    /// `git <args>` succeeds with `stdout` in `path` only
    pub(crate) fn ok_at(self, path: &str, args: &str, stdout: &str) -> Self {
        self.respond(Some(PathBuf::from(path)), args, GitOutput::ok(stdout))
    }

    /// `git <args>` fails in `path` only
    pub(crate) fn fail_at(self, path: &str, args: &str) -> Self {
        self.respond(
            Some(PathBuf::from(path)),
            args,
            GitOutput::failed("scripted failure"),
        )
    }

    fn respond(mut self, path: Option<PathBuf>, args: &str, output: GitOutput) -> Self {
        self.rules.push(Rule {
            path,
            args: args.to_string(),
            output,
        });
        self
    }

    /// Every invocation so far as `(path, "arg arg ...")`
    pub(crate) fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// True when some invocation's argument string starts with `prefix`
    pub(crate) fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|(_, args)| args.starts_with(prefix))
    }

    /// True when `path` saw an invocation starting with `prefix`
    pub(crate) fn called_at(&self, path: &str, prefix: &str) -> bool {
        self.calls()
            .iter()
            .any(|(p, args)| p == Path::new(path) && args.starts_with(prefix))
    }
}

#[async_trait]
impl GitRunner for FakeGit {
    async fn run(&self, path: &Path, args: &[&str]) -> Result<GitOutput> {
        let joined = args.join(" ");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((path.to_path_buf(), joined.clone()));
        }

        let specific = self
            .rules
            .iter()
            .find(|r| r.args == joined && r.path.as_deref() == Some(path));
        let generic = || {
            self.rules
                .iter()
                .find(|r| r.args == joined && r.path.is_none())
        };

        Ok(specific
            .or_else(generic)
            .map(|r| r.output.clone())
            .unwrap_or_else(|| GitOutput::ok("")))
    }
}
