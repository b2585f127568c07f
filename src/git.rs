//! Defaults for the project coordinates taken from the local git checkout.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use url::Url;

/// Project coordinates and branch derived from the `origin` remote and HEAD.
///
/// Fields are empty when they cannot be determined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoDefaults {
    pub vcs_type: String,
    pub organization: String,
    pub repository: String,
    pub branch: String,
}

impl RepoDefaults {
    /// Reads the repository containing `dir`. Never fails; missing pieces
    /// stay empty.
    pub fn discover(dir: &Path) -> Self {
        let mut defaults = match run_git(dir, &["remote", "get-url", "origin"]) {
            Some(remote) => parse_remote_url(&remote).unwrap_or_else(|| {
                warn!("Unrecognized origin remote URL: {remote}");
                Self::default()
            }),
            None => Self::default(),
        };

        if let Some(branch) = run_git(dir, &["symbolic-ref", "--short", "-q", "HEAD"]) {
            defaults.branch = branch;
        }

        debug!("Git defaults: {defaults:?}");
        defaults
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = match Command::new("git").args(args).current_dir(dir).output() {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to run git: {e}");
            return None;
        }
    };

    if !output.status.success() {
        debug!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Splits a remote URL into vcs type, organization and repository.
///
/// Accepts `git@host:org/repo.git`, `https://host/org/repo.git` and
/// `ssh://git@host/org/repo`. Hosts other than bitbucket.org map to
/// `github`.
pub fn parse_remote_url(remote: &str) -> Option<RepoDefaults> {
    let (host, path) = if remote.contains("://") {
        let url = Url::parse(remote).ok()?;
        (url.host_str()?.to_string(), url.path().to_string())
    } else {
        let (authority, path) = remote.split_once(':')?;
        let host = authority.rsplit('@').next()?;
        (host.to_string(), path.to_string())
    };

    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let organization = segments.next()?;
    let repository = segments.next()?;
    let repository = repository.strip_suffix(".git").unwrap_or(repository);

    if host.is_empty() || repository.is_empty() {
        return None;
    }

    let vcs_type = if host.eq_ignore_ascii_case("bitbucket.org") {
        "bitbucket"
    } else {
        "github"
    };

    Some(RepoDefaults {
        vcs_type: vcs_type.to_string(),
        organization: organization.to_string(),
        repository: repository.to_string(),
        branch: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(vcs_type: &str, organization: &str, repository: &str) -> Option<RepoDefaults> {
        Some(RepoDefaults {
            vcs_type: vcs_type.to_string(),
            organization: organization.to_string(),
            repository: repository.to_string(),
            branch: String::new(),
        })
    }

    fn run(dir: &Path, args: &[&str]) {
        let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    #[test]
    fn test_parse_scp_like_remote() {
        assert_eq!(
            parse_remote_url("git@github.com:tmessi/cci.git"),
            parsed("github", "tmessi", "cci")
        );
    }

    #[test]
    fn test_parse_https_remote() {
        assert_eq!(
            parse_remote_url("https://github.com/tmessi/cci.git"),
            parsed("github", "tmessi", "cci")
        );
        assert_eq!(
            parse_remote_url("https://github.com/tmessi/cci"),
            parsed("github", "tmessi", "cci")
        );
    }

    #[test]
    fn test_parse_ssh_remote_bitbucket() {
        assert_eq!(
            parse_remote_url("ssh://git@bitbucket.org/acme/widgets"),
            parsed("bitbucket", "acme", "widgets")
        );
        assert_eq!(
            parse_remote_url("git@bitbucket.org:acme/widgets.git"),
            parsed("bitbucket", "acme", "widgets")
        );
    }

    #[test]
    fn test_parse_other_hosts_default_to_github() {
        assert_eq!(
            parse_remote_url("git@git.example.com:team/service.git"),
            parsed("github", "team", "service")
        );
    }

    #[test]
    fn test_parse_rejects_incomplete_remotes() {
        assert_eq!(parse_remote_url("not a remote"), None);
        assert_eq!(parse_remote_url("https://github.com/only-org"), None);
        assert_eq!(parse_remote_url("git@github.com:"), None);
    }

    #[test]
    fn test_discover_reads_origin_and_branch() {
        let repo = tempfile::tempdir().unwrap();
        run(repo.path(), &["init", "-q"]);
        run(repo.path(), &["symbolic-ref", "HEAD", "refs/heads/trunk"]);
        run(
            repo.path(),
            &["remote", "add", "origin", "git@bitbucket.org:acme/widgets.git"],
        );

        let defaults = RepoDefaults::discover(repo.path());

        assert_eq!(
            defaults,
            RepoDefaults {
                vcs_type: "bitbucket".to_string(),
                organization: "acme".to_string(),
                repository: "widgets".to_string(),
                branch: "trunk".to_string(),
            }
        );
    }

    #[test]
    fn test_discover_outside_repository_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        let defaults = RepoDefaults::discover(dir.path());

        assert_eq!(defaults.organization, "");
        assert_eq!(defaults.repository, "");
    }
}
