//! Repository URL normalization.
//!
//! `package.json` repositories come in many spellings: full URLs with
//! `git+https`/`git+ssh` schemes, scp-like `git@host:org/repo`, hosted
//! shorthands (`github:org/repo`) and bare `org/repo`. All of them reduce to
//! `host/org/repo`.

pub const CANONICAL_SCHEME: &str = "git";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoUrl {
    pub host: String,
    /// `org/repo` (may contain further segments for nested groups).
    pub path: String,
}

impl RepoUrl {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed.split('#').next().unwrap_or_default();
        let trimmed = trimmed.strip_prefix("git+").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return None;
        }

        for (shorthand, host) in [("github:", "github.com"), ("gitlab:", "gitlab.com"), ("bitbucket:", "bitbucket.org")]
        {
            if let Some(rest) = trimmed.strip_prefix(shorthand) {
                return Self::from_parts(host, rest);
            }
        }

        if let Some((_, rest)) = trimmed.split_once("://") {
            let (authority, path) = rest.split_once('/')?;
            let host = authority.rsplit('@').next().unwrap_or(authority);
            let host = host.split(':').next().unwrap_or(host);
            return Self::from_parts(host, path);
        }

        // scp-like: git@github.com:org/repo.git
        if let Some((authority, path)) = trimmed.split_once(':')
            && !authority.contains('/')
        {
            let host = authority.rsplit('@').next().unwrap_or(authority);
            return Self::from_parts(host, path);
        }

        let (first, rest) = trimmed.split_once('/')?;
        if first.contains('.') {
            return Self::from_parts(first, rest);
        }
        Self::from_parts("github.com", trimmed)
    }

    fn from_parts(
        host: &str,
        path: &str,
    ) -> Option<Self> {
        let host = host.trim().trim_end_matches('/').to_ascii_lowercase();
        let path = path.trim().trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path).trim_end_matches('/');
        if host.is_empty() || path.is_empty() || !path.contains('/') {
            return None;
        }
        Some(Self {
            host,
            path: path.to_string(),
        })
    }

    /// `host/org/repo`, the scheme-less repository identity.
    pub fn repo_uri(&self) -> String {
        format!("{}/{}", self.host, self.path)
    }

    /// `git://host/org/repo`.
    pub fn canonical_base(&self) -> String {
        format!("{CANONICAL_SCHEME}://{}/{}", self.host, self.path)
    }
}
