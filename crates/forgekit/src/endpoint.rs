//! Endpoint templates and path resolution.
//!
//! Every API path is declared once as a template with `{name}` placeholders
//! and filled per call by [`resolve_endpoint`]. Placeholder values are either
//! validated against a strict safe-path pattern or, for hierarchical values
//! such as file paths, percent-encoded segment by segment.

use std::collections::{HashMap, HashSet};

use crate::error::{ForgeError, Result};

/// Logical API endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    User,
    UserRepos,
    UserOrgs,
    UserByName,
    UserReposByName,
    UserHeatmap,
    UserFollowers,
    UserFollowing,
    UsersSearch,

    ReposSearch,
    Repo,
    RepoCreateUser,
    RepoCreateOrg,
    RepoForks,
    RepoTopics,
    RepoCollaborators,
    RepoTeams,
    RepoTransfer,
    RepoStargazers,
    RepoAssignees,
    RepoContents,

    Issues,
    Issue,
    IssueLabels,
    IssueAssignees,
    IssueDeadline,
    IssueStopwatchStart,
    IssueStopwatchStop,
    IssuesSearch,

    IssueComments,
    IssueComment,
    RepoComments,

    Pulls,
    Pull,
    PullMerge,
    PullFiles,
    PullReviews,
    PullCommits,

    Labels,
    Label,
    OrgLabels,
    OrgLabel,

    Milestones,
    Milestone,

    Releases,
    Release,
    ReleaseLatest,
    ReleaseByTag,
    ReleaseAssets,

    Branches,
    Branch,

    FileContents,
    FileRaw,

    Orgs,
    Org,
    OrgRepos,
    OrgMembers,
    OrgTeams,
}

impl Endpoint {
    /// The path template, relative to the API prefix.
    #[must_use]
    pub fn template(self) -> &'static str {
        match self {
            Endpoint::User => "/user",
            Endpoint::UserRepos => "/user/repos",
            Endpoint::UserOrgs => "/user/orgs",
            Endpoint::UserByName => "/users/{owner}",
            Endpoint::UserReposByName => "/users/{owner}/repos",
            Endpoint::UserHeatmap => "/users/{owner}/heatmap",
            Endpoint::UserFollowers => "/users/{owner}/followers",
            Endpoint::UserFollowing => "/users/{owner}/following",
            Endpoint::UsersSearch => "/users/search",

            Endpoint::ReposSearch => "/repos/search",
            Endpoint::Repo => "/repos/{owner}/{repo}",
            Endpoint::RepoCreateUser => "/user/repos",
            Endpoint::RepoCreateOrg => "/orgs/{owner}/repos",
            Endpoint::RepoForks => "/repos/{owner}/{repo}/forks",
            Endpoint::RepoTopics => "/repos/{owner}/{repo}/topics",
            Endpoint::RepoCollaborators => "/repos/{owner}/{repo}/collaborators",
            Endpoint::RepoTeams => "/repos/{owner}/{repo}/teams",
            Endpoint::RepoTransfer => "/repos/{owner}/{repo}/transfer",
            Endpoint::RepoStargazers => "/repos/{owner}/{repo}/stargazers",
            Endpoint::RepoAssignees => "/repos/{owner}/{repo}/assignees",
            Endpoint::RepoContents => "/repos/{owner}/{repo}/contents",

            Endpoint::Issues => "/repos/{owner}/{repo}/issues",
            Endpoint::Issue => "/repos/{owner}/{repo}/issues/{index}",
            Endpoint::IssueLabels => "/repos/{owner}/{repo}/issues/{index}/labels",
            Endpoint::IssueAssignees => "/repos/{owner}/{repo}/issues/{index}/assignees",
            Endpoint::IssueDeadline => "/repos/{owner}/{repo}/issues/{index}/deadline",
            Endpoint::IssueStopwatchStart => {
                "/repos/{owner}/{repo}/issues/{index}/stopwatch/start"
            }
            Endpoint::IssueStopwatchStop => "/repos/{owner}/{repo}/issues/{index}/stopwatch/stop",
            Endpoint::IssuesSearch => "/repos/issues/search",

            Endpoint::IssueComments => "/repos/{owner}/{repo}/issues/{index}/comments",
            Endpoint::IssueComment => "/repos/{owner}/{repo}/issues/comments/{id}",
            Endpoint::RepoComments => "/repos/{owner}/{repo}/issues/comments",

            Endpoint::Pulls => "/repos/{owner}/{repo}/pulls",
            Endpoint::Pull => "/repos/{owner}/{repo}/pulls/{index}",
            Endpoint::PullMerge => "/repos/{owner}/{repo}/pulls/{index}/merge",
            Endpoint::PullFiles => "/repos/{owner}/{repo}/pulls/{index}/files",
            Endpoint::PullReviews => "/repos/{owner}/{repo}/pulls/{index}/reviews",
            Endpoint::PullCommits => "/repos/{owner}/{repo}/pulls/{index}/commits",

            Endpoint::Labels => "/repos/{owner}/{repo}/labels",
            Endpoint::Label => "/repos/{owner}/{repo}/labels/{id}",
            Endpoint::OrgLabels => "/orgs/{owner}/labels",
            Endpoint::OrgLabel => "/orgs/{owner}/labels/{id}",

            Endpoint::Milestones => "/repos/{owner}/{repo}/milestones",
            Endpoint::Milestone => "/repos/{owner}/{repo}/milestones/{id}",

            Endpoint::Releases => "/repos/{owner}/{repo}/releases",
            Endpoint::Release => "/repos/{owner}/{repo}/releases/{id}",
            Endpoint::ReleaseLatest => "/repos/{owner}/{repo}/releases/latest",
            Endpoint::ReleaseByTag => "/repos/{owner}/{repo}/releases/tags/{tag}",
            Endpoint::ReleaseAssets => "/repos/{owner}/{repo}/releases/{id}/assets",

            Endpoint::Branches => "/repos/{owner}/{repo}/branches",
            Endpoint::Branch => "/repos/{owner}/{repo}/branches/{branch}",

            Endpoint::FileContents => "/repos/{owner}/{repo}/contents/{filepath}",
            Endpoint::FileRaw => "/repos/{owner}/{repo}/raw/{filepath}",

            Endpoint::Orgs => "/orgs",
            Endpoint::Org => "/orgs/{owner}",
            Endpoint::OrgRepos => "/orgs/{owner}/repos",
            Endpoint::OrgMembers => "/orgs/{owner}/members",
            Endpoint::OrgTeams => "/orgs/{owner}/teams",
        }
    }

    /// Resolve this endpoint with strict validation of every placeholder.
    pub fn resolve(self, params: &[(&str, &str)]) -> Result<String> {
        resolve_endpoint(self.template(), &params.iter().copied().collect(), None)
    }

    /// Resolve this endpoint, percent-encoding the placeholders named in `raw_keys`.
    pub fn resolve_raw(self, params: &[(&str, &str)], raw_keys: &[&str]) -> Result<String> {
        let raw: HashSet<&str> = raw_keys.iter().copied().collect();
        resolve_endpoint(
            self.template(),
            &params.iter().copied().collect(),
            Some(&raw),
        )
    }
}

/// A `.` or `..` segment would be collapsed by the URL parser.
fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

/// Returns true if `value` only contains `[A-Za-z0-9_.+-]` and is neither
/// empty nor a dot segment.
fn is_safe_path_param(value: &str) -> bool {
    !value.is_empty()
        && !is_dot_segment(value)
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'+' | b'-'))
}

/// Validate a single path value against the safe-path pattern.
pub fn validate_path_param<'a>(value: &'a str, name: &str) -> Result<&'a str> {
    if is_safe_path_param(value) {
        Ok(value)
    } else {
        Err(ForgeError::InvalidParameter {
            name: name.to_string(),
        })
    }
}

/// Percent-encode a hierarchical path, keeping `/` separators intact.
///
/// Empty, `.` and `..` segments are rejected so the path cannot climb out
/// of the endpoint it is appended to.
pub fn encode_raw_path(value: &str, name: &str) -> Result<String> {
    let mut segments = Vec::new();
    for segment in value.split('/') {
        if segment.is_empty() || is_dot_segment(segment) {
            return Err(ForgeError::InvalidParameter {
                name: name.to_string(),
            });
        }
        segments.push(urlencoding::encode(segment).into_owned());
    }
    Ok(segments.join("/"))
}

/// Fill every `{name}` placeholder in `template`.
///
/// Values for keys in `raw_keys` are percent-encoded with [`encode_raw_path`];
/// all others must pass [`validate_path_param`].
pub fn resolve_endpoint(
    template: &str,
    params: &HashMap<&str, &str>,
    raw_keys: Option<&HashSet<&str>>,
) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        resolved.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unterminated brace: not a placeholder.
            resolved.push_str(&rest[open..]);
            return Ok(resolved);
        };

        let key = &after[..close];
        let value = params
            .get(key)
            .ok_or_else(|| ForgeError::MissingParameter {
                name: key.to_string(),
            })?;

        if raw_keys.is_some_and(|raw| raw.contains(key)) {
            resolved.push_str(&encode_raw_path(value, key)?);
        } else {
            resolved.push_str(validate_path_param(value, key)?);
        }

        rest = &after[close + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}
