pub mod types;

pub use types::{PrRef, Targets};

use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("Could not parse URL {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    #[error("URL malformed: {input:?} must have a path of `/{{owner}}/{{repo}}/pull/{{pullid}}`")]
    BadShape { input: String },
}

/// Parse a pull request URL into owner, repo and pull ID.
///
/// Any host is accepted, as is anything after the pull ID (`/files`, a query,
/// a fragment). Only the path shape is checked: owner and repo may be any
/// string, including empty ones, and the pull ID only has to be non-empty.
#[instrument(level = "debug")]
pub fn resolve(raw: &str) -> Result<PrRef, PrError> {
    check_raw(raw).map_err(|reason| PrError::Malformed {
        input: raw.to_string(),
        reason,
    })?;

    let parsed = Url::parse(raw).map_err(|e| PrError::Malformed {
        input: raw.to_string(),
        reason: e.to_string(),
    })?;

    let parts: Vec<&str> = parsed.path().split('/').collect();
    if parts.len() < 5 || parts[3] != "pull" || parts[4].is_empty() {
        return Err(PrError::BadShape {
            input: raw.to_string(),
        });
    }

    let reference = PrRef {
        owner: parts[1].to_string(),
        repo: parts[2].to_string(),
        pull_id: parts[4].to_string(),
    };
    debug!(owner = %reference.owner, repo = %reference.repo, pull_id = %reference.pull_id, "resolved pull request URL");
    Ok(reference)
}

/// Reject input the WHATWG parser would otherwise quietly repair: control
/// characters (tabs and newlines are stripped) and broken percent-escapes
/// (left in place as literal text). Escapes in the query are not checked.
fn check_raw(raw: &str) -> Result<(), String> {
    if let Some(c) = raw.chars().find(|c| c.is_ascii_control()) {
        return Err(format!("invalid control character {c:?} in URL"));
    }

    let (before_fragment, fragment) = match raw.split_once('#') {
        Some((before, fragment)) => (before, Some(fragment)),
        None => (raw, None),
    };
    let before_query = before_fragment
        .split_once('?')
        .map_or(before_fragment, |(before, _)| before);

    check_escapes(before_query)?;
    if let Some(fragment) = fragment {
        check_escapes(fragment)?;
    }
    Ok(())
}

fn check_escapes(part: &str) -> Result<(), String> {
    let bytes = part.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let escape = bytes.get(i + 1..i + 3);
        let valid = matches!(escape, Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit());
        if !valid {
            let end = (i + 3).min(part.len());
            let shown = part.get(i..end).unwrap_or("%");
            return Err(format!("invalid URL escape {shown:?}"));
        }
    }
    Ok(())
}

/// Work out the clone URL and local branch for a resolved pull request.
///
/// A non-empty `branch_override` wins; otherwise the branch is
/// `branch_prefix` followed by the pull ID (`pull42` with the default prefix).
pub fn derive_targets(reference: &PrRef, branch_override: Option<&str>, branch_prefix: &str) -> Targets {
    let branch_name = match branch_override {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}{}", branch_prefix, reference.pull_id),
    };

    Targets {
        remote_url: format!("https://github.com/{}/{}.git", reference.owner, reference.repo),
        branch_name,
        pull_id: reference.pull_id.clone(),
    }
}
