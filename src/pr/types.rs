/// The pieces of a pull request URL this tool cares about.
///
/// Extracted from a path of the form `/{owner}/{repo}/pull/{pullid}`.
/// Segments are kept exactly as they appear in the escaped path, so
/// percent-encoded characters stay encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Pull request identifier. Not required to be numeric.
    pub pull_id: String,
}

/// Where to fetch from and which local branch to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    /// Clone URL, always `https://github.com/{owner}/{repo}.git`
    pub remote_url: String,
    /// Local branch that receives the pull request head
    pub branch_name: String,
    /// Pull request identifier, used to build the fetch refspec
    pub pull_id: String,
}

impl Targets {
    /// Refspec mapping the remote pull request head onto the local branch.
    pub fn refspec(&self) -> String {
        format!("pull/{}/head:{}", self.pull_id, self.branch_name)
    }
}
