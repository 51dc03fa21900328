//! GitHub credentials resolved from the process environment.

/// Environment variable holding the GitHub username.
pub const USERNAME_VAR: &str = "GITHUB_USERNAME";
/// Environment variable holding a GitHub password. Checked before [`TOKEN_VAR`].
pub const PASSWORD_VAR: &str = "GITHUB_PASSWORD";
/// Environment variable holding a GitHub token, used when [`PASSWORD_VAR`] is unset.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// A username/secret pair for HTTP Basic authentication against the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    /// Resolve credentials from the process environment.
    ///
    /// Returns [`None`] when `GITHUB_USERNAME` is unset or when neither
    /// `GITHUB_PASSWORD` nor `GITHUB_TOKEN` holds a non-empty value. A missing
    /// pair is an expected outcome which callers report as "cannot proceed"
    /// rather than an error.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    ///
    /// The password-named variable wins over the token-named one when both are
    /// set.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(PASSWORD_VAR)
            .filter(|secret| !secret.is_empty())
            .or_else(|| lookup(TOKEN_VAR).filter(|secret| !secret.is_empty()))?;
        let username = lookup(USERNAME_VAR)?;
        Some(Self { username, token })
    }
}

#[cfg(test)]
mod test_credential_resolution {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn username_only_is_absent() {
        let creds = Credentials::from_lookup(lookup_from(&[(USERNAME_VAR, "user")]));
        assert!(creds.is_none());
    }

    #[test]
    fn token_only_is_absent() {
        let creds = Credentials::from_lookup(lookup_from(&[(TOKEN_VAR, "tok")]));
        assert!(creds.is_none());
    }

    #[test]
    fn empty_secret_is_absent() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, ""),
            (TOKEN_VAR, ""),
        ]));
        assert!(creds.is_none());
    }

    #[test]
    fn token_is_used_when_password_unset() {
        let creds =
            Credentials::from_lookup(lookup_from(&[(USERNAME_VAR, "user"), (TOKEN_VAR, "tok")]))
                .unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.token, "tok");
    }

    #[test]
    fn password_wins_over_token() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, "pass"),
            (TOKEN_VAR, "tok"),
        ]))
        .unwrap();
        assert_eq!(creds.token, "pass");
    }

    #[test]
    fn empty_password_falls_back_to_token() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (USERNAME_VAR, "user"),
            (PASSWORD_VAR, ""),
            (TOKEN_VAR, "tok"),
        ]))
        .unwrap();
        assert_eq!(creds.token, "tok");
    }
}
