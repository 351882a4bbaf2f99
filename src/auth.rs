//! The demo login gate.  A single configured credential pair grants a session, which lives in the
//! session-scoped store until logout.

use failure;
use serde_json;

use settings;
use storage;

const DEMO_TOKEN: &'static str = "demo-token";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Fail, PartialEq)]
pub enum AuthError {
    #[fail(display = "Email and password are required.")]
    MissingFields,
    #[fail(display = "Please enter a valid email.")]
    InvalidEmail,
    #[fail(display = "Invalid credentials")]
    InvalidCredentials,
    #[fail(display = "Not logged in; run `iotmon login` first")]
    NotLoggedIn,
}

pub fn login<S>(
    storage: &S,
    credentials: &settings::Credentials,
    email: &str,
    password: &str,
) -> Result<User, failure::Error>
where
    S: storage::Storage,
{
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields.into());
    }
    if !looks_like_email(email) {
        return Err(AuthError::InvalidEmail.into());
    }
    if email != credentials.email || password != credentials.password {
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = User {
        email: email.to_owned(),
        token: DEMO_TOKEN.to_owned(),
    };
    storage.write(storage::AUTH_KEY, &serde_json::to_string(&user)?)?;
    Ok(user)
}

pub fn logout<S>(storage: &S) -> Result<(), failure::Error>
where
    S: storage::Storage,
{
    storage.remove(storage::AUTH_KEY)
}

/// The logged in user, if any.  An unreadable session counts as logged out.
pub fn current_user<S>(storage: &S) -> Option<User>
where
    S: storage::Storage,
{
    storage
        .read(storage::AUTH_KEY)
        .ok()
        .and_then(|raw| raw)
        .and_then(|raw| serde_json::from_str(&raw).ok())
}

pub fn require_user<S>(storage: &S) -> Result<User, failure::Error>
where
    S: storage::Storage,
{
    current_user(storage).ok_or_else(|| AuthError::NotLoggedIn.into())
}

// Somewhere in the input: something, an @, something, a dot, something; none of it whitespace.
fn looks_like_email(email: &str) -> bool {
    email.split_whitespace().any(|word| {
        word.match_indices('@').any(|(at, _)| {
            let domain = &word[at + 1..];
            at > 0
                && domain
                    .char_indices()
                    .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
        })
    })
}
