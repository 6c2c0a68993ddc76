use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};

const LOOKUP_CONCURRENCY: usize = 8;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

const ATTR_FULL_NAME: &str = "cn";
const ATTR_EMAIL: &str = "mail";
const ATTR_TITLE: &str = "title";
const ATTR_DEPARTMENT: &str = "departmentNumber";
const ATTR_USERNAME: &str = "uid";
const ATTR_ORGANIZATION: &str = "o";

/// Directory details for a project owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub title: Option<String>,
    pub department: Option<String>,
    pub organization: Option<String>,
    /// Whether the details came from the directory
    pub resolved: bool,
}

impl Identity {
    /// An owner the directory knows nothing about
    pub fn unresolved(username: &str) -> Self {
        Self {
            username: username.to_string(),
            full_name: username.to_string(),
            email: None,
            title: None,
            department: None,
            organization: None,
            resolved: false,
        }
    }

    /// Build an identity from the attributes of a directory entry
    pub fn from_attrs(username: &str, attrs: &HashMap<String, Vec<String>>) -> Self {
        let first = |name: &str| {
            attrs
                .get(name)
                .and_then(|values| values.first())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let username = first(ATTR_USERNAME).unwrap_or_else(|| username.to_string());
        Self {
            full_name: first(ATTR_FULL_NAME).unwrap_or_else(|| username.clone()),
            email: first(ATTR_EMAIL),
            title: first(ATTR_TITLE),
            department: first(ATTR_DEPARTMENT),
            organization: first(ATTR_ORGANIZATION),
            username,
            resolved: true,
        }
    }
}

/// Somewhere owner details can be looked up
#[async_trait::async_trait]
pub trait Directory: Send + Sync {
    /// Look up a single user; `Ok(None)` when there is no such user
    async fn lookup(&self, username: &str) -> Result<Option<Identity>, DirectoryError>;
}

/// A directory that knows nobody, used when no directory is reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

#[async_trait::async_trait]
impl Directory for NoDirectory {
    async fn lookup(&self, _username: &str) -> Result<Option<Identity>, DirectoryError> {
        Ok(None)
    }
}

/// An LDAP server searched anonymously by `uid`
pub struct LdapDirectory {
    ldap: Ldap,
    base: String,
}

impl LdapDirectory {
    pub async fn connect(server: &str, base: &str) -> Result<Self, DirectoryError> {
        let settings = LdapConnSettings::new().set_conn_timeout(CONNECT_TIMEOUT);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, server).await?;

        let server_name = server.to_string();
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(server = %server_name, "LDAP connection error: {}", e);
            }
        });

        tracing::debug!(server, base, "connected to LDAP directory");
        Ok(Self {
            ldap,
            base: base.to_string(),
        })
    }

    /// Close the connection; lookups fail afterwards
    pub async fn close(mut self) {
        if let Err(e) = self.ldap.unbind().await {
            tracing::debug!("LDAP unbind failed: {}", e);
        }
    }
}

/// `(uid=<username>)` with the username escaped
pub fn uid_filter(username: &str) -> String {
    format!("({}={})", ATTR_USERNAME, ldap_escape(username))
}

#[async_trait::async_trait]
impl Directory for LdapDirectory {
    async fn lookup(&self, username: &str) -> Result<Option<Identity>, DirectoryError> {
        let mut ldap = self.ldap.clone();
        let (entries, _) = ldap
            .with_timeout(SEARCH_TIMEOUT)
            .search(
                &self.base,
                Scope::Subtree,
                &uid_filter(username),
                vec![
                    ATTR_FULL_NAME,
                    ATTR_EMAIL,
                    ATTR_TITLE,
                    ATTR_DEPARTMENT,
                    ATTR_USERNAME,
                    ATTR_ORGANIZATION,
                ],
            )
            .await?
            .success()?;

        Ok(entries
            .into_iter()
            .next()
            .map(|entry| Identity::from_attrs(username, &SearchEntry::construct(entry).attrs)))
    }
}

/// Look up every distinct name in `usernames`, a few at a time.
///
/// Never fails: a name that cannot be looked up, or is not in the
/// directory, maps to [`Identity::unresolved`].
pub async fn resolve_identities<'a, I>(directory: &dyn Directory, usernames: I) -> BTreeMap<String, Identity>
where
    I: IntoIterator<Item = &'a str>,
{
    let distinct: BTreeSet<&str> = usernames
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    stream::iter(distinct)
        .map(|username| async move {
            let identity = match directory.lookup(username).await {
                Ok(Some(identity)) => identity,
                Ok(None) => {
                    tracing::debug!(username, "no directory entry");
                    Identity::unresolved(username)
                }
                Err(e) => {
                    tracing::warn!(username, "directory lookup failed: {}", e);
                    Identity::unresolved(username)
                }
            };
            (username.to_string(), identity)
        })
        .buffer_unordered(LOOKUP_CONCURRENCY)
        .boxed()
        .collect()
        .await
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),
}
