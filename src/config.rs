use std::fmt;
use std::str::FromStr;

/// Which persistence backend holds the link records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// SQLite database file (`:memory:` works too).
    Sqlite,
    /// A single JSON document on disk.
    File,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "file" | "json" => Ok(Backend::File),
            other => Err(format!("unknown backend `{other}`, expected `sqlite` or `file`")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => f.write_str("sqlite"),
            Backend::File => f.write_str("file"),
        }
    }
}

/// The fixed admin login pair.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub secret: String,
    pub database_url: String,
    pub backend: Backend,
    pub admin: Credentials,
    pub session_hours: i64,
}

impl Config {
    pub fn new(
        secret: String,
        database_url: String,
        backend: Backend,
        admin: Credentials,
    ) -> Config {
        Config {
            secret,
            database_url,
            backend,
            admin,
            session_hours: 12,
        }
    }

    pub fn with_session_hours(self, session_hours: i64) -> Config {
        Config {
            session_hours,
            ..self
        }
    }
}
