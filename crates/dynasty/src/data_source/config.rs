use dynasty_core::{schema::EntityDescriptor, Error, Result};
use std::{fmt, str::FromStr, time::Duration};

const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to open and manage one named data source.
///
/// ```
/// # use dynasty::DataSourceConfig;
/// # use std::time::Duration;
/// let config = DataSourceConfig::new("inventory", "sqlite::memory:")
///     .pool_size(4)
///     .checkout_timeout(Duration::from_secs(5));
/// assert_eq!(config.name(), "inventory");
/// ```
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    name: String,
    url: String,
    dialect: Option<Dialect>,
    driver: Option<String>,
    credentials: Option<Credentials>,
    pool_size: Option<usize>,
    checkout_timeout: Duration,
    manage_schema: bool,
    entities: Vec<EntityDescriptor>,
}

/// SQL dialect spoken by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgresql,
}

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl DataSourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> DataSourceConfig {
        DataSourceConfig {
            name: name.into(),
            url: url.into(),
            dialect: None,
            driver: None,
            credentials: None,
            pool_size: None,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
            manage_schema: true,
            entities: vec![],
        }
    }

    /// Overrides the dialect otherwise derived from the URL scheme.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Names the driver to use; it must serve the configured dialect.
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// User and password for databases that authenticate. SQLite does not,
    /// and a SQLite configuration carrying credentials is rejected.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    /// How long a checkout waits on an exhausted pool.
    pub fn checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// Whether configuring reconciles each entity's table.
    pub fn manage_schema(mut self, manage_schema: bool) -> Self {
        self.manage_schema = manage_schema;
        self
    }

    pub fn entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.entities.push(descriptor);
        self
    }

    pub fn entities(mut self, descriptors: impl IntoIterator<Item = EntityDescriptor>) -> Self {
        self.entities.extend(descriptors);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dialect_override(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn driver_name(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    pub fn user_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn pool_size_limit(&self) -> Option<usize> {
        self.pool_size
    }

    pub fn timeout(&self) -> Duration {
        self.checkout_timeout
    }

    pub fn manages_schema(&self) -> bool {
        self.manage_schema
    }

    pub fn entity_descriptors(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Records `descriptors` as this data source's entities, replacing any
    /// with the same qualified name.
    pub(crate) fn merge_entities(&mut self, descriptors: &[EntityDescriptor]) {
        for descriptor in descriptors {
            match self
                .entities
                .iter_mut()
                .find(|entity| entity.qualified_name() == descriptor.qualified_name())
            {
                Some(entity) => *entity = descriptor.clone(),
                None => self.entities.push(descriptor.clone()),
            }
        }
    }
}

impl Dialect {
    /// The dialect implied by a connection URL scheme.
    pub fn from_scheme(scheme: &str) -> Option<Dialect> {
        match scheme {
            "sqlite" => Some(Dialect::Sqlite),
            "postgres" | "postgresql" => Some(Dialect::Postgresql),
            _ => None,
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Dialect> {
        Dialect::from_scheme(&s.to_ascii_lowercase()).ok_or_else(|| {
            Error::invalid_driver_configuration(format!("unknown dialect `{s}`"))
        })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => f.write_str("sqlite"),
            Dialect::Postgresql => f.write_str("postgresql"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
