use super::{DataSourceConfig, Dialect};

use dynasty_core::{driver::Driver, Error, Result};
use url::Url;

/// Picks and builds the driver a configuration asks for.
pub(crate) fn driver(config: &DataSourceConfig) -> Result<Box<dyn Driver>> {
    let url = Url::parse(config.url()).map_err(|err| {
        Error::invalid_connection_url(format!("{err}; url={}", config.url()))
    })?;

    let Some(dialect) = Dialect::from_scheme(url.scheme()) else {
        return Err(Error::invalid_driver_configuration(format!(
            "unsupported database; scheme={}; url={}",
            url.scheme(),
            config.url()
        )));
    };

    if let Some(declared) = config.dialect_override() {
        if declared != dialect {
            return Err(Error::invalid_driver_configuration(format!(
                "dialect `{declared}` does not match connection URL scheme `{}`",
                url.scheme()
            )));
        }
    }

    match dialect {
        Dialect::Sqlite => match config.driver_name() {
            None | Some("sqlite" | "rusqlite") => connect_sqlite(config),
            Some(other) => Err(Error::invalid_driver_configuration(format!(
                "driver `{other}` does not serve dialect `{dialect}`"
            ))),
        },
        Dialect::Postgresql => Err(Error::invalid_driver_configuration(
            "no `postgresql` driver is available",
        )),
    }
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(config: &DataSourceConfig) -> Result<Box<dyn Driver>> {
    if let Some(credentials) = config.user_credentials() {
        return Err(Error::invalid_driver_configuration(format!(
            "sqlite does not authenticate; credentials given for user `{}`",
            credentials.user
        )));
    }

    let driver = dynasty_driver_sqlite::Sqlite::new(config.url())?;
    Ok(Box::new(driver))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_config: &DataSourceConfig) -> Result<Box<dyn Driver>> {
    Err(Error::invalid_driver_configuration(
        "`sqlite` feature not enabled",
    ))
}
