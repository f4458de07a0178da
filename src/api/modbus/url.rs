use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use tokio_modbus::SlaveId;
use url::Host;

use crate::prelude::*;

/// Inverter endpoint in the form of `modbus+tcp://host:port/slave-id`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParsedUrl {
    pub host: Host,
    pub port: u16,
    pub slave_id: SlaveId,
}

impl ParsedUrl {
    const DEFAULT_PORT: u16 = 502;
}

impl FromStr for ParsedUrl {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let url = url::Url::from_str(url).with_context(|| format!("`{url}` is an invalid URL"))?;
        ensure!(url.scheme() == "modbus+tcp", "only `modbus+tcp` scheme is currently supported");
        // Non-special schemes keep IP literals as domains.
        let host = url.host_str().context("the URL must contain host")?;
        let host = Host::parse(host).with_context(|| format!("`{host}` is an invalid host"))?;
        let port = url.port().unwrap_or(Self::DEFAULT_PORT);
        let slave_id = url
            .path_segments()
            .into_iter()
            .flatten()
            .next()
            .filter(|segment| !segment.is_empty())
            .context("slave ID must be specified in the first segment")?
            .parse()
            .context("incorrect slave ID")?;
        Ok(Self { host, port, slave_id })
    }
}

impl Display for ParsedUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "modbus+tcp://{}:{}/{}", self.host, self.port, self.slave_id)
    }
}
