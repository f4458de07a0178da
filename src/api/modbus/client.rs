use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use tokio::{
    net::{TcpStream, lookup_host},
    sync::Mutex,
    time::timeout,
};
use tokio_modbus::{
    Slave,
    client::{Reader, Writer, tcp::attach_slave},
};
use url::Host;

use crate::{
    api::modbus::ParsedUrl,
    core::registers::Register,
    prelude::*,
    target::InverterRegisterTarget,
};

/// Modbus/TCP connection to the inverter holding registers.
pub struct Client {
    context: Mutex<tokio_modbus::client::Context>,
}

impl Client {
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    #[instrument(skip_all, fields(host = %url.host, port = url.port, slave_id = url.slave_id))]
    pub async fn connect(url: &ParsedUrl) -> Result<Self> {
        let tcp_stream = new_tcp_stream(&url.host, url.port).await?;
        let context = attach_slave(tcp_stream, Slave(url.slave_id));
        Ok(Self { context: Mutex::new(context) })
    }
}

#[async_trait]
impl InverterRegisterTarget for Client {
    #[instrument(skip_all, level = "debug", fields(register = %register))]
    async fn read_register(&self, register: Register) -> Result<u16> {
        let mut context = self.context.lock().await;
        let words = timeout(
            Self::REQUEST_TIMEOUT,
            context.read_holding_registers(register.address(), 1),
        )
        .await
        .context("timeout reading the register")???;
        drop(context);
        let value = words
            .first()
            .copied()
            .with_context(|| format!("nothing is read from `{register}`"))?;
        trace!(value, "read");
        Ok(value)
    }

    #[instrument(skip_all, level = "debug", fields(register = %register, value = value))]
    async fn write_register(&self, register: Register, value: u16) -> Result {
        let mut context = self.context.lock().await;
        timeout(Self::REQUEST_TIMEOUT, context.write_single_register(register.address(), value))
            .await
            .context("timeout writing the register")???;
        drop(context);
        trace!("written");
        Ok(())
    }
}

async fn new_tcp_stream(host: &Host, port: u16) -> Result<TcpStream> {
    info!("connecting…");
    let addresses = match host {
        Host::Domain(domain) => lookup_host((domain.as_str(), port)).await?.collect_vec(),
        Host::Ipv4(ip_address) => lookup_host((*ip_address, port)).await?.collect_vec(),
        Host::Ipv6(ip_address) => lookup_host((*ip_address, port)).await?.collect_vec(),
    };
    let tcp_stream = timeout(Client::CONNECT_TIMEOUT, TcpStream::connect(&*addresses))
        .await
        .context("timed out while connecting to the inverter")?
        .context("failed to connect to the inverter")?;
    tcp_stream.set_nodelay(true)?;
    info!("connected");
    Ok(tcp_stream)
}
