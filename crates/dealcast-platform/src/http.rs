use std::time::Duration;

use anyhow::Result;
use reqwest::Client;

const USER_AGENT: &str = concat!("dealcast/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;

    Ok(client)
}
