use std::time::Duration;

use reqwest::Client;

use crate::prelude::*;

/// Build a default client.
pub fn try_new() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(clap::crate_name!())
        .timeout(Duration::from_secs(20))
        .build()?)
}
