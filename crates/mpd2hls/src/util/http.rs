use std::{ops::Deref, time::Duration};

use reqwest::{Client, ClientBuilder};

use crate::error::TranscodeResult;

#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder) -> TranscodeResult<Self> {
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// A plain client whose every request gives up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> TranscodeResult<Self> {
        Self::new(Client::builder().timeout(timeout))
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
