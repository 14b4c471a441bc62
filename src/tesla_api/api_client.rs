/// A simple wrapper around `reqwest::Client` used to manage HTTP requests
/// against the Tesla owner API with a preconfigured base URL and bearer token.
///
/// Token acquisition and refresh happen outside this process; the client only
/// carries the opaque token it was handed at startup.
#[derive(Debug)]
pub struct TeslaApiClient {
    /// The underlying `reqwest::Client` used to perform HTTP requests.
    client: reqwest::Client,
    /// Base URL for the API, prepended to all endpoint paths.
    base_url: String,
    /// Bearer token attached to every request.
    access_token: String,
}

impl TeslaApiClient {
    /// Constructs a new `TeslaApiClient` with the given base URL and token.
    ///
    /// The request timeout is generous: telemetry fetches against a vehicle
    /// that is waking up routinely take tens of seconds.
    pub fn new(base_url: &str, access_token: &str) -> TeslaApiClient {
        TeslaApiClient {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap(),
            base_url: String::from(base_url),
            access_token: String::from(access_token),
        }
    }

    /// Returns a reference to the internal `reqwest::Client`.
    pub(super) fn client(&self) -> &reqwest::Client { &self.client }
    /// Returns the base URL that the client was initialized with.
    pub(crate) fn url(&self) -> &str { self.base_url.as_str() }
    /// Returns the bearer token for the owner API.
    pub(super) fn token(&self) -> &str { self.access_token.as_str() }
}
