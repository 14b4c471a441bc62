use super::api_client::TeslaApiClient;
use strum_macros::Display;

pub enum HTTPRequestMethod {
    Get,
    Post,
}

/// Every owner-API response nests its payload under a `response` key.
#[derive(serde::Deserialize)]
struct ApiResponse<T> {
    response: T,
}

pub trait TeslaRequestType {
    type Response: for<'de> serde::Deserialize<'de>;
    fn endpoint(&self) -> String;
    fn request_method(&self) -> HTTPRequestMethod;

    async fn send_request(&self, client: &TeslaApiClient) -> Result<Self::Response, ApiError>
    where Self: Sized {
        let url = format!("{}{}", client.url(), self.endpoint());
        let request = match self.request_method() {
            HTTPRequestMethod::Get => client.client().get(&url),
            HTTPRequestMethod::Post => client.client().post(&url),
        };
        let response = request.bearer_auth(client.token()).send().await?;
        let response = unwrap_return_code(response).await?;
        let body: ApiResponse<Self::Response> = response.json().await?;
        Ok(body.response)
    }
}

async fn unwrap_return_code(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { code: status.as_u16(), body })
    }
}

#[derive(Debug, Display)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, timeout, decode).
    Request(reqwest::Error),
    /// The API answered with a non-success status.
    Status { code: u16, body: String },
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self { ApiError::Request(value) }
}
