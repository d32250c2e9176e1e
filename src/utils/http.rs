//! Shared HTTP client for JSON APIs.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest client that asks for JSON and identifies itself as this crate
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { client })
    }

    /// POST `body` as JSON with a verbatim `Authorization` header
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        authorization: &str,
        body: &T,
    ) -> RequestBuilder {
        self.client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_post_json_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "lin_api_abc")
            .match_header("accept", "application/json")
            .match_header("user-agent", Matcher::Regex(format!("^{}/", env!("CARGO_PKG_NAME"))))
            .match_body(Matcher::Json(json!({ "query": "{ viewer { id } }" })))
            .with_status(204)
            .create_async()
            .await;

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let response = http
            .post_json(
                &format!("{}/graphql", server.url()),
                "lin_api_abc",
                &json!({ "query": "{ viewer { id } }" }),
            )
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 204);
        mock.assert_async().await;
    }
}
