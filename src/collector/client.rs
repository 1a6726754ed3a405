//! MX4J HTTP 클라이언트
//!
//! Connection pooling과 타임아웃을 지원하는 비동기 HTTP 클라이언트입니다.
//! 모든 요청은 GET이고, MX4J HTTP 어댑터가 기대하는 `template=identity`
//! 인자가 항상 붙습니다.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::EndpointConfig;
use crate::error::{CollectResult, CollectorError};

/// MX4J HTTP 클라이언트
#[derive(Clone)]
pub struct Mx4jClient {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
    auth: Option<(String, String)>,
}

impl Mx4jClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `endpoint` - 대상 관리 엔드포인트 설정 (host, port, base path, 타임아웃)
    ///
    /// # Example
    /// ```ignore
    /// let client = Mx4jClient::new(&EndpointConfig::default())?;
    /// ```
    pub fn new(endpoint: &EndpointConfig) -> CollectResult<Self> {
        let raw = format!(
            "http://{}:{}{}",
            endpoint.host, endpoint.port, endpoint.base_path
        );
        let base_url = Url::parse(&raw).map_err(|source| CollectorError::InvalidEndpoint {
            url: raw,
            source,
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(endpoint.timeout_ms))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(CollectorError::HttpClientInit)?;

        let auth = match (&endpoint.username, &endpoint.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            base_url,
            timeout_ms: endpoint.timeout_ms,
            auth,
        })
    }

    /// 상대 경로와 쿼리 인자로 요청 URL 구성
    fn request_url(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
        url.set_path(&joined);

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("template", "identity");
        }

        url
    }

    /// 관리 엔드포인트 GET 요청
    ///
    /// 2xx 응답이면 본문을 그대로 반환한다. 파싱은 호출자의 몫이다.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> CollectResult<String> {
        let url = self.request_url(path, query);

        debug!(url = %url, "Sending management request");

        let mut request = self.client.get(url);
        if let Some((username, password)) = &self.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                CollectorError::timeout_with_duration(self.timeout_ms)
            } else {
                CollectorError::from(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(CollectorError::HttpResponse)
    }
}
