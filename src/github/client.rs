use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{GitHubApi, GitHubError, PullDetail, PullState, PullSummary, RawComment, RawCommit};
use crate::config::{Config, Credentials};

const USER_AGENT_VALUE: &str = "pr-reporter";
const ACCEPT_VALUE: &str = "application/vnd.github+json";

/// Authenticated REST client shared by every call of a report run.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    per_page: u8,
}

impl GitHubClient {
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self, GitHubError> {
        let api_url = config.api_url().to_string();
        reqwest::Url::parse(&api_url).map_err(|_| GitHubError::InvalidApiUrl(api_url.clone()))?;

        Ok(GitHubClient {
            http: reqwest::Client::new(),
            api_url,
            token: credentials.oauth_token.clone(),
            per_page: config.per_page(),
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, ACCEPT_VALUE)
            .bearer_auth(&self.token)
    }

    /// Fetch a single object from `path`.
    #[instrument(skip(self))]
    pub async fn get_one<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        let value = self
            .request(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(value)
    }

    /// Fetch every page of the array resource at `path`.
    ///
    /// The first request carries `per_page` and `params`; later requests use
    /// the `rel="next"` URL from the `Link` header as given.
    #[instrument(skip(self, params))]
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError> {
        let per_page = self.per_page.to_string();
        let mut request = self
            .request(&format!("{}{}", self.api_url, path))
            .query(&[("per_page", per_page.as_str())])
            .query(params);

        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let response = request.send().await?.error_for_status()?;
            let next = next_page_url(response.headers());
            let mut batch = response.json::<Vec<T>>().await?;
            debug!(page, items = batch.len(), "received page");
            items.append(&mut batch);

            match next {
                Some(url) => {
                    request = self.request(&url);
                    page += 1;
                }
                None => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_pull_requests(
        &self,
        repo: &str,
        state: PullState,
    ) -> Result<Vec<PullSummary>, GitHubError> {
        self.get_all(&format!("/repos/{repo}/pulls"), &[("state", state.as_str())])
            .await
    }

    async fn pull_request(&self, repo: &str, number: u64) -> Result<PullDetail, GitHubError> {
        self.get_one(&format!("/repos/{repo}/pulls/{number}")).await
    }

    async fn pull_request_commits(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<RawCommit>, GitHubError> {
        self.get_all(&format!("/repos/{repo}/pulls/{number}/commits"), &[])
            .await
    }

    async fn pull_request_comments(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<RawComment>, GitHubError> {
        self.get_all(&format!("/repos/{repo}/pulls/{number}/comments"), &[])
            .await
    }

    async fn commit_comments(&self, repo: &str, sha: &str) -> Result<Vec<RawComment>, GitHubError> {
        self.get_all(&format!("/repos/{repo}/commits/{sha}/comments"), &[])
            .await
    }
}

/// Extract the `rel="next"` target from a `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let mut segments = entry.split(';');
        let url = segments
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        segments
            .any(|param| param.trim() == "rel=\"next\"")
            .then(|| url.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GitHubClient {
        let config = Config {
            api_url: Some(server.uri()),
            per_page: Some(2),
            ..Config::default()
        };
        let credentials = Credentials {
            login: Some("alice".to_string()),
            oauth_token: "test-token".to_string(),
        };
        GitHubClient::new(&config, &credentials).unwrap()
    }

    fn pull_json(number: u64) -> serde_json::Value {
        serde_json::json!({
            "number": number,
            "title": format!("PR {number}"),
            "body": "",
            "state": "open",
            "user": { "login": "alice" },
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": null,
            "merged_at": null,
            "base": { "ref": "main" }
        })
    }

    #[test]
    fn test_next_page_url() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(concat!(
                "<https://api.github.com/x?page=2>; rel=\"next\", ",
                "<https://api.github.com/x?page=5>; rel=\"last\"",
            )),
        );
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://api.github.com/x?page=2")
        );
    }

    #[test]
    fn test_next_page_url_absent_on_last_page() {
        let mut headers = HeaderMap::new();
        assert!(next_page_url(&headers).is_none());

        headers.insert(
            LINK,
            HeaderValue::from_static("<https://api.github.com/x?page=1>; rel=\"prev\""),
        );
        assert!(next_page_url(&headers).is_none());
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let config = Config {
            api_url: Some("not a url".to_string()),
            ..Config::default()
        };
        let credentials = Credentials {
            login: None,
            oauth_token: "t".to_string(),
        };
        assert!(matches!(
            GitHubClient::new(&config, &credentials),
            Err(GitHubError::InvalidApiUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_pull_requests_follows_pagination() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/repos/org/repo/pulls?state=closed&per_page=2&page=2>; rel=\"next\"",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls"))
            .and(query_param("state", "closed"))
            .and(query_param("per_page", "2"))
            .and(query_param_is_missing("page"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("user-agent", USER_AGENT_VALUE))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(serde_json::json!([pull_json(1), pull_json(2)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([pull_json(3)])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let pulls = client
            .list_pull_requests("org/repo", PullState::Closed)
            .await
            .unwrap();

        let numbers: Vec<u64> = pulls.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_pull_request_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/pulls/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 42,
                "commits": 3,
                "comments": 1,
                "review_comments": 2,
                "additions": 10,
                "deletions": 4,
                "changed_files": 2,
                "merged": true,
                "merged_by": { "login": "bob" }
            })))
            .mount(&server)
            .await;

        let detail = client_for(&server)
            .pull_request("org/repo", 42)
            .await
            .unwrap();
        assert_eq!(detail.commits, 3);
        assert_eq!(detail.review_comments, 2);
        assert!(detail.merged);
        assert_eq!(detail.merged_by.unwrap().login, "bob");
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/org/repo/commits/abc/comments"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client_for(&server).commit_comments("org/repo", "abc").await;
        assert!(matches!(result, Err(GitHubError::ApiRequest(_))));
    }
}
