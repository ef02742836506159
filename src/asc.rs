use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

use anyhow::Context;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::gamecenter::{self, AchievementLocalization, AchievementSpec, ItemKind, LeaderboardSpec};
use crate::token::{AuthError, IssuedToken, TokenIssuer};
use crate::util::{data_id, data_items, truncate};

pub const DEFAULT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/";

const PAGE_LIMIT: &str = "200";
const ERROR_BODY_LIMIT: usize = 500;
/// Re-mint the bearer token once it is this close to expiring.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    pub key_id: String,
    pub issuer_id: String,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_parts(
        key_id: Option<String>,
        issuer_id: Option<String>,
        key_file: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let key_id =
            key_id.context("Missing --key-id or GCKIT_KEY_ID (App Store Connect API Key ID)")?;
        let issuer_id = issuer_id
            .context("Missing --issuer-id or GCKIT_ISSUER_ID (App Store Connect Issuer ID)")?;
        let key_file =
            key_file.context("Missing --key-file or GCKIT_KEY_FILE (path to the .p8 private key)")?;
        Ok(Self {
            key_id,
            issuer_id,
            key_file,
        })
    }

    pub fn issuer(&self) -> Result<TokenIssuer, AuthError> {
        TokenIssuer::from_key_file(&self.key_id, &self.issuer_id, &self.key_file)
    }
}

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {url} failed {status}: {message}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        message: String,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response from {url} has no data.id")]
    MissingId { url: String },
    #[error("invalid URL {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Short form for progress lines: `404 Not Found: detail`.
    pub fn summary(&self) -> String {
        match self {
            ApiError::Status {
                status, message, ..
            } => format!("{status}: {message}"),
            other => other.to_string(),
        }
    }
}

/// Result of following a paginated collection.
///
/// `error` is set when a page failed; `items` then holds everything collected
/// before that page.
#[derive(Debug, Default)]
pub struct Listing {
    pub items: Vec<Value>,
    pub error: Option<ApiError>,
}

impl Listing {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

enum Credentials {
    Static(String),
    Signed {
        issuer: TokenIssuer,
        cached: tokio::sync::Mutex<Option<IssuedToken>>,
    },
}

pub struct AppStoreConnectClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl AppStoreConnectClient {
    pub fn new(issuer: TokenIssuer) -> Result<Self, ApiError> {
        Self::build(Credentials::Signed {
            issuer,
            cached: tokio::sync::Mutex::new(None),
        })
    }

    /// Client that sends a fixed bearer token instead of signing its own.
    pub fn with_static_token(token: impl Into<String>) -> Result<Self, ApiError> {
        Self::build(Credentials::Static(token.into()))
    }

    fn build(credentials: Credentials) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("gckit/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()?;
        let base_url =
            Url::parse(DEFAULT_BASE_URL).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Overrides the base URL for API requests. Useful for tests with a mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub async fn bearer(&self) -> Result<String, ApiError> {
        let (issuer, cached) = match &self.credentials {
            Credentials::Static(token) => return Ok(token.clone()),
            Credentials::Signed { issuer, cached } => (issuer, cached),
        };
        let mut guard = cached.lock().await;
        if let Some(issued) = &*guard
            && !needs_refresh(issued, SystemTime::now())
        {
            return Ok(issued.token.clone());
        }
        debug!(kid = issuer.key_id(), "minting bearer token");
        let issued = issuer.issue()?;
        let token = issued.token.clone();
        guard.replace(issued);
        Ok(token)
    }

    fn resolve(&self, path_or_url: &str) -> Result<Url, ApiError> {
        let parsed = if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            Url::parse(path_or_url)
        } else {
            self.base_url.join(path_or_url)
        };
        parsed.map_err(|e| ApiError::InvalidUrl(format!("{path_or_url}: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        path_or_url: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.resolve(path_or_url)?;
        let bearer = self.bearer().await?;
        debug!(%method, %url, "request");
        let mut req = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(bearer);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status,
                message: error_message(&text),
            });
        }
        debug!(%status, bytes = text.len(), "response");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get(&self, path_or_url: &str) -> Result<Value, ApiError> {
        self.send(Method::GET, path_or_url, &[], None).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        self.send(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(Method::POST, path, &[], Some(&body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.send(Method::PATCH, path, &[], Some(&body)).await
    }

    /// POSTs `body` and returns the id of the created resource.
    pub async fn create(&self, path: &str, body: Value) -> Result<String, ApiError> {
        let url = self.resolve(path)?;
        let document = self.send(Method::POST, url.as_str(), &[], Some(&body)).await?;
        require_id(&document, &url)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, &[], None).await.map(|_| ())
    }

    /// Follows `links.next` from `initial_path` and concatenates every page's
    /// `data`. `query` only applies to the first request; `next` links already
    /// carry their own.
    pub async fn list_all(&self, initial_path: &str, query: &[(&str, &str)]) -> Listing {
        let mut items: Vec<Value> = Vec::new();
        let mut next_url: Option<String> = Some(initial_path.to_string());
        let mut query = query;
        while let Some(url) = next_url.take() {
            let page = match self.send(Method::GET, &url, query, None).await {
                Ok(page) => page,
                Err(error) => {
                    warn!(%error, collected = items.len(), "pagination stopped early");
                    return Listing {
                        items,
                        error: Some(error),
                    };
                }
            };
            items.extend(data_items(&page));
            next_url = page
                .get("links")
                .and_then(|l| l.get("next"))
                .and_then(|n| n.as_str())
                .map(|s| s.to_string());
            query = &[];
        }
        Listing { items, error: None }
    }

    // Game Center detail

    pub async fn game_center_detail_id(&self, app_id: &str) -> Result<Option<String>, ApiError> {
        let v = self
            .get(&format!("v1/apps/{}/gameCenterDetail", app_id))
            .await?;
        Ok(data_id(&v))
    }

    pub async fn create_game_center_detail(&self, app_id: &str) -> Result<String, ApiError> {
        self.create(
            "v1/gameCenterDetails",
            gamecenter::game_center_detail_body(app_id),
        )
        .await
    }

    pub async fn list_items(&self, kind: ItemKind, detail_id: &str) -> Listing {
        let path = format!("v1/gameCenterDetails/{}/{}", detail_id, kind.collection());
        self.list_all(&path, &[("limit", PAGE_LIMIT)]).await
    }

    // Leaderboards and achievements

    pub async fn create_leaderboard(
        &self,
        detail_id: &str,
        spec: &LeaderboardSpec,
    ) -> Result<String, ApiError> {
        self.create(
            "v1/gameCenterLeaderboards",
            gamecenter::leaderboard_body(detail_id, spec),
        )
        .await
    }

    pub async fn create_leaderboard_localization(
        &self,
        leaderboard_id: &str,
        spec: &LeaderboardSpec,
    ) -> Result<Value, ApiError> {
        self.post(
            "v1/gameCenterLeaderboardLocalizations",
            gamecenter::leaderboard_localization_body(leaderboard_id, spec),
        )
        .await
    }

    pub async fn create_achievement(
        &self,
        detail_id: &str,
        spec: &AchievementSpec,
    ) -> Result<String, ApiError> {
        self.create(
            "v1/gameCenterAchievements",
            gamecenter::achievement_body(detail_id, spec),
        )
        .await
    }

    pub async fn create_achievement_localization(
        &self,
        achievement_id: &str,
        localization: &AchievementLocalization,
    ) -> Result<Value, ApiError> {
        self.post(
            "v1/gameCenterAchievementLocalizations",
            gamecenter::achievement_localization_body(achievement_id, localization),
        )
        .await
    }

    pub async fn list_localizations(&self, kind: ItemKind, item_id: &str) -> Listing {
        let path = format!("v1/{}/{}/localizations", kind.collection(), item_id);
        self.list_all(&path, &[]).await
    }

    // Images

    pub async fn localization_image_id(
        &self,
        kind: ItemKind,
        localization_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let v = self
            .get(&format!(
                "v1/{}/{}/{}",
                kind.localization_type(),
                localization_id,
                kind.image_relationship()
            ))
            .await?;
        Ok(data_id(&v))
    }

    pub async fn delete_image(&self, kind: ItemKind, image_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("v1/{}/{}", kind.image_type(), image_id))
            .await
    }

    pub async fn reserve_image(
        &self,
        kind: ItemKind,
        localization_id: &str,
        file_name: &str,
        file_size: u64,
    ) -> Result<Value, ApiError> {
        self.post(
            &format!("v1/{}", kind.image_type()),
            gamecenter::image_reservation_body(kind, localization_id, file_name, file_size),
        )
        .await
    }

    pub async fn commit_image(&self, kind: ItemKind, image_id: &str) -> Result<Value, ApiError> {
        self.patch(
            &format!("v1/{}/{}", kind.image_type(), image_id),
            gamecenter::image_commit_body(kind, image_id),
        )
        .await
    }

    // Review submissions

    pub async fn review_submissions(
        &self,
        app_id: &str,
        states: &[&str],
    ) -> Result<Vec<Value>, ApiError> {
        let states = states.join(",");
        let v = self
            .get_with_query(
                "v1/reviewSubmissions",
                &[("filter[app]", app_id), ("filter[state]", states.as_str())],
            )
            .await?;
        Ok(data_items(&v))
    }

    pub async fn review_submission_items(
        &self,
        submission_id: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let v = self
            .get(&format!("v1/reviewSubmissions/{}/items", submission_id))
            .await?;
        Ok(data_items(&v))
    }

    pub async fn add_review_submission_item(
        &self,
        submission_id: &str,
        kind: ItemKind,
        version_id: &str,
    ) -> Result<Value, ApiError> {
        self.post(
            "v1/reviewSubmissionItems",
            gamecenter::review_submission_item_body(submission_id, kind, version_id),
        )
        .await
    }

    // v1 releases and v2 versions

    pub async fn item_releases(
        &self,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let v = self
            .get(&format!("v1/{}/{}/releases", kind.collection(), item_id))
            .await?;
        Ok(data_items(&v))
    }

    pub async fn delete_release(&self, kind: ItemKind, release_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("v1/{}/{}", kind.release_type(), release_id))
            .await
    }

    pub async fn create_item_release(
        &self,
        kind: ItemKind,
        detail_id: &str,
        item_id: &str,
    ) -> Result<Value, ApiError> {
        self.post(
            &format!("v1/{}", kind.release_type()),
            gamecenter::item_release_body(kind, detail_id, item_id),
        )
        .await
    }

    pub async fn item_versions(
        &self,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let v = self
            .get(&format!("v2/{}/{}/versions", kind.collection(), item_id))
            .await?;
        Ok(data_items(&v))
    }

    pub async fn create_item_version(
        &self,
        kind: ItemKind,
        item_id: &str,
    ) -> Result<String, ApiError> {
        self.create(
            &format!("v2/{}", kind.version_type()),
            gamecenter::item_version_body(kind, item_id),
        )
        .await
    }

    // App store versions and Game Center releases

    pub async fn app_store_versions(
        &self,
        app_id: &str,
        version: &str,
        platform: &str,
    ) -> Result<Vec<Value>, ApiError> {
        let v = self
            .get_with_query(
                &format!("v1/apps/{}/appStoreVersions", app_id),
                &[
                    ("filter[versionString]", version),
                    ("filter[platform]", platform),
                ],
            )
            .await?;
        Ok(data_items(&v))
    }

    pub async fn create_game_center_app_version(
        &self,
        app_store_version_id: &str,
    ) -> Result<String, ApiError> {
        self.create(
            "v1/gameCenterAppVersions",
            gamecenter::game_center_app_version_body(app_store_version_id),
        )
        .await
    }

    pub async fn game_center_app_version_id(
        &self,
        app_store_version_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let v = self
            .get(&format!(
                "v1/appStoreVersions/{}/gameCenterAppVersion",
                app_store_version_id
            ))
            .await?;
        Ok(data_id(&v))
    }

    pub async fn create_detail_release_request(&self, detail_id: &str) -> Result<String, ApiError> {
        self.create(
            "v1/gameCenterDetailReleaseRequests",
            gamecenter::detail_release_request_body(detail_id),
        )
        .await
    }
}

/// True once fewer than `TOKEN_REFRESH_MARGIN` of validity remain at `now`.
fn needs_refresh(issued: &IssuedToken, now: SystemTime) -> bool {
    now + TOKEN_REFRESH_MARGIN >= issued.expires_at
}

fn require_id(document: &Value, url: &Url) -> Result<String, ApiError> {
    data_id(document).ok_or_else(|| ApiError::MissingId {
        url: url.to_string(),
    })
}

/// First `errors[].detail` of an API error document, else the raw body.
fn error_message(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("errors")
            .and_then(|e| e.as_array())
            .and_then(|e| e.first())
            .and_then(|e| e.get("detail").or_else(|| e.get("title")))
            .and_then(|d| d.as_str())
            .map(|d| d.to_string())
    });
    detail.unwrap_or_else(|| truncate(body, ERROR_BODY_LIMIT).to_string())
}
