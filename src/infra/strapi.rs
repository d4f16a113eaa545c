//! Strapi REST adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::application::repos::{CategoryLookup, ContentSource, SourceError};
use crate::config::ContentSettings;
use crate::domain::entities::{IndexSettings, PostRecord};

use super::records::{
    RawArticle, RawCategory, RawIndexSettings, sort_newest_first, validate_articles,
    validate_categories,
};

const SOURCE: &str = "infra::strapi";
const ARTICLES_PATH: &str = "api/articles";
const INDEX_SETTINGS_PATH: &str = "api/index-setting";
const CATEGORIES_PATH: &str = "api/categories";

#[derive(Clone, Debug)]
pub struct StrapiClient {
    client: Client,
    base: Url,
    token: Option<String>,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    #[serde(default)]
    page_count: u32,
}

impl StrapiClient {
    pub fn new(settings: &ContentSettings) -> Result<Self, SourceError> {
        let base = settings
            .strapi_url
            .clone()
            .ok_or(SourceError::Missing("strapi_url"))?;
        Self::with_base(
            base,
            settings.strapi_token.clone(),
            settings.request_timeout,
            settings.page_size,
        )
    }

    pub fn with_base(
        base: Url,
        token: Option<String>,
        timeout: Duration,
        page_size: u32,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(SourceError::transport)?;
        Ok(Self {
            client,
            base,
            token,
            page_size: page_size.max(1),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("bloglane/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, SourceError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| SourceError::transport(format!("invalid path `{path}`: {err}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, SourceError> {
        let url = self.url(path, query)?;
        let mut request = self.client.get(url);
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(SourceError::transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(SourceError::transport)?;
        if !status.is_success() {
            return Err(status_error(status, path));
        }

        serde_json::from_slice(&bytes).map_err(SourceError::decode)
    }

    async fn category_lookup(
        &self,
        field: &str,
        value: &str,
    ) -> Result<CategoryLookup, SourceError> {
        let filter = format!("filters[{field}][$eq]");
        let envelope: Envelope<Vec<RawCategory>> = self
            .get(
                CATEGORIES_PATH,
                &[(filter.as_str(), value.to_string()), ("populate", "*".to_string())],
            )
            .await?;

        Ok(CategoryLookup {
            data: validate_categories(envelope.data.unwrap_or_default()),
        })
    }
}

#[async_trait]
impl ContentSource for StrapiClient {
    #[instrument(skip(self), target = "infra::strapi")]
    async fn sorted_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let fetched_at = OffsetDateTime::now_utc();
        let mut raw = Vec::new();
        let mut page = 1u32;

        loop {
            let envelope: Envelope<Vec<RawArticle>> = self
                .get(
                    ARTICLES_PATH,
                    &[
                        ("populate", "*".to_string()),
                        ("sort", "publishedAt:desc".to_string()),
                        ("pagination[page]", page.to_string()),
                        ("pagination[pageSize]", self.page_size.to_string()),
                    ],
                )
                .await?;

            let batch = envelope.data.unwrap_or_default();
            let page_count = envelope
                .meta
                .and_then(|meta| meta.pagination)
                .map(|pagination| pagination.page_count)
                .unwrap_or(page);
            let empty = batch.is_empty();
            raw.extend(batch);

            if empty || page >= page_count {
                break;
            }
            page += 1;
        }

        let mut posts = validate_articles(raw, fetched_at);
        sort_newest_first(&mut posts);
        debug!(target = SOURCE, count = posts.len(), pages = page, "articles fetched");
        Ok(posts)
    }

    async fn index_settings(&self) -> Result<IndexSettings, SourceError> {
        let envelope: Envelope<RawIndexSettings> = self
            .get(INDEX_SETTINGS_PATH, &[("populate", "*".to_string())])
            .await?;
        envelope
            .data
            .map(RawIndexSettings::into_settings)
            .ok_or(SourceError::Missing("index settings"))
    }

    async fn category_by_slug(&self, slug: &str) -> Result<CategoryLookup, SourceError> {
        self.category_lookup("slug", slug).await
    }

    async fn category_by_name(&self, name: &str) -> Result<CategoryLookup, SourceError> {
        self.category_lookup("name", name).await
    }
}

fn status_error(status: StatusCode, path: &str) -> SourceError {
    SourceError::Status {
        status: status.as_u16(),
        path: path.to_string(),
    }
}
