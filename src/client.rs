//! HTTP client for the books API.

use crate::workload::NewBook;
use anyhow::Result;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Extension};
use reqwest_tracing::{OtelPathNames, TracingMiddleware};
use std::time::Duration;

/// Status and raw body of one API call. Classification of the call into a
/// workload outcome happens in the workload module, not here.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Thin wrapper over reqwest for the four books endpoints.
///
/// In the traced profile the client carries the tracing middleware, so
/// every request emits a span named after its route template.
pub struct BooksClient {
    http: ClientWithMiddleware,
    base_url: String,
}

impl BooksClient {
    pub fn new(base_url: &str, traced: bool) -> Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut builder = ClientBuilder::new(reqwest_client);
        if traced {
            // Group spans by route template instead of raw path
            builder = builder
                .with_init(Extension(OtelPathNames::known_paths([
                    "/books",
                    "/books/add",
                    "/books/{id}",
                ])?))
                .with(TracingMiddleware::default());
        }

        Ok(Self {
            http: builder.build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET /books/{id}
    pub async fn get_book(&self, id: i64) -> Result<ApiResponse> {
        let url = format!("{}/books/{}", self.base_url, id);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::read_response(response).await
    }

    /// GET /books
    pub async fn get_many_books(&self) -> Result<ApiResponse> {
        let url = format!("{}/books", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        Self::read_response(response).await
    }

    /// POST /books/add
    pub async fn create_book(&self, book: &NewBook) -> Result<ApiResponse> {
        let url = format!("{}/books/add", self.base_url);
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(book)
            .send()
            .await?;
        Self::read_response(response).await
    }

    /// DELETE /books/{id}
    pub async fn delete_book(&self, id: i64) -> Result<ApiResponse> {
        let url = format!("{}/books/{}", self.base_url, id);
        let response = self.http.delete(&url).send().await?;
        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ApiResponse { status, body })
    }
}
