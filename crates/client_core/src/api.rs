//! Remote data source boundary.
//!
//! The core only sees [`RemoteApi`]: six asynchronous operations that either
//! succeed or fail. [`HttpApiService`] is the production implementation
//! against the itinerary HTTP API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use url::Url;

use shared::{
    domain::{Destination, OfferGroup, Point, PointDraft, PointId},
    error::ApiError,
    protocol::{DestinationPayload, OfferGroupPayload, PointPayload, SavePointRequest},
};

#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn fetch_points(&self) -> Result<Vec<Point>>;
    async fn fetch_destinations(&self) -> Result<Vec<Destination>>;
    async fn fetch_offers(&self) -> Result<Vec<OfferGroup>>;
    /// Create a point from a completed draft; returns the confirmed record
    /// with its server-assigned id.
    async fn create_point(&self, draft: PointDraft) -> Result<Point>;
    /// Replace an existing record; returns the confirmed record.
    async fn update_point(&self, point: Point) -> Result<Point>;
    async fn delete_point(&self, id: PointId) -> Result<()>;
}

pub struct HttpApiService {
    http: Client,
    end_point: String,
    authorization: String,
}

impl HttpApiService {
    pub fn new(end_point: &str, authorization: impl Into<String>) -> Result<Self> {
        Url::parse(end_point).context("invalid API end point")?;
        Ok(Self {
            http: Client::new(),
            end_point: end_point.trim_end_matches('/').to_string(),
            authorization: authorization.into(),
        })
    }

    /// Success passes through; failure is turned into an error carrying the
    /// server's error envelope when the body contains one.
    async fn expect_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match response.json::<ApiError>().await {
            Ok(envelope) => Err(anyhow!("request failed with {status}: {envelope}")),
            Err(_) => Err(anyhow!("request failed with {status}")),
        }
    }
}

#[async_trait]
impl RemoteApi for HttpApiService {
    async fn fetch_points(&self) -> Result<Vec<Point>> {
        let response = self
            .http
            .get(format!("{}/points", self.end_point))
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        let payloads: Vec<PointPayload> = Self::expect_success(response).await?.json().await?;
        Ok(payloads.into_iter().map(Point::from).collect())
    }

    async fn fetch_destinations(&self) -> Result<Vec<Destination>> {
        let response = self
            .http
            .get(format!("{}/destinations", self.end_point))
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        let payloads: Vec<DestinationPayload> = Self::expect_success(response).await?.json().await?;
        Ok(payloads.into_iter().map(Destination::from).collect())
    }

    async fn fetch_offers(&self) -> Result<Vec<OfferGroup>> {
        let response = self
            .http
            .get(format!("{}/offers", self.end_point))
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        let payloads: Vec<OfferGroupPayload> = Self::expect_success(response).await?.json().await?;
        Ok(payloads.into_iter().map(OfferGroup::from).collect())
    }

    async fn create_point(&self, draft: PointDraft) -> Result<Point> {
        let destination = draft
            .destination
            .clone()
            .ok_or_else(|| anyhow!("draft has no destination"))?;
        let request = SavePointRequest::create(draft.kind, destination, &draft);
        let response = self
            .http
            .post(format!("{}/points", self.end_point))
            .header(header::AUTHORIZATION, &self.authorization)
            .json(&request)
            .send()
            .await?;
        let payload: PointPayload = Self::expect_success(response).await?.json().await?;
        Ok(payload.into())
    }

    async fn update_point(&self, point: Point) -> Result<Point> {
        let request = SavePointRequest::update(&point);
        let response = self
            .http
            .put(format!("{}/points/{}", self.end_point, point.id))
            .header(header::AUTHORIZATION, &self.authorization)
            .json(&request)
            .send()
            .await?;
        let payload: PointPayload = Self::expect_success(response).await?.json().await?;
        Ok(payload.into())
    }

    async fn delete_point(&self, id: PointId) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/points/{id}", self.end_point))
            .header(header::AUTHORIZATION, &self.authorization)
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
