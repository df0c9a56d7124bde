// File: maowhook-core/src/platforms/twitch_webhook/subscriptions.rs

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use maowhook_common::models::{Condition, Subscription, SubscriptionFilter, SubscriptionStatus};

use crate::http::{HttpRequest, HttpResponse};
use crate::Error;

use super::client::Client;

#[derive(Debug, Serialize)]
struct WebhookTransport<'a> {
    method: &'static str,
    callback: &'a str,
    secret: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateSubscriptionBody<'a> {
    #[serde(rename = "type")]
    sub_type: &'a str,
    version: &'a str,
    condition: &'a Condition,
    transport: WebhookTransport<'a>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionsResponse {
    #[serde(default)]
    data: Vec<Subscription>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    cursor: Option<String>,
}

fn unhandled(response: HttpResponse) -> Error {
    Error::UnhandledStatus {
        status: response.status.as_u16(),
        body: response.body,
    }
}

impl Client {
    /// Creates a subscription and waits until Twitch has verified the callback.
    ///
    /// Returns the subscription ID. On [`Error::VerificationTimeout`] the
    /// subscription may still exist on Twitch's side in a pending state; the
    /// error carries the record so the caller can remove it.
    pub async fn create_subscription(
        &self,
        sub_type: &str,
        version: &str,
        condition: Condition,
    ) -> Result<String, Error> {
        let subscription = self.request_subscription(sub_type, version, condition).await?;

        debug!(
            "[EventSub] awaiting verification for {} ({})",
            subscription.id, sub_type
        );
        if self
            .verifications
            .wait_for(&subscription.id, self.config.verification_timeout)
            .await
        {
            info!("[EventSub] subscribed to {} ({})", sub_type, subscription.id);
            Ok(subscription.id)
        } else {
            warn!(
                "[EventSub] no verification for {} ({}) within {:?}",
                subscription.id, sub_type, self.config.verification_timeout
            );
            Err(Error::VerificationTimeout(Box::new(subscription)))
        }
    }

    async fn request_subscription(
        &self,
        sub_type: &str,
        version: &str,
        condition: Condition,
    ) -> Result<Subscription, Error> {
        let body = serde_json::to_string(&CreateSubscriptionBody {
            sub_type,
            version,
            condition: &condition,
            transport: WebhookTransport {
                method: "webhook",
                callback: &self.config.webhook_url,
                secret: &self.config.webhook_secret,
            },
        })?;

        let request = HttpRequest::new(Method::POST, self.subscriptions_url())
            .header("Content-Type", "application/json")
            .body(body);
        let response = self.send_helix(request).await?;

        match response.status {
            StatusCode::ACCEPTED => {
                let parsed: SubscriptionsResponse = serde_json::from_str(&response.body)?;
                let mut data = parsed.data;
                if data.len() != 1 {
                    return Err(Error::Internal(format!(
                        "expected exactly one subscription in 202 response, got {}",
                        data.len()
                    )));
                }
                Ok(data.remove(0))
            }
            StatusCode::CONFLICT => Err(Error::DuplicateSubscription {
                subscription_type: sub_type.to_string(),
                condition,
            }),
            _ => Err(unhandled(response)),
        }
    }

    /// Deletes one subscription by ID.
    pub async fn remove_subscription(&self, id: &str) -> Result<(), Error> {
        let url = format!(
            "{}?id={}",
            self.subscriptions_url(),
            urlencoding::encode(id)
        );
        let response = self.send_helix(HttpRequest::new(Method::DELETE, url)).await?;

        match response.status {
            StatusCode::NO_CONTENT => {
                info!("[EventSub] removed subscription {}", id);
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(Error::SubscriptionNotFound),
            _ => Err(unhandled(response)),
        }
    }

    /// Deletes every subscription of `sub_type` whose condition equals `condition`.
    /// Returns how many were removed; zero matches is not an error.
    pub async fn remove_subscriptions_by_type(
        &self,
        sub_type: &str,
        condition: &Condition,
    ) -> Result<usize, Error> {
        let subscriptions = self
            .list_subscriptions(SubscriptionFilter::Type(sub_type.to_string()))
            .await?;

        let mut removed = 0;
        for sub in subscriptions
            .iter()
            .filter(|s| s.sub_type == sub_type && s.condition == *condition)
        {
            self.remove_subscription(&sub.id).await?;
            removed += 1;
        }
        debug!("[EventSub] removed {} subscription(s) of type {}", removed, sub_type);
        Ok(removed)
    }

    /// Fetches every page of subscriptions matching `filter`.
    pub async fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<Vec<Subscription>, Error> {
        let mut subscriptions = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 1;

        loop {
            debug!("[EventSub] fetching subscriptions page {}", page);
            let url = self.list_url(&filter, cursor.as_deref());
            let response = self.send_helix(HttpRequest::new(Method::GET, url)).await?;
            if response.status != StatusCode::OK {
                return Err(unhandled(response));
            }

            let parsed: SubscriptionsResponse = serde_json::from_str(&response.body)?;
            subscriptions.extend(parsed.data);

            match parsed.pagination.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
            page += 1;
        }

        Ok(subscriptions)
    }

    pub async fn get_subscriptions(&self) -> Result<Vec<Subscription>, Error> {
        self.list_subscriptions(SubscriptionFilter::All).await
    }

    pub async fn get_subscriptions_by_type(
        &self,
        sub_type: &str,
    ) -> Result<Vec<Subscription>, Error> {
        self.list_subscriptions(SubscriptionFilter::Type(sub_type.to_string()))
            .await
    }

    pub async fn get_subscriptions_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<Subscription>, Error> {
        self.list_subscriptions(SubscriptionFilter::Status(status))
            .await
    }

    fn subscriptions_url(&self) -> String {
        format!(
            "{}/eventsub/subscriptions",
            self.config.helix_url.trim_end_matches('/')
        )
    }

    fn list_url(&self, filter: &SubscriptionFilter, after: Option<&str>) -> String {
        let mut params = Vec::new();
        if let Some((key, value)) = filter.query_param() {
            params.push(format!("{}={}", key, urlencoding::encode(value)));
        }
        if let Some(after) = after {
            params.push(format!("after={}", urlencoding::encode(after)));
        }

        let base = self.subscriptions_url();
        if params.is_empty() {
            base
        } else {
            format!("{}?{}", base, params.join("&"))
        }
    }

    /// Sends an authenticated Helix request. On 401 the token is regenerated
    /// once and the request replayed once; a second 401 is [`Error::Unauthorized`].
    async fn send_helix(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let token = self.credentials.current();
        request.set_header("Client-Id", self.credentials.client_id());
        request.set_header("Authorization", format!("Bearer {}", token));

        let response = self.http.send(request.clone()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(
            "[EventSub] {} {} => 401, refreshing app access token",
            request.method, request.url
        );
        if let Err(e) = self.credentials.regenerate_if_current(&token).await {
            error!("[EventSub] token refresh failed: {}", e);
            return Err(Error::Unauthorized);
        }

        request.set_header(
            "Authorization",
            format!("Bearer {}", self.credentials.current()),
        );
        let retried = self.http.send(request).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        Ok(retried)
    }
}
