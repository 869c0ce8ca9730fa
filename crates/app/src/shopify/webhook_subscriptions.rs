//! Webhook subscription registration.

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::discounts::format_user_errors;
use super::{AdminClient, ShopifyError};

/// Webhook topics this service subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTopic {
    /// A cart was created or its contents changed.
    CartsUpdate,
}

impl WebhookTopic {
    /// The Admin API enum value for this topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CartsUpdate => "CARTS_UPDATE",
        }
    }
}

/// Outcome of a subscription attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    /// A new subscription was created with this GID.
    Created(String),
    /// The callback address was already subscribed to the topic
    /// (reinstall or repeated callback).
    AlreadySubscribed,
}

const WEBHOOK_SUBSCRIPTION_CREATE: &str = r"
    mutation webhookSubscriptionCreate($topic: WebhookSubscriptionTopic!, $webhookSubscription: WebhookSubscriptionInput!) {
        webhookSubscriptionCreate(topic: $topic, webhookSubscription: $webhookSubscription) {
            webhookSubscription {
                id
            }
            userErrors {
                field
                message
            }
        }
    }
";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    webhook_subscription_create: Option<CreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePayload {
    webhook_subscription: Option<SubscriptionNode>,
    #[serde(default)]
    user_errors: Vec<super::discounts::UserError>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionNode {
    id: String,
}

impl AdminClient {
    /// Subscribe the given callback URL to a webhook topic.
    ///
    /// Shopify rejects a duplicate (topic, address) pair with a user error;
    /// that case is reported as [`SubscriptionOutcome::AlreadySubscribed`] so
    /// reinstalls can ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the mutation reports a
    /// user error other than a duplicate subscription.
    #[instrument(skip(self), fields(topic = topic.as_str(), callback_url = %callback_url))]
    pub async fn create_webhook_subscription(
        &self,
        topic: WebhookTopic,
        callback_url: &str,
    ) -> Result<SubscriptionOutcome, ShopifyError> {
        let variables = json!({
            "topic": topic.as_str(),
            "webhookSubscription": {
                "callbackUrl": callback_url,
                "format": "JSON",
            }
        });

        let response: CreateResponse = self
            .execute(WEBHOOK_SUBSCRIPTION_CREATE, variables)
            .await?;

        let Some(payload) = response.webhook_subscription_create else {
            return Err(ShopifyError::UserError(
                "No payload returned from webhook subscription create".to_string(),
            ));
        };

        if !payload.user_errors.is_empty() {
            // "Address for this topic has already been taken"
            if payload
                .user_errors
                .iter()
                .any(|e| e.message.contains("already been taken"))
            {
                return Ok(SubscriptionOutcome::AlreadySubscribed);
            }
            return Err(ShopifyError::UserError(format_user_errors(
                &payload.user_errors,
            )));
        }

        payload
            .webhook_subscription
            .map(|n| SubscriptionOutcome::Created(n.id))
            .ok_or_else(|| {
                ShopifyError::UserError(
                    "No subscription returned from create".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_as_str() {
        assert_eq!(WebhookTopic::CartsUpdate.as_str(), "CARTS_UPDATE");
    }

    #[test]
    fn test_create_response_parses() {
        let body = json!({
            "webhookSubscriptionCreate": {
                "webhookSubscription": { "id": "gid://shopify/WebhookSubscription/42" },
                "userErrors": [],
            }
        });

        let response: CreateResponse = serde_json::from_value(body).expect("parses");
        let payload = response.webhook_subscription_create.expect("payload");
        assert_eq!(
            payload.webhook_subscription.expect("node").id,
            "gid://shopify/WebhookSubscription/42"
        );
    }
}
