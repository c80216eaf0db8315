use crate::{env_or, env_parse};

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub secret_key: String,
    /// Shared secret used to sign webhook deliveries.
    pub webhook_secret: String,
    pub api_base: String,
    /// Checkout redirects land on `{frontend_url}/verify`.
    pub frontend_url: String,
    pub currency: String,
    /// Flat fee added to every checkout as its own line item. Zero disables it.
    pub service_fee_cents: i64,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        Self {
            secret_key: std::env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            api_base: env_or("STRIPE_API_BASE", "https://api.stripe.com"),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:5173"),
            currency: env_or("PAYMENT_CURRENCY", "usd").to_lowercase(),
            service_fee_cents: env_parse("PAYMENT_SERVICE_FEE_CENTS", 0_i64).max(0),
        }
    }

    pub fn success_url(&self, order_id: &str) -> String {
        format!(
            "{}/verify?success=true&orderId={}",
            self.frontend_url.trim_end_matches('/'),
            order_id
        )
    }

    pub fn cancel_url(&self, order_id: &str) -> String {
        format!(
            "{}/verify?success=false&orderId={}",
            self.frontend_url.trim_end_matches('/'),
            order_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_urls() {
        let config = PaymentConfig {
            secret_key: String::new(),
            webhook_secret: String::new(),
            api_base: "https://api.stripe.com".into(),
            frontend_url: "https://shop.example.com/".into(),
            currency: "usd".into(),
            service_fee_cents: 0,
        };

        assert_eq!(
            config.success_url("abc"),
            "https://shop.example.com/verify?success=true&orderId=abc"
        );
        assert_eq!(
            config.cancel_url("abc"),
            "https://shop.example.com/verify?success=false&orderId=abc"
        );
    }
}
