use async_trait::async_trait;
use serde::Deserialize;

const VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Third-party bot check for registration. Injected so services can be
/// tested without calling out to the network.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Returns whether the client-supplied response token passed the check.
    /// Transport failures count as a failed check.
    async fn verify(&self, response_token: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
}

pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, response_token: &str) -> bool {
        let result = self
            .client
            .post(VERIFY_URL)
            .query(&[("secret", self.secret.as_str()), ("response", response_token)])
            .send()
            .await;

        match result {
            Ok(response) => match response.json::<VerifyResponse>().await {
                Ok(body) => body.success,
                Err(e) => {
                    tracing::warn!("Captcha verification returned bad body: {}", e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("Captcha verification request failed: {}", e);
                false
            }
        }
    }
}

/// Fixed-outcome verifier for tests.
pub struct StaticVerifier(pub bool);

#[async_trait]
impl CaptchaVerifier for StaticVerifier {
    async fn verify(&self, _response_token: &str) -> bool {
        self.0
    }
}
