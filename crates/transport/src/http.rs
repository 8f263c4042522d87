//! Backend client over HTTP POST + JSON.

use std::time::Duration;

use async_trait::async_trait;
use augur_engine::{PredictionRequest, PredictionResponse, Transport, TransportError};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Default bound on one HTTP round trip, applied at the client level. The
/// engine enforces its own in-flight bound on top.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection options for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
	/// Client-level request timeout.
	pub request_timeout: Duration,
	/// Bearer token attached to every request, if the backend wants one.
	pub auth_token: Option<String>,
}

impl Default for HttpOptions {
	fn default() -> Self {
		Self {
			request_timeout: DEFAULT_HTTP_TIMEOUT,
			auth_token: None,
		}
	}
}

/// Errors from constructing an [`HttpTransport`].
///
/// Setup-time only; once built, failures surface as
/// [`TransportError`] values on individual calls.
#[derive(Debug, Error)]
pub enum HttpSetupError {
	/// The endpoint could not be parsed as a URL.
	#[error("invalid endpoint url: {0}")]
	InvalidEndpoint(#[from] url::ParseError),

	/// The underlying HTTP client could not be built.
	#[error("failed to build http client: {0}")]
	Client(#[from] reqwest::Error),
}

/// What the prediction endpoint answers with.
#[derive(Debug, Deserialize)]
struct PredictBody {
	text: String,
}

/// [`Transport`] over a single HTTP endpoint.
pub struct HttpTransport {
	client: reqwest::Client,
	endpoint: Url,
	auth_token: Option<String>,
}

impl HttpTransport {
	/// Builds a transport posting to `endpoint`.
	pub fn new(endpoint: &str, options: HttpOptions) -> Result<Self, HttpSetupError> {
		let endpoint = Url::parse(endpoint)?;
		let client = reqwest::Client::builder()
			.timeout(options.request_timeout)
			.build()?;
		Ok(Self {
			client,
			endpoint,
			auth_token: options.auth_token,
		})
	}
}

#[async_trait]
impl Transport for HttpTransport {
	async fn predict(
		&self,
		request: &PredictionRequest,
		cancel: CancellationToken,
	) -> Result<PredictionResponse, TransportError> {
		let send = async {
			let mut builder = self.client.post(self.endpoint.clone()).json(request);
			if let Some(token) = &self.auth_token {
				builder = builder.bearer_auth(token);
			}

			let response = builder
				.send()
				.await
				.map_err(|error| TransportError::Unavailable(error.to_string()))?;

			let status = response.status();
			if !status.is_success() {
				let message = response.text().await.unwrap_or_default();
				return Err(TransportError::Status {
					code: status.as_u16(),
					message,
				});
			}

			let body: PredictBody = response
				.json()
				.await
				.map_err(|error| TransportError::Malformed(error.to_string()))?;

			debug!(doc = ?request.document, seq = request.seq, bytes = body.text.len(), "prediction received");
			Ok(PredictionResponse { text: body.text })
		};

		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(TransportError::Cancelled),
			result = send => result,
		}
	}
}
