//! Transport boundary: send an assembled context, get a candidate back.
//!
//! The engine owns nothing about how the request travels; implementations
//! decide the wire. The contract is one call per request, cancelable
//! mid-flight through the provided token, returning either candidate text or
//! a structured error. Retrying is never done here; the next trigger event
//! is the retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::PredictionContext;
use crate::store::DocumentId;

/// One prediction request, valid for a single document snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
	/// Document the prediction is for.
	pub document: DocumentId,
	/// Trigger sequence number; responses behind the document's latest
	/// trigger are discarded on arrival.
	pub seq: u64,
	/// Document version at issue time.
	pub snapshot_version: u64,
	/// Assembled payload.
	pub context: PredictionContext,
}

/// Candidate rewrite returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
	/// Proposed text for the region the context described.
	pub text: String,
}

/// Why a transport call produced no candidate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
	/// The backend could not be reached.
	#[error("backend unreachable: {0}")]
	Unavailable(String),

	/// The backend answered with a non-success status.
	#[error("backend returned status {code}: {message}")]
	Status {
		/// HTTP-like status code.
		code: u16,
		/// Response body or reason phrase.
		message: String,
	},

	/// The response arrived but could not be decoded.
	#[error("malformed backend response: {0}")]
	Malformed(String),

	/// The configured in-flight bound elapsed.
	#[error("request timed out")]
	Timeout,

	/// The call was cancelled before it resolved.
	#[error("request cancelled")]
	Cancelled,
}

/// Backend client used by the engine.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Requests a candidate for `request`.
	///
	/// Implementations should resolve promptly with
	/// [`TransportError::Cancelled`] once `cancel` trips; the engine discards
	/// late responses either way via the sequence check.
	async fn predict(
		&self,
		request: &PredictionRequest,
		cancel: CancellationToken,
	) -> Result<PredictionResponse, TransportError>;
}
