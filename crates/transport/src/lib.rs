//! HTTP implementation of the engine's transport boundary.
//!
//! Posts an assembled [`PredictionRequest`](augur_engine::PredictionRequest)
//! as JSON to a prediction endpoint and maps the reply onto the engine's
//! [`TransportError`](augur_engine::TransportError) taxonomy. No retrying
//! happens here; the engine treats the next trigger event as the retry.

mod http;

pub use http::{HttpOptions, HttpSetupError, HttpTransport};
