//!
//! JSON-RPC client for the factomd v2 API.
//!
//! This module provides an async client that fetches heights, directory blocks, entry blocks and
//! entries from a factomd node. Transport failures are retried with exponential backoff inside a
//! single request; JSON-RPC error objects are returned to the caller immediately.

use super::source::LedgerSource;
use super::types::*;
use backoff::{ExponentialBackoff, future::retry};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// factomd JSON-RPC client
pub struct FactomClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// The v2 API endpoint, e.g. `http://localhost:8088/v2`.
	url: String,
	/// Upper bound on the time spent retrying one request.
	max_retry_elapsed: Duration,
	next_id: AtomicU64,
}

impl FactomClient {
	/// Create a new factomd client.
	///
	/// # Arguments
	/// * `url` - The factomd v2 API endpoint.
	/// * `request_timeout` - Timeout applied to every HTTP request.
	/// * `max_retry_elapsed` - How long transport failures are retried before giving up.
	pub fn new(
		url: String,
		request_timeout: Duration,
		max_retry_elapsed: Duration,
	) -> Result<Self, FactomError> {
		let http_client = Client::builder().timeout(request_timeout).build()?;

		Ok(Self {
			http_client,
			url,
			max_retry_elapsed,
			next_id: AtomicU64::new(1),
		})
	}

	fn backoff(&self) -> ExponentialBackoff {
		ExponentialBackoff {
			max_elapsed_time: Some(self.max_retry_elapsed),
			..ExponentialBackoff::default()
		}
	}

	/// Execute a JSON-RPC request and decode its `result`.
	///
	/// # Arguments
	/// * `method` - The factomd method name.
	/// * `params` - The method parameters, or `Value::Null` for none.
	///
	/// # Errors
	/// Returns `FactomError::RpcError` for error responses, `HttpError` once retries are exhausted.
	pub async fn request<R: DeserializeOwned>(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<R, FactomError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut request_body = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
		});
		if !params.is_null() {
			request_body["params"] = params;
		}

		debug!(method, id, "factomd request");

		let response_json: serde_json::Value = retry(self.backoff(), || async {
			let response = self
				.http_client
				.post(&self.url)
				.header("Content-Type", "application/json")
				.json(&request_body)
				.send()
				.await
				.map_err(|e| {
					warn!(method, error = %e, "factomd request failed, retrying");
					backoff::Error::transient(FactomError::HttpError(e))
				})?;

			if response.status().is_server_error() {
				let err = response.error_for_status_ref().err();
				if let Some(e) = err {
					warn!(method, error = %e, "factomd server error, retrying");
					return Err(backoff::Error::transient(FactomError::HttpError(e)));
				}
			}

			// factomd reports RPC errors with 4xx statuses and a JSON body, so parse regardless.
			let body = response
				.json::<serde_json::Value>()
				.await
				.map_err(|e| backoff::Error::permanent(FactomError::HttpError(e)))?;

			Ok::<serde_json::Value, backoff::Error<FactomError>>(body)
		})
		.await?;

		Self::decode_result(response_json)
	}

	fn decode_result<R: DeserializeOwned>(mut response_json: serde_json::Value) -> Result<R, FactomError> {
		if let Some(error) = response_json.get("error").filter(|e| !e.is_null()) {
			let error: RpcErrorObject = serde_json::from_value(error.clone())?;
			return Err(FactomError::RpcError {
				code: error.code,
				message: error.message,
			});
		}

		let result = response_json
			.get_mut("result")
			.map(serde_json::Value::take)
			.filter(|r| !r.is_null())
			.ok_or(FactomError::NoData)?;

		Ok(serde_json::from_value(result)?)
	}
}

#[async_trait::async_trait]
impl LedgerSource for FactomClient {
	async fn heights(&self) -> Result<Heights, FactomError> {
		let heights: WireHeights = self.request("heights", serde_json::Value::Null).await?;
		Ok(heights.into())
	}

	async fn dblock_by_height(&self, height: u32) -> Result<DBlock, FactomError> {
		let response: WireDBlockResponse = self
			.request("dblock-by-height", json!({ "height": height }))
			.await?;
		Ok(response.dblock.into())
	}

	async fn entry_block(&self, key_mr: &Bytes32) -> Result<EBlock, FactomError> {
		let eblock: WireEBlock = self
			.request("entry-block", json!({ "keymr": key_mr.to_hex() }))
			.await?;
		Ok(eblock.into_eblock(*key_mr))
	}

	async fn entry(&self, hash: &Bytes32) -> Result<Entry, FactomError> {
		let entry: WireEntry = self
			.request("entry", json!({ "hash": hash.to_hex() }))
			.await?;
		let entry = entry.into_entry(*hash)?;
		entry.verify()?;
		Ok(entry)
	}
}
