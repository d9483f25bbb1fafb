//! Blocking client for Spring-style config servers: templated config URLs, memoized
//! fetches with fail-fast, OAuth 2.0 client credentials, and encrypt/decrypt proxies.
//!
//! ```no_run
//! use spring_config_client::{ConfigClient, error};
//!
//! let builder = ConfigClient::builder("billing").profile("production");
//! let client = error::exit_on_fatal(builder.build())?;
//! let host = error::exit_on_fatal(client.get("spring.cloud.consul.host"))?;
//!
//! println!("{host:?}");
//! # Ok::<(), spring_config_client::Error>(())
//! ```

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod inject;
pub mod lookup;
pub mod oauth;
pub mod obs;
pub mod registry;
pub mod template;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::ConfigClientBuilder,
		http::{ReqwestTransport, Transport},
	};

	/// Builds a blocking reqwest transport that accepts the self-signed certificates produced
	/// by `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = reqwest::blocking::Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Returns a builder pointed at `address` that uses [`test_reqwest_transport`].
	pub fn test_client_builder(address: &str, app_name: &str) -> ConfigClientBuilder {
		let transport: Arc<dyn Transport> = Arc::new(test_reqwest_transport());

		ConfigClientBuilder::new(app_name).address(address).transport(transport)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::Error as ReqwestError;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use client::{ClientSettings, ConfigClient, ConfigClientBuilder};
pub use error::{Error, Result};
pub use http::RequestOptions;
pub use inject::config_client;
pub use lookup::ConfigMap;
pub use registry::create_config_client;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
#[cfg(test)] use {color_eyre as _, httpmock as _};
