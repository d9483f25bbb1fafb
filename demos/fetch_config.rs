//! Demonstrates fetching configuration from a mocked config server, reading dotted paths, and
//! handing fatal failures to the top-level fail-fast handler.

// std
use std::time::Duration as StdDuration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use spring_config_client::{
	ConfigClient, RequestOptions, auth::OAuth2Credentials, error::exit_on_fatal,
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start();
	let token_mock = server.mock(|when, then| {
		when.method(POST).path("/oauth/token");
		then.status(200).header("content-type", "application/json").body(
			"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
		);
	});
	let config_mock = server.mock(|when, then| {
		when.method(GET)
			.path("/master/development-demo.json")
			.header("authorization", "Bearer demo-access");
		then.status(200).header("content-type", "application/json").body(
			"{\"spring\":{\"cloud\":{\"consul\":{\"host\":\"discovery\",\"port\":8500}}}}",
		);
	});
	let encrypt_mock = server.mock(|when, then| {
		when.method(POST).path("/encrypt").body("hunter2");
		then.status(200).body("a1b2c3");
	});
	let credentials =
		OAuth2Credentials::new(server.url("/oauth/token"), "demo-client", "demo-secret");
	let client = exit_on_fatal(
		ConfigClient::builder("demo").address(server.base_url()).oauth2(credentials).build(),
	)?;
	let options = RequestOptions::default().with_timeout(StdDuration::from_secs(5));
	let config = exit_on_fatal(client.get_config(&options))?;

	println!("Fetched {} top-level keys from {}.", config.len(), client.url());

	let host = client.get_as::<String>("spring.cloud.consul.host")?;
	let port = client.get_as::<u16>("spring.cloud.consul.port")?;

	println!("Consul endpoint: {host:?}:{port:?}.");
	println!("Encrypted value: {}.", client.encrypt("hunter2")?);

	token_mock.assert();
	config_mock.assert();
	encrypt_mock.assert();

	Ok(())
}
