// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use spring_config_client::{
	ConfigClient, RequestOptions, config_client,
	http::{HeaderName, HeaderValue},
	registry::{ClientRegistry, RegistryScope},
};

fn database_url(client: &ConfigClient) -> Option<String> {
	client.get_as("db.url").ok().flatten()
}

fn describe(client: &ConfigClient, (prefix, count): (&str, usize)) -> String {
	format!("{prefix}:{}:{count}", client.profile())
}

fn serve<'a>(server: &'a MockServer, app_name: &str) -> httpmock::Mock<'a> {
	let path = format!("/master/development-{app_name}.json");

	server.mock(move |when, then| {
		when.method(GET).path(path).header("x-caller", "inject");
		then.status(200)
			.header("content-type", "application/json")
			.body(r#"{"db":{"url":"postgres://db/billing"}}"#);
	})
}

fn options() -> RequestOptions {
	RequestOptions::default()
		.with_header(HeaderName::from_static("x-caller"), HeaderValue::from_static("inject"))
}

#[test]
fn injected_function_receives_a_loaded_client() {
	let server = MockServer::start();
	let mock = serve(&server, "billing");
	let injected = config_client(ConfigClient::builder("billing").address(server.base_url()))
		.with_options(options())
		.inject(database_url);

	assert_eq!(injected.name(), "database_url");
	assert_eq!(
		injected.call().expect("Injected call should succeed."),
		Some("postgres://db/billing".to_owned())
	);

	mock.assert_calls(1);
}

#[test]
fn each_call_builds_a_fresh_client_without_registry() {
	let server = MockServer::start();
	let mock = serve(&server, "billing");
	let injected = config_client(ConfigClient::builder("billing").address(server.base_url()))
		.with_options(options())
		.inject(describe);

	assert_eq!(injected.call_with(("svc", 1)).expect("Call should succeed."), "svc:development:1");
	assert_eq!(injected.call_with(("svc", 2)).expect("Call should succeed."), "svc:development:2");

	mock.assert_calls(2);
}

#[test]
fn registry_shares_clients_across_injected_functions() {
	let server = MockServer::start();
	let mock = serve(&server, "billing");
	let registry = Arc::new(ClientRegistry::new(RegistryScope::PerApplication));
	let injector = config_client(ConfigClient::builder("billing").address(server.base_url()))
		.with_options(options())
		.with_registry(registry.clone());
	let url = injector.clone().inject(database_url);
	let label = injector.inject(describe);

	url.call().expect("First function should succeed.");
	label.call_with(("svc", 3)).expect("Second function should succeed.");

	assert!(registry.get("billing").is_some());

	mock.assert_calls(1);
}

#[test]
fn failed_fetch_is_returned_to_the_caller() {
	let server = MockServer::start();

	server.mock(|when, then| {
		when.method(GET).path("/master/development-billing.json");
		then.status(503);
	});

	let injected = config_client(
		ConfigClient::builder("billing").address(server.base_url()).fail_fast(false),
	)
	.inject(database_url);
	let err = injected.call().expect_err("HTTP 503 should fail the call.");

	assert!(!err.is_fatal());
	assert_eq!(err.status(), Some(503));
}
