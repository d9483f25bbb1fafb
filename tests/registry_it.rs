// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use spring_config_client::{ConfigClient, create_config_client, registry::global_registry};

#[test]
fn create_config_client_returns_one_process_wide_instance() {
	let server = MockServer::start();
	let failing = server.mock(|when, then| {
		when.method(GET).path("/master/development-broken.json");
		then.status(500);
	});
	let app1 = server.mock(|when, then| {
		when.method(GET).path("/master/development-app1.json");
		then.status(200).header("content-type", "application/json").body(r#"{"name":"app1"}"#);
	});
	let app2 = server.mock(|when, then| {
		when.method(GET).path("/master/development-app2.json");
		then.status(200).header("content-type", "application/json").body(r#"{"name":"app2"}"#);
	});
	let builder = |app_name: &str| ConfigClient::builder(app_name).address(server.base_url());
	let err = create_config_client(builder("broken"))
		.expect_err("A failed first fetch should not populate the registry.");

	assert!(err.is_fatal());
	assert!(global_registry().is_empty());

	let client1 = create_config_client(builder("app1")).expect("First client should build.");
	let client2 = create_config_client(builder("app2")).expect("Second call should reuse it.");

	assert!(Arc::ptr_eq(&client1, &client2));
	assert_eq!(client2.app_name(), "app1");
	assert!(client2.cached_config().is_some());

	failing.assert_calls(1);
	app1.assert_calls(1);
	app2.assert_calls(0);

	global_registry().reset();

	let client3 = create_config_client(builder("app2")).expect("Reset registry should rebuild.");

	assert_eq!(client3.app_name(), "app2");

	app2.assert_calls(1);
}
