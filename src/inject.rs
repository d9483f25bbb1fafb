//! Function wrapper that hands a ready [`ConfigClient`] to the wrapped function.
//!
//! ```no_run
//! use spring_config_client::{ConfigClient, config_client};
//!
//! fn port(client: &ConfigClient) -> Option<u64> {
//! 	client.get("server.port").ok().flatten().and_then(|value| value.as_u64())
//! }
//!
//! let port = config_client(ConfigClient::builder("billing")).inject(port);
//!
//! assert_eq!(port.name(), "port");
//!
//! let _value = port.call();
//! ```

// self
use crate::{
	_prelude::*,
	client::{ConfigClient, ConfigClientBuilder},
	http::RequestOptions,
	registry::ClientRegistry,
};

/// Starts an injector that builds clients from `builder`.
pub fn config_client(builder: ConfigClientBuilder) -> ConfigClientInjector {
	ConfigClientInjector::new(builder)
}

/// Produces [`Injected`] functions sharing one client recipe.
#[derive(Clone, Debug)]
pub struct ConfigClientInjector {
	builder: ConfigClientBuilder,
	options: RequestOptions,
	registry: Option<Arc<ClientRegistry>>,
}
impl ConfigClientInjector {
	/// Creates an injector that builds a fresh client on every call.
	pub fn new(builder: ConfigClientBuilder) -> Self {
		Self { builder, options: RequestOptions::default(), registry: None }
	}

	/// Sets the options forwarded to the configuration fetch.
	pub fn with_options(mut self, options: RequestOptions) -> Self {
		self.options = options;

		self
	}

	/// Obtains clients through `registry` instead of building one per call.
	pub fn with_registry(mut self, registry: Arc<ClientRegistry>) -> Self {
		self.registry = Some(registry);

		self
	}

	/// Wraps `function`.
	pub fn inject<F>(self, function: F) -> Injected<F> {
		Injected { injector: self, function }
	}

	fn client(&self) -> Result<Arc<ConfigClient>> {
		if let Some(registry) = &self.registry {
			return registry.get_or_create_with(self.builder.clone(), &self.options);
		}

		let client = self.builder.clone().build()?;

		client.get_config(&self.options)?;

		Ok(Arc::new(client))
	}
}

/// A function wrapped by [`ConfigClientInjector::inject`].
///
/// Each call obtains a client, fetches its configuration under the builder's fail-fast
/// policy, and passes the client as the first argument. Construction and fetch errors
/// are returned before the function runs.
#[derive(Clone)]
pub struct Injected<F> {
	injector: ConfigClientInjector,
	function: F,
}
impl<F> Injected<F> {
	/// Unqualified name of the wrapped function.
	pub fn name(&self) -> &'static str {
		let path = self.type_name();

		path.rsplit("::").next().unwrap_or(path)
	}

	/// Fully qualified type name of the wrapped function.
	pub fn type_name(&self) -> &'static str {
		std::any::type_name::<F>()
	}

	/// Calls a function that only takes the client.
	pub fn call<R>(&self) -> Result<R>
	where
		F: Fn(&ConfigClient) -> R,
	{
		let client = self.injector.client()?;

		Ok((self.function)(&client))
	}

	/// Calls a function that takes the client and one more argument.
	///
	/// Pass a tuple to forward several values.
	pub fn call_with<A, R>(&self, args: A) -> Result<R>
	where
		F: Fn(&ConfigClient, A) -> R,
	{
		let client = self.injector.client()?;

		Ok((self.function)(&client, args))
	}
}
impl<F> Debug for Injected<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Injected")
			.field("function", &self.type_name())
			.field("injector", &self.injector)
			.finish()
	}
}
