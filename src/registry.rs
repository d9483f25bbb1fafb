//! Shared client instances.
//!
//! A [`ClientRegistry`] hands out one [`ConfigClient`] per scope key. The first request
//! for a key builds the client and fetches its configuration; later requests return the
//! stored instance and ignore the builder they were given. Failed constructions are not
//! stored, so the next call tries again.

// std
use std::sync::LazyLock;
// self
use crate::{
	_prelude::*,
	client::{ConfigClient, ConfigClientBuilder},
	http::RequestOptions,
};

static GLOBAL_REGISTRY: LazyLock<ClientRegistry> = LazyLock::new(ClientRegistry::default);

/// How a [`ClientRegistry`] keys its clients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegistryScope {
	/// One client for the whole registry, whatever settings later calls pass.
	#[default]
	Singleton,
	/// One client per application name.
	PerApplication,
}

/// Lazily populated store of shared [`ConfigClient`] instances.
#[derive(Debug, Default)]
pub struct ClientRegistry {
	scope: RegistryScope,
	clients: Mutex<HashMap<String, Arc<ConfigClient>>>,
}
impl ClientRegistry {
	/// Creates an empty registry with the given scope.
	pub fn new(scope: RegistryScope) -> Self {
		Self { scope, clients: Default::default() }
	}

	/// Scope the registry keys clients by.
	pub fn scope(&self) -> RegistryScope {
		self.scope
	}

	/// Returns the client for `builder`'s scope key, creating it on first use.
	pub fn get_or_create(&self, builder: ConfigClientBuilder) -> Result<Arc<ConfigClient>> {
		self.get_or_create_with(builder, &RequestOptions::default())
	}

	/// Like [`get_or_create`](Self::get_or_create), forwarding `options` to the initial fetch.
	///
	/// The registry lock is held while the client is built, so concurrent first calls
	/// construct a single instance.
	pub fn get_or_create_with(
		&self,
		builder: ConfigClientBuilder,
		options: &RequestOptions,
	) -> Result<Arc<ConfigClient>> {
		let key = self.key_for(&builder.settings.app_name);
		let mut clients = self.clients.lock();

		if let Some(client) = clients.get(&key) {
			return Ok(client.clone());
		}

		let client = builder.build()?;

		client.get_config(options)?;

		let client = Arc::new(client);

		clients.insert(key, client.clone());

		Ok(client)
	}

	/// Returns the stored client for `app_name` without creating one.
	///
	/// Under [`RegistryScope::Singleton`] the name is ignored.
	pub fn get(&self, app_name: &str) -> Option<Arc<ConfigClient>> {
		self.clients.lock().get(&self.key_for(app_name)).cloned()
	}

	/// Number of stored clients.
	pub fn len(&self) -> usize {
		self.clients.lock().len()
	}

	/// Returns `true` when no client has been created yet.
	pub fn is_empty(&self) -> bool {
		self.clients.lock().is_empty()
	}

	/// Drops every stored client; the next call builds afresh.
	pub fn reset(&self) {
		self.clients.lock().clear();
	}

	fn key_for(&self, app_name: &str) -> String {
		match self.scope {
			RegistryScope::Singleton => String::new(),
			RegistryScope::PerApplication => app_name.to_owned(),
		}
	}
}

/// Process-wide singleton registry used by [`create_config_client`].
pub fn global_registry() -> &'static ClientRegistry {
	&GLOBAL_REGISTRY
}

/// Returns the process-wide client, building it and fetching its configuration on the
/// first call.
///
/// Every later call returns the same instance regardless of `builder`.
pub fn create_config_client(builder: ConfigClientBuilder) -> Result<Arc<ConfigClient>> {
	GLOBAL_REGISTRY.get_or_create(builder)
}
