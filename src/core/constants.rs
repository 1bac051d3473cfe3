use crate::core::message::Role;

/// Base URL of the Ollama daemon when neither the config file nor `--host`
/// provides one.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Model used when the daemon's model list cannot be retrieved and no other
/// default is configured.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Authoring roles offered by the role selector, in display order.
pub const ROLE_ORDER: [Role; 3] = [Role::User, Role::System, Role::Assistant];
