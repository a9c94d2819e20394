// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Name of the identity object that is never bound, so Vault's own `default` policy stays intact.
pub const RESERVED_IDENTITY_NAME: &str = "default";

/// Field manager recorded on writes to the Vault resource
pub const OPERATOR_NAME: &str = "vault-binder";

/// Value the gating annotation must carry
pub const ENABLED_VALUE: &str = "true";

/// Keys recognised in the defaults-override ConfigMap
pub mod defaults {
    pub const POLICY_TEMPLATE: &str = "policy-template";
    pub const DB_USER_CREATION_STATEMENT: &str = "db-user-creation-statement";
    pub const DB_DEFAULT_TTL: &str = "db-default-ttl";
    pub const DB_MAX_TTL: &str = "db-max-ttl";

    pub const DEFAULT_POLICY_TEMPLATE: &str =
        "path \"secret/{{ .Name }}\" { capabilities = [\"read\"] }";
    /// `{{name}}` and `{{password}}` are filled in by Vault when it issues credentials.
    pub const DEFAULT_DB_USER_CREATION_STATEMENT: &str =
        "CREATE USER '{{name}}'@'%' IDENTIFIED BY '{{password}}'; GRANT ALL ON *.* TO '{{name}}'@'%';";
    pub const DEFAULT_DB_DEFAULT_TTL: &str = "1h";
    pub const DEFAULT_DB_MAX_TTL: &str = "24h";
}

/// Discriminators of the configuration document sections we manage
pub mod document {
    pub const KUBERNETES_AUTH_TYPE: &str = "kubernetes";
    pub const DATABASE_SECRETS_TYPE: &str = "database";
    /// Binds a role to every namespace
    pub const ALL_NAMESPACES: &str = "*";
}

/// CRD polling configuration
pub mod crd {
    pub const VAULT_GROUP: &str = "vault.banzaicloud.com";
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Requeue delays used by the error policies
pub mod requeue {
    pub const ERROR_SECS: u64 = 60;
    pub const CONFLICT_SECS: u64 = 5;
}
