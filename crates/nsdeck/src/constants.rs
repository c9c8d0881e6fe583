pub const NS_INGRESS_CACHE_KEY: &str = "namespaceIngressInfo";
pub const NAMESPACE_CACHE_KEY_PREFIX: &str = "namespace:";

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const CONFIG_PATH_ENV: &str = "NSDECK_CONFIG";

pub fn namespace_cache_key(namespace: &str) -> String {
    format!("{}{}", NAMESPACE_CACHE_KEY_PREFIX, namespace)
}
