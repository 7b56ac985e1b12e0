//!
//! Server configuration
//! --------------------
//! Resolution order for every setting: CLI flag, then environment variable, then
//! built-in default. A value that fails to parse is ignored and the next source wins.

use std::env;
use std::str::FromStr;

use crate::identity::{DEFAULT_AUDIENCE, DEFAULT_EXPIRY_HOURS, DEFAULT_ISSUER};

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_DB_FOLDER: &str = "data";
/// Development fallback. The server warns when it is left in place.
pub const DEFAULT_JWT_SECRET: &str = "your-secret-key";
pub const DEFAULT_SEED_PASSWORD: &str = "password123";
/// Longest accepted token lifetime (ten years). Larger values fall back to the default.
pub const MAX_EXPIRY_HOURS: i64 = 24 * 365 * 10;

pub const USAGE: &str = "campaign_server\n\nUSAGE:\n  campaign_server [--http-port N] [--db-folder PATH] [--jwt-secret S] [--jwt-expiry-hours N] [--no-seed]\n\nOPTIONS:\n  --http-port N           HTTP API port (env: RBAC_HTTP_PORT, default 3000)\n  --db-folder PATH        Data folder for table snapshots (env: RBAC_DB_FOLDER, default data)\n  --jwt-secret S          Token signing secret (env: JWT_SECRET)\n  --jwt-expiry-hours N    Token lifetime in hours (env: JWT_EXPIRES_IN_HOURS, default 24)\n  --no-seed               Skip first-run provisioning (env: RBAC_SEED=false)\n\nOther environment: JWT_ISSUER, JWT_AUDIENCE, RBAC_SEED_PASSWORD, RUST_LOG\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub http_port: u16,
    pub db_root: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_hours: i64,
    pub seed: bool,
    pub seed_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            db_root: DEFAULT_DB_FOLDER.to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_issuer: DEFAULT_ISSUER.to_string(),
            jwt_audience: DEFAULT_AUDIENCE.to_string(),
            jwt_expiry_hours: DEFAULT_EXPIRY_HOURS,
            seed: true,
            seed_password: DEFAULT_SEED_PASSWORD.to_string(),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
        i += 1;
    }
    None
}

fn parse_arg<T: FromStr>(args: &[String], flag: &str) -> Option<T> {
    arg_value(args, flag).and_then(|v| v.parse::<T>().ok())
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

impl ServerConfig {
    /// Resolve from the process environment and the given argv.
    pub fn from_env_and_args(args: &[String]) -> Self {
        Self::resolve(args, |name| env::var(name).ok())
    }

    pub fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let env_parse = |name: &str| env(name).and_then(|v| v.parse::<i64>().ok());
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let http_port = parse_arg::<u16>(args, "--http-port")
            .or_else(|| env("RBAC_HTTP_PORT").and_then(|v| v.parse::<u16>().ok()))
            .unwrap_or(d.http_port);
        let db_root = arg_value(args, "--db-folder").map(str::to_string)
            .or_else(|| non_empty(env("RBAC_DB_FOLDER")))
            .unwrap_or(d.db_root);
        let jwt_secret = arg_value(args, "--jwt-secret").map(str::to_string)
            .or_else(|| non_empty(env("JWT_SECRET")))
            .unwrap_or(d.jwt_secret);
        let valid_ttl = |h: &i64| *h > 0 && *h <= MAX_EXPIRY_HOURS;
        let jwt_expiry_hours = parse_arg::<i64>(args, "--jwt-expiry-hours").filter(valid_ttl)
            .or_else(|| env_parse("JWT_EXPIRES_IN_HOURS").filter(valid_ttl))
            .unwrap_or(d.jwt_expiry_hours);
        let seed = if has_flag(args, "--no-seed") {
            false
        } else {
            env("RBAC_SEED").and_then(|v| parse_bool(&v)).unwrap_or(d.seed)
        };

        Self {
            http_port,
            db_root,
            jwt_secret,
            jwt_issuer: non_empty(env("JWT_ISSUER")).unwrap_or(d.jwt_issuer),
            jwt_audience: non_empty(env("JWT_AUDIENCE")).unwrap_or(d.jwt_audience),
            jwt_expiry_hours,
            seed,
            seed_password: non_empty(env("RBAC_SEED_PASSWORD")).unwrap_or(d.seed_password),
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("campaign_server").chain(list.iter().copied()).map(String::from).collect()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_without_input() {
        let cfg = ServerConfig::resolve(&args(&[]), env_of(&[]));
        assert_eq!(cfg, ServerConfig::default());
        assert!(cfg.uses_default_secret());
        assert_eq!(cfg.jwt_expiry_hours, 24);
    }

    #[test]
    fn flags_override_environment() {
        let env = env_of(&[("RBAC_HTTP_PORT", "4000"), ("RBAC_DB_FOLDER", "/var/env"), ("JWT_SECRET", "from-env")]);
        let cfg = ServerConfig::resolve(&args(&["--http-port", "5000", "--jwt-secret", "from-flag"]), env);
        assert_eq!(cfg.http_port, 5000);
        assert_eq!(cfg.db_root, "/var/env");
        assert_eq!(cfg.jwt_secret, "from-flag");
        assert!(!cfg.uses_default_secret());
    }

    #[test]
    fn unparsable_values_fall_through() {
        let env = env_of(&[("RBAC_HTTP_PORT", "4000"), ("JWT_EXPIRES_IN_HOURS", "soon"), ("RBAC_SEED", "maybe")]);
        let cfg = ServerConfig::resolve(&args(&["--http-port", "99999", "--jwt-expiry-hours", "-3"]), env);
        assert_eq!(cfg.http_port, 4000);
        assert_eq!(cfg.jwt_expiry_hours, 24);
        assert!(cfg.seed);
    }

    #[test]
    fn oversized_token_lifetime_falls_back() {
        let env = env_of(&[("JWT_EXPIRES_IN_HOURS", "100000000000")]);
        assert_eq!(ServerConfig::resolve(&args(&[]), env).jwt_expiry_hours, DEFAULT_EXPIRY_HOURS);

        let env = env_of(&[("JWT_EXPIRES_IN_HOURS", "48")]);
        let cfg = ServerConfig::resolve(&args(&["--jwt-expiry-hours", "9999999"]), env);
        assert_eq!(cfg.jwt_expiry_hours, 48);

        let edge = MAX_EXPIRY_HOURS.to_string();
        let cfg = ServerConfig::resolve(&args(&["--jwt-expiry-hours", edge.as_str()]), env_of(&[]));
        assert_eq!(cfg.jwt_expiry_hours, MAX_EXPIRY_HOURS);
    }

    #[test]
    fn seeding_switches() {
        assert!(!ServerConfig::resolve(&args(&["--no-seed"]), env_of(&[])).seed);
        assert!(!ServerConfig::resolve(&args(&[]), env_of(&[("RBAC_SEED", "off")])).seed);
        let cfg = ServerConfig::resolve(&args(&[]), env_of(&[("RBAC_SEED_PASSWORD", "s3cret"), ("JWT_ISSUER", "me")]));
        assert_eq!(cfg.seed_password, "s3cret");
        assert_eq!(cfg.jwt_issuer, "me");
        assert_eq!(cfg.jwt_audience, DEFAULT_AUDIENCE);
    }
}
