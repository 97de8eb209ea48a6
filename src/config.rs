//! Configuración del proceso coordinador.
//! Se lee del entorno (tras cargar `.env` una vez) y queda inmutable.
use bespoke_core::{EnterPolicy, PollerSettings, RetryPolicy};
use bespoke_persistence::DbConfig;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Listener propio para las rutas de workers en proceso.
    pub worker_port: u16,
    pub prefix: String,
}

impl GatewayConfig {
    pub fn coordinator_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn worker_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.worker_port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// `true`: workers en proceso (`LocalWorkerClient` + rutas locales).
    pub local: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub workers: WorkerConfig,
    pub poller: PollerSettings,
    pub enter_policy: EnterPolicy,
    pub retry: RetryPolicy,
    /// `None`: almacén en memoria.
    pub database: Option<DbConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        bespoke_persistence::init_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una fuente arbitraria de
    /// variables (el entorno en producción, un mapa en tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let vars = Vars(&lookup);
        let defaults = PollerSettings::default();
        let retry_defaults = RetryPolicy::default();

        let gateway = GatewayConfig { host: vars.parse("BEFLOW_GATEWAY_HOST", IpAddr::from([127, 0, 0, 1]))?,
                                      port: vars.parse("BEFLOW_GATEWAY_PORT", 8000)?,
                                      worker_port: vars.parse("BEFLOW_WORKER_PORT", 8001)?,
                                      prefix: vars.string("BEFLOW_API_V1_STR", "/api/v1") };
        let workers = WorkerConfig { local: vars.flag("BEFLOW_LOCAL_WORKERS", true)?,
                                     url: vars.string("BEFLOW_WORKER_URL", "http://127.0.0.1:8001") };
        let poller = PollerSettings { max_running_tasks: vars.parse("BEFLOW_COORDINATOR_MAX_RUNNING_TASKS", defaults.max_running_tasks)?,
                                      min_update_interval: vars.millis("BEFLOW_COORDINATOR_MIN_UPDATE_INTERVAL_MS",
                                                                       defaults.min_update_interval)?,
                                      pass_interval: vars.millis("BEFLOW_COORDINATOR_PASS_INTERVAL_MS", defaults.pass_interval)?,
                                      ..defaults };
        if poller.max_running_tasks == 0 {
            return Err(ConfigError::Invalid { key: "BEFLOW_COORDINATOR_MAX_RUNNING_TASKS".into(),
                                              value: "0".into(),
                                              expected: "a positive integer" });
        }
        let enter_policy = if vars.flag("BEFLOW_POLL_AFTER_ENTER", true)? {
            EnterPolicy::PollImmediately
        } else {
            EnterPolicy::DeferToNextTick
        };
        let retry = RetryPolicy { fragmentation: vars.parse("BEFLOW_RETRY_FRAGMENTATION", retry_defaults.fragmentation)?,
                                  qc_generation: vars.parse("BEFLOW_RETRY_QC_GENERATION", retry_defaults.qc_generation)?,
                                  optimization: vars.parse("BEFLOW_RETRY_OPTIMIZATION", retry_defaults.optimization)?,
                                  backoff: retry_defaults.backoff };
        let database = match lookup("DATABASE_URL") {
            Some(url) => Some(DbConfig { url,
                                         min_connections: vars.parse("DATABASE_MIN_CONNECTIONS", 2)?,
                                         max_connections: vars.parse("DATABASE_MAX_CONNECTIONS", 16)? }),
            None => None,
        };

        Ok(Self { gateway,
                  workers,
                  poller,
                  enter_policy,
                  retry,
                  database })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F> where F: Fn(&str) -> Option<String>
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.raw(key) {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key: key.to_string(),
                                                                    value: v,
                                                                    expected: std::any::type_name::<T>() }),
            None => Ok(default),
        }
    }

    fn millis(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let ms: u64 = self.parse(key, default.as_millis() as u64)?;
        Ok(Duration::from_millis(ms))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(key) {
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid { key: key.to_string(),
                                                value: v,
                                                expected: "a boolean" }),
            },
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.gateway.coordinator_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(cfg.gateway.worker_addr().port(), 8001);
        assert_eq!(cfg.gateway.prefix, "/api/v1");
        assert!(cfg.workers.local);
        assert_eq!(cfg.poller.max_running_tasks, 1000);
        assert_eq!(cfg.poller.min_update_interval, Duration::from_millis(1000));
        assert_eq!(cfg.enter_policy, EnterPolicy::PollImmediately);
        assert_eq!(cfg.retry, RetryPolicy::default());
        assert!(cfg.database.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[("BEFLOW_GATEWAY_PORT", "9000"),
                           ("BEFLOW_LOCAL_WORKERS", "false"),
                           ("BEFLOW_WORKER_URL", "http://workers:8001"),
                           ("BEFLOW_COORDINATOR_PASS_INTERVAL_MS", "20"),
                           ("BEFLOW_POLL_AFTER_ENTER", "no"),
                           ("BEFLOW_RETRY_QC_GENERATION", "5"),
                           ("DATABASE_URL", "postgres://u@h/db"),
                           ("DATABASE_MAX_CONNECTIONS", "4")]).unwrap();
        assert_eq!(cfg.gateway.port, 9000);
        assert!(!cfg.workers.local);
        assert_eq!(cfg.workers.url, "http://workers:8001");
        assert_eq!(cfg.poller.pass_interval, Duration::from_millis(20));
        assert_eq!(cfg.enter_policy, EnterPolicy::DeferToNextTick);
        assert_eq!(cfg.retry.qc_generation, 5);
        let db = cfg.database.unwrap();
        assert_eq!(db.url, "postgres://u@h/db");
        assert_eq!((db.min_connections, db.max_connections), (2, 4));
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = config(&[("BEFLOW_GATEWAY_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("BEFLOW_GATEWAY_PORT"));
        assert!(config(&[("BEFLOW_LOCAL_WORKERS", "maybe")]).is_err());
        assert!(config(&[("BEFLOW_COORDINATOR_MAX_RUNNING_TASKS", "0")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[("BEFLOW_GATEWAY_PORT", "  ")]).unwrap();
        assert_eq!(cfg.gateway.port, 8000);
    }
}
