use bespoke_domain::BespokeOptimizationSchema;
use log::{debug, warn};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::parameter_cache_key;
use crate::errors::{CoreError, StoreError};
use crate::hashing::fingerprint;
use crate::store::KeyValueStore;

/// Caché de parámetros ajustados: fingerprint -> {SMIRKS -> valor}.
///
/// Escritura sólo-si-falta: un SMIRKS ya presente bajo un fingerprint no se
/// sobrescribe nunca.
#[derive(Clone)]
pub struct ParameterCache {
    store: Arc<dyn KeyValueStore>,
}

impl ParameterCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Fingerprint de campo de fuerza + ajustes, sin parámetros objetivo ni
    /// datos de referencia.
    pub fn fingerprint(schema: &BespokeOptimizationSchema) -> Result<String, CoreError> {
        let mut stages = Vec::with_capacity(schema.stages.len());
        for stage in &schema.stages {
            let mut value = serde_json::to_value(stage)?;
            if let Value::Object(map) = &mut value {
                map.remove("parameters");
                if let Some(Value::Array(targets)) = map.get_mut("targets") {
                    for target in targets.iter_mut() {
                        if let Value::Object(t) = target {
                            t.remove("reference_data");
                        }
                    }
                }
            }
            stages.push(value);
        }
        let input = json!({
            "initial_force_field": serde_json::to_value(&schema.initial_force_field)?,
            "stages": stages,
        });
        Ok(fingerprint(&input))
    }

    /// Mapa acumulado bajo `fp`, o `None` si nunca se escribió nada.
    pub fn get_cached_parameters(&self, fp: &str) -> Result<Option<BTreeMap<String, Value>>, StoreError> {
        let raw = self.store.hgetall(&parameter_cache_key(fp))?;
        if raw.is_empty() {
            return Ok(None);
        }
        let mut out = BTreeMap::new();
        for (smirks, encoded) in raw {
            match serde_json::from_str(&encoded) {
                Ok(value) => {
                    out.insert(smirks, value);
                }
                Err(e) => warn!("parameter cache entry skipped smirks={} error={}", smirks, e),
            }
        }
        Ok(Some(out))
    }

    /// Añade los SMIRKS que falten; devuelve cuántos se escribieron.
    pub fn merge(&self, fp: &str, parameters: &BTreeMap<String, Value>) -> Result<usize, StoreError> {
        let key = parameter_cache_key(fp);
        let mut added = 0;
        for (smirks, value) in parameters {
            if self.store.hset_if_absent(&key, smirks, &serde_json::to_string(value)?)? {
                added += 1;
            }
        }
        debug!("parameter cache merge key={} offered={} added={}", key, parameters.len(), added);
        Ok(added)
    }
}
