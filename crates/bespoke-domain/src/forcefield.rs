//! Campo de fuerza base y parámetros a reajustar.
//!
//! El contenido de cada parámetro (constantes de fuerza, periodicidades...)
//! es JSON opaco para el coordinador; sólo se indexa por patrón SMIRKS.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    Bonds,
    Angles,
    ProperTorsions,
    ImproperTorsions,
    #[serde(rename = "vdW")]
    Vdw,
}

/// Parámetro objetivo de un stage de optimización.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub smirks: String,
    /// Marca un SMIRKS provisional que debe regenerarse para que aplique a la
    /// molécula padre y a sus fragmentos antes de optimizar.
    #[serde(default)]
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceField {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl ForceField {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               parameters: BTreeMap::new() }
    }

    pub fn parameter(&self, smirks: &str) -> Option<&Value> {
        self.parameters.get(smirks)
    }

    /// Copia del campo de fuerza con los valores ajustados superpuestos por
    /// SMIRKS (los valores de `fitted` ganan).
    pub fn with_overrides(&self, fitted: &BTreeMap<String, Value>) -> ForceField {
        let mut refit = self.clone();
        for (smirks, value) in fitted {
            refit.parameters.insert(smirks.clone(), value.clone());
        }
        refit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn with_overrides_keeps_untouched_parameters() {
        let mut base = ForceField::new("openff-2.0.0");
        base.parameters.insert("[#6:1]-[#6:2]".into(), json!({"k": 1.0}));
        base.parameters.insert("[#6:1]-[#8:2]".into(), json!({"k": 2.0}));

        let fitted = BTreeMap::from([("[#6:1]-[#8:2]".to_string(), json!({"k": 5.0}))]);
        let refit = base.with_overrides(&fitted);

        assert_eq!(refit.parameter("[#6:1]-[#6:2]"), Some(&json!({"k": 1.0})));
        assert_eq!(refit.parameter("[#6:1]-[#8:2]"), Some(&json!({"k": 5.0})));
        // el original no cambia
        assert_eq!(base.parameter("[#6:1]-[#8:2]"), Some(&json!({"k": 2.0})));
    }

    #[test]
    fn parameter_kind_uses_handler_names() {
        let p: Parameter = serde_json::from_value(json!({"type": "vdW", "smirks": "[#1:1]"})).unwrap();
        assert_eq!(p.kind, ParameterKind::Vdw);
        assert!(!p.placeholder);
    }
}
