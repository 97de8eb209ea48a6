//! Contrato de petición/respuesta con el servicio de fragmentación.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Molecule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentationRequest {
    pub smiles: Molecule,
    /// Patrones de selección de enlaces; `None` deja que el fragmentador
    /// elija todos los enlaces rotables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bond_smarts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub smiles: String,
    /// Enlaces del padre (índices de átomo) que este fragmento representa.
    pub bond_indices: Vec<(usize, usize)>,
}

/// Árbol de fragmentación: molécula padre y sus fragmentos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentationResult {
    pub parent_smiles: String,
    pub fragments: Vec<Fragment>,
}
