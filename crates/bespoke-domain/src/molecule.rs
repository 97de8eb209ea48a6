use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Molécula objetivo identificada por su SMILES.
///
/// No se canonicaliza el grafo (eso requiere un toolkit químico); sólo se
/// recorta y se rechazan cadenas vacías o con espacios internos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Molecule {
    smiles: String,
}

impl Molecule {
    pub fn from_smiles(smiles: &str) -> Result<Self, DomainError> {
        let trimmed = smiles.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError("SMILES must not be empty".to_string()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::ValidationError(format!("SMILES contains whitespace: {trimmed:?}")));
        }
        Ok(Molecule { smiles: trimmed.to_string() })
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }
}

impl TryFrom<String> for Molecule {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Molecule::from_smiles(&value)
    }
}

impl From<Molecule> for String {
    fn from(m: Molecule) -> Self {
        m.smiles
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<smiles: {}>", self.smiles)
    }
}
