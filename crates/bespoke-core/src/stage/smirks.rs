use bespoke_domain::{DomainError, Fragment, Parameter};

/// Regenera SMIRKS provisionales para que apliquen a la molécula padre y a
/// sus fragmentos. La generación real requiere un toolkit químico y se
/// inyecta desde fuera.
pub trait SmirksRegenerator: Send + Sync {
    fn regenerate(&self, parameters: &[Parameter], parent_smiles: &str, fragments: &[Fragment])
                  -> Result<Vec<Parameter>, DomainError>;
}

/// Conserva los patrones tal cual y retira la marca de provisional.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainSmirks;

impl SmirksRegenerator for RetainSmirks {
    fn regenerate(&self, parameters: &[Parameter], _parent_smiles: &str, _fragments: &[Fragment])
                  -> Result<Vec<Parameter>, DomainError> {
        Ok(parameters.iter()
                     .cloned()
                     .map(|mut p| {
                         p.placeholder = false;
                         p
                     })
                     .collect())
    }
}
