use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuración inválida {key}={value:?}: se esperaba {expected}")]
    Invalid {
        key: String,
        value: String,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_variant_names_the_key() {
        let err = ConfigError::Invalid { key: "BEFLOW_GATEWAY_PORT".into(),
                                         value: "x".into(),
                                         expected: "u16" };
        assert_eq!(err.to_string(), "configuración inválida BEFLOW_GATEWAY_PORT=\"x\": se esperaba u16");
    }
}
