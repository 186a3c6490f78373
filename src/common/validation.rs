// src/common/validation.rs

// Validadores usados com `#[validate(custom(function = ...))]`.

use validator::ValidationError;

// Campos obrigatórios não podem ser só espaços
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("required".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t\n").is_err());
        assert!(validate_not_blank(" Ana ").is_ok());
    }
}
