pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_format(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_format(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidFormat {
        element: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::{ErrorCode, Result};

    fn checked_limit(limit: i64) -> Result<usize> {
        verify_arg!(limit, limit >= 0);
        Ok(limit as usize)
    }

    fn checked_line(fields: &[&str]) -> Result<usize> {
        verify_data!(fields, !fields.is_empty());
        Ok(fields.len())
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(checked_limit(3).unwrap(), 3);
        let err = checked_limit(-1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(err.to_string().contains("limit >= 0"));
    }

    #[test]
    fn test_verify_data() {
        assert_eq!(checked_line(&["a", "b"]).unwrap(), 2);
        let err = checked_line(&[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Generic);
        assert!(err.to_string().contains("fields"));
    }
}
