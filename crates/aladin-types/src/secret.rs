use std::fmt;

/// A wrapper that redacts secret values in Debug and Display output.
///
/// Use this to wrap any `String` that might contain sensitive data.
/// The actual value is accessible via `.expose()`. Not `Serialize`; output
/// uses [`Redacted::masked`].
#[derive(Clone, PartialEq, Eq)]
pub struct Redacted(String);

impl Redacted {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Show masked representation: last 4 chars visible.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 4 {
            "****".to_string()
        } else {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("****{tail}")
        }
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Redacted(\"***\")")
    }
}

impl fmt::Display for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use std::marker::PhantomData;

    use super::*;

    struct SerializeCheck<T>(PhantomData<T>);

    trait NotSerializable {
        fn serializable(&self) -> bool {
            false
        }
    }

    impl<T> NotSerializable for SerializeCheck<T> {}

    impl<T: serde::Serialize> SerializeCheck<T> {
        fn serializable(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_redacted_cannot_be_serialized() {
        assert!(!SerializeCheck::<Redacted>(PhantomData).serializable());
        assert!(SerializeCheck::<String>(PhantomData).serializable());
    }

    #[test]
    fn test_redacted_debug_hides_value() {
        let secret = Redacted::new("sk-abc123xyz");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("abc123xyz"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_redacted_display_hides_value() {
        let secret = Redacted::new("sk-abc123xyz");
        assert_eq!(format!("{secret}"), "***");
    }

    #[test]
    fn test_redacted_masked() {
        assert_eq!(Redacted::new("sk-abc123xyz").masked(), "****3xyz");
        assert_eq!(Redacted::new("ab").masked(), "****");
    }

    #[test]
    fn test_redacted_is_blank() {
        assert!(Redacted::new("   ").is_blank());
        assert!(!Redacted::new("sk-1").is_blank());
    }
}
