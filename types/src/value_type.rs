/// Underlying value type of a mapped column.
///
/// relmap never converts values itself; the type travels with each selected
/// column so the scanning layer can pick a decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueType {
    Bool,
    #[default]
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    Time,
    Json,
    /// A user type that brings its own scanner.
    Custom(String),
}

impl ValueType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::Float => "float",
            ValueType::Text => "text",
            ValueType::Bytes => "bytes",
            ValueType::Time => "time",
            ValueType::Json => "json",
            ValueType::Custom(name) => name,
        }
    }
}

impl core::fmt::Display for ValueType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ValueType::Time.to_string(), "time");
        assert_eq!(ValueType::Custom("point".into()).to_string(), "point");
    }
}
