use serde::{Deserialize, Serialize};

/// Configuration for a semantic-convention analysis run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Module namespace that publishes the semconv packages
    /// (`<namespace>/semconv/vX.Y.Z`)
    pub semconv_namespace: String,

    /// Import path of the package declaring the attribute-key type
    pub attribute_package: String,

    /// Name of the attribute-key type inside `attribute_package`
    pub attribute_key_type: String,

    /// Extension (without the dot) of files to analyze
    pub source_extension: String,

    /// Walk files on the rayon pool instead of the calling thread
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            semconv_namespace: "go.opentelemetry.io/otel".to_string(),
            attribute_package: "go.opentelemetry.io/otel/attribute".to_string(),
            attribute_key_type: "Key".to_string(),
            source_extension: "go".to_string(),
            parallel: true,
        }
    }
}

impl AnalyzerConfig {
    /// Config that processes files one at a time on the calling thread
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    /// Fully qualified name of the tracked attribute-key type,
    /// e.g. `go.opentelemetry.io/otel/attribute.Key`
    pub fn attribute_key_type_path(&self) -> String {
        format!("{}.{}", self.attribute_package, self.attribute_key_type)
    }
}
