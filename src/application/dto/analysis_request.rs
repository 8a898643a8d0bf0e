use crate::carbon_dating::domain::TargetType;

/// Client identity used when the caller does not supply one
pub const LOCAL_CLIENT: &str = "local";

/// AnalysisRequest - Request DTO for the analyze use case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// Raw target URL as supplied by the caller
    pub target: String,
    /// Explicit target type; inferred from the URL when absent
    pub target_type: Option<TargetType>,
    /// Identity the request throttle counts against
    pub client_id: String,
}

impl AnalysisRequest {
    pub fn new(target: impl Into<String>, target_type: Option<TargetType>) -> Self {
        Self {
            target: target.into(),
            target_type,
            client_id: LOCAL_CLIENT.to_string(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }
}
