use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub const KIND_ACCESS: &str = "access";
pub const KIND_REFRESH: &str = "refresh";
pub const OUTCOME_VALID: &str = "valid";

#[derive(Clone)]
pub struct TokenMetrics {
    registry: Registry,
    issued: IntCounterVec,
    validations: IntCounterVec,
}

impl TokenMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Register the token counters into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let issued = IntCounterVec::new(
            Opts::new("auth_tokens_issued_total", "Count of tokens issued grouped by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(issued.clone()))?;

        let validations = IntCounterVec::new(
            Opts::new(
                "auth_token_validations_total",
                "Count of access token validations grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(validations.clone()))?;

        Ok(Self {
            registry,
            issued,
            validations,
        })
    }

    pub fn token_issued(&self, kind: &str) {
        self.issued.with_label_values(&[kind]).inc();
    }

    pub fn validation(&self, outcome: &str) {
        self.validations.with_label_values(&[outcome]).inc();
    }

    pub fn issued_count(&self, kind: &str) -> u64 {
        self.issued.with_label_values(&[kind]).get()
    }

    pub fn validation_count(&self, outcome: &str) -> u64 {
        self.validations.with_label_values(&[outcome]).get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition of every metric in the registry.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
