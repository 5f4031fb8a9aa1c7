//! LLM pricing lookup for the generation budget.
//!
//! Prices are in USD per million tokens; the mock backend and unknown
//! backends default to $0.

/// Per-token pricing for a model.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// USD per million input tokens.
    pub input_per_million: f64,
    /// USD per million output tokens.
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Compute the estimated cost for the given token counts.
    pub fn compute_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input_cost = (f64::from(input_tokens) / 1_000_000.0) * self.input_per_million;
        let output_cost = (f64::from(output_tokens) / 1_000_000.0) * self.output_per_million;
        input_cost + output_cost
    }
}

/// Look up pricing for a backend + model combination.
pub fn lookup(backend: &str, model: &str) -> ModelPricing {
    match backend {
        "anthropic" => lookup_anthropic(model),
        // Mock and unknown backends are free.
        _ => ModelPricing {
            input_per_million: 0.0,
            output_per_million: 0.0,
        },
    }
}

fn lookup_anthropic(model: &str) -> ModelPricing {
    if model.contains("opus") {
        ModelPricing {
            input_per_million: 15.0,
            output_per_million: 75.0,
        }
    } else if model.contains("haiku") {
        ModelPricing {
            input_per_million: 1.0,
            output_per_million: 5.0,
        }
    } else {
        // Sonnet and unknown Anthropic models.
        ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    }
}
