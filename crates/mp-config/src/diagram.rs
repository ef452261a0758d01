//! Diagram generation defaults.

use serde::{Deserialize, Serialize};

fn default_models() -> Vec<String> {
    vec![String::from("llama3.1")]
}

const fn default_max_input_chars() -> usize {
    20_000
}

fn default_detail() -> String {
    String::from("basic")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiagramConfig {
    /// Candidate models, tried in order.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Maximum characters of the text report sent to the model.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Entity-relationship detail level: `basic` or `detailed`.
    #[serde(default = "default_detail")]
    pub detail: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            max_input_chars: default_max_input_chars(),
            detail: default_detail(),
        }
    }
}
