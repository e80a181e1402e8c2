use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDiag {
    pub tool: String,
    pub version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
