use serde::{Deserialize, Serialize};

/// One unit of streamed agent output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { name: String },
}

impl ContentBlock {
    pub fn block_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolUse { .. } => "tool_use",
        }
    }
}

/// Out-of-band execution statistics attached to a session notification,
/// typically delivered when a tool invocation finishes.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponseStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hit_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_use_count: Option<u32>,
    /// Identifier of the sub-agent that produced the tool response, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subagent_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_block_wire_shape() {
        let block = ContentBlock::Text { text: "Hi".into() };
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"type":"text","text":"Hi"}"#);
    }

    #[test]
    fn tool_use_block_wire_shape() {
        let block = ContentBlock::ToolUse { name: "read_file".into() };
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, r#"{"type":"tool_use","name":"read_file"}"#);
    }

    #[test]
    fn block_type_strings() {
        assert_eq!(ContentBlock::Text { text: String::new() }.block_type(), "text");
        assert_eq!(
            ContentBlock::ToolUse { name: "grep".into() }.block_type(),
            "tool_use"
        );
    }

    #[test]
    fn stats_omit_absent_fields() {
        let stats = ToolResponseStats {
            duration_ms: Some(120),
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"durationMs":120}"#);
    }

    #[test]
    fn stats_roundtrip_with_token_breakdown() {
        let stats = ToolResponseStats {
            duration_ms: Some(950),
            total_tokens: Some(4200),
            input_tokens: Some(3000),
            output_tokens: Some(900),
            cache_hit_tokens: Some(300),
            tool_use_count: Some(3),
            subagent_id: Some("researcher".into()),
        };
        let json = serde_json::to_string(&stats).unwrap();
        let parsed: ToolResponseStats = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stats);
    }
}
