//! Category table: tool name to behavioral category.
//!
//! This is the single source of truth consulted by the event extractor
//! and all aggregate reporting. The mapping is total: every name
//! resolves to exactly one category, with unmapped names falling back
//! to [`ToolCategory::Other`].

use crate::types::ToolCategory;

/// Read/search/web-fetch style tools.
const EXPLORATION_TOOLS: &[&str] = &["Read", "Glob", "Grep", "WebSearch", "WebFetch", "LSP"];

/// File write/edit tools.
const MODIFICATION_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Shell/subprocess/task-delegation tools.
const EXECUTION_TOOLS: &[&str] = &["Bash", "Task", "TaskOutput", "BashOutput", "KillShell"];

/// Todo/plan-mode tools.
const PLANNING_TOOLS: &[&str] = &["TodoWrite", "EnterPlanMode", "ExitPlanMode"];

/// User-facing question/control tools.
const INTERACTION_TOOLS: &[&str] = &["AskUserQuestion"];

/// Remote-control and browser-automation tools.
const ADVANCED_TOOLS: &[&str] = &[
    "AgentOutputTool",
    "mcp__playwright__browser_navigate",
    "mcp__playwright__browser_click",
    "mcp__playwright__browser_press_key",
    "mcp__playwright__browser_snapshot",
];

/// Tools whose invocation counts as a file edit for correction tracking.
pub const EDIT_TOOLS: &[&str] = &["Edit", "Write", "MultiEdit"];

/// Resolve a tool name to its behavioral category.
///
/// Total function: never fails, never returns more than one category.
pub fn categorize(tool_name: &str) -> ToolCategory {
    if EXPLORATION_TOOLS.contains(&tool_name) {
        ToolCategory::Exploration
    } else if MODIFICATION_TOOLS.contains(&tool_name) {
        ToolCategory::Modification
    } else if EXECUTION_TOOLS.contains(&tool_name) {
        ToolCategory::Execution
    } else if PLANNING_TOOLS.contains(&tool_name) {
        ToolCategory::Planning
    } else if INTERACTION_TOOLS.contains(&tool_name) {
        ToolCategory::Interaction
    } else if ADVANCED_TOOLS.contains(&tool_name) {
        ToolCategory::Advanced
    } else {
        ToolCategory::Other
    }
}

/// Check whether a tool name is a file-editing tool.
pub fn is_edit_tool(tool_name: &str) -> bool {
    EDIT_TOOLS.contains(&tool_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tools() {
        assert_eq!(categorize("Read"), ToolCategory::Exploration);
        assert_eq!(categorize("Grep"), ToolCategory::Exploration);
        assert_eq!(categorize("Edit"), ToolCategory::Modification);
        assert_eq!(categorize("NotebookEdit"), ToolCategory::Modification);
        assert_eq!(categorize("Bash"), ToolCategory::Execution);
        assert_eq!(categorize("Task"), ToolCategory::Execution);
        assert_eq!(categorize("TodoWrite"), ToolCategory::Planning);
        assert_eq!(categorize("AskUserQuestion"), ToolCategory::Interaction);
        assert_eq!(
            categorize("mcp__playwright__browser_navigate"),
            ToolCategory::Advanced
        );
    }

    #[test]
    fn test_totality_on_arbitrary_input() {
        // Any string input resolves to exactly one category.
        assert_eq!(categorize(""), ToolCategory::Other);
        assert_eq!(categorize("NotARealTool"), ToolCategory::Other);
        assert_eq!(categorize("bash"), ToolCategory::Other); // case-sensitive
        assert_eq!(categorize("読み取り"), ToolCategory::Other);
    }

    #[test]
    fn test_no_tool_in_two_categories() {
        let tables = [
            EXPLORATION_TOOLS,
            MODIFICATION_TOOLS,
            EXECUTION_TOOLS,
            PLANNING_TOOLS,
            INTERACTION_TOOLS,
            ADVANCED_TOOLS,
        ];
        let mut seen = std::collections::HashSet::new();
        for table in tables {
            for name in table {
                assert!(seen.insert(*name), "{name} appears in two categories");
            }
        }
    }

    #[test]
    fn test_edit_tools_are_modifications() {
        for name in EDIT_TOOLS {
            assert_eq!(categorize(name), ToolCategory::Modification);
            assert!(is_edit_tool(name));
        }
        assert!(!is_edit_tool("Read"));
    }
}
