//! `generateReadme`: draft a project README in Markdown.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use st_api::GenerateRequest;
use st_core::constants::flows;
use st_core::error::{StError, StResult};

use super::{parse_input, require};
use crate::context::FlowContext;
use crate::prompt::{bullet_list, fill_template, parse_json_output};

const PROMPT: &str = "Write a README.md in GitHub-flavored Markdown for the project below. \
Include a title, a short overview, a features section, a tech stack section, and getting \
started instructions that fit the stack.

Project name: {{projectName}}
Description: {{description}}

Features:
{{features}}

Tech stack:
{{techStack}}

Respond with JSON only: {\"readme\": \"<markdown>\"}";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadmeInput {
    pub project_name: String,
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

impl ReadmeInput {
    pub fn validate(&self) -> StResult<()> {
        require("projectName", &self.project_name)?;
        require("description", &self.description)
    }

    fn prompt(&self) -> String {
        fill_template(
            PROMPT,
            &[
                ("projectName", self.project_name.trim()),
                ("description", self.description.trim()),
                ("features", &bullet_list(&self.features)),
                ("techStack", &bullet_list(&self.tech_stack)),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadmeOutput {
    pub readme: String,
}

pub fn definition() -> Value {
    json!({
        "name": flows::GENERATE_README,
        "description": "Generate a Markdown README from a project name, description, features and tech stack.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "projectName": { "type": "string", "description": "Project name" },
                "description": { "type": "string", "description": "One-paragraph project description" },
                "features": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Feature list"
                },
                "techStack": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Languages, frameworks and services used"
                }
            },
            "required": ["projectName", "description"]
        }
    })
}

pub async fn generate_readme(ctx: &FlowContext, input: ReadmeInput) -> StResult<ReadmeOutput> {
    input.validate()?;

    let raw = ctx.model.generate(&GenerateRequest::json(input.prompt())).await?;
    let output: ReadmeOutput = parse_json_output(&raw)?;
    if output.readme.trim().is_empty() {
        return Err(StError::Model("empty README".into()));
    }

    info!(
        "generated README for {} ({} chars)",
        input.project_name,
        output.readme.len()
    );
    Ok(output)
}

pub async fn execute(ctx: &FlowContext, args: Value) -> StResult<Value> {
    let input: ReadmeInput = parse_input(flows::GENERATE_README, args)?;
    let output = generate_readme(ctx, input).await?;
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_features() {
        let input = ReadmeInput {
            project_name: "Secure Talk".into(),
            description: "Chat app".into(),
            features: vec!["Groups".into(), "Translation".into()],
            tech_stack: vec![],
        };
        let prompt = input.prompt();
        assert!(prompt.contains("Project name: Secure Talk"));
        assert!(prompt.contains("- Groups\n- Translation"));
        assert!(prompt.contains("Tech stack:\n- (none)"));
    }

    #[test]
    fn test_validate() {
        let input: ReadmeInput = serde_json::from_value(json!({
            "projectName": "x",
            "description": " "
        }))
        .unwrap();
        assert!(matches!(input.validate(), Err(StError::InvalidInput(_))));
    }
}
