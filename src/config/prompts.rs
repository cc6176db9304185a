//! Prompt templates for Forsk.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub research: ResearchPrompts,
    pub calculator: CalculatorPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the research agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPrompts {
    pub system: String,
    /// Output shape the model must answer with, inserted as {{format_instructions}}.
    pub format_instructions: String,
    pub user: String,
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a research assistant that will help generate a research paper.
Answer the user query and use the necessary tools.

Tools:
- 'search' for current information from the web
- 'wikipedia' for background on a topic
- 'arxiv' for academic papers
- 'calculator' for any arithmetic, never compute by hand
- 'save_text_to_file' only when the user asks to keep the results

Wrap the output in this format and provide no other text.
{{format_instructions}}"#
                .to_string(),

            format_instructions: r#"The output must be a single JSON object with exactly these fields:
- "topic": string, the research topic
- "summary": string, a concise summary answering the query
- "sources": array of strings, the URLs or citations you relied on

Example:
{"topic": "...", "summary": "...", "sources": ["https://..."]}"#
                .to_string(),

            user: "{{query}}".to_string(),
        }
    }
}

/// Prompts for translating a math question into an evaluable expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorPrompts {
    pub system: String,
    pub user: String,
}

impl Default for CalculatorPrompts {
    fn default() -> Self {
        Self {
            system: r#"Translate a math problem into a single-line expression that can be evaluated by a numeric expression evaluator.
Supported: numbers, + - * / % ** ( ), pi, e, sqrt, abs, exp, log, log10, ln, sin, cos, tan, floor, ceil, round.

Use exactly this format:

Question: ${Question with math problem.}
```text
${single line mathematical expression that solves the problem}
```

Example:
Question: What is 37593 * 67?
```text
37593 * 67
```"#
                .to_string(),

            user: "Question: {{question}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let research_path = custom_path.join("research.toml");
            if research_path.exists() {
                let content = std::fs::read_to_string(&research_path)?;
                prompts.research = toml::from_str(&content)?;
            }

            let calculator_path = custom_path.join("calculator.toml");
            if calculator_path.exists() {
                let content = std::fs::read_to_string(&calculator_path)?;
                prompts.calculator = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The research system prompt with the format instructions filled in.
    pub fn research_system(&self) -> String {
        let mut vars = std::collections::HashMap::new();
        vars.insert(
            "format_instructions".to_string(),
            self.research.format_instructions.clone(),
        );
        self.render_with_custom(&self.research.system, &vars)
    }
}
