//! Prompt templates for Vidra.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub translation: TranslationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for question rewriting, answering and summarizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub rewrite: String,
    pub answer: String,
    pub summary: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            rewrite: r#"Given the chat history and the latest user question, write one standalone question that can be understood without the chat history.
Keep the same intent as the latest question and resolve every pronoun or reference to earlier turns.
Output only the question itself, with no explanation.

Chat history:
{{history}}

Latest question: {{question}}
Standalone question:"#
                .to_string(),

            answer: r#"You are a professional video assistant. Answer the user's question using the timestamped video transcript below.

Requirements:
1. Cite the [timestamp] of the relevant passages in your answer whenever possible, so the user can find them.
2. If the transcript does not contain the information, answer plainly that the video does not mention it.
3. Always answer in {{language}}.

Known video content (context):
{{context}}

User question: {{question}}
Assistant answer:"#
                .to_string(),

            summary: r#"You are a professional video content analyst.

Here is the video transcript:
{{context}}

Please:
1. Summarize the core theme in one sentence.
2. List 3-5 key points, each with its approximate timestamp.
3. Write the summary in {{language}}."#
                .to_string(),
        }
    }
}

/// Prompts for per-segment transcript translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationPrompts {
    pub segment: String,
}

impl Default for TranslationPrompts {
    fn default() -> Self {
        Self {
            segment: r#"Translate the following transcript line into {{target_language}}.
Output only the translation, keep names and technical terms intact, and do not add commentary.

{{text}}"#
                .to_string(),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let translation_path = custom_path.join("translation.toml");
            if translation_path.exists() {
                let content = std::fs::read_to_string(&translation_path)?;
                prompts.translation = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass: placeholders inside substituted values
    /// are left as they are. Unknown placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &regex::Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.qa.answer.contains("{{context}}"));
        assert!(prompts.qa.rewrite.contains("{{history}}"));
        assert!(prompts.qa.summary.contains("{{language}}"));
        assert!(prompts.translation.segment.contains("{{text}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let template = "Context:\n{{context}}\n\nQuestion: {{question}}\nReply in {{language}}.";
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "the slide reads {{language}}".to_string());
        vars.insert("question".to_string(), "what does {{context}} mean?".to_string());
        vars.insert("language".to_string(), "English".to_string());

        assert_eq!(
            Prompts::render(template, &vars),
            "Context:\nthe slide reads {{language}}\n\nQuestion: what does {{context}} mean?\nReply in English."
        );
        assert_eq!(Prompts::render("{{unknown}} stays", &vars), "{{unknown}} stays");
    }

    #[test]
    fn test_custom_variables_are_overridden() {
        let mut custom = HashMap::new();
        custom.insert("language".to_string(), "French".to_string());
        custom.insert("channel".to_string(), "Rustaceans".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("language".to_string(), "German".to_string());
        let out = prompts.render_with_custom("{{language}} / {{channel}}", &vars);
        assert_eq!(out, "German / Rustaceans");
    }

    #[test]
    fn test_load_custom_qa_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("qa.toml"),
            "answer = \"Only answer: {{question}}\"\n",
        )
        .unwrap();
        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.qa.answer, "Only answer: {{question}}");
        assert!(prompts.qa.rewrite.contains("Standalone question"));
    }
}
