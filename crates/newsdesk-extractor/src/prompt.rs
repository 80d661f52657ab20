//! Prompt templates and schema rendering for the two-pass protocol
//!
//! The task prompt is an explicit template value with one named slot for the
//! email body, rendered through a pure function. The structuring prompt
//! embeds either the built-in default schema or one rendered from a
//! [`SchemaSpec`].

use crate::config::{ExtractionConfig, SchemaSpec};

/// Slot name the task template must contain
pub const EMAIL_CONTENT_SLOT: &str = "{email_content}";

/// Default system prompt for Pass 1
pub const DEFAULT_ANALYSIS_SYSTEM_PROMPT: &str = r#"You are an AI research analyst with access to tools.
Your task is to analyze a newsletter email for a VP at Google.

You should:
1. First, understand the structure of the email (it's in EML format)
2. Identify the main stories/sections
3. For each story, extract key facts, companies mentioned, and implications
4. Identify which links would be worth following for deeper context
5. Synthesize into actionable insights

Think step by step. Explain your reasoning as you analyze.

The VP cares about:
- Competitive moves by Meta, OpenAI, Microsoft, AWS
- Talent market dynamics
- Infrastructure investments
- Technical trends
- Strategic opportunities/threats for Google

Be specific and actionable. Distinguish between confirmed facts and speculation."#;

/// Default task prompt template for Pass 1 (contains the email-content slot)
pub const DEFAULT_ANALYSIS_TASK_PROMPT: &str = r#"Please analyze this newsletter email.

Here is the raw EML file content:

```
{email_content}
```

Please:
1. Parse the email structure (identify HTML content, plain text, metadata)
2. Extract the main stories covered
3. For each story, identify:
   - Key facts and numbers
   - Companies mentioned
   - What this means for Google specifically
   - Which links would be worth following for more detail
4. Identify any trend signals across the stories
5. Provide a final executive summary

Think through this step by step, showing your reasoning."#;

/// Built-in output schema for the structuring pass
const DEFAULT_SCHEMA: &str = r#"{
  "executive_summary": "3-4 sentences for a VP",
  "stories": [
    {
      "title": "Story title",
      "category": "competitive_intelligence | talent_market | infrastructure | product_development | regulation | research",
      "key_facts": ["fact1", "fact2"],
      "companies": ["company1", "company2"],
      "google_implications": "What this means for Google",
      "confidence": "high | medium | low",
      "reasoning": "Brief explanation of how you arrived at this analysis",
      "links_to_follow": ["link descriptions worth fetching"]
    }
  ],
  "trend_signals": [
    {
      "trend": "Trend name",
      "evidence": "Evidence from newsletter",
      "trajectory": "accelerating | stable | uncertain"
    }
  ],
  "action_items": ["Specific recommendations"],
  "analysis_notes": "Any caveats or limitations in this analysis"
}"#;

/// Field names rendered as example lists rather than scalar placeholders
const LIST_FIELDS: &[&str] = &[
    "stories",
    "key_facts",
    "companies",
    "links_to_follow",
    "action_items",
    "trend_signals",
];

/// Task prompt template with a single named slot for the email body
///
/// Parsed once from the template string; rendering is a pure concatenation,
/// so placeholder-shaped text inside the email body cannot be re-expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    before: String,
    after: String,
}

impl TaskTemplate {
    /// Parse a template string; `None` when the slot is absent
    pub fn parse(template: &str) -> Option<Self> {
        let slot = template.find(EMAIL_CONTENT_SLOT)?;
        Some(Self {
            before: template[..slot].to_string(),
            after: template[slot + EMAIL_CONTENT_SLOT.len()..].to_string(),
        })
    }

    /// Render the template with the email body in the slot
    pub fn render(&self, email_content: &str) -> String {
        format!("{}{}{}", self.before, email_content, self.after)
    }
}

impl Default for TaskTemplate {
    fn default() -> Self {
        // The built-in template always contains the slot.
        Self::parse(DEFAULT_ANALYSIS_TASK_PROMPT).unwrap_or(Self {
            before: String::new(),
            after: String::new(),
        })
    }
}

/// Resolved prompt bundle for one extraction
///
/// Built from an [`ExtractionConfig`] with per-field fallback: any absent or
/// unusable override reverts to the built-in default.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Pass-1 system prompt
    pub system_prompt: String,

    /// Pass-1 task template
    pub task_template: TaskTemplate,

    /// Custom schema for the structuring instruction, when configured
    pub schema: Option<SchemaSpec>,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_ANALYSIS_SYSTEM_PROMPT.to_string(),
            task_template: TaskTemplate::default(),
            schema: None,
        }
    }
}

impl PromptSet {
    /// Resolve a prompt set from configuration
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let system_prompt = config
            .analysis_system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_ANALYSIS_SYSTEM_PROMPT.to_string());

        // A custom task prompt without the content slot is unusable; fall
        // back rather than fail.
        let task_template = config
            .analysis_task_prompt
            .as_deref()
            .and_then(TaskTemplate::parse)
            .unwrap_or_default();

        let schema = config.schema.clone().filter(|s| !s.is_empty());

        Self {
            system_prompt,
            task_template,
            schema,
        }
    }

    /// Render the Pass-1 user prompt for the given email body
    pub fn render_task(&self, email_content: &str) -> String {
        self.task_template.render(email_content)
    }
}

/// Render the Pass-2 structuring prompt
///
/// Replays the Pass-1 analysis and demands JSON matching either the custom
/// schema or the built-in default. The instruction explicitly forbids prose
/// and markdown fencing around the JSON.
pub fn render_structuring_prompt(analysis_text: &str, schema: Option<&SchemaSpec>) -> String {
    let schema_block = match schema {
        Some(spec) => render_schema(spec),
        None => DEFAULT_SCHEMA.to_string(),
    };

    format!(
        "Based on your analysis above, now provide a structured JSON output.\n\n\
         Your analysis:\n{}\n\n\
         Please provide the final output as JSON with this structure:\n\n{}\n\n\
         Respond with ONLY valid JSON. Do not wrap it in markdown code fences \
         and do not add any text before or after the JSON object.",
        analysis_text, schema_block
    )
}

/// Render a custom schema as an example JSON object
///
/// Required fields are enumerated first, then optional fields, each in the
/// order given. Optional placeholders carry an "(optional)" marker so the
/// model may omit them without violating the format. Known multi-valued
/// fields render as a short example list.
pub fn render_schema(spec: &SchemaSpec) -> String {
    let mut lines = Vec::with_capacity(spec.required_fields.len() + spec.optional_fields.len());

    for field in &spec.required_fields {
        lines.push(render_field(field, false));
    }
    for field in &spec.optional_fields {
        lines.push(render_field(field, true));
    }

    format!("{{\n{}\n}}", lines.join(",\n"))
}

fn render_field(name: &str, optional: bool) -> String {
    let is_list = LIST_FIELDS.contains(&name);
    match (is_list, optional) {
        (true, false) => format!("  \"{}\": [\"example\", \"example\"]", name),
        (true, true) => format!("  \"{}\": [\"example (optional)\"]", name),
        (false, false) => format!("  \"{}\": \"...\"", name),
        (false, true) => format!("  \"{}\": \"... (optional)\"", name),
    }
}
