use common::error::AppError;
use minijinja::{context, Environment};

const SYSTEM_PROMPT_TEMPLATE: &str = r"You are a helpful assistant answering questions about a private document collection.
Base your answers on the context below. When the context does not contain the
answer, say so plainly instead of guessing. Mention the source file of the
passages you relied on.

Context:
{{ context }}";

/// Renders the system prompt the chat model sees for one question.
pub fn render_system_prompt(context_json: &serde_json::Value) -> Result<String, AppError> {
    let mut env = Environment::new();
    env.add_template("chat_system", SYSTEM_PROMPT_TEMPLATE)?;
    let template = env.get_template("chat_system")?;
    let rendered = template.render(context! { context => context_json.to_string() })?;
    Ok(rendered)
}
