//! Built-in chat template: the model's Jinja template in rich mode, ChatML
//! role markers in plain mode.

use chatgen_abi::{
    ChatMessage, ChatTemplate, InferenceEngine, RenderFailure, RenderMode, RenderedPrompt,
};
use minijinja::{Environment, Error, ErrorKind, context};

/// End-of-turn markers picked up as stops when they appear in a template.
const KNOWN_TURN_ENDS: &[&str] = &["<|im_end|>", "<|eot_id|>", "<|end|>", "<end_of_turn>", "</s>"];

const PLAIN_TURN_END: &str = "<|im_end|>";

#[derive(Debug, Clone, Default)]
pub struct JinjaTemplate {
    source: Option<String>,
    bos_token: String,
    eos_token: String,
}

impl JinjaTemplate {
    pub fn new<S: Into<String>>(source: Option<S>, bos_token: S, eos_token: S) -> Self {
        Self {
            source: source.map(Into::into),
            bos_token: bos_token.into(),
            eos_token: eos_token.into(),
        }
    }

    /// Template with no native source; every render lands in plain mode.
    pub fn plain_only() -> Self {
        Self::default()
    }

    /// Pull the native template and special-token text from an engine.
    pub fn from_engine<E: InferenceEngine + ?Sized>(engine: &E) -> Self {
        Self {
            source: engine.chat_template_source(),
            bos_token: engine.bos_text(),
            eos_token: engine.eos_text(),
        }
    }

    pub fn has_native_source(&self) -> bool {
        self.source.is_some()
    }

    fn render_rich(&self, messages: &[ChatMessage]) -> Result<RenderedPrompt, RenderFailure> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| RenderFailure::new("model ships no chat template"))?;

        let mut env = Environment::new();
        env.add_function("raise_exception", raise_exception);
        env.add_template("chat", source)
            .map_err(|e| RenderFailure::new(format!("template compile: {e}")))?;
        let tmpl = env
            .get_template("chat")
            .map_err(|e| RenderFailure::new(e.to_string()))?;

        let prompt = tmpl
            .render(context! {
                messages => messages,
                add_generation_prompt => true,
                bos_token => &self.bos_token,
                eos_token => &self.eos_token,
            })
            .map_err(|e| RenderFailure::new(format!("template render: {e}")))?;

        let additional_stops = KNOWN_TURN_ENDS
            .iter()
            .filter(|m| source.contains(**m))
            .map(|m| m.to_string())
            .collect();

        Ok(RenderedPrompt {
            prompt,
            additional_stops,
        })
    }

    fn render_plain(&self, messages: &[ChatMessage]) -> RenderedPrompt {
        let mut prompt = String::with_capacity(
            messages.iter().map(|m| m.content.len() + 32).sum::<usize>() + 32,
        );
        for m in messages {
            prompt.push_str("<|im_start|>");
            prompt.push_str(m.role.as_str());
            prompt.push('\n');
            prompt.push_str(&m.content);
            prompt.push_str(PLAIN_TURN_END);
            prompt.push('\n');
        }
        prompt.push_str("<|im_start|>assistant\n");

        RenderedPrompt {
            prompt,
            additional_stops: vec![PLAIN_TURN_END.to_string()],
        }
    }
}

impl ChatTemplate for JinjaTemplate {
    fn render(
        &self,
        messages: &[ChatMessage],
        mode: RenderMode,
    ) -> Result<RenderedPrompt, RenderFailure> {
        match mode {
            RenderMode::Rich => self.render_rich(messages),
            RenderMode::Plain => Ok(self.render_plain(messages)),
        }
    }
}

fn raise_exception(msg: String) -> Result<String, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, msg))
}
