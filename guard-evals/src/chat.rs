use guard_adapters::traits::{
    AdapterResult, InferenceRequest, MessageRole, ModelAdapter, PromptMessage, collect_text,
};

/// Sampling settings for one evaluation question.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Sampling {
    pub(crate) temperature: f32,
    pub(crate) top_p: Option<f32>,
    pub(crate) max_output_tokens: u32,
}

/// Sends a system + user exchange and returns the trimmed answer.
pub(crate) async fn ask(
    adapter: &dyn ModelAdapter,
    model: &str,
    system_prompt: &str,
    question: &str,
    sampling: Sampling,
) -> AdapterResult<String> {
    let mut request =
        InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, question)])?
            .with_system_prompt(system_prompt)
            .with_model(model)
            .with_temperature(sampling.temperature)
            .with_max_output_tokens(sampling.max_output_tokens);
    if let Some(top_p) = sampling.top_p {
        request = request.with_top_p(top_p);
    }

    let stream = adapter.infer(request).await?;
    let text = collect_text(stream).await?;
    Ok(text.trim().to_owned())
}
