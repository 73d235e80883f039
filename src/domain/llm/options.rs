use super::Tool;

/// Options accepted by every completer and backend
#[derive(Debug, Clone, Default)]
pub struct CompleteOptions {
    pub stop: Vec<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub tools: Vec<Tool>,
}

impl CompleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_empty() {
        let options = CompleteOptions::new();
        assert!(options.stop.is_empty());
        assert!(options.max_tokens.is_none());
        assert!(options.temperature.is_none());
        assert!(options.tools.is_empty());
    }

    #[test]
    fn test_options_builder() {
        let options = CompleteOptions::new()
            .with_stop(vec!["\nObservation:".into()])
            .with_temperature(0.0)
            .with_max_tokens(256);

        assert_eq!(options.stop, vec!["\nObservation:".to_string()]);
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.max_tokens, Some(256));
    }
}
