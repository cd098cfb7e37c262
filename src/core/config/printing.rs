use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        let agent = self.agent_config();
        let models = self.model_policy();

        println!("Current configuration:");
        match &self.default_persona {
            Some(persona) => println!("  default-persona: {persona}"),
            None => println!("  default-persona: (unset, {})", agent.persona),
        }
        match agent.use_search {
            true => println!("  web-search: on"),
            false => println!("  web-search: off"),
        }
        println!("  temperature: {}", agent.temperature);
        println!("  fast-model: {}", models.fast_model);
        println!("  pro-model: {}", models.pro_model);
        println!("  base-url: {}", self.base_url());
    }
}
