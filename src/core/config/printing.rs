use crate::core::background::BackgroundConfig;
use crate::core::config::data::Config;

impl Config {
    pub fn render_all(&self) -> String {
        fn or_default(value: Option<String>, fallback: String) -> String {
            value.unwrap_or_else(|| format!("{fallback} (default)"))
        }

        let mut out = String::from("Current configuration:\n");
        out.push_str(&format!(
            "  server-url: {}\n",
            or_default(self.server_url.clone(), self.server_url().to_string())
        ));
        out.push_str(&format!(
            "  greeting: {}\n",
            or_default(self.greeting.clone(), self.greeting().to_string())
        ));
        out.push_str(&format!(
            "  typewriter-interval-ms: {}\n",
            or_default(
                self.typewriter_interval_ms.map(|ms| ms.to_string()),
                self.typewriter_interval().as_millis().to_string()
            )
        ));
        out.push_str(&format!(
            "  background: {}\n",
            or_default(
                self.background.map(|on| on_off(on).to_string()),
                on_off(self.background_enabled()).to_string()
            )
        ));
        out.push_str(&format!(
            "  particle-count: {}\n",
            or_default(
                self.particle_count.map(|count| count.to_string()),
                BackgroundConfig::default().particle_count.to_string()
            )
        ));
        out
    }

    pub fn print_all(&self) {
        print!("{}", self.render_all());
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
