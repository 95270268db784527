use crate::core::message::{Message, Sender};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Plain-text transcript log enabled with `--log <file>`.
pub struct LoggingState {
    file_path: Option<String>,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = log_file.as_deref() {
            Self::test_file_access(path)?;
        }
        Ok(LoggingState {
            file_path: log_file,
        })
    }

    pub fn disabled() -> Self {
        LoggingState { file_path: None }
    }

    pub fn log_message(&self, message: &Message) -> Result<(), Box<dyn std::error::Error>> {
        if message.text.is_empty() {
            return Ok(());
        }
        match message.sender {
            Sender::User => self.write_block(&format!("You: {}", message.text)),
            Sender::Assistant => self.write_block(&message.text),
        }
    }

    /// Write a `##` marker line, e.g. when the conversation is cleared.
    pub fn log_marker(&self, label: &str) -> Result<(), Box<dyn std::error::Error>> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.write_block(&format!("## {label} ({stamp})"))
    }

    fn write_block(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref() else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn get_status_string(&self) -> String {
        match &self.file_path {
            None => "off".to_string(),
            Some(path) => Path::new(path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned(),
        }
    }

    fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}
