use std::io::{self, Read};

use crate::types::SessionSnapshot;

pub trait StdinCollector {
    fn read_input(&mut self) -> io::Result<String>;
}

/// Reads the whole process stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessStdinCollector;

impl StdinCollector for ProcessStdinCollector {
    fn read_input(&mut self) -> io::Result<String> {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(input)
    }
}

#[derive(Debug, Default)]
pub struct StubStdinCollector {
    pub input: String,
}

impl StdinCollector for StubStdinCollector {
    fn read_input(&mut self) -> io::Result<String> {
        Ok(std::mem::take(&mut self.input))
    }
}

/// `Ok(None)` for empty or whitespace-only input (the host has not sent a
/// snapshot yet).
pub fn parse_snapshot(input: &str) -> Result<Option<SessionSnapshot>, serde_json::Error> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(input).map(Some)
}
