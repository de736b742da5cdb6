//! console output of the fixture
//!
//! the startup line and every logged POST payload go through a [`Console`],
//! so tests can capture exactly what the process would print

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Console: Send + Sync {
    fn write_line(&self, line: &str);
}

/// writes each line to the process stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn write_line(&self, line: &str) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            error!("console write err = {:?}", e);
        }
    }
}

/// keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct CaptureConsole {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CaptureConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Vec<String>> {
        match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// snapshot of the captured lines
    pub fn lines(&self) -> Vec<String> {
        self.locked().clone()
    }

    /// how many captured lines equal `line`
    pub fn count(&self, line: &str) -> usize {
        self.locked().iter().filter(|l| l.as_str() == line).count()
    }
}

impl Console for CaptureConsole {
    fn write_line(&self, line: &str) {
        self.locked().push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_is_shared_between_clones() {
        let console = CaptureConsole::new();
        let clone = console.clone();
        clone.write_line("a=1&b=2");
        console.write_line("Server running");
        assert_eq!(console.lines(), vec!["a=1&b=2", "Server running"]);
        assert_eq!(console.count("a=1&b=2"), 1);
    }

    #[test]
    fn works_behind_a_trait_object() {
        let capture = CaptureConsole::new();
        let console: Arc<dyn Console> = Arc::new(capture.clone());
        console.write_line("Ok");
        assert_eq!(capture.count("Ok"), 1);
    }
}
