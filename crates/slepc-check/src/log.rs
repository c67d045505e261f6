//! The `configure.log` file.
//!
//! Everything the probes produce goes to the log, including the generated
//! programs and the compiler output. Only section titles and `println`
//! messages are also reported through `tracing`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

const SEPARATOR_WIDTH: usize = 80;

enum Sink {
    File(BufWriter<File>),
    Memory(String),
}

pub struct ConfigureLog {
    sink: Sink,
}

impl ConfigureLog {
    /// Opens the log file for appending, creating it if needed, and writes
    /// the header of a new run. Earlier runs stay in the file.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        let mut log = Self {
            sink: Sink::File(BufWriter::new(file)),
        };
        log.header()?;
        Ok(log)
    }

    /// Log kept in memory, mostly for tests.
    pub fn in_memory() -> Self {
        Self {
            sink: Sink::Memory(String::new()),
        }
    }

    /// Text collected by an in-memory log.
    pub fn captured(&self) -> Option<&str> {
        match &self.sink {
            Sink::Memory(buf) => Some(buf),
            Sink::File(_) => None,
        }
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        match &mut self.sink {
            Sink::File(out) => {
                out.write_all(text.as_bytes())?;
                out.write_all(b"\n")?;
            }
            Sink::Memory(buf) => {
                buf.push_str(text);
                buf.push('\n');
            }
        }
        Ok(())
    }

    pub fn println(&mut self, text: &str) -> Result<()> {
        tracing::info!("{text}");
        self.write(text)
    }

    pub fn new_section(&mut self, title: &str) -> Result<()> {
        self.write(&"=".repeat(SEPARATOR_WIDTH))?;
        self.println(title)
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Sink::File(out) = &mut self.sink {
            out.flush()?;
        }
        Ok(())
    }

    fn header(&mut self) -> Result<()> {
        let now = chrono::Local::now();
        self.write(&"=".repeat(SEPARATOR_WIDTH))?;
        self.write(&format!(
            "Starting configure run at {}",
            now.format("%a, %d %b %Y %H:%M:%S %z")
        ))?;
        self.write(&"=".repeat(SEPARATOR_WIDTH))
    }
}

impl Drop for ConfigureLog {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!("failed to flush configure log: {err}");
        }
    }
}
