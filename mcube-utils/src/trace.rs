use anyhow::{anyhow, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Appends `iteration value` lines to a text file, one per search step.
pub struct TraceWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
}

impl TraceWriter {
    /// Creates (or truncates) the trace file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| anyhow!("Failed to create trace file {:?}: {}", path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    pub fn record(&mut self, iteration: usize, value: f64) -> Result<()> {
        writeln!(self.writer, "{} {:.6}", iteration, value)
            .map_err(|e| anyhow!("Failed to write trace file {:?}: {}", self.path, e))?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| anyhow!("Failed to flush trace file {:?}: {}", self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> usize {
        self.records
    }
}
