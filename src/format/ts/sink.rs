use log::info;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default extension for elementary stream output files.
pub const DEFAULT_EXTENSION: &str = "h264";

/// Maps a PID to a writable, append-only destination for its elementary
/// stream bytes.
///
/// The assembler calls `create_sink` at most once per PID, the first time
/// that PID has a completed unit to flush.
pub trait SinkFactory {
    /// Destination type handed out for each PID
    type Sink: Write;

    /// Opens the sink for `pid`.
    fn create_sink(&mut self, pid: u16) -> io::Result<Self::Sink>;
}

/// Writes each PID to `<dir>/output_<pid>.<extension>`.
#[derive(Debug, Clone)]
pub struct FileSinkFactory {
    dir: PathBuf,
    extension: String,
}

impl FileSinkFactory {
    /// Creates the output directory (and parents) if it does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            extension: DEFAULT_EXTENSION.to_string(),
        })
    }

    /// Sets the file extension, without the leading dot.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the sink for `pid` is written to.
    pub fn path_for(&self, pid: u16) -> PathBuf {
        self.dir.join(format!("output_{}.{}", pid, self.extension))
    }
}

impl SinkFactory for FileSinkFactory {
    type Sink = BufWriter<File>;

    fn create_sink(&mut self, pid: u16) -> io::Result<Self::Sink> {
        let path = self.path_for(pid);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Created output file for PID {}: {}", pid, path.display());
        Ok(BufWriter::new(file))
    }
}

type SharedOutputs = Arc<Mutex<HashMap<u16, Vec<u8>>>>;

/// Collects every PID's output in memory.
///
/// Clones share the same storage, so a caller can keep one handle while
/// the assembler owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySinkFactory {
    outputs: SharedOutputs,
}

impl MemorySinkFactory {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written for `pid` so far, or `None` if no sink was created.
    pub fn contents(&self, pid: u16) -> Option<Vec<u8>> {
        self.outputs.lock().get(&pid).cloned()
    }

    /// PIDs that have a sink, in ascending order.
    pub fn pids(&self) -> Vec<u16> {
        let mut pids: Vec<u16> = self.outputs.lock().keys().copied().collect();
        pids.sort_unstable();
        pids
    }
}

impl SinkFactory for MemorySinkFactory {
    type Sink = MemorySink;

    fn create_sink(&mut self, pid: u16) -> io::Result<Self::Sink> {
        self.outputs.lock().entry(pid).or_default();
        Ok(MemorySink {
            pid,
            outputs: Arc::clone(&self.outputs),
        })
    }
}

/// Sink handed out by [`MemorySinkFactory`].
#[derive(Debug)]
pub struct MemorySink {
    pid: u16,
    outputs: SharedOutputs,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outputs
            .lock()
            .entry(self.pid)
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
