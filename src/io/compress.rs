//! External compression of text output.
//!
//! Compressed output is produced by piping the body through a compressor
//! program (pigz, lz4c, gzip, ...) whose stdout is the output file. Programs
//! are looked up through a [`ProgramLocator`] so tests can control what is
//! "installed". A `.gz` output with no compressor program is gzipped in
//! process with `flate2`.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::str::FromStr;

use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;
use tracing::{debug, info, warn};

const SINK_BUFFER_SIZE: usize = 1 << 20;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Unsupported compression method: {0}")]
    Unsupported(String),

    #[error("Compressor '{0}' not found in PATH")]
    NotFound(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} compression failed ({status})")]
    Failed { program: String, status: ExitStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Requested compression program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressMethod {
    /// First available of pigz, lz4c, gzip; none if nothing is found
    #[default]
    Auto,
    Pigz,
    Gzip,
    Lzop,
    Lz4c,
    Lz4,
    Snzip,
    None,
}

impl CompressMethod {
    /// Program name, `None` for `Auto` and `None`
    #[must_use]
    pub fn program(self) -> Option<&'static str> {
        match self {
            Self::Pigz => Some("pigz"),
            Self::Gzip => Some("gzip"),
            Self::Lzop => Some("lzop"),
            Self::Lz4c => Some("lz4c"),
            Self::Lz4 => Some("lz4"),
            Self::Snzip => Some("snzip"),
            Self::Auto | Self::None => None,
        }
    }

    /// Whether the output is gzip data. `None` counts: unnamed `.gz` outputs
    /// are gzipped in process.
    #[must_use]
    pub fn writes_gzip(self) -> bool {
        matches!(self, Self::Pigz | Self::Gzip | Self::None)
    }

    fn args(self, threads: usize) -> Vec<String> {
        match self {
            Self::Pigz => vec!["-p".to_string(), threads.max(1).to_string()],
            Self::Auto | Self::None => Vec::new(),
            _ => vec!["-c".to_string()],
        }
    }
}

impl FromStr for CompressMethod {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "pigz" => Ok(Self::Pigz),
            "gzip" => Ok(Self::Gzip),
            "lzop" => Ok(Self::Lzop),
            "lz4c" => Ok(Self::Lz4c),
            "lz4" => Ok(Self::Lz4),
            "snzip" => Ok(Self::Snzip),
            "none" => Ok(Self::None),
            other => Err(CompressError::Unsupported(other.to_string())),
        }
    }
}

impl fmt::Display for CompressMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::None => write!(f, "none"),
            other => write!(f, "{}", other.program().unwrap_or_default()),
        }
    }
}

/// Finds executables by name
pub trait ProgramLocator {
    fn find(&self, program: &str) -> Option<PathBuf>;
}

/// Looks programs up on `$PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPath;

impl ProgramLocator for SystemPath {
    fn find(&self, program: &str) -> Option<PathBuf> {
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// A resolved compressor: the method plus the command to run, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressor {
    pub method: CompressMethod,
    pub program: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Compressor {
    /// No compression
    #[must_use]
    pub fn none() -> Self {
        Self {
            method: CompressMethod::None,
            program: None,
            args: Vec::new(),
        }
    }

    fn resolved(method: CompressMethod, program: PathBuf, threads: usize) -> Self {
        Self {
            method,
            program: Some(program),
            args: method.args(threads),
        }
    }
}

/// Resolve a compression method against the available programs.
///
/// `Auto` prefers pigz, then lz4c, then gzip (with a warning) and finally no
/// compression (with a warning). A named method must be available.
///
/// lz4c, lz4, lzop and snzip do not write gzip, whatever the output suffix;
/// see [`CompressMethod::writes_gzip`].
///
/// # Errors
///
/// Returns `CompressError::NotFound` if an explicitly named program is not
/// available.
pub fn choose_compressor(
    method: CompressMethod,
    threads: usize,
    locator: &dyn ProgramLocator,
) -> Result<Compressor, CompressError> {
    match method {
        CompressMethod::None => Ok(Compressor::none()),
        CompressMethod::Auto => {
            for candidate in [CompressMethod::Pigz, CompressMethod::Lz4c, CompressMethod::Gzip] {
                let Some(name) = candidate.program() else {
                    continue;
                };
                if let Some(path) = locator.find(name) {
                    if candidate == CompressMethod::Gzip {
                        warn!("lz4c and pigz not found. Falling back to gzip.");
                    }
                    debug!(program = %path.display(), "Selected compressor");
                    return Ok(Compressor::resolved(candidate, path, threads));
                }
            }
            warn!("No compressor found in PATH. Using no compression.");
            Ok(Compressor::none())
        }
        named => {
            let name = named.program().unwrap_or_default();
            let path = locator
                .find(name)
                .ok_or_else(|| CompressError::NotFound(name.to_string()))?;
            Ok(Compressor::resolved(named, path, threads))
        }
    }
}

enum SinkWriter {
    File(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Pipe(BufWriter<ChildStdin>),
}

impl SinkWriter {
    /// Flush everything, writing the gzip trailer if any
    fn close(self) -> std::io::Result<()> {
        match self {
            Self::File(mut w) => w.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
            Self::Pipe(mut w) => w.flush(),
        }
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::File(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
            Self::Pipe(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::File(w) => w.write_all(buf),
            Self::Gzip(w) => w.write_all(buf),
            Self::Pipe(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::File(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
            Self::Pipe(w) => w.flush(),
        }
    }
}

/// Output file, written either directly or through a compressor process.
///
/// Call [`OutputSink::finish`] to flush, close the pipe and check the
/// compressor's exit status. Dropping an unfinished sink closes the pipe and
/// reaps the child without checking it.
pub struct OutputSink {
    writer: Option<SinkWriter>,
    child: Option<(String, Child)>,
}

impl OutputSink {
    /// Create the output file and start the compressor, if any.
    ///
    /// # Errors
    ///
    /// Returns `CompressError::Io` if the file cannot be created and
    /// `CompressError::Spawn` if the compressor cannot be started.
    pub fn create(path: &Path, compressor: &Compressor) -> Result<Self, CompressError> {
        let file = File::create(path)?;

        let Some(program) = &compressor.program else {
            let buffered = BufWriter::with_capacity(SINK_BUFFER_SIZE, file);
            let writer = if path.to_string_lossy().ends_with(".gz") {
                debug!(output = %path.display(), "Compressing output in process");
                SinkWriter::Gzip(GzEncoder::new(buffered, Compression::default()))
            } else {
                SinkWriter::File(buffered)
            };
            return Ok(Self {
                writer: Some(writer),
                child: None,
            });
        };

        let name = compressor.method.to_string();
        info!(program = %name, output = %path.display(), "Compressing output");
        if !compressor.method.writes_gzip() && path.to_string_lossy().ends_with(".gz") {
            warn!(
                program = %name,
                output = %path.display(),
                "Compressor does not write gzip, the output cannot be read back as .gz"
            );
        }
        let mut child = Command::new(program)
            .args(&compressor.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(file))
            .spawn()
            .map_err(|source| CompressError::Spawn {
                program: name.clone(),
                source,
            })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CompressError::Spawn {
                program: name,
                source: std::io::Error::other("failed to open pipe"),
            });
        };

        Ok(Self {
            writer: Some(SinkWriter::Pipe(BufWriter::with_capacity(SINK_BUFFER_SIZE, stdin))),
            child: Some((name, child)),
        })
    }

    /// Flush all output and wait for the compressor to exit.
    ///
    /// # Errors
    ///
    /// Returns `CompressError::Io` on write failure and
    /// `CompressError::Failed` if the compressor exits unsuccessfully.
    pub fn finish(mut self) -> Result<(), CompressError> {
        if let Some(writer) = self.writer.take() {
            // Closing the pipe lets the compressor see EOF
            writer.close()?;
        }

        if let Some((program, mut child)) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                return Err(CompressError::Failed { program, status });
            }
            debug!(program = %program, "Compressor finished");
        }
        Ok(())
    }

    /// Convert a write failure into the error to report.
    ///
    /// A compressor that exits early surfaces as a broken pipe on the next
    /// write. The pipe is closed and the child reaped; if it exited
    /// unsuccessfully, `CompressError::Failed` is returned in place of the
    /// write error.
    #[must_use]
    pub fn fail(mut self, error: std::io::Error) -> CompressError {
        drop(self.writer.take());

        if let Some((program, mut child)) = self.child.take() {
            match child.wait() {
                Ok(status) if !status.success() => {
                    return CompressError::Failed { program, status };
                }
                Ok(_) => {}
                Err(e) => debug!(program = %program, error = %e, "Could not wait for compressor"),
            }
        }
        CompressError::Io(error)
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.writer {
            Some(w) => w.write(buf),
            None => Err(std::io::Error::other("output already finished")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.writer {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        drop(self.writer.take());
        if let Some((_, mut child)) = self.child.take() {
            let _ = child.wait();
        }
    }
}
