use directories::ProjectDirs;
use log::LevelFilter;
use std::fs;
use std::io::Write;

use crate::Result;

/// Initialize the logger with file and console output
///
/// # Arguments
///
/// * `verbose` - Enable debug level logging
/// * `quiet` - Suppress console output (logs still written to file)
///
/// Console logs go to stderr so they never mix with the report on stdout.
/// The level can be overridden with `KUBEMEM_LOG`.
///
/// # Platform-specific log locations
///
/// * **macOS**: `~/Library/Application Support/io.kubemem.kubemem/kubemem.log`
/// * **Linux**: `~/.local/share/kubemem/kubemem.log`
/// * **Windows**: `C:\Users\<User>\AppData\Local\kubemem\kubemem\data\kubemem.log`
///
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_path = if let Some(proj_dirs) = ProjectDirs::from("io", "kubemem", "kubemem") {
        let log_dir = proj_dirs.data_local_dir();
        fs::create_dir_all(log_dir).map_err(|e| {
            crate::ConfigError::InvalidValue(format!("Failed to create log directory: {}", e))
        })?;
        log_dir.join("kubemem.log")
    } else {
        std::env::temp_dir().join("kubemem.log")
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| crate::ConfigError::InvalidValue(format!("Failed to open log file: {}", e)))?;

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log_level)
        .parse_env("KUBEMEM_LOG")
        .format_timestamp_secs();

    if quiet {
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter {
            console: std::io::stderr(),
            file: log_file,
        })));
    }

    builder.try_init().map_err(|e| {
        crate::ConfigError::InvalidValue(format!("Failed to initialize logger: {}", e))
    })?;

    log::debug!("Logging to: {}", log_path.display());

    Ok(())
}

/// Writes every record to stderr and the log file
struct TeeWriter {
    console: std::io::Stderr,
    file: fs::File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.console.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.console.flush()?;
        self.file.flush()?;
        Ok(())
    }
}
