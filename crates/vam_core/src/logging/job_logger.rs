//! Per-job logger with file and callback output.
//!
//! Each job gets its own logger that:
//! - Writes to a dedicated log file, or keeps lines in memory
//! - Sends messages to a GUI callback (if provided)
//! - Keeps a tail of external tool output for failure diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{GuiLogCallback, LogConfig, LogLevel, MessagePrefix};

enum Sink {
    File {
        path: PathBuf,
        writer: Mutex<Option<BufWriter<File>>>,
    },
    Memory(Mutex<Vec<String>>),
}

/// Per-job logger.
pub struct JobLogger {
    job_name: String,
    sink: Sink,
    gui_callback: Mutex<Option<GuiLogCallback>>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
}

impl JobLogger {
    /// Create a logger writing to `<log_dir>/<job_name>.log`.
    pub fn new(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        gui_callback: Option<GuiLogCallback>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();
        let file_stem = job_name.clone();
        Self::with_file_stem(job_name, log_dir, &file_stem, config, gui_callback)
    }

    /// Create a logger for `job_name` writing to `<log_dir>/<file_stem>.log`.
    pub fn with_file_stem(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        file_stem: &str,
        config: LogConfig,
        gui_callback: Option<GuiLogCallback>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let path = log_dir.join(format!("{}.log", sanitize_filename(file_stem)));
        let writer = BufWriter::new(File::create(&path)?);

        Ok(Self::with_sink(
            job_name,
            Sink::File {
                path,
                writer: Mutex::new(Some(writer)),
            },
            config,
            gui_callback,
        ))
    }

    /// Create a logger that keeps its lines in memory.
    pub fn in_memory(job_name: impl Into<String>, config: LogConfig) -> Self {
        Self::with_sink(job_name.into(), Sink::Memory(Mutex::new(Vec::new())), config, None)
    }

    fn with_sink(
        job_name: String,
        sink: Sink,
        config: LogConfig,
        gui_callback: Option<GuiLogCallback>,
    ) -> Self {
        let capacity = config.error_tail;
        Self {
            job_name,
            sink,
            gui_callback: Mutex::new(gui_callback),
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Log file path, `None` for in-memory loggers.
    pub fn log_path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::File { path, .. } => Some(path),
            Sink::Memory(_) => None,
        }
    }

    /// Lines written so far by an in-memory logger.
    pub fn lines(&self) -> Vec<String> {
        match &self.sink {
            Sink::Memory(lines) => lines.lock().clone(),
            Sink::File { .. } => Vec::new(),
        }
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a command line about to run.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Record one line of external tool output.
    ///
    /// Always kept in the tail buffer; echoed only outside compact mode.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut buffer = self.tail_buffer.lock();
            if buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }

        if self.config.compact {
            return;
        }

        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.output(&self.format_message(&format!("{}{}", prefix, line)));
    }

    /// Record every line of a captured output block.
    pub fn output_text(&self, text: &str, is_stderr: bool) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.output_line(line, is_stderr);
        }
    }

    /// Print the tail buffer (typically after an error).
    pub fn show_tail(&self, header: &str) {
        let buffer = self.tail_buffer.lock();
        if buffer.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in buffer.iter() {
            self.output(&self.format_message(line));
        }
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Dump command tokens one option per line.
    pub fn log_options_pretty(&self, program: &str, tokens: &[String]) {
        self.info(&format!("--- {} options (pretty) ---", program));
        self.info(&format_tokens_pretty(tokens));
        self.info("---------------------------------");
    }

    pub fn flush(&self) {
        if let Sink::File { writer, .. } = &self.sink {
            if let Some(ref mut w) = *writer.lock() {
                let _ = w.flush();
            }
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        if let Sink::File { writer, .. } = &self.sink {
            *writer.lock() = None;
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        match &self.sink {
            Sink::File { writer, .. } => {
                if let Some(ref mut w) = *writer.lock() {
                    let _ = writeln!(w, "{}", formatted);
                }
            }
            Sink::Memory(lines) => lines.lock().push(formatted.to_string()),
        }

        if let Some(ref callback) = *self.gui_callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Group tokens so each option sits on its own continuation line with its value.
pub fn format_tokens_pretty(tokens: &[String]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for token in tokens {
        let starts_option = token.starts_with('-') && token.len() > 1 && !is_number(token);
        match lines.last_mut() {
            Some(line) if !starts_option && line.starts_with('-') && !line.contains(' ') => {
                line.push(' ');
                line.push_str(token);
            }
            _ => lines.push(token.clone()),
        }
    }
    lines.join(" \\\n  ")
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn plain() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..Default::default()
        }
    }

    #[test]
    fn creates_log_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("test_job", dir.path(), LogConfig::default(), None).unwrap();

        let path = logger.log_path().unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("test_job.log"));
    }

    #[test]
    fn file_stem_is_independent_of_job_name() {
        let dir = tempdir().unwrap();
        let logger =
            JobLogger::with_file_stem("intro", dir.path(), "intro_3f9a", plain(), None).unwrap();

        assert_eq!(logger.job_name(), "intro");
        assert_eq!(logger.log_path().unwrap(), dir.path().join("intro_3f9a.log"));
    }

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("test_job", dir.path(), LogConfig::default(), None).unwrap();

        logger.info("Test message");
        logger.flush();

        let content = fs::read_to_string(logger.log_path().unwrap()).unwrap();
        assert!(content.contains("Test message"));
    }

    #[test]
    fn calls_gui_callback() {
        let dir = tempdir().unwrap();
        let call_count = Arc::new(AtomicUsize::new(0));
        let count_clone = call_count.clone();

        let callback: GuiLogCallback = Box::new(move |_msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger =
            JobLogger::new("test_job", dir.path(), LogConfig::default(), Some(callback)).unwrap();

        logger.info("Message 1");
        logger.info("Message 2");

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn memory_logger_keeps_prefixed_lines() {
        let logger = JobLogger::in_memory("job", plain());
        logger.phase("Extend");
        logger.command("ffmpeg -i a.mp4");
        logger.debug("hidden");
        logger.error("boom");

        assert_eq!(
            logger.lines(),
            vec!["=== Extend ===", "$ ffmpeg -i a.mp4", "[ERROR] boom"]
        );
    }

    #[test]
    fn compact_mode_keeps_tool_output_in_tail_only() {
        let logger = JobLogger::in_memory("job", plain());
        logger.output_text("line one\n\nline two\n", true);
        assert!(logger.lines().is_empty());
        assert_eq!(logger.get_tail(), vec!["line one", "line two"]);

        logger.show_tail("ffmpeg");
        assert_eq!(logger.lines()[0], "[ffmpeg/tail]");
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let config = LogConfig {
            error_tail: 5,
            ..plain()
        };
        let logger = JobLogger::in_memory("job", config);

        for i in 0..10 {
            logger.output_line(&format!("Line {}", i), false);
        }

        let tail = logger.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");
    }

    #[test]
    fn pretty_tokens_pair_options_with_values() {
        let tokens: Vec<String> = ["-i", "in.mp4", "-map", "0:v:0", "-itsoffset", "-1.5", "out.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            format_tokens_pretty(&tokens),
            "-i in.mp4 \\\n  -map 0:v:0 \\\n  -itsoffset -1.5 \\\n  out.mp4"
        );
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
