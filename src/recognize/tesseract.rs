//! `tesseract` command-line engine.

use super::{OcrConfig, RecognizeError, TextRecognizer};
use crate::error::{LedgerError, Result};
use image::{GrayImage, ImageFormat};
use log::{debug, warn};
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pipes a PNG-encoded crop through `tesseract stdin stdout`.
#[derive(Clone, Debug)]
pub struct TesseractCli {
    binary: PathBuf,
    lang: String,
}

impl TesseractCli {
    /// Locate `tesseract` on `PATH`.
    pub fn locate(lang: &str) -> Result<Self> {
        let binary = which::which("tesseract")
            .map_err(|e| LedgerError::Config(format!("tesseract not found on PATH: {e}")))?;
        debug!("TesseractCli::locate using {}", binary.display());
        Ok(Self::with_binary(binary, lang))
    }

    pub fn with_binary(binary: impl Into<PathBuf>, lang: &str) -> Self {
        Self {
            binary: binary.into(),
            lang: lang.to_string(),
        }
    }

    /// Command-line arguments for one invocation.
    pub fn args(&self, config: &OcrConfig) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "--psm".to_string(),
            config.psm.to_string(),
            "-l".to_string(),
            self.lang.clone(),
        ];
        if let Some(whitelist) = &config.whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={whitelist}"));
        }
        args
    }
}

impl TesseractCli {
    /// One `tesseract` run. Past `deadline` the child is killed and reaped.
    fn run(
        &self,
        image: &GrayImage,
        config: &OcrConfig,
        deadline: Option<Instant>,
    ) -> std::result::Result<String, RecognizeError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| RecognizeError::Engine(format!("png encode: {e}")))?;

        let started = Instant::now();
        let mut child = Command::new(&self.binary)
            .args(self.args(config))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecognizeError::Engine(format!("spawn {}: {e}", self.binary.display())))?;

        // Pipes are serviced off-thread so a child that stops reading or
        // writing cannot block the deadline check.
        let stdin = child
            .stdin
            .take()
            .map(|mut pipe| thread::spawn(move || pipe.write_all(&png)));
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RecognizeError::Engine(format!("wait: {e}")));
                }
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = child.kill();
                let _ = child.wait();
                let ms = started.elapsed().as_millis() as u64;
                warn!("TesseractCli::run killed pid {} after {ms} ms", child.id());
                return Err(RecognizeError::Timeout { ms });
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(Ok(Err(e))) = stdin.map(|h| h.join()) {
            debug!("TesseractCli::run stdin closed early: {e}");
        }
        let stdout = collect(stdout);
        if !status.success() {
            let stderr = collect(stderr);
            return Err(RecognizeError::Engine(
                String::from_utf8_lossy(&stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(5);

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> std::result::Result<String, RecognizeError> {
        self.run(image, config, None)
    }

    fn recognize_until(
        &self,
        image: &GrayImage,
        config: &OcrConfig,
        deadline: Instant,
    ) -> std::result::Result<String, RecognizeError> {
        self.run(image, config, Some(deadline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_configs_whitelist_digits() {
        let cli = TesseractCli::with_binary("/usr/bin/tesseract", "spa");
        let args = cli.args(&OcrConfig::numeric("digits-line", 7));
        assert_eq!(
            args,
            vec![
                "stdin",
                "stdout",
                "--psm",
                "7",
                "-l",
                "spa",
                "-c",
                "tessedit_char_whitelist=0123456789"
            ]
        );
        let free = cli.args(&OcrConfig::free_text("text-block", 6));
        assert_eq!(free.len(), 6);
        assert_eq!(free[3], "6");
    }

    #[test]
    fn missing_binary_is_an_engine_error() {
        let cli = TesseractCli::with_binary("/nonexistent/tesseract-binary", "spa");
        let res = cli.recognize(&GrayImage::new(12, 12), &OcrConfig::free_text("t", 7));
        assert!(matches!(res, Err(RecognizeError::Engine(_))));
    }

    /// Fake engine that records its pid and then hangs.
    #[cfg(target_os = "linux")]
    fn hanging_engine(dir: &std::path::Path) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::create_dir_all(dir).unwrap();
        let pid_file = dir.join("pid");
        let script = dir.join("tesseract");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho $$ > {}\nexec sleep 30\n", pid_file.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script, pid_file)
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn hung_engine_is_killed_at_the_deadline() {
        let dir = std::env::temp_dir().join(format!("ledger-hung-engine-{}", std::process::id()));
        let (script, pid_file) = hanging_engine(&dir);
        let cli = TesseractCli::with_binary(&script, "spa");

        let started = Instant::now();
        let res = cli.recognize_until(
            &GrayImage::new(12, 12),
            &OcrConfig::numeric("digits-line", 7),
            Instant::now() + Duration::from_millis(500),
        );
        assert!(matches!(res, Err(RecognizeError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let proc_entry = PathBuf::from(format!("/proc/{}", pid.trim()));
        assert!(!proc_entry.exists(), "engine process {} still alive", pid.trim());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
