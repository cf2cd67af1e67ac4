use fieldkit_core::ExportSink;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes exports into a directory, replacing a same-named file through a
/// temp file and rename.
pub struct FileSink {
    dir: PathBuf,
    written: Option<PathBuf>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: None,
        }
    }

    pub fn written(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl ExportSink for FileSink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        write_atomic(&path, contents)?;
        self.written = Some(path);
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let temp_path = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => path.with_extension("tmp"),
    };
    fs::write(&temp_path, contents)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}

pub struct StdoutSink;

impl ExportSink for StdoutSink {
    fn deliver(&mut self, _file_name: &str, contents: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(contents.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()
    }
}
