//! Filesystem output: PNG images, WAV files and `index.json`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use xnb::{AssetGraph, OutputSink, PixelGrid};

/// Name of the aggregate document inside the output directory.
pub const INDEX_FILE: &str = "index.json";

/// Writes decoded output into one directory.
#[derive(Debug)]
pub struct FsSink {
    dir: PathBuf,
    written: usize,
}

impl FsSink {
    /// Creates a sink writing into `dir`, which must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn path(&self, name: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{name}.{extension}"))
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

impl OutputSink for FsSink {
    type Error = anyhow::Error;

    fn write_image(&mut self, name: &str, grid: &PixelGrid) -> Result<()> {
        if grid.width == 0 || grid.height == 0 {
            warn!(name, "skipping empty image");
            return Ok(());
        }
        let path = self.path(name, "png");
        image::save_buffer(
            &path,
            &grid.to_rgba8(),
            grid.width,
            grid.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("failed to write {}", display(&path)))?;
        debug!(path = %path.display(), "wrote image");
        self.written += 1;
        Ok(())
    }

    fn write_wave(&mut self, name: &str, wave: &[u8]) -> Result<()> {
        let path = self.path(name, "wav");
        fs::write(&path, wave).with_context(|| format!("failed to write {}", display(&path)))?;
        debug!(path = %path.display(), bytes = wave.len(), "wrote wave");
        self.written += 1;
        Ok(())
    }

    fn write_document(&mut self, graph: &AssetGraph) -> Result<()> {
        let path = self.dir.join(INDEX_FILE);
        let file = File::create(&path).with_context(|| format!("failed to create {}", display(&path)))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, graph)?;
        out.flush()?;
        debug!(path = %path.display(), "wrote index");
        self.written += 1;
        Ok(())
    }
}
