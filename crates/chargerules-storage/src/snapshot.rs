//! Charge-template snapshots: one JSON document per line, zstd-compressed when
//! the file name ends in `.zst`.

use crate::mem::InMemoryStore;
use chargerules_core::{ChargeTemplate, Result};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

fn is_compressed(path: &Path) -> bool {
    path.extension().map(|e| e == "zst").unwrap_or(false)
}

enum Sink {
    Plain(BufWriter<File>),
    Zstd(zstd::Encoder<'static, File>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Sink::Plain(w) => w,
            Sink::Zstd(w) => w,
        }
    }
}

pub struct SnapshotWriter {
    out: Sink,
    pub path: PathBuf,
    pub written: usize,
}

impl SnapshotWriter {
    pub fn create(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let fh = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let out = if is_compressed(&path) {
            Sink::Zstd(zstd::Encoder::new(fh, 3)?)
        } else {
            Sink::Plain(BufWriter::new(fh))
        };
        Ok(Self {
            out,
            path,
            written: 0,
        })
    }

    pub fn write_template(&mut self, template: &ChargeTemplate) -> Result<()> {
        let s = serde_json::to_string(template)?;
        let out = self.out.writer();
        out.write_all(s.as_bytes())?;
        out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Complete the zstd frame (if any) and sync to disk. A writer dropped
    /// without `finish` leaves a truncated snapshot.
    pub fn finish(self) -> Result<usize> {
        let fh = match self.out {
            Sink::Plain(w) => w.into_inner().map_err(|e| e.into_error())?,
            Sink::Zstd(enc) => enc.finish()?,
        };
        fh.sync_all()?;
        Ok(self.written)
    }
}

/// Read every template in the snapshot. Blank lines are skipped; lines that do
/// not decode as a template are logged and skipped.
pub fn read_snapshot(path: &Path) -> Result<Vec<ChargeTemplate>> {
    let fh = File::open(path)?;
    let reader: Box<dyn Read> = if is_compressed(path) {
        Box::new(zstd::Decoder::new(fh)?)
    } else {
        Box::new(fh)
    };
    let mut out = Vec::new();
    for (n, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(t) => out.push(t),
            Err(e) => warn!(line = n + 1, "skipping undecodable template: {}", e),
        }
    }
    Ok(out)
}

pub fn load_store(path: &Path) -> Result<InMemoryStore> {
    let templates = read_snapshot(path)?;
    info!(path = %path.display(), templates = templates.len(), "loaded charge template snapshot");
    InMemoryStore::from_templates(templates)
}
