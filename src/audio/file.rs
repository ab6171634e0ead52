use anyhow::{bail, Context, Result};
use hound::WavReader;
use std::fs;
use std::path::{Path, PathBuf};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::info;

/// Audio formats the prediction service accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "ogg", "flac", "webm"];

/// Upload cap enforced client-side before any bytes are transmitted.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// An audio file selected for upload.
///
/// `open` is cheap and fills in only what the filesystem knows (name,
/// size), so the preview can show immediately; `probe_duration` decodes
/// headers and fills in the duration afterwards.
pub struct AudioFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub duration_seconds: Option<f64>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let size_bytes = fs::metadata(path)
            .with_context(|| format!("Failed to stat audio file: {}", path.display()))?
            .len();

        info!("Selected audio file: {} ({})", name, format_size(size_bytes));

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size_bytes,
            duration_seconds: None,
        })
    }

    /// Check the constraints the service enforces, before uploading.
    pub fn validate_for_upload(&self) -> Result<()> {
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            bail!(
                "Unsupported audio type .{}. Allowed: {}",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            );
        }

        if self.size_bytes > MAX_UPLOAD_BYTES {
            bail!(
                "File is {} but uploads are capped at {}",
                format_size(self.size_bytes),
                format_size(MAX_UPLOAD_BYTES)
            );
        }

        Ok(())
    }

    /// Read duration metadata: hound for WAV, symphonia for everything else.
    pub fn probe_duration(&mut self) -> Result<()> {
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let duration = if ext == "wav" {
            let reader = WavReader::open(&self.path).context("Failed to open WAV file")?;
            let spec = reader.spec();
            Some(reader.duration() as f64 / spec.sample_rate as f64)
        } else {
            probe_duration_symphonia(&self.path, &ext)?
        };

        if let Some(secs) = duration {
            info!("Probed duration: {:.1}s", secs);
        }

        self.duration_seconds = duration;
        Ok(())
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .with_context(|| format!("Failed to read audio file: {}", self.path.display()))
    }

    /// Preview label: size first, duration appended once probed.
    pub fn preview_label(&self) -> String {
        match self.duration_seconds {
            Some(secs) => format!(
                "{} \u{2022} {}",
                format_size(self.size_bytes),
                format_duration(secs)
            ),
            None => format_size(self.size_bytes),
        }
    }
}

/// Decode just enough of a container to learn its duration.
fn probe_duration_symphonia(path: &Path, ext: &str) -> Result<Option<f64>> {
    let src = fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if !ext.is_empty() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unrecognized audio container")?;

    let format = probed.format;
    let track = match format.default_track() {
        Some(track) => track,
        None => return Ok(None),
    };

    let params = &track.codec_params;
    let duration = match (params.time_base, params.n_frames) {
        (Some(time_base), Some(n_frames)) => {
            let time = time_base.calc_time(n_frames);
            Some(time.seconds as f64 + time.frac)
        }
        _ => None,
    };

    Ok(duration)
}

/// Format a byte count as megabytes with two decimals, e.g. "2.50 MB"
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Format seconds as m:ss, e.g. "1:07"
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn size_label_two_decimals() {
        assert_eq!(format_size(2_621_440), "2.50 MB"); // 2.5 MiB
        assert_eq!(format_size(0), "0.00 MB");
    }

    #[test]
    fn duration_label_zero_pads_seconds() {
        assert_eq!(format_duration(42.4), "0:42");
        assert_eq!(format_duration(67.0), "1:07");
    }

    #[test]
    fn preview_shows_size_before_duration_is_known() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; 2_621_440]).unwrap();

        let mut audio = AudioFile::open(&path).unwrap();
        assert_eq!(audio.preview_label(), "2.50 MB");

        // Once metadata arrives the duration is appended.
        audio.duration_seconds = Some(42.0);
        assert_eq!(audio.preview_label(), "2.50 MB \u{2022} 0:42");
    }

    #[test]
    fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let audio = AudioFile::open(&path).unwrap();
        let err = audio.validate_for_upload().unwrap_err();
        assert!(err.to_string().contains("Unsupported audio type"));
    }

    #[test]
    fn rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.wav");
        fs::write(&path, b"RIFF").unwrap();

        let mut audio = AudioFile::open(&path).unwrap();
        audio.size_bytes = MAX_UPLOAD_BYTES + 1;
        assert!(audio.validate_for_upload().is_err());
    }

    #[test]
    fn wav_duration_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..16000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut audio = AudioFile::open(&path).unwrap();
        audio.probe_duration().unwrap();
        assert_eq!(audio.duration_seconds, Some(1.0));
    }
}
