//! Playable-duration probing for stored clips.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use crate::error::{MonologueError, Result};

/// Measures how long a stored clip plays for.
pub trait DurationProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<Duration>;
}

/// Container-level probe backed by symphonia.
///
/// Uses the track's frame count when the container declares one and
/// otherwise sums packet durations, which covers streamed MP3 without a
/// Xing/VBRI header.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProbe;

impl DurationProbe for SymphoniaProbe {
    fn probe(&self, path: &Path) -> Result<Duration> {
        let fail = |message: String| MonologueError::AudioProbe {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| MonologueError::local_io(path, e))?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let format_opts = FormatOptions {
            enable_gapless: false,
            ..Default::default()
        };
        let mut probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &MetadataOptions::default())
            .map_err(|e| fail(e.to_string()))?;

        let track = probed
            .format
            .default_track()
            .ok_or_else(|| fail("no audio track".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let time_base = params
            .time_base
            .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
            .ok_or_else(|| fail("track declares neither time base nor sample rate".to_string()))?;

        if let Some(n_frames) = params.n_frames {
            return Ok(to_duration(time_base, n_frames));
        }

        let mut total: u64 = 0;
        loop {
            match probed.format.next_packet() {
                Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                Ok(_) => {}
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => return Err(fail(e.to_string())),
            }
        }

        if total == 0 {
            return Err(fail("stream contains no audio packets".to_string()));
        }
        Ok(to_duration(time_base, total))
    }
}

fn to_duration(time_base: TimeBase, ticks: u64) -> Duration {
    let time = time_base.calc_time(ticks);
    Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac)
}
