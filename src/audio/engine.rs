use rodio::{OutputStream, OutputStreamHandle};

use crate::audio::AudioError;

/// The shared audio output. Open one per process and pass it to every
/// component that makes sound; the stream must outlive them, so the host
/// keeps this alive for the whole session. Handles are cheap clones and
/// cross into worker threads, the stream itself stays put.
pub struct AudioEngine {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioEngine {
    /// Open the default output device. When this fails (headless host,
    /// no device) callers should carry on without an engine: every audio
    /// component accepts `None` and degrades to silent no-ops.
    pub fn open() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    pub(crate) fn handle(&self) -> OutputStreamHandle {
        self.handle.clone()
    }
}
