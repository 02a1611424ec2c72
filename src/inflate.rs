//! Streaming raw-DEFLATE decoder used by the validator.
//!
//! ZIP entries with method 8 are raw DEFLATE streams (no zlib or gzip
//! framing). The wrapper around [`flate2::Decompress`] below tolerates being
//! fed arbitrary partial slices of the stream, which is what the decrypter
//! produces, and delivers inflated output in bounded chunks.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};

const INFLATE_CHUNK: usize = 1 << 10;

/// A resettable raw-DEFLATE inflater.
///
/// Like the [`Decrypter`](crate::crypto::Decrypter) it is owned per worker
/// and reused across attempts; [`reset`](Inflater::reset) restores the
/// initial decoder state.
pub struct Inflater {
    stream: Decompress,
}

impl Inflater {
    pub fn new() -> Self {
        Self {
            // false: no zlib header, ZIP payloads are raw DEFLATE
            stream: Decompress::new(false),
        }
    }

    pub fn reset(&mut self) {
        self.stream.reset(false);
    }

    /// Feed `input` to the decoder, emitting inflated bytes to `receiver` in
    /// chunks of at most 1 KiB.
    ///
    /// `finish` corresponds to the final piece of the stream; the validator
    /// always passes `false` because the cipher may complete a deflate block
    /// mid-chunk. End of stream is detected internally, and surplus input
    /// after it is ignored rather than treated as an error. A hard bitstream
    /// error is [`Error::CorruptDeflate`].
    pub fn transform(
        &mut self,
        input: &[u8],
        receiver: &mut dyn FnMut(&[u8]),
        finish: bool,
    ) -> Result<()> {
        let flush = if finish {
            FlushDecompress::Finish
        } else {
            FlushDecompress::None
        };
        let mut remaining = input;
        let mut out = [0u8; INFLATE_CHUNK];

        loop {
            let before_in = self.stream.total_in();
            let before_out = self.stream.total_out();
            let status = self
                .stream
                .decompress(remaining, &mut out, flush)
                .map_err(|err| Error::CorruptDeflate(err.to_string()))?;
            let consumed = (self.stream.total_in() - before_in) as usize;
            let produced = (self.stream.total_out() - before_out) as usize;
            remaining = &remaining[consumed..];

            if produced > 0 {
                receiver(&out[..produced]);
            }

            match status {
                Status::StreamEnd => break,
                // The decoder cannot make progress on what is left; more
                // input has to arrive through a later call.
                Status::BufError => break,
                Status::Ok => {
                    // A full output buffer may mean more is pending even
                    // with no input left to consume.
                    if remaining.is_empty() && produced < out.len() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}
