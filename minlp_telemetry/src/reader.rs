use std::io::{self, Read};

use tracing::trace;

use crate::error::{WireError, WireResult};
use crate::message::Message;

/// Consumer side of a framed telemetry stream.
///
/// Yields `None` when the stream ends cleanly between frames. A stream that ends inside a frame
/// yields one [`WireError::Truncated`] and then stops. A complete frame with a malformed body is
/// yielded as an error without ending the stream.
pub struct MessageReader<R: Read> {
    inner: R,
    body: Vec<u8>,
    done: bool,
}

impl<R: Read> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            body: Vec::new(),
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Frame length, or `None` on a clean end of stream.
    fn read_len(&mut self) -> WireResult<Option<u64>> {
        let mut value: u64 = 0;
        for i in 0..10 {
            let Some(byte) = self.read_byte()? else {
                return if i == 0 {
                    Ok(None)
                } else {
                    Err(WireError::Truncated("frame length"))
                };
            };
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(Some(value));
            }
        }
        Err(WireError::VarintOverflow)
    }

    /// Body of the next frame, or `None` on a clean end of stream. Errors here lose the frame
    /// boundary.
    fn read_frame(&mut self) -> WireResult<Option<&[u8]>> {
        let Some(len) = self.read_len()? else {
            return Ok(None);
        };
        self.body.clear();
        let read = (&mut self.inner).take(len).read_to_end(&mut self.body)?;
        if (read as u64) < len {
            return Err(WireError::Truncated("frame body"));
        }
        trace!(len, "read telemetry frame");
        Ok(Some(&self.body))
    }

    pub fn read_message(&mut self) -> WireResult<Option<Message>> {
        match self.read_frame()? {
            Some(body) => Message::decode(body).map(Some),
            None => Ok(None),
        }
    }
}

impl<R: Read> Iterator for MessageReader<R> {
    type Item = WireResult<Message>;

    /// A frame whose body fails to decode is yielded as an error and reading goes on with the
    /// next frame. Errors in the framing itself end the iteration.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_frame().map(|body| body.map(Message::decode)) {
            Ok(Some(decoded)) => Some(decoded),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
